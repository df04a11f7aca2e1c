//! HTTP bridge transport: POST a signed envelope to
//! `<target-base>/__internal/bridge` using a single `reqwest::Client` with
//! a per-call `.timeout(...)`.

use std::time::Duration;

use plexus_core::{AppError, DistributorId};
use serde_json::Value;
use tracing::warn;

use crate::bridge::BoxFuture;
use crate::envelope::{BridgeEnvelope, BridgeRequest};
use crate::signature::{generate_nonce, sign};

/// Calls a target distributor's `/__internal/bridge` endpoint over HTTP,
/// signing every request with the shared secret configured for that target.
pub struct HttpBridge {
    client: reqwest::Client,
    caller: DistributorId,
    secret: String,
    path: String,
}

impl HttpBridge {
    pub fn new(caller: DistributorId, secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            caller,
            secret: secret.into(),
            path: "/__internal/bridge".to_string(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Call `target` at `base_url`, honouring `timeout`. On timeout returns
    /// `BridgeEnvelope::timeout()` rather than an `Err` — a
    /// `{success:false, code:"TIMEOUT"}` response is itself a successful
    /// bridge round trip.
    pub fn call_at<'a>(
        &'a self,
        base_url: &'a str,
        target: &'a DistributorId,
        module: &'a str,
        command: &'a str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<BridgeEnvelope, AppError>> {
        Box::pin(async move {
            let timestamp = chrono::Utc::now().timestamp();
            let nonce = generate_nonce();
            let caller = self.caller.as_wire();
            let signature = sign(&self.secret, &caller, module, command, &args, &nonce, timestamp);

            let request = BridgeRequest {
                caller,
                module: module.to_string(),
                command: command.to_string(),
                args,
                timestamp,
                nonce,
                signature,
            };

            let url = format!("{}{}", base_url.trim_end_matches('/'), self.path);
            let send = self
                .client
                .post(&url)
                .json(&request)
                .timeout(timeout)
                .send();

            match tokio::time::timeout(timeout, send).await {
                Err(_) => Ok(BridgeEnvelope::timeout()),
                Ok(Err(err)) => {
                    warn!(target = %target, error = %err, "bridge http call failed");
                    Err(AppError::Internal(format!("bridge call to '{target}' failed: {err}")))
                }
                Ok(Ok(response)) => response
                    .json::<BridgeEnvelope>()
                    .await
                    .map_err(|err| AppError::Internal(format!("invalid bridge response from '{target}': {err}"))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_defaults_to_the_reserved_bridge_route() {
        let bridge = HttpBridge::new(DistributorId::new("a", "prod"), "secret");
        assert_eq!(bridge.path, "/__internal/bridge");
    }

    #[test]
    fn with_path_overrides_the_default() {
        let bridge = HttpBridge::new(DistributorId::new("a", "prod"), "secret").with_path("/custom/bridge");
        assert_eq!(bridge.path, "/custom/bridge");
    }
}
