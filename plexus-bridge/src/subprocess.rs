//! Subprocess bridge transport: `<runtime> bridge <target@tag> <module>
//! <command> <args-as-json>`, communicating a single JSON document over
//! stdout. Kills the child and discards its output on timeout.

use std::process::Stdio;
use std::time::Duration;

use plexus_core::{AppError, DistributorId};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::bridge::BoxFuture;
use crate::envelope::BridgeEnvelope;

/// Spawns a fresh runtime process per call, isolating it from the caller's
/// address space entirely.
pub struct SubprocessBridge {
    runtime_path: String,
}

impl SubprocessBridge {
    pub fn new(runtime_path: impl Into<String>) -> Self {
        Self {
            runtime_path: runtime_path.into(),
        }
    }

    pub fn call<'a>(
        &'a self,
        target: &'a DistributorId,
        module: &'a str,
        command: &'a str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<BridgeEnvelope, AppError>> {
        Box::pin(async move {
            let args_json = serde_json::to_string(&args).unwrap_or_else(|_| "[]".to_string());

            let mut child = Command::new(&self.runtime_path)
                .arg("bridge")
                .arg(target.as_wire())
                .arg(module)
                .arg(command)
                .arg(&args_json)
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|err| {
                    AppError::Internal(format!("failed to spawn bridge subprocess for '{target}': {err}"))
                })?;

            let mut stdout = child.stdout.take().expect("stdout was piped at spawn");

            match tokio::time::timeout(timeout, child.wait()).await {
                Err(_elapsed) => {
                    // Partial stdout is discarded; the caller only sees the timeout.
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                    Ok(BridgeEnvelope::timeout())
                }
                Ok(Err(err)) => Err(AppError::Internal(format!(
                    "bridge subprocess for '{target}' failed: {err}"
                ))),
                Ok(Ok(_status)) => {
                    let mut output = String::new();
                    stdout
                        .read_to_string(&mut output)
                        .await
                        .map_err(|err| AppError::Internal(format!("failed to read bridge subprocess output: {err}")))?;
                    serde_json::from_str(&output).map_err(|err| {
                        AppError::Internal(format!("invalid bridge subprocess output from '{target}': {err}"))
                    })
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `/bin/echo` emits no JSON at all, which exercises the "invalid
    /// output" error path without depending on a real runtime binary.
    #[tokio::test]
    async fn non_json_stdout_is_an_internal_error() {
        let bridge = SubprocessBridge::new("/bin/echo");
        let result = bridge
            .call(
                &DistributorId::new("acme", "prod"),
                "vendor/reports",
                "generate",
                vec![],
                Duration::from_secs(5),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn a_missing_runtime_binary_is_an_internal_error() {
        let bridge = SubprocessBridge::new("/no/such/runtime-binary");
        let result = bridge
            .call(
                &DistributorId::new("acme", "prod"),
                "vendor/reports",
                "generate",
                vec![],
                Duration::from_secs(5),
            )
            .await;
        assert!(result.is_err());
    }
}
