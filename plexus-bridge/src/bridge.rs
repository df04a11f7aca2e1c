//! The `Bridge` trait and transport selection: HTTP if the target
//! distributor has a bound host, otherwise subprocess. Shaped like
//! `plexus-cache`'s `CacheStore` — a `Send + Sync` trait returning a boxed
//! future per call rather than requiring `async fn` in a trait.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use plexus_core::{AppError, DistributorId};
use serde_json::Value;

use crate::envelope::BridgeEnvelope;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The default bridge call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One cross-distributor call transport.
pub trait Bridge: Send + Sync {
    fn call<'a>(
        &'a self,
        target: &'a DistributorId,
        module: &'a str,
        command: &'a str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<BridgeEnvelope, AppError>>;
}

/// Resolves a target distributor to the base URL of its bound host, if any.
/// `None` means "no host bound" — the caller falls back to the subprocess
/// transport.
pub trait BridgeHostResolver: Send + Sync {
    fn base_url(&self, target: &DistributorId) -> Option<String>;
}

/// A resolver backed by a fixed map, for the common case of a static sites
/// table known at startup.
#[derive(Default, Clone)]
pub struct StaticHostResolver {
    hosts: std::collections::HashMap<DistributorId, String>,
}

impl StaticHostResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, target: DistributorId, base_url: impl Into<String>) {
        self.hosts.insert(target, base_url.into());
    }
}

impl BridgeHostResolver for StaticHostResolver {
    fn base_url(&self, target: &DistributorId) -> Option<String> {
        self.hosts.get(target).cloned()
    }
}

/// Picks HTTP or subprocess per call based on the target's bound host.
pub struct DistributorBridge<R: BridgeHostResolver> {
    resolver: R,
    http: crate::http::HttpBridge,
    subprocess: crate::subprocess::SubprocessBridge,
}

impl<R: BridgeHostResolver> DistributorBridge<R> {
    pub fn new(resolver: R, http: crate::http::HttpBridge, subprocess: crate::subprocess::SubprocessBridge) -> Self {
        Self {
            resolver,
            http,
            subprocess,
        }
    }
}

impl<R: BridgeHostResolver + Send + Sync> Bridge for DistributorBridge<R> {
    fn call<'a>(
        &'a self,
        target: &'a DistributorId,
        module: &'a str,
        command: &'a str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<BridgeEnvelope, AppError>> {
        match self.resolver.base_url(target) {
            Some(base_url) => self.http.call_at(&base_url, target, module, command, args, timeout),
            None => self.subprocess.call(target, module, command, args, timeout),
        }
    }
}
