//! Named limiter registry: routes reference a limiter by name (e.g.
//! `"api"`) and the registry resolves it to a concrete [`Limit`] per
//! request.

use std::collections::HashMap;

use plexus_core::MiddlewareContext;

use crate::limit::Limit;

type Resolver = Box<dyn Fn(&MiddlewareContext) -> Limit + Send + Sync>;

/// Maps a limiter name to a closure that resolves the per-request [`Limit`].
#[derive(Default)]
pub struct NamedLimiters {
    resolvers: HashMap<String, Resolver>,
}

impl NamedLimiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` to resolve via `resolver`.
    pub fn register<F>(&mut self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&MiddlewareContext) -> Limit + Send + Sync + 'static,
    {
        self.resolvers.insert(name.into(), Box::new(resolver));
    }

    /// Resolve `name` against `ctx`, namespacing the resulting bucket key
    /// with `<name>:` so two limiters never collide on the same store.
    pub fn resolve(&self, name: &str, ctx: &MiddlewareContext) -> Option<Limit> {
        let resolver = self.resolvers.get(name)?;
        let mut limit = resolver(ctx);
        if !limit.unlimited {
            limit.key = format!("{name}:{}", limit.key);
        }
        Some(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> MiddlewareContext {
        let mut ctx = MiddlewareContext::new("GET", "/api", "core/demo", "handler");
        ctx.contains.insert(
            "remote_ip".to_string(),
            serde_json::Value::from("1.1.1.1"),
        );
        ctx
    }

    #[test]
    fn resolved_limit_is_namespaced_by_limiter_name() {
        let mut limiters = NamedLimiters::new();
        limiters.register("api", |ctx| {
            let ip = ctx.contains.get("remote_ip").and_then(|v| v.as_str()).unwrap_or("unknown");
            Limit::per_minute(3).by(ip)
        });
        let limit = limiters.resolve("api", &ctx()).expect("registered");
        assert_eq!(limit.key, "api:1.1.1.1");
        assert_eq!(limit.max_attempts, 3);
    }

    #[test]
    fn unknown_limiter_resolves_to_none() {
        let limiters = NamedLimiters::new();
        assert!(limiters.resolve("missing", &ctx()).is_none());
    }

    #[test]
    fn unlimited_resolution_is_not_namespaced() {
        let mut limiters = NamedLimiters::new();
        limiters.register("open", |_ctx| Limit::unlimited());
        let limit = limiters.resolve("open", &ctx()).unwrap();
        assert_eq!(limit.key, "");
    }
}
