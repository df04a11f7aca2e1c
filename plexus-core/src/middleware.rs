//! Onion-style middleware pipeline: a middleware owns its context, may
//! mutate it before handing off, and may transform the result after `next`
//! returns.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::HeaderValue;
use serde_json::Value;

use crate::error::AppError;
use crate::response::{IntoResponse, Response};
use crate::routing::RouteKind;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The read/write map threaded through the pipeline: `url_query, route,
/// module, closure_path, arguments, method, type, is_shadow, contains`.
#[derive(Debug, Clone)]
pub struct MiddlewareContext {
    pub url_query: HashMap<String, String>,
    pub route: String,
    pub module: String,
    pub closure_path: String,
    pub arguments: Vec<String>,
    pub method: String,
    pub kind: RouteKind,
    pub is_shadow: bool,
    /// Free-form bag for middleware-to-middleware state (e.g. the session
    /// id, resolved rate-limit key).
    pub contains: HashMap<String, Value>,
}

impl MiddlewareContext {
    pub fn new(
        method: impl Into<String>,
        route: impl Into<String>,
        module: impl Into<String>,
        closure_path: impl Into<String>,
    ) -> Self {
        Self {
            url_query: HashMap::new(),
            route: route.into(),
            module: module.into(),
            closure_path: closure_path.into(),
            arguments: Vec::new(),
            method: method.into(),
            kind: RouteKind::Standard,
            is_shadow: false,
            contains: HashMap::new(),
        }
    }
}

/// The continuation a middleware calls to run the rest of the pipeline.
pub type NextFn = Box<dyn FnOnce(MiddlewareContext) -> BoxFuture<Result<Response, AppError>> + Send>;

/// A single pluggable interceptor in the pipeline.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: MiddlewareContext, next: NextFn) -> BoxFuture<Result<Response, AppError>>;
}

/// Ordered composition of middlewares around a terminal handler.
///
/// Global middleware is pushed first; route-level middleware is appended
/// after it for routes that declare it.
#[derive(Clone, Default)]
pub struct Pipeline {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Build a pipeline from global middleware plus route-specific additions,
    /// without mutating either input.
    pub fn compose(global: &Pipeline, route_specific: &[Arc<dyn Middleware>]) -> Self {
        let mut middlewares = global.middlewares.clone();
        middlewares.extend(route_specific.iter().cloned());
        Self { middlewares }
    }

    /// Run the pipeline, invoking `handler` once all middlewares have called
    /// `next`. Middlewares closer to the front of the list are outermost.
    pub fn run<H, Fut>(&self, ctx: MiddlewareContext, handler: H) -> BoxFuture<Result<Response, AppError>>
    where
        H: FnOnce(MiddlewareContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
    {
        let mut next: NextFn = Box::new(move |ctx| Box::pin(handler(ctx)));
        for middleware in self.middlewares.iter().rev() {
            let middleware = Arc::clone(middleware);
            let inner = next;
            next = Box::new(move |ctx| middleware.handle(ctx, inner));
        }
        next(ctx)
    }
}

/// Sets `X-RateLimit-*` and `Retry-After` headers on an already-built response.
pub fn apply_rate_limit_headers(resp: &mut Response, limit: u64, remaining: u64, reset_at: u64) {
    let headers = resp.headers_mut();
    headers.insert(
        "X-RateLimit-Limit",
        HeaderValue::from_str(&limit.to_string()).unwrap(),
    );
    headers.insert(
        "X-RateLimit-Remaining",
        HeaderValue::from_str(&remaining.to_string()).unwrap(),
    );
    headers.insert(
        "X-RateLimit-Reset",
        HeaderValue::from_str(&reset_at.to_string()).unwrap(),
    );
}

/// Session middleware: starts the session before `next`, saves it
/// unconditionally afterward — even if the handler returned an error.
pub struct SessionMiddleware {
    driver: Arc<dyn crate::session::SessionDriver>,
    gc_policy: crate::session::GcPolicy,
    cookie_name: String,
}

impl SessionMiddleware {
    pub fn new(
        driver: Arc<dyn crate::session::SessionDriver>,
        gc_policy: crate::session::GcPolicy,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            gc_policy,
            cookie_name: cookie_name.into(),
        }
    }

    fn extract_session_id(ctx: &MiddlewareContext) -> Option<String> {
        ctx.contains
            .get("session_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

impl Middleware for SessionMiddleware {
    fn handle(&self, mut ctx: MiddlewareContext, next: NextFn) -> BoxFuture<Result<Response, AppError>> {
        let driver = Arc::clone(&self.driver);
        let gc_policy = self.gc_policy;
        let cookie_name = self.cookie_name.clone();

        Box::pin(async move {
            let existing_id = Self::extract_session_id(&ctx);
            let mut session = match existing_id {
                Some(id) if !id.is_empty() => {
                    crate::session::Session::resume(&id, driver, gc_policy)?
                }
                _ => crate::session::Session::new(driver, gc_policy),
            };
            session.start()?;
            ctx.contains
                .insert("session_id".to_string(), Value::from(session.id().to_string()));

            let result = next(ctx).await;

            // save() runs on every exit path, including an error result.
            let save_result = session.save();

            let mut response = result?;
            response.headers_mut().insert(
                http::header::SET_COOKIE,
                HeaderValue::from_str(&format!("{cookie_name}={}; Path=/; HttpOnly", session.id()))
                    .unwrap_or_else(|_| HeaderValue::from_static("")),
            );
            save_result?;
            Ok(response)
        })
    }
}

/// CSRF middleware: passthrough for safe methods; for POST/PUT/PATCH/DELETE,
/// extracts the submitted token from the form field `_token` or the
/// `X-CSRF-TOKEN` header and validates it against the session.
pub struct CsrfMiddleware {
    excluded_routes: Vec<String>,
}

impl CsrfMiddleware {
    pub fn new(excluded_routes: Vec<String>) -> Self {
        Self { excluded_routes }
    }

    fn is_safe_method(method: &str) -> bool {
        matches!(method.to_ascii_uppercase().as_str(), "GET" | "HEAD" | "OPTIONS")
    }

    fn extract_submitted_token(ctx: &MiddlewareContext) -> Option<String> {
        ctx.contains
            .get("form__token")
            .or_else(|| ctx.contains.get("header_x_csrf_token"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

impl Middleware for CsrfMiddleware {
    fn handle(&self, ctx: MiddlewareContext, next: NextFn) -> BoxFuture<Result<Response, AppError>> {
        if Self::is_safe_method(&ctx.method) || self.excluded_routes.contains(&ctx.route) {
            return next(ctx);
        }

        Box::pin(async move {
            // The live `Session` lives with `SessionMiddleware`, which must
            // run outside this one in the pipeline; it stashes the issued
            // token into `contains` for this middleware to compare against.
            let submitted = Self::extract_submitted_token(&ctx).unwrap_or_default();
            let stored = ctx
                .contains
                .get("csrf_token")
                .and_then(|v| v.as_str())
                .map(str::to_string);

            let valid = match stored {
                Some(stored) => {
                    use subtle::ConstantTimeEq;
                    bool::from(stored.as_bytes().ct_eq(submitted.as_bytes()))
                }
                None => false,
            };

            if !valid {
                return Err(AppError::CsrfMismatch("token mismatch".into()));
            }
            next(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    struct Echo;
    impl Middleware for Echo {
        fn handle(&self, ctx: MiddlewareContext, next: NextFn) -> BoxFuture<Result<Response, AppError>> {
            next(ctx)
        }
    }

    struct AddHeader(&'static str);
    impl Middleware for AddHeader {
        fn handle(&self, ctx: MiddlewareContext, next: NextFn) -> BoxFuture<Result<Response, AppError>> {
            let name = self.0;
            Box::pin(async move {
                let mut resp = next(ctx).await?;
                resp.headers_mut()
                    .insert(name, HeaderValue::from_static("1"));
                Ok(resp)
            })
        }
    }

    #[tokio::test]
    async fn pipeline_runs_middlewares_in_registration_order() {
        let mut pipeline = Pipeline::new();
        pipeline.push(Arc::new(AddHeader("X-First")));
        pipeline.push(Arc::new(AddHeader("X-Second")));
        let ctx = MiddlewareContext::new("GET", "/x", "core/demo", "x");
        let resp = pipeline
            .run(ctx, |_ctx| async { Ok(crate::response::ok_bytes("ok")) })
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("X-First"));
        assert!(resp.headers().contains_key("X-Second"));
    }

    #[tokio::test]
    async fn middleware_can_short_circuit_by_skipping_next() {
        struct Block;
        impl Middleware for Block {
            fn handle(
                &self,
                _ctx: MiddlewareContext,
                _next: NextFn,
            ) -> BoxFuture<Result<Response, AppError>> {
                Box::pin(async { Err(AppError::Forbidden("blocked".into())) })
            }
        }
        let mut pipeline = Pipeline::new();
        pipeline.push(Arc::new(Block));
        let ctx = MiddlewareContext::new("GET", "/x", "core/demo", "x");
        let result = pipeline.run(ctx, |_ctx| async { Ok(crate::response::ok_bytes("ok")) }).await;
        assert!(result.is_err());
    }
}
