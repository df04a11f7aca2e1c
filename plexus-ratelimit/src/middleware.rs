//! [`plexus_core::Middleware`] wrapping a [`RateLimiter`] around a named
//! limit: resolves the per-request [`Limit`], rejects with
//! `AppError::RateLimitExceeded` when it would be exceeded, otherwise
//! records the hit and annotates the response with `X-RateLimit-*`
//! headers. Either way the caller ends up with `X-RateLimit-*` and (on
//! rejection) `Retry-After` set — `plexus-core`'s `IntoResponse for
//! AppError` applies the same `X-RateLimit-*` headers to the 429 body.

use std::sync::Arc;

use plexus_core::{apply_rate_limit_headers, AppError, BoxFuture, Middleware, MiddlewareContext, NextFn, Response};

use crate::limiter::RateLimiter;
use crate::registry::NamedLimiters;

pub struct RateLimitMiddleware {
    limiter: RateLimiter,
    limiters: Arc<NamedLimiters>,
    name: String,
}

impl RateLimitMiddleware {
    pub fn new(limiter: RateLimiter, limiters: Arc<NamedLimiters>, name: impl Into<String>) -> Self {
        Self {
            limiter,
            limiters,
            name: name.into(),
        }
    }
}

impl Middleware for RateLimitMiddleware {
    fn handle(&self, ctx: MiddlewareContext, next: NextFn) -> BoxFuture<Result<Response, AppError>> {
        let Some(limit) = self.limiters.resolve(&self.name, &ctx) else {
            // No limiter registered under this name: nothing to enforce.
            return next(ctx);
        };

        if limit.unlimited {
            return next(ctx);
        }

        let limiter = self.limiter.clone();
        Box::pin(async move {
            limiter.hit(&limit)?;

            let mut response = next(ctx).await?;
            apply_rate_limit_headers(
                &mut response,
                limit.max_attempts,
                limiter.remaining(&limit.key, limit.max_attempts),
                limiter.reset_at(&limit.key).unwrap_or(0),
            );
            Ok(response)
        })
    }
}
