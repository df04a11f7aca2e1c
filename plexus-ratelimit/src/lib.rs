//! Fixed-window rate limiting for the Plexus runtime: a [`Limit`] describes
//! an allowance, a [`RateLimiter`] tracks hits for a key against a
//! pluggable [`RateLimitStore`], [`NamedLimiters`] resolves a limiter by
//! name per request, and [`RateLimitMiddleware`] wires the two into the
//! `plexus-core` pipeline.

pub mod limit;
pub mod limiter;
pub mod middleware;
pub mod registry;
pub mod store;

pub use limit::Limit;
pub use limiter::RateLimiter;
pub use middleware::RateLimitMiddleware;
pub use registry::NamedLimiters;
pub use store::{CacheBackedStore, InMemoryStore, RateLimitRecord, RateLimitStore};
