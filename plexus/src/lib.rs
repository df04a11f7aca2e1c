//! Plexus — a modular multi-tenant web-application runtime.
//!
//! This facade crate re-exports the `plexus-*` sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use plexus::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Default | Crate             |
//! |-------------|---------|-------------------|
//! | `cache`     | **yes** | `plexus-cache`    |
//! | `ratelimit` | **yes** | `plexus-ratelimit`|
//! | `auth`      | **yes** | `plexus-auth`     |
//! | `bridge`    | **yes** | `plexus-bridge`   |
//! | `full`      | no      | All of the above  |

pub extern crate plexus_core;

// Re-export everything from plexus-core at the top level for convenience —
// routing, middleware, sessions, CSRF, distributors and commands are always
// present; they do not live behind a feature flag.
pub use plexus_core::*;

#[cfg(feature = "cache")]
pub use plexus_cache;

#[cfg(feature = "ratelimit")]
pub use plexus_ratelimit;

#[cfg(feature = "auth")]
pub use plexus_auth;

#[cfg(feature = "bridge")]
pub use plexus_bridge;

/// Unified prelude — import everything with `use plexus::prelude::*`.
///
/// Includes the core prelude plus the types from every enabled feature
/// crate.
pub mod prelude {
    pub use plexus_core::prelude::*;

    #[cfg(feature = "cache")]
    pub use plexus_cache::{cache_backend, set_cache_backend, CacheStore, InMemoryStore, TtlCache};

    #[cfg(feature = "ratelimit")]
    pub use plexus_ratelimit::{
        CacheBackedStore, Limit, NamedLimiters, RateLimitMiddleware, RateLimitRecord, RateLimitStore,
        RateLimiter,
    };

    #[cfg(feature = "auth")]
    pub use plexus_auth::prelude::*;

    #[cfg(feature = "bridge")]
    pub use plexus_bridge::{
        handle_bridge_request, Bridge, BridgeEnvelope, BridgeHostResolver, BridgeRequest,
        DistributorBridge, HttpBridge, InternalBridgeConfig, StaticHostResolver,
        SubprocessBridge,
    };
}
