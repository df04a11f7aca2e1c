//! Core runtime for the Plexus multi-tenant web application runtime:
//! route compilation and dispatch, the middleware pipeline, sessions,
//! CSRF protection, in-process commands, events, and bridge access
//! control, all threaded explicitly through a [`Distributor`] rather than
//! reached via process-wide state.

pub mod access;
pub mod commands;
pub mod config;
pub mod csrf;
pub mod distributor;
pub mod error;
pub mod events;
pub mod ids;
pub mod middleware;
pub mod prelude;
pub mod request_id;
pub mod response;
pub mod routing;
pub mod session;

pub use access::{BridgeAccessControl, Site, SiteResolver};
pub use commands::{CommandEntry, CommandHandler, CommandRegistry, PermissionGate};
pub use config::{
    ConfigError, ConfigProperties, ConfigValue, DistributorSettings, FromConfigValue, PlexusConfig,
    PropertyMeta, SessionConfig,
};
pub use csrf::CsrfTokenManager;
pub use distributor::{ClosureLoader, Distributor, ModuleLoader};
pub use error::AppError;
pub use events::{EventDispatcher, EventHandler};
pub use ids::{DistributorId, ModuleInfo};
pub use middleware::{
    apply_rate_limit_headers, BoxFuture, CsrfMiddleware, Middleware, MiddlewareContext, NextFn,
    Pipeline, SessionMiddleware,
};
pub use request_id::RequestId;
pub use response::{IntoResponse, Response};
pub use routing::{Pattern, RouteBinding, RouteKind, RouteTable};
pub use session::{GcPolicy, Session, SessionDriver, SessionState};
