//! Plexus prelude — import everything you need with a single `use`.
//!
//! ```ignore
//! use plexus_core::prelude::*;
//! ```

pub use crate::access::{BridgeAccessControl, Site, SiteResolver};
pub use crate::commands::{CommandEntry, CommandHandler, CommandRegistry, PermissionGate};
pub use crate::config::{
    ConfigError, ConfigProperties, ConfigValue, DistributorSettings, FromConfigValue, PlexusConfig,
    PropertyMeta, SessionConfig,
};
pub use crate::csrf::CsrfTokenManager;
pub use crate::distributor::{ClosureLoader, Distributor, ModuleLoader};
pub use crate::error::AppError;
pub use crate::events::{EventDispatcher, EventHandler};
pub use crate::ids::{DistributorId, ModuleInfo};
pub use crate::middleware::{
    apply_rate_limit_headers, BoxFuture, CsrfMiddleware, Middleware, MiddlewareContext, NextFn,
    Pipeline, SessionMiddleware,
};
pub use crate::request_id::RequestId;
pub use crate::response::{IntoResponse, Response};
pub use crate::routing::{Pattern, RouteBinding, RouteKind, RouteTable};
pub use crate::session::{GcPolicy, Session, SessionDriver, SessionState};
