//! Cross-distributor call bridge for the Plexus runtime: two transports —
//! signed HTTP and subprocess — reached only when a call crosses into a
//! different distributor's process/code isolation boundary.
//! In-process cross-module calls stay in `plexus-core`'s `CommandRegistry`;
//! this crate only exists for the cases that must leave the process.

pub mod bridge;
pub mod config;
pub mod envelope;
pub mod http;
pub mod server;
pub mod signature;
pub mod subprocess;

pub use bridge::{Bridge, BridgeHostResolver, DistributorBridge, StaticHostResolver, DEFAULT_TIMEOUT};
pub use config::InternalBridgeConfig;
pub use envelope::{BridgeEnvelope, BridgeRequest, ACCESS_DENIED, COMMAND_NOT_FOUND, INTERNAL_ERROR, MODULE_NOT_FOUND, TIMEOUT};
pub use http::HttpBridge;
pub use server::handle_bridge_request;
pub use subprocess::SubprocessBridge;
