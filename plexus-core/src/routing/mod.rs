//! Route resolution: pattern compiler, compiled route table, shadow and
//! lazy route expansion.

mod pattern;
mod table;

pub use pattern::Pattern;
pub use table::{LazyNode, Matched, RouteBinding, RouteKind, RouteTable, ShadowTarget};
