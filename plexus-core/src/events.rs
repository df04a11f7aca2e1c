//! Cross-module publish/subscribe: `listen(listening_module, vendor/module:event, handler)`
//! and `fire(source, event, args)`.
//!
//! String-keyed rather than `TypeId`-keyed, since listeners are registered
//! by a distributor-qualified event name at module-load time, not by a Rust
//! type known at compile time.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;

pub type EventHandler = Arc<dyn Fn(&[Value]) -> Result<Value, AppError> + Send + Sync>;

/// `(listening_module, source_module, event_name)` must be unique: a given
/// module registering twice for the same source event is a conflict, but
/// two different modules may both listen to the same `(source, event)`.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct EventKey {
    source_module: String,
    event_name: String,
}

struct Listener {
    listening_module: String,
    handler: EventHandler,
}

/// Per-distributor event registry. `fire` invokes every listener bound to
/// `(source, event)`, across all listening modules, and collects their
/// results; a single failing listener does not stop the others from
/// running.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: HashMap<EventKey, Vec<Listener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listening_module`'s handler for `source_module:event_name`.
    /// Errors if `listening_module` already has a handler bound to that
    /// exact triple; other modules may still register independently.
    pub fn listen(
        &mut self,
        listening_module: impl Into<String>,
        source_module: impl Into<String>,
        event_name: impl Into<String>,
        handler: EventHandler,
    ) -> Result<(), AppError> {
        let listening_module = listening_module.into();
        let key = EventKey {
            source_module: source_module.into(),
            event_name: event_name.into(),
        };
        let bound = self.listeners.entry(key.clone()).or_default();
        if bound.iter().any(|l| l.listening_module == listening_module) {
            return Err(AppError::RouteConflict(format!(
                "'{listening_module}' already listens to '{}:{}'",
                key.source_module, key.event_name
            )));
        }
        bound.push(Listener {
            listening_module,
            handler,
        });
        Ok(())
    }

    pub fn unlisten(&mut self, listening_module: &str, source_module: &str, event_name: &str) -> bool {
        let key = EventKey {
            source_module: source_module.to_string(),
            event_name: event_name.to_string(),
        };
        let Some(bound) = self.listeners.get_mut(&key) else {
            return false;
        };
        let before = bound.len();
        bound.retain(|l| l.listening_module != listening_module);
        let removed = bound.len() != before;
        if bound.is_empty() {
            self.listeners.remove(&key);
        }
        removed
    }

    /// Fire `source:event` with `args`, invoking every listener bound to
    /// that pair and collecting their results. Firing an event with no
    /// listeners is not an error — it simply collects nothing.
    pub fn fire(&self, source_module: &str, event_name: &str, args: &[Value]) -> Vec<Result<Value, AppError>> {
        let key = EventKey {
            source_module: source_module.to_string(),
            event_name: event_name.to_string(),
        };
        match self.listeners.get(&key) {
            Some(bound) => bound.iter().map(|l| (l.handler)(args)).collect(),
            None => Vec::new(),
        }
    }

    pub fn is_listening(&self, source_module: &str, event_name: &str) -> bool {
        let key = EventKey {
            source_module: source_module.to_string(),
            event_name: event_name.to_string(),
        };
        self.listeners.get(&key).is_some_and(|bound| !bound.is_empty())
    }
}
