//! In-process command dispatch: API commands and bridge commands per
//! module, with permission gates.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;

/// `{ module_code, command_name, closure_path, internally_bound }`.
#[derive(Debug, Clone)]
pub struct CommandEntry {
    pub module_code: String,
    pub command_name: String,
    pub closure_path: String,
    pub internally_bound: bool,
}

/// Permission gate a controller implements to allow or deny a call.
pub trait PermissionGate: Send + Sync {
    /// `onAPICall(caller, command)`.
    fn on_api_call(&self, caller: &str, command: &str) -> bool;
    /// `onBridgeCall(source_distributor, command)`.
    fn on_bridge_call(&self, source_distributor: &str, command: &str) -> bool;
    /// `onError(command, err)` — invoked when the resolved handler fails.
    fn on_error(&self, _command: &str, _err: &AppError) {}
}

/// A resolved, callable command handler. `Arc`-shared so a `#`-prefixed
/// command can live in both the public API table and the internal-binding
/// table without being registered twice.
pub type CommandHandler = Arc<dyn Fn(&[Value]) -> Result<Value, AppError> + Send + Sync>;

/// Per-module command tables: API commands and bridge commands.
///
/// Adding an API command whose name begins with `#` registers it (with the
/// prefix stripped) in both the API map and the internal-binding table,
/// which lets the owning controller call it as if it were a method.
pub struct CommandRegistry {
    module_code: String,
    api_commands: HashMap<String, CommandHandler>,
    bridge_commands: HashMap<String, CommandHandler>,
    internally_bound: HashMap<String, CommandHandler>,
    gate: Box<dyn PermissionGate>,
}

impl CommandRegistry {
    pub fn new(module_code: impl Into<String>, gate: Box<dyn PermissionGate>) -> Self {
        Self {
            module_code: module_code.into(),
            api_commands: HashMap::new(),
            bridge_commands: HashMap::new(),
            internally_bound: HashMap::new(),
            gate,
        }
    }

    /// Register an API command. A leading `#` both strips the prefix from
    /// the public name and registers the same handler internally-bound.
    pub fn add_api_command(&mut self, name: &str, handler: CommandHandler) -> Result<(), AppError> {
        let (public_name, internal) = match name.strip_prefix('#') {
            Some(stripped) => (stripped.to_string(), true),
            None => (name.to_string(), false),
        };
        if self.api_commands.contains_key(&public_name) {
            return Err(AppError::RouteConflict(format!(
                "duplicate command '{}' on module '{}'",
                public_name, self.module_code
            )));
        }
        if internal {
            self.internally_bound.insert(public_name.clone(), Arc::clone(&handler));
        }
        self.api_commands.insert(public_name, handler);
        Ok(())
    }

    /// Register a bridge command (reachable only via the cross-distributor bridge).
    pub fn add_bridge_command(&mut self, name: &str, handler: CommandHandler) -> Result<(), AppError> {
        if self.bridge_commands.contains_key(name) {
            return Err(AppError::RouteConflict(format!(
                "duplicate bridge command '{}' on module '{}'",
                name, self.module_code
            )));
        }
        self.bridge_commands.insert(name.to_string(), handler);
        Ok(())
    }

    /// Execute an in-process API call from `caller`.
    pub fn execute_api(&self, caller: &str, command: &str, args: &[Value]) -> Option<Value> {
        let handler = self.api_commands.get(command)?;
        if !self.gate.on_api_call(caller, command) {
            return None;
        }
        match handler(args) {
            Ok(value) => Some(value),
            Err(err) => {
                self.gate.on_error(command, &err);
                None
            }
        }
    }

    /// Execute a bridge call from `source_distributor`, returning a
    /// structured error instead of `None` so the bridge transport can map
    /// it to a response envelope error code.
    pub fn execute_bridge(
        &self,
        source_distributor: &str,
        command: &str,
        args: &[Value],
    ) -> Result<Value, AppError> {
        let handler = self
            .bridge_commands
            .get(command)
            .or_else(|| self.api_commands.get(command))
            .ok_or_else(|| AppError::CommandNotFound(command.to_string()))?;
        if !self.gate.on_bridge_call(source_distributor, command) {
            return Err(AppError::AccessDenied(format!(
                "distributor '{source_distributor}' may not call '{command}'"
            )));
        }
        handler(args).map_err(|err| {
            self.gate.on_error(command, &err);
            AppError::Internal(format!("command '{command}' failed: {err}"))
        })
    }

    /// Internally-bound commands (the `#`-prefixed ones), callable as if
    /// they were controller methods.
    pub fn internal(&self, command: &str) -> Option<&CommandHandler> {
        self.internally_bound.get(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AllowAll;
    impl PermissionGate for AllowAll {
        fn on_api_call(&self, _caller: &str, _command: &str) -> bool {
            true
        }
        fn on_bridge_call(&self, _source_distributor: &str, _command: &str) -> bool {
            true
        }
    }

    struct DenyAll;
    impl PermissionGate for DenyAll {
        fn on_api_call(&self, _caller: &str, _command: &str) -> bool {
            false
        }
        fn on_bridge_call(&self, _source_distributor: &str, _command: &str) -> bool {
            false
        }
    }

    #[test]
    fn execute_api_returns_none_for_unknown_command() {
        let registry = CommandRegistry::new("vendor/mod", Box::new(AllowAll));
        assert!(registry.execute_api("caller", "missing", &[]).is_none());
    }

    #[test]
    fn execute_api_calls_the_handler_when_gate_allows() {
        let mut registry = CommandRegistry::new("vendor/mod", Box::new(AllowAll));
        registry
            .add_api_command("greet", Arc::new(|_args| Ok(Value::from("hi"))))
            .unwrap();
        assert_eq!(registry.execute_api("caller", "greet", &[]), Some(Value::from("hi")));
    }

    #[test]
    fn execute_api_returns_none_when_gate_denies() {
        let mut registry = CommandRegistry::new("vendor/mod", Box::new(DenyAll));
        registry
            .add_api_command("greet", Arc::new(|_args| Ok(Value::from("hi"))))
            .unwrap();
        assert!(registry.execute_api("caller", "greet", &[]).is_none());
    }

    #[test]
    fn duplicate_command_registration_conflicts() {
        let mut registry = CommandRegistry::new("vendor/mod", Box::new(AllowAll));
        registry
            .add_api_command("greet", Arc::new(|_args| Ok(Value::Null)))
            .unwrap();
        let err = registry.add_api_command("greet", Arc::new(|_args| Ok(Value::Null)));
        assert!(err.is_err());
    }

    #[test]
    fn execute_bridge_rejects_unknown_command_with_structured_error() {
        let registry = CommandRegistry::new("vendor/mod", Box::new(AllowAll));
        let err = registry.execute_bridge("other@default", "missing", &[]).unwrap_err();
        assert!(matches!(err, AppError::CommandNotFound(_)));
    }

    #[test]
    fn hash_prefixed_command_is_registered_internally_bound_too() {
        let mut registry = CommandRegistry::new("vendor/mod", Box::new(AllowAll));
        registry
            .add_api_command("#internal.step", Arc::new(|_args| Ok(Value::from("ok"))))
            .unwrap();
        assert_eq!(
            registry.execute_api("caller", "internal.step", &[]),
            Some(Value::from("ok"))
        );
        let internal = registry.internal("internal.step").unwrap();
        assert_eq!(internal(&[]).unwrap(), Value::from("ok"));
    }

    #[test]
    fn execute_bridge_denies_when_gate_rejects() {
        let mut registry = CommandRegistry::new("vendor/mod", Box::new(DenyAll));
        registry
            .add_bridge_command("reports.generate", Arc::new(|_args| Ok(Value::Null)))
            .unwrap();
        let err = registry
            .execute_bridge("other@default", "reports.generate", &[])
            .unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));
    }
}
