//! The `Distributor`: owns one runtime's shared resources and threads them
//! explicitly into request handling, rather than reaching for process-wide
//! singletons.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::access::{BridgeAccessControl, Site, SiteResolver};
use crate::commands::{CommandRegistry, PermissionGate};
use crate::config::sections::{DistributorSettings, SessionConfig};
use crate::config::PlexusConfig;
use crate::error::AppError;
use crate::events::EventDispatcher;
use crate::ids::{DistributorId, ModuleInfo};
use crate::routing::RouteTable;

/// Loads a module's route table, command registry, and event listeners on
/// first access. Modules are immutable once loaded, so a loader only ever
/// runs once per module code — subsequent calls hit the cache.
pub trait ModuleLoader: Send + Sync {
    /// Load (or build) the module identified by `info`, registering its
    /// routes/commands/listeners into the given tables.
    fn load(
        &self,
        info: &ModuleInfo,
        routes: &mut RouteTable,
        commands: &mut CommandRegistry,
        events: &mut EventDispatcher,
    ) -> Result<(), AppError>;
}

/// A handler resolved lazily by closure path — the counterpart to
/// `RouteKind::Lazy`/`RouteKind::Script` bindings, which name a handler
/// without loading it until the route is actually dispatched.
pub trait ClosureLoader: Send + Sync {
    fn load(&self, module_code: &str, closure_path: &str) -> Result<Value, AppError>;
}

struct DenyAllGate;
impl PermissionGate for DenyAllGate {
    fn on_api_call(&self, _caller: &str, _command: &str) -> bool {
        false
    }
    fn on_bridge_call(&self, _source_distributor: &str, _command: &str) -> bool {
        false
    }
}

/// One loaded module's resources, held together so they can be looked up
/// and torn down as a unit.
struct LoadedModule {
    info: ModuleInfo,
    commands: CommandRegistry,
}

/// Owns everything a single distributor runtime needs to dispatch requests:
/// its route table, per-module command registries, event dispatcher, and
/// resolved configuration. Handlers receive a `&Distributor` explicitly;
/// nothing here is reached via a global.
pub struct Distributor {
    pub id: DistributorId,
    pub settings: DistributorSettings,
    pub session_config: SessionConfig,
    routes: RwLock<RouteTable>,
    modules: RwLock<HashMap<String, LoadedModule>>,
    events: RwLock<EventDispatcher>,
    sites: SiteResolver,
    bridge_acl: BridgeAccessControl,
}

impl Distributor {
    /// Build a distributor from its resolved configuration plus the sites
    /// table and bridge allowlist it was configured with.
    pub fn new(
        config: &PlexusConfig,
        sites: Vec<Site>,
        bridge_allowed: Vec<String>,
    ) -> Result<Self, AppError> {
        let settings = DistributorSettings::from_config(config)?;
        let session_config = SessionConfig::from_config(config)?;
        let id = settings.id();

        let mut resolver = SiteResolver::new();
        for site in sites {
            resolver.add_site(site)?;
        }

        Ok(Self {
            id,
            settings,
            session_config,
            routes: RwLock::new(RouteTable::new()),
            modules: RwLock::new(HashMap::new()),
            events: RwLock::new(EventDispatcher::new()),
            sites: resolver,
            bridge_acl: BridgeAccessControl::new(bridge_allowed),
        })
    }

    pub fn resolve_site(&self, host: &str) -> Result<&Site, AppError> {
        self.sites.resolve(host)
    }

    pub fn check_bridge_caller(&self, caller: &DistributorId) -> Result<(), AppError> {
        self.bridge_acl.check(caller)
    }

    /// Register a module's routes/commands/events via `loader`, idempotent
    /// per module code.
    pub fn load_module(&self, info: ModuleInfo, loader: &dyn ModuleLoader) -> Result<(), AppError> {
        if self.modules.read().unwrap().contains_key(&info.code) {
            return Ok(());
        }
        let mut commands = CommandRegistry::new(info.code.clone(), Box::new(DenyAllGate));
        {
            let mut routes = self.routes.write().unwrap();
            let mut events = self.events.write().unwrap();
            loader.load(&info, &mut routes, &mut commands, &mut events).inspect_err(|err| {
                tracing::warn!(module = %info.code, error = %err, "module failed to load");
            })?;
        }
        tracing::info!(module = %info.code, version = %info.version, "module loaded");
        self.modules
            .write()
            .unwrap()
            .insert(info.code.clone(), LoadedModule { info, commands });
        Ok(())
    }

    pub fn freeze_routes(&self) {
        self.routes.write().unwrap().freeze();
    }

    /// Dispatch an inbound `(method, path)` to its route binding, returning
    /// the resolved module, closure path, and named path arguments.
    pub fn dispatch_route(
        &self,
        method: &str,
        path: &str,
    ) -> Result<(String, String, HashMap<String, String>), AppError> {
        let method = http::Method::from_bytes(method.as_bytes())
            .map_err(|_| AppError::BadRequest(format!("invalid HTTP method '{method}'")))?;
        let routes = self.routes.read().unwrap();
        let matched = routes.dispatch(&method, path)?;
        let args = matched
            .binding
            .pattern
            .arg_names()
            .iter()
            .cloned()
            .zip(matched.args.iter().cloned())
            .collect::<HashMap<_, _>>();
        Ok((
            matched.binding.module_code.clone(),
            matched.binding.closure_path.clone(),
            args,
        ))
    }

    pub fn execute_api_command(
        &self,
        module_code: &str,
        caller: &str,
        command: &str,
        args: &[Value],
    ) -> Option<Value> {
        let modules = self.modules.read().unwrap();
        modules.get(module_code)?.commands.execute_api(caller, command, args)
    }

    pub fn execute_bridge_command(
        &self,
        module_code: &str,
        source_distributor: &str,
        command: &str,
        args: &[Value],
    ) -> Result<Value, AppError> {
        let modules = self.modules.read().unwrap();
        let module = modules
            .get(module_code)
            .ok_or_else(|| AppError::CommandNotFound(format!("module '{module_code}' not loaded")))?;
        module.commands.execute_bridge(source_distributor, command, args).inspect_err(|err| {
            tracing::warn!(source = %source_distributor, module = %module_code, command = %command, error = %err, "bridge command rejected");
        })
    }

    pub fn fire_event(&self, source_module: &str, event: &str, args: &[Value]) -> Vec<Result<Value, AppError>> {
        self.events.read().unwrap().fire(source_module, event, args)
    }

    pub fn listen_event(
        &self,
        listening_module: impl Into<String>,
        source_module: impl Into<String>,
        event: impl Into<String>,
        handler: crate::events::EventHandler,
    ) -> Result<(), AppError> {
        self.events
            .write()
            .unwrap()
            .listen(listening_module, source_module, event, handler)
    }

    pub fn module_info(&self, module_code: &str) -> Option<ModuleInfo> {
        self.modules
            .read()
            .unwrap()
            .get(module_code)
            .map(|m| m.info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopLoader;
    impl ModuleLoader for NoopLoader {
        fn load(
            &self,
            info: &ModuleInfo,
            routes: &mut RouteTable,
            commands: &mut CommandRegistry,
            _events: &mut EventDispatcher,
        ) -> Result<(), AppError> {
            routes.add_route("GET", "/ping", &info.code, "ping")?;
            commands.add_api_command(
                "ping",
                Arc::new(|_args| Ok(Value::from("pong"))),
            )?;
            Ok(())
        }
    }

    fn sample_config() -> PlexusConfig {
        PlexusConfig::from_yaml_str(
            "dist:\n  code: acme\n  module_root: /opt/modules\n",
            "test",
        )
        .unwrap()
    }

    #[test]
    fn load_module_is_idempotent() {
        let distributor = Distributor::new(&sample_config(), vec![], vec![]).unwrap();
        let info = ModuleInfo::new("acme/core", "1.0.0", distributor.id.clone(), "core", "/opt/modules/core");
        distributor.load_module(info.clone(), &NoopLoader).unwrap();
        distributor.load_module(info, &NoopLoader).unwrap();
        distributor.freeze_routes();
        let (module, closure, _args) = distributor.dispatch_route("GET", "/ping").unwrap();
        assert_eq!(module, "acme/core");
        assert_eq!(closure, "ping");
    }

    #[test]
    fn execute_api_command_reaches_the_loaded_module() {
        let distributor = Distributor::new(&sample_config(), vec![], vec![]).unwrap();
        let info = ModuleInfo::new("acme/core", "1.0.0", distributor.id.clone(), "core", "/opt/modules/core");
        distributor.load_module(info, &NoopLoader).unwrap();
        let result = distributor.execute_api_command("acme/core", "caller", "ping", &[]);
        assert_eq!(result, Some(Value::from("pong")));
    }

    #[test]
    fn bridge_caller_must_be_allowlisted() {
        let distributor =
            Distributor::new(&sample_config(), vec![], vec!["partner@*".to_string()]).unwrap();
        assert!(distributor
            .check_bridge_caller(&DistributorId::new("partner", "staging"))
            .is_ok());
        assert!(distributor
            .check_bridge_caller(&DistributorId::new("stranger", "default"))
            .is_err());
    }

    #[test]
    fn dispatch_route_propagates_not_found() {
        let distributor = Distributor::new(&sample_config(), vec![], vec![]).unwrap();
        distributor.freeze_routes();
        assert!(distributor.dispatch_route("GET", "/missing").is_err());
    }
}
