//! Compiled route table, shadow resolution, and lazy route expansion.

use std::collections::{HashMap, HashSet};

use http::Method;

use crate::error::AppError;

use super::pattern::Pattern;

/// One of the four route shapes a module can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Standard,
    Lazy,
    Script,
    Shadow,
}

/// Target of a shadow route: the module and closure the dispatcher should
/// rebind to when this route is matched.
#[derive(Debug, Clone)]
pub struct ShadowTarget {
    pub target_module: String,
    pub target_closure_path: String,
}

/// A single registered route.
#[derive(Debug, Clone)]
pub struct RouteBinding {
    pub pattern: Pattern,
    pub method: String,
    pub module_code: String,
    pub closure_path: String,
    pub kind: RouteKind,
    pub shadow_target: Option<ShadowTarget>,
}

impl RouteBinding {
    fn is_wildcard_method(&self) -> bool {
        self.method == "*"
    }

    fn method_matches(&self, requested: &Method) -> bool {
        self.is_wildcard_method() || self.method.eq_ignore_ascii_case(requested.as_str())
    }
}

/// A nested tree of lazy route declarations. Leaves are closure paths;
/// the reserved key `@self` binds the parent segment itself.
#[derive(Debug, Clone)]
pub enum LazyNode {
    Leaf(String),
    Branch(HashMap<String, LazyNode>),
}

/// The result of a successful dispatch: the final (possibly shadow-resolved)
/// binding plus the captured path arguments in declaration order.
pub struct Matched<'t> {
    pub binding: &'t RouteBinding,
    pub args: Vec<String>,
}

/// Compiled, read-mostly route index for one distributor.
///
/// Registration happens during module `init`; once the distributor enters
/// its request-serving phase the table is frozen.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteBinding>,
    /// `(method, pattern source)` registered so far, for duplicate detection.
    registered: HashSet<(String, String)>,
    frozen: bool,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the table against further registration. Subsequent `add_*`
    /// calls return `RouteConflict`-shaped errors rather than panicking.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.resort();
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Register an absolute route: `addRoute(method, pattern, module, closure_path)`.
    pub fn add_route(
        &mut self,
        method: &str,
        pattern: &str,
        module_code: &str,
        closure_path: &str,
    ) -> Result<(), AppError> {
        self.add_binding(method, pattern, module_code, closure_path, RouteKind::Standard, None)
    }

    /// Register a shadow route: `addShadowRoute(pattern, target_module, target_closure_path)`.
    ///
    /// If `target_closure_path` is `None`, the dispatcher uses `pattern`
    /// itself as the target path.
    pub fn add_shadow_route(
        &mut self,
        method: &str,
        pattern: &str,
        module_code: &str,
        target_module: &str,
        target_closure_path: Option<&str>,
    ) -> Result<(), AppError> {
        let target_closure_path = target_closure_path.unwrap_or(pattern).to_string();
        self.add_binding(
            method,
            pattern,
            module_code,
            "",
            RouteKind::Shadow,
            Some(ShadowTarget {
                target_module: target_module.to_string(),
                target_closure_path,
            }),
        )
    }

    /// Expand a lazy route tree under `alias_prefix` into absolute routes.
    pub fn add_lazy_route(
        &mut self,
        method: &str,
        alias_prefix: &str,
        module_code: &str,
        tree: &LazyNode,
    ) -> Result<(), AppError> {
        self.expand_lazy(method, alias_prefix, module_code, tree)
    }

    fn expand_lazy(
        &mut self,
        method: &str,
        prefix: &str,
        module_code: &str,
        node: &LazyNode,
    ) -> Result<(), AppError> {
        match node {
            LazyNode::Leaf(closure_path) => {
                self.add_route(method, prefix, module_code, closure_path)
            }
            LazyNode::Branch(children) => {
                for (segment, child) in children {
                    if segment == "@self" {
                        self.expand_lazy(method, prefix, module_code, child)?;
                        continue;
                    }
                    let nested = if prefix.ends_with('/') {
                        format!("{prefix}{segment}")
                    } else {
                        format!("{prefix}/{segment}")
                    };
                    self.expand_lazy(method, &nested, module_code, child)?;
                }
                Ok(())
            }
        }
    }

    fn add_binding(
        &mut self,
        method: &str,
        pattern_src: &str,
        module_code: &str,
        closure_path: &str,
        kind: RouteKind,
        shadow_target: Option<ShadowTarget>,
    ) -> Result<(), AppError> {
        if self.frozen {
            return Err(AppError::RouteConflict(format!(
                "route table is frozen, cannot register {method} {pattern_src}"
            )));
        }
        let key = (method.to_string(), pattern_src.to_string());
        if !self.registered.insert(key) {
            return Err(AppError::RouteConflict(format!(
                "duplicate route: {method} {pattern_src}"
            )));
        }
        let pattern = Pattern::compile(pattern_src)?;
        let arg_names = pattern.arg_names().to_vec();
        self.routes.push(RouteBinding {
            pattern,
            method: method.to_string(),
            module_code: module_code.to_string(),
            closure_path: closure_path.to_string(),
            kind,
            shadow_target,
        });
        let _ = arg_names;
        Ok(())
    }

    /// Re-sort routes by specificity: literal-only patterns first, then by
    /// descending literal-prefix length, with exact-method routes preferred
    /// over `*` for an otherwise-tied pattern, and ties broken by
    /// registration order (a stable sort preserves it).
    fn resort(&mut self) {
        self.routes.sort_by(|a, b| {
            a.pattern
                .has_tokens()
                .cmp(&b.pattern.has_tokens())
                .then(b.pattern.literal_prefix_len().cmp(&a.pattern.literal_prefix_len()))
                .then(a.is_wildcard_method().cmp(&b.is_wildcard_method()))
        });
    }

    /// Find the first matching binding for `(method, path)`, without
    /// resolving shadow routes. Use [`RouteTable::dispatch`] for the full
    /// shadow-aware lookup.
    pub fn find(&self, method: &Method, path: &str) -> Option<Matched<'_>> {
        for binding in &self.routes {
            if !binding.method_matches(method) {
                continue;
            }
            if let Some(caps) = binding.pattern.matches(path) {
                return Some(Matched {
                    binding,
                    args: caps.into_iter().map(str::to_string).collect(),
                });
            }
        }
        None
    }

    /// Resolve `(method, path)` to its terminal (non-shadow) binding,
    /// following shadow chains and detecting cycles via a per-request
    /// visited set of `(module, closure_path)`. The arguments captured by
    /// the original (alias) match are preserved through the chain — a
    /// shadow hop rebinds which handler runs, not what was captured from
    /// the request path.
    pub fn dispatch(&self, method: &Method, path: &str) -> Result<Matched<'_>, AppError> {
        let mut visited: HashSet<(String, String)> = HashSet::new();
        let mut current_path = path.to_string();
        let mut original_args: Option<Vec<String>> = None;

        loop {
            let matched = self
                .find(method, &current_path)
                .ok_or_else(|| AppError::RouteNotFound(format!("{method} {path}")))?;
            let args = original_args.get_or_insert_with(|| matched.args.clone()).clone();

            match &matched.binding.shadow_target {
                None => {
                    return Ok(Matched {
                        binding: matched.binding,
                        args,
                    })
                }
                Some(target) => {
                    let key = (target.target_module.clone(), target.target_closure_path.clone());
                    if !visited.insert(key.clone()) {
                        return Err(AppError::ShadowCycle(format!(
                            "cycle at module={} closure_path={}",
                            key.0, key.1
                        )));
                    }
                    current_path = target.target_closure_path.clone();
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(table: &mut RouteTable, pattern: &str, module: &str, closure: &str) {
        table.add_route("GET", pattern, module, closure).unwrap();
    }

    #[test]
    fn static_route_matches_exactly() {
        let mut table = RouteTable::new();
        get(&mut table, "/hello", "core/demo", "hello.handler");
        table.freeze();
        assert!(table.dispatch(&Method::GET, "/hello").is_ok());
        assert!(table.dispatch(&Method::POST, "/hello").is_err());
    }

    #[test]
    fn pattern_capture_echoes_argument() {
        let mut table = RouteTable::new();
        get(&mut table, "/user/(:d)", "core/demo", "user.show");
        table.freeze();
        let matched = table.dispatch(&Method::GET, "/user/42").unwrap();
        assert_eq!(matched.args, vec!["42".to_string()]);
        assert!(table.dispatch(&Method::GET, "/user/abc").is_err());
    }

    #[test]
    fn literal_route_outranks_token_route_for_same_prefix() {
        let mut table = RouteTable::new();
        get(&mut table, "/user/(:a)", "core/demo", "user.catch_all");
        get(&mut table, "/user/me", "core/demo", "user.me");
        table.freeze();
        let matched = table.dispatch(&Method::GET, "/user/me").unwrap();
        assert_eq!(matched.binding.closure_path, "user.me");
    }

    #[test]
    fn duplicate_registration_conflicts() {
        let mut table = RouteTable::new();
        get(&mut table, "/hello", "core/demo", "a");
        let err = table.add_route("GET", "/hello", "core/demo", "b");
        assert!(err.is_err());
    }

    #[test]
    fn exact_method_wins_over_wildcard_for_same_pattern() {
        let mut table = RouteTable::new();
        table.add_route("*", "/ping", "core/demo", "any").unwrap();
        table.add_route("GET", "/ping", "core/demo", "get_only").unwrap();
        table.freeze();
        let matched = table.dispatch(&Method::GET, "/ping").unwrap();
        assert_eq!(matched.binding.closure_path, "get_only");
        let matched_post = table.dispatch(&Method::POST, "/ping").unwrap();
        assert_eq!(matched_post.binding.closure_path, "any");
    }

    #[test]
    fn shadow_route_rebinds_to_target() {
        let mut table = RouteTable::new();
        table.add_route("GET", "/real", "mod-b", "real.handler").unwrap();
        table
            .add_shadow_route("GET", "/alias", "mod-a", "mod-b", Some("/real"))
            .unwrap();
        table.freeze();
        let matched = table.dispatch(&Method::GET, "/alias").unwrap();
        assert_eq!(matched.binding.closure_path, "real.handler");
    }

    #[test]
    fn shadow_route_preserves_the_alias_patterns_captured_args() {
        let mut table = RouteTable::new();
        table.add_route("GET", "/real", "mod-b", "real.handler").unwrap();
        table
            .add_shadow_route("GET", "/alias/(:d)", "mod-a", "mod-b", Some("/real"))
            .unwrap();
        table.freeze();
        let matched = table.dispatch(&Method::GET, "/alias/42").unwrap();
        assert_eq!(matched.binding.closure_path, "real.handler");
        assert_eq!(matched.args, vec!["42".to_string()]);
    }

    #[test]
    fn shadow_cycle_is_detected() {
        let mut table = RouteTable::new();
        table
            .add_shadow_route("GET", "/a", "mod-a", "mod-b", Some("/b"))
            .unwrap();
        table
            .add_shadow_route("GET", "/b", "mod-b", "mod-a", Some("/a"))
            .unwrap();
        table.freeze();
        assert!(table.dispatch(&Method::GET, "/a").is_err());
    }

    #[test]
    fn lazy_route_expands_under_alias() {
        let mut table = RouteTable::new();
        let mut children = HashMap::new();
        children.insert("list".to_string(), LazyNode::Leaf("posts.list".to_string()));
        children.insert(
            "@self".to_string(),
            LazyNode::Leaf("posts.index".to_string()),
        );
        let tree = LazyNode::Branch(children);
        table
            .add_lazy_route("GET", "/blog/posts", "blog/core", &tree)
            .unwrap();
        table.freeze();
        assert!(table.dispatch(&Method::GET, "/blog/posts/list").is_ok());
        assert!(table.dispatch(&Method::GET, "/blog/posts").is_ok());
    }
}
