//! Host/site resolution and bridge caller allowlists.

use std::collections::HashMap;

use crate::error::AppError;
use crate::ids::DistributorId;

/// A single configured site: the host it answers on, the distributor that
/// owns it, and the module mounted at its root.
#[derive(Debug, Clone)]
pub struct Site {
    pub host: String,
    pub distributor: DistributorId,
    pub root_module: String,
}

/// Resolves an inbound `Host` header to the distributor and module that
/// should handle the request. Lookup is exact-match on the host string;
/// wildcard host matching is not supported.
#[derive(Default)]
pub struct SiteResolver {
    sites: HashMap<String, Site>,
}

impl SiteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_site(&mut self, site: Site) -> Result<(), AppError> {
        if self.sites.contains_key(&site.host) {
            return Err(AppError::RouteConflict(format!(
                "duplicate site binding for host '{}'",
                site.host
            )));
        }
        self.sites.insert(site.host.clone(), site);
        Ok(())
    }

    pub fn resolve(&self, host: &str) -> Result<&Site, AppError> {
        self.sites
            .get(host)
            .ok_or_else(|| AppError::RouteNotFound(format!("no site configured for host '{host}'")))
    }
}

/// Per-module bridge caller allowlist: entries are either an exact
/// `DistributorId` or a `code@*` wildcard, matched via
/// [`DistributorId::matches_allow_entry`].
#[derive(Debug, Clone, Default)]
pub struct BridgeAccessControl {
    allowed: Vec<String>,
}

impl BridgeAccessControl {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    /// An empty allowlist denies every caller — access must be granted
    /// explicitly, never implicitly.
    pub fn permits(&self, caller: &DistributorId) -> bool {
        self.allowed
            .iter()
            .any(|entry| caller.matches_allow_entry(entry))
    }

    pub fn check(&self, caller: &DistributorId) -> Result<(), AppError> {
        if self.permits(caller) {
            Ok(())
        } else {
            Err(AppError::AccessDenied(format!(
                "distributor '{caller}' is not in the bridge allowlist"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_returns_configured_site() {
        let mut resolver = SiteResolver::new();
        resolver
            .add_site(Site {
                host: "shop.example.com".into(),
                distributor: DistributorId::new("acme", "default"),
                root_module: "acme/storefront".into(),
            })
            .unwrap();
        let site = resolver.resolve("shop.example.com").unwrap();
        assert_eq!(site.root_module, "acme/storefront");
    }

    #[test]
    fn resolve_unknown_host_is_not_found() {
        let resolver = SiteResolver::new();
        assert!(resolver.resolve("unknown.example.com").is_err());
    }

    #[test]
    fn duplicate_host_binding_conflicts() {
        let mut resolver = SiteResolver::new();
        let site = Site {
            host: "shop.example.com".into(),
            distributor: DistributorId::new("acme", "default"),
            root_module: "acme/storefront".into(),
        };
        resolver.add_site(site.clone()).unwrap();
        assert!(resolver.add_site(site).is_err());
    }

    #[test]
    fn empty_allowlist_denies_everyone() {
        let acl = BridgeAccessControl::new(vec![]);
        assert!(!acl.permits(&DistributorId::new("acme", "default")));
    }

    #[test]
    fn wildcard_entry_permits_any_tag_for_that_code() {
        let acl = BridgeAccessControl::new(vec!["acme@*".into()]);
        assert!(acl.permits(&DistributorId::new("acme", "staging")));
        assert!(!acl.permits(&DistributorId::new("other", "staging")));
    }

    #[test]
    fn exact_entry_requires_both_code_and_tag() {
        let acl = BridgeAccessControl::new(vec!["acme@prod".into()]);
        assert!(acl.check(&DistributorId::new("acme", "prod")).is_ok());
        assert!(acl.check(&DistributorId::new("acme", "staging")).is_err());
    }
}
