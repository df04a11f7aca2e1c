//! Typed configuration sections for the core configuration shapes:
//! distributor identity, session policy, and the sites table.

use super::{ConfigError, ConfigProperties, ConfigValue, PlexusConfig, PropertyMeta};
use crate::access::Site;
use crate::ids::DistributorId;

/// `dist.*` — identity of the distributor this process is running as.
#[derive(Debug, Clone)]
pub struct DistributorSettings {
    pub code: String,
    pub tag: String,
    pub module_root: String,
}

impl ConfigProperties for DistributorSettings {
    fn prefix() -> &'static str {
        "dist"
    }

    fn properties_metadata() -> Vec<PropertyMeta> {
        vec![
            PropertyMeta {
                key: "code".into(),
                full_key: "dist.code".into(),
                type_name: "String",
                required: true,
                default_value: None,
                description: Some("The distributor's code, e.g. \"acme\".".into()),
            },
            PropertyMeta {
                key: "tag".into(),
                full_key: "dist.tag".into(),
                type_name: "String",
                required: false,
                default_value: Some(DistributorId::DEFAULT_TAG.into()),
                description: Some("Runtime variant of the distributor, e.g. \"staging\".".into()),
            },
            PropertyMeta {
                key: "module_root".into(),
                full_key: "dist.module_root".into(),
                type_name: "String",
                required: true,
                default_value: None,
                description: Some("Filesystem directory modules are loaded from.".into()),
            },
        ]
    }

    fn from_config(config: &PlexusConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            code: config.get("dist.code")?,
            tag: config.get_or("dist.tag", DistributorId::DEFAULT_TAG.to_string()),
            module_root: config.get("dist.module_root")?,
        })
    }
}

impl DistributorSettings {
    pub fn id(&self) -> DistributorId {
        DistributorId::new(self.code.clone(), self.tag.clone())
    }
}

/// `session.*` — the session driver and its policy knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub driver: String,
    pub cookie_name: String,
    pub gc_probability: i64,
    pub gc_divisor: i64,
    pub max_lifetime_seconds: i64,
}

impl ConfigProperties for SessionConfig {
    fn prefix() -> &'static str {
        "session"
    }

    fn properties_metadata() -> Vec<PropertyMeta> {
        vec![
            PropertyMeta {
                key: "driver".into(),
                full_key: "session.driver".into(),
                type_name: "String",
                required: false,
                default_value: Some("memory".into()),
                description: Some("One of \"memory\", \"file\", \"database\", \"null\".".into()),
            },
            PropertyMeta {
                key: "cookie_name".into(),
                full_key: "session.cookie_name".into(),
                type_name: "String",
                required: false,
                default_value: Some("plexus_session".into()),
                description: None,
            },
            PropertyMeta {
                key: "gc_probability".into(),
                full_key: "session.gc_probability".into(),
                type_name: "i64",
                required: false,
                default_value: Some("1".into()),
                description: None,
            },
            PropertyMeta {
                key: "gc_divisor".into(),
                full_key: "session.gc_divisor".into(),
                type_name: "i64",
                required: false,
                default_value: Some("100".into()),
                description: None,
            },
            PropertyMeta {
                key: "max_lifetime_seconds".into(),
                full_key: "session.max_lifetime_seconds".into(),
                type_name: "i64",
                required: false,
                default_value: Some("86400".into()),
                description: None,
            },
        ]
    }

    fn from_config(config: &PlexusConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            driver: config.get_or("session.driver", "memory".to_string()),
            cookie_name: config.get_or("session.cookie_name", "plexus_session".to_string()),
            gc_probability: config.get_or("session.gc_probability", 1),
            gc_divisor: config.get_or("session.gc_divisor", 100),
            max_lifetime_seconds: config.get_or("session.max_lifetime_seconds", 86_400),
        })
    }
}

impl From<&SessionConfig> for crate::session::GcPolicy {
    fn from(cfg: &SessionConfig) -> Self {
        crate::session::GcPolicy {
            probability: cfg.gc_probability.max(0) as u32,
            divisor: cfg.gc_divisor.max(1) as u32,
            max_lifetime_seconds: cfg.max_lifetime_seconds.max(0) as u64,
        }
    }
}

/// Parse the `sites` list (a sequence of maps with `host`, `distributor`
/// and `root_module` keys) out of raw config. Unlike `DistributorSettings`
/// and `SessionConfig`, this isn't a fixed-key section — it's a variable
/// length table — so it's read directly rather than through
/// `ConfigProperties`.
pub fn load_sites(config: &PlexusConfig) -> Result<Vec<Site>, ConfigError> {
    let raw: ConfigValue = match config.get("sites") {
        Ok(v) => v,
        Err(ConfigError::NotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let ConfigValue::List(entries) = raw else {
        return Err(ConfigError::TypeMismatch {
            key: "sites".into(),
            expected: "List",
        });
    };
    let mut sites = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let ConfigValue::Map(fields) = entry else {
            return Err(ConfigError::TypeMismatch {
                key: format!("sites[{i}]"),
                expected: "Map",
            });
        };
        let host = string_field(&fields, "host", i)?;
        let distributor_raw = string_field(&fields, "distributor", i)?;
        let root_module = string_field(&fields, "root_module", i)?;
        sites.push(Site {
            host,
            distributor: DistributorId::parse(&distributor_raw),
            root_module,
        });
    }
    Ok(sites)
}

fn string_field(
    fields: &std::collections::HashMap<String, ConfigValue>,
    key: &str,
    index: usize,
) -> Result<String, ConfigError> {
    match fields.get(key) {
        Some(ConfigValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(ConfigError::TypeMismatch {
            key: format!("sites[{index}].{key}"),
            expected: "String",
        }),
        None => Err(ConfigError::NotFound(format!("sites[{index}].{key}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distributor_settings_loads_required_and_defaulted_fields() {
        let config = PlexusConfig::from_yaml_str(
            "dist:\n  code: acme\n  module_root: /opt/modules\n",
            "test",
        )
        .unwrap();
        let settings = DistributorSettings::from_config(&config).unwrap();
        assert_eq!(settings.code, "acme");
        assert_eq!(settings.tag, "default");
        assert_eq!(settings.module_root, "/opt/modules");
    }

    #[test]
    fn session_config_uses_defaults_when_absent() {
        let config = PlexusConfig::empty();
        let session = SessionConfig::from_config(&config).unwrap();
        assert_eq!(session.driver, "memory");
        assert_eq!(session.gc_probability, 1);
        assert_eq!(session.gc_divisor, 100);
    }

    #[test]
    fn load_sites_parses_the_table() {
        let config = PlexusConfig::from_yaml_str(
            "sites:\n  - host: shop.example.com\n    distributor: acme@prod\n    root_module: acme/storefront\n",
            "test",
        )
        .unwrap();
        let sites = load_sites(&config).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].host, "shop.example.com");
        assert_eq!(sites[0].distributor, DistributorId::new("acme", "prod"));
    }

    #[test]
    fn load_sites_is_empty_when_key_missing() {
        let config = PlexusConfig::empty();
        assert!(load_sites(&config).unwrap().is_empty());
    }
}
