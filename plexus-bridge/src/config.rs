//! `internal_bridge.*` — the per-distributor bridge settings. `allow` is a
//! variable-length map rather than a fixed key set, so this reads raw
//! `ConfigValue`s directly the same way `plexus_core::config::sections::load_sites`
//! reads the `sites` table, rather than going through `ConfigProperties`.

use plexus_core::config::{ConfigError, ConfigValue, PlexusConfig};

/// Bridge settings for one distributor: whether the bridge endpoint is
/// enabled, the caller allowlist, the shared HMAC secret, and the mounted
/// path (default `/__internal/bridge`).
#[derive(Debug, Clone)]
pub struct InternalBridgeConfig {
    pub enabled: bool,
    pub allow: Vec<String>,
    pub secret: String,
    pub path: String,
}

impl InternalBridgeConfig {
    pub fn from_config(config: &PlexusConfig) -> Result<Self, ConfigError> {
        let enabled = config.get_or("internal_bridge.enabled", false);
        let path = config.get_or("internal_bridge.path", "/__internal/bridge".to_string());

        if !enabled {
            return Ok(Self {
                enabled: false,
                allow: Vec::new(),
                secret: String::new(),
                path,
            });
        }

        let secret: String = config.get("internal_bridge.secret")?;
        let allow = match config.get::<ConfigValue>("internal_bridge.allow") {
            Ok(ConfigValue::Map(entries)) => entries.into_keys().collect(),
            Ok(_) => {
                return Err(ConfigError::TypeMismatch {
                    key: "internal_bridge.allow".into(),
                    expected: "Map",
                })
            }
            Err(ConfigError::NotFound(_)) => Vec::new(),
            Err(err) => return Err(err),
        };

        Ok(Self {
            enabled: true,
            allow,
            secret,
            path,
        })
    }
}
