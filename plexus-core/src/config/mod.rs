mod loader;
pub mod registry;
pub mod sections;
pub mod secrets;
pub mod typed;
pub mod validation;
pub mod value;

use std::collections::HashMap;
use std::ops::Deref;
use std::path::Path;

pub use registry::{register_section, registered_sections, RegisteredSection};
pub use sections::{load_sites, DistributorSettings, SessionConfig};
pub use secrets::{DefaultSecretResolver, SecretResolver};
pub use typed::{ConfigProperties, PropertyMeta};
pub use validation::{validate_keys, validate_section, ConfigValidationError, MissingKeyError};
pub use value::{ConfigValue, FromConfigValue};

/// A single validation error detail from typed config validation.
#[derive(Debug, Clone)]
pub struct ConfigValidationDetail {
    pub key: String,
    pub message: String,
}

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// Validation errors from typed config.
    Validation(Vec<ConfigValidationDetail>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Validation(details) => {
                write!(f, "Config validation errors:")?;
                for detail in details {
                    write!(f, "\n  - {}: {}", detail.key, detail.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration loaded from a YAML file and environment variables.
///
/// `PlexusConfig` (= `PlexusConfig<()>`) provides raw key-value access only.
/// `PlexusConfig<T>` adds typed access to a validated config struct via
/// `Deref<Target = T>`. This backs the config shapes spec.md §6 describes —
/// distributor config, sites config, session config — each is just a
/// different `T`.
///
/// Resolution order (lowest to highest priority):
/// 1. `{name}.yaml` (base)
/// 2. `.env` file (loaded into process environment, never overwriting)
/// 3. Environment variables (e.g. `DIST_CODE` overrides `dist.code`)
#[derive(Debug, Clone)]
pub struct PlexusConfig<T = ()> {
    values: HashMap<String, ConfigValue>,
    source_name: String,
    typed: T,
}

impl PlexusConfig {
    /// Load configuration from a named YAML file plus environment overlay.
    pub fn load_with_resolver(
        name: &str,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();

        loader::load_yaml_file(Path::new(&format!("{name}.yaml")), &mut values)?;
        let _ = dotenvy::dotenv();
        resolve_string_values(&mut values, resolver)?;

        for (env_key, env_val) in std::env::vars() {
            let config_key = env_key.to_lowercase().replace('_', ".");
            values.insert(config_key, ConfigValue::String(env_val));
        }

        Ok(PlexusConfig {
            values,
            source_name: name.to_string(),
            typed: (),
        })
    }

    /// Load configuration for the given name (default resolver: env + file).
    pub fn load(name: &str) -> Result<Self, ConfigError> {
        Self::load_with_resolver(name, &DefaultSecretResolver)
    }

    /// Create a config from a YAML string (useful for testing and embedded defaults).
    pub fn from_yaml_str(yaml: &str, source_name: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(PlexusConfig {
            values,
            source_name: source_name.to_string(),
            typed: (),
        })
    }

    /// Create an empty config (useful for testing).
    pub fn empty() -> Self {
        PlexusConfig {
            values: HashMap::new(),
            source_name: "test".to_string(),
            typed: (),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Upgrade to a typed config by constructing `T` from the raw values.
    pub fn with_typed<C: ConfigProperties>(self) -> Result<PlexusConfig<C>, ConfigError> {
        let typed = C::from_config(&self)?;
        Ok(PlexusConfig {
            values: self.values,
            source_name: self.source_name,
            typed,
        })
    }
}

impl<T> PlexusConfig<T> {
    /// Get a typed value for the given dot-separated key (raw access).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the key does not exist, or
    /// `ConfigError::TypeMismatch` if the value cannot be converted.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, returning a default if the key is missing.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Check whether a key exists in the config.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The name this config was loaded from (file stem or test label).
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Get a reference to the typed config layer.
    pub fn typed(&self) -> &T {
        &self.typed
    }

    /// Downgrade to a raw (untyped) config, discarding the typed layer.
    pub fn raw(&self) -> PlexusConfig {
        PlexusConfig {
            values: self.values.clone(),
            source_name: self.source_name.clone(),
            typed: (),
        }
    }
}

impl<T> Deref for PlexusConfig<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.typed
    }
}

/// Resolve `${...}` placeholders in all string values of the config map.
fn resolve_string_values(
    values: &mut HashMap<String, ConfigValue>,
    resolver: &dyn SecretResolver,
) -> Result<(), ConfigError> {
    let keys: Vec<String> = values.keys().cloned().collect();
    for key in keys {
        if let Some(ConfigValue::String(s)) = values.get(&key) {
            if s.contains("${") {
                let resolved = secrets::resolve_placeholders(s, resolver)?;
                values.insert(key, ConfigValue::String(resolved));
            }
        }
    }
    Ok(())
}
