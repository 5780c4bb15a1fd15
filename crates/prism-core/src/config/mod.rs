//! Configuration management for Prism.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Endpoint strings may reference environment variables with
//! `${VAR}` syntax; they are resolved once, when the service is built.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure for Prism.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Remote origin settings
    pub origin: OriginConfig,

    /// Local mirror settings
    pub mirror: MirrorConfig,

    /// Metadata service settings
    pub metadata: MetadataConfig,

    /// Cache store key and expiry settings
    pub cache: CacheConfig,

    /// Variant selection settings
    pub variant: VariantConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.prism.prism/config.toml
    /// - Linux: ~/.config/prism/config.toml
    ///
    /// Falls back to ~/.prism/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "prism", "prism")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".prism").join("config.toml")
            })
    }

    /// Resolve `${ENV_VAR}` references in the endpoint settings.
    pub fn resolve_endpoints(&self) -> Result<ResolvedEndpoints, ConfigError> {
        let origin_url = resolve_env_var(&self.origin.base_url).ok_or(ConfigError::MissingValue {
            field: "origin.base_url",
        })?;
        let metadata_url =
            resolve_env_var(&self.metadata.base_url).ok_or(ConfigError::MissingValue {
                field: "metadata.base_url",
            })?;
        let mirror_dir = resolve_env_var(&self.mirror.base_dir).ok_or(ConfigError::MissingValue {
            field: "mirror.base_dir",
        })?;
        let mirror_dir = PathBuf::from(shellexpand::tilde(&mirror_dir).into_owned());

        Ok(ResolvedEndpoints {
            origin_url,
            metadata_url,
            mirror_dir,
        })
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.lock_ttl_secs)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.result_ttl_secs)
    }

    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.metadata_ttl_secs)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Returns `None` for empty values and for references to unset or empty
/// variables.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
