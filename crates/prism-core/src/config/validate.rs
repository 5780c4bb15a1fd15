//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.key_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "cache.key_prefix must not be empty".into(),
            ));
        }
        if self.cache.lock_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.lock_ttl_secs must be > 0".into(),
            ));
        }
        if self.cache.result_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.result_ttl_secs must be > 0".into(),
            ));
        }
        if self.cache.metadata_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.metadata_ttl_secs must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.origin.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "origin.timeout_ms must be > 0".into(),
            ));
        }
        if self.metadata.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "metadata.timeout_ms must be > 0".into(),
            ));
        }
        if self.mirror.placeholder.trim_matches('/').is_empty() {
            return Err(ConfigError::ValidationError(
                "mirror.placeholder must name a file".into(),
            ));
        }
        if !self.metadata.query_template.contains("[NAMESPACE]")
            || !self.metadata.query_template.contains("[KEYID]")
        {
            return Err(ConfigError::ValidationError(
                "metadata.query_template must contain [NAMESPACE] and [KEYID]".into(),
            ));
        }
        Ok(())
    }
}
