//! Sub-configuration structs with service defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Query sent to the metadata service. `[NAMESPACE]` and `[KEYID]` are
/// substituted per request.
pub const DEFAULT_QUERY_TEMPLATE: &str = "jp/[NAMESPACE]?&q=%7B%22select%22:%7B%22VirtualImageParams%22:%7B%22*%22:1%7D,%22ImageAssetRefs%22:%7B%22Height%22:1,%22Width%22:1,%22URI%22:1%7D,%22ImagesWithCaptions%22:%7B%22Image%22:%7B%22VirtualImageParams%22:%7B%22*%22:1%7D,%22ImageAssetRefs%22:%7B%22Height%22:1,%22Width%22:1,%22URI%22:1%7D%7D%7D,%22Images%22:%7B%22VirtualImageParams%22:%7B%22*%22:1%7D,%22ImageAssetRefs%22:%7B%22Height%22:1,%22Width%22:1,%22URI%22:1%7D%7D%7D,%22vars%22:%7B%7D,%22where%22:%7B%22byId%22:%5B%22[KEYID]%22%5D%7D,%22start%22:0,%22rows%22:1,%22omitNumFound%22:true%7D&stage=authoring&filterSchedules=true&dateFormat=UTC";

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the service listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Remote origin the mirror is populated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL prepended to the resource identifier (supports ${ENV_VAR} syntax)
    pub base_url: String,

    /// Query suffix appended to every origin request
    pub quality_hint: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "${PRISM_ORIGIN_URL}".to_string(),
            quality_hint: "?q=.9".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Local mirror of origin assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Directory mirrored assets are written under (supports ${ENV_VAR} syntax)
    pub base_dir: String,

    /// Placeholder asset, relative to `base_dir` and to the origin base URL
    pub placeholder: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_dir: "${PRISM_MIRROR_DIR}".to_string(),
            placeholder: "/default_missing.jpg".to_string(),
        }
    }
}

/// Metadata service used to resolve content-item identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Base URL of the metadata service, with trailing slash (supports ${ENV_VAR} syntax)
    pub base_url: String,

    /// Query appended to `base_url`
    pub query_template: String,

    /// Identifier provider segment this service can resolve
    pub provider: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: "${PRISM_METADATA_URL}".to_string(),
            query_template: DEFAULT_QUERY_TEMPLATE.to_string(),
            provider: "arc".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Key namespacing and expiry for the shared cache store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix for every key this service writes
    pub key_prefix: String,

    /// Lifetime of a fetch lock claim in seconds
    pub lock_ttl_secs: u64,

    /// Lifetime of rendered results (and their format) in seconds
    pub result_ttl_secs: u64,

    /// Lifetime of cached metadata responses in seconds
    pub metadata_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "prism_".to_string(),
            lock_ttl_secs: 5,
            result_ttl_secs: 5 * 60,
            metadata_ttl_secs: 60 * 60,
        }
    }
}

/// Which request directive supplies the target ratio for variant selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioSource {
    /// `rw` / `rh`
    #[default]
    Resize,
    /// `cw` / `ch`
    Crop,
}

/// Variant selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    /// Directive pair fed into aspect-ratio matching
    pub ratio_source: RatioSource,
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum origin body size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            max_image_dimension: 12_000,
        }
    }
}

impl LimitsConfig {
    /// Byte limit derived from `max_file_size_mb`.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Settings after `${ENV_VAR}` resolution, ready to hand to components.
#[derive(Debug, Clone)]
pub struct ResolvedEndpoints {
    pub origin_url: String,
    pub metadata_url: String,
    pub mirror_dir: PathBuf,
}
