//! Error types for the Prism render service.
//!
//! Only failures that end a request surface as [`RenderError`]. Transient
//! problems with the origin, the metadata service, or the cache store have
//! their own types ([`FetchError`], [`StoreError`]) and are logged and
//! converted into a fallback (placeholder image, cache miss) by the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Prism operations.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A required value is empty or names an unset environment variable
    #[error("Missing configuration value for {field} (set it in the config file or its environment variable)")]
    MissingValue { field: &'static str },
}

/// Errors that terminate a single render request.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The request path carries no content identifier
    #[error("Invalid image request: {0}")]
    InvalidRequest(String),

    /// The placeholder asset could not be read, decoded, or fetched
    #[error("Placeholder image unavailable at {path}: {reason}")]
    PlaceholderUnavailable { path: PathBuf, reason: String },

    /// A fetched origin asset could not be persisted to the local mirror
    #[error("Failed to write mirror file {path}: {source}")]
    MirrorWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Encoding the output format failed
    #[error("Encode error for {format}: {message}")]
    Encode { format: String, message: String },

    /// A blocking image task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl RenderError {
    /// Whether the failure means local storage or default-asset provisioning
    /// is broken, as opposed to a bad request.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RenderError::InvalidRequest(_))
    }
}

/// Transient failures talking to the origin or the metadata service.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body is not acceptable as an image
    #[error("Rejected response from {url}: {reason}")]
    Rejected { url: String, reason: String },
}

/// Cache store failures. Always recoverable: callers treat them as a miss.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached or refused the command
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for Prism results.
pub type Result<T> = std::result::Result<T, PrismError>;

/// Convenience type alias for render results.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
