//! Prism Core - on-demand image transformation library.
//!
//! Prism renders images addressed by a request path: either directly by an
//! origin asset identifier (`/uri/`) or by a content-item identifier that is
//! resolved to the best-fitting variant through a metadata service (`/oid/`).
//!
//! # Architecture
//!
//! ```text
//! Request → Result cache → Variant resolver → Mirror / locked origin fetch
//!         → Decode → Crop → Resize → Normalize → Encode → Result cache
//! ```
//!
//! Every tier that can fail transiently degrades to a placeholder image or a
//! cache miss. Only a broken mirror or an unobtainable placeholder fails a
//! request.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism_core::{Config, Prism, RenderRequest, Trace};
//!
//! #[tokio::main]
//! async fn main() -> prism_core::Result<()> {
//!     let prism = Prism::with_memory_store(Config::load()?)?;
//!     let request = RenderRequest::from_path("/uri/rw=480/mgid:file:/a.jpg", Trace::discard())?;
//!     let rendered = prism.render(&request).await?;
//!     println!("{} bytes of {}", rendered.bytes.len(), rendered.content_type());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod directive;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod pipeline;
pub mod render;
pub mod request;
pub mod store;
pub mod trace;
pub mod types;
pub mod variant;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PrismError, RenderError, RenderResult, Result};
pub use request::{RenderRequest, RequestKind};
pub use store::{CacheStore, MemoryStore};
pub use trace::Trace;
pub use types::{RenderOptions, Rendered};

use std::sync::Arc;
use std::time::Duration;

use fetch::{FetchCoordinator, Mirror, OriginFetcher};
use metadata::MetadataClient;
use pipeline::{CanvasDecoder, Validator};
use render::RenderCoordinator;
use store::CacheKeys;
use variant::VariantResolver;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prism service - the main entry point for rendering.
///
/// Built once from a [`Config`] and a cache store, then shared by every
/// request handler.
pub struct Prism {
    coordinator: RenderCoordinator,
}

impl Prism {
    /// Create a new Prism instance backed by `store`.
    ///
    /// Resolves `${ENV_VAR}` references in the endpoint settings; fails if
    /// any is unset.
    pub fn new(config: Config, store: Arc<dyn CacheStore>) -> Result<Self> {
        config.validate()?;
        let endpoints = config.resolve_endpoints()?;
        tracing::debug!(
            origin = %endpoints.origin_url,
            metadata = %endpoints.metadata_url,
            mirror = %endpoints.mirror_dir.display(),
            "Initializing Prism v{}",
            VERSION
        );

        let keys = CacheKeys::new(config.cache.key_prefix.clone());

        let fetch = FetchCoordinator::new(
            Mirror::new(endpoints.mirror_dir),
            OriginFetcher::new(
                &endpoints.origin_url,
                &config.origin.quality_hint,
                Duration::from_millis(config.origin.timeout_ms),
                Validator::new(config.limits.clone()),
            ),
            CanvasDecoder::new(config.limits.clone()),
            store.clone(),
            keys.clone(),
            config.lock_ttl(),
            &config.mirror.placeholder,
        );

        let resolver = VariantResolver::new(
            MetadataClient::new(
                &endpoints.metadata_url,
                &config.metadata.query_template,
                Duration::from_millis(config.metadata.timeout_ms),
                store.clone(),
                keys.clone(),
                config.metadata_ttl(),
            ),
            &config.metadata.provider,
        );

        let coordinator = RenderCoordinator::new(
            store,
            keys,
            config.result_ttl(),
            config.variant.ratio_source,
            fetch,
            resolver,
        );

        Ok(Self { coordinator })
    }

    /// Create a new Prism instance with an in-process cache store.
    pub fn with_memory_store(config: Config) -> Result<Self> {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    /// Render one parsed request.
    pub async fn render(&self, request: &RenderRequest) -> RenderResult<Rendered> {
        self.coordinator.render(request).await
    }
}
