//! Render coordination: result cache, variant resolution, fetch, transform.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RatioSource;
use crate::error::RenderError;
use crate::fetch::{FetchCoordinator, LocalAsset};
use crate::pipeline;
use crate::request::{RenderRequest, RequestKind};
use crate::store::{CacheKeys, CacheStore};
use crate::types::Rendered;
use crate::variant::VariantResolver;

/// Serves render requests through the cache tiers.
///
/// A result entry is two keys, payload and format label. It is a hit only
/// when both are present and the label is non-empty. The label is written
/// first and the payload only if that succeeded.
pub struct RenderCoordinator {
    store: Arc<dyn CacheStore>,
    keys: CacheKeys,
    result_ttl: Duration,
    ratio_source: RatioSource,
    fetch: FetchCoordinator,
    resolver: VariantResolver,
}

impl RenderCoordinator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        keys: CacheKeys,
        result_ttl: Duration,
        ratio_source: RatioSource,
        fetch: FetchCoordinator,
        resolver: VariantResolver,
    ) -> Self {
        Self {
            store,
            keys,
            result_ttl,
            ratio_source,
            fetch,
            resolver,
        }
    }

    /// Render one request.
    pub async fn render(&self, request: &RenderRequest) -> Result<Rendered, RenderError> {
        let trace = &request.trace;

        if request.force_refresh {
            trace.note("cache: refresh requested, bypassing result cache");
        } else if let Some(hit) = self.cached(&request.path).await {
            trace.note(format!("cache: hit {} ({})", request.path, hit.format));
            return Ok(hit);
        }

        let mut options = request.options.clone();
        let asset = match request.kind {
            RequestKind::Direct => {
                self.fetch
                    .ensure_local(&request.identifier, request.force_refresh, trace)
                    .await?
            }
            RequestKind::Identifier => {
                let (width, height) = match self.ratio_source {
                    RatioSource::Resize => (options.resize_width, options.resize_height),
                    RatioSource::Crop => (options.crop.width, options.crop.height),
                };
                let variant = self
                    .resolver
                    .resolve(
                        &request.identifier,
                        width,
                        height,
                        request.force_refresh,
                        trace,
                    )
                    .await;
                match variant {
                    Some(variant) => {
                        if variant.crop.is_active() {
                            options.override_crop(variant.crop);
                        }
                        self.fetch
                            .ensure_local(&variant.uri, request.force_refresh, trace)
                            .await?
                    }
                    None => {
                        trace.note("variant: no match, serving placeholder");
                        self.fetch.placeholder(request.force_refresh, trace).await?
                    }
                }
            }
        };

        let LocalAsset {
            canvas,
            placeholder,
        } = asset;
        let accept = request.accept.clone();
        let task_trace = trace.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            pipeline::transform(canvas, &options, accept.as_deref(), &task_trace)
        })
        .await
        .map_err(|e| RenderError::Worker(format!("transform task: {e}")))??;

        let rendered = Rendered {
            bytes: Bytes::from(encoded.bytes),
            format: encoded.format.label().to_string(),
            placeholder,
            cached: false,
        };

        if placeholder {
            trace.note("cache: placeholder result not cached");
        } else {
            self.store_result(&request.path, &rendered).await;
            trace.note(format!("cache: stored {}", request.path));
        }

        Ok(rendered)
    }

    async fn cached(&self, path: &str) -> Option<Rendered> {
        let format = self.read(&self.keys.format(path)).await?;
        let format = String::from_utf8(format.to_vec()).ok()?;
        if format.is_empty() {
            return None;
        }
        let bytes = self.read(&self.keys.result(path)).await?;
        Some(Rendered {
            bytes,
            format,
            placeholder: false,
            cached: true,
        })
    }

    async fn read(&self, key: &str) -> Option<Bytes> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, "Result cache read failed: {e}");
                None
            }
        }
    }

    async fn store_result(&self, path: &str, rendered: &Rendered) {
        let format_key = self.keys.format(path);
        let format = Bytes::from(rendered.format.clone());
        if let Err(e) = self.store.set(&format_key, format, self.result_ttl).await {
            tracing::warn!(key = %format_key, "Cannot cache result format: {e}");
            return;
        }
        let result_key = self.keys.result(path);
        if let Err(e) = self
            .store
            .set(&result_key, rendered.bytes.clone(), self.result_ttl)
            .await
        {
            tracing::warn!(key = %result_key, "Cannot cache result: {e}");
        }
    }
}
