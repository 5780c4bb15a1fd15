//! Origin fetch coordination.
//!
//! Resolves a resource to a decoded image through three tiers: the local
//! mirror, an origin fetch guarded by a best-effort lock, and the
//! placeholder asset.
//!
//! The lock is a claim in the shared cache store with a short TTL. It only
//! keeps concurrent misses from stampeding the origin; a worker that loses
//! the claim never waits or retries and serves the placeholder instead.
//! Claims are never released early and expiry during a slow fetch is
//! tolerated.

mod mirror;
mod origin;

pub use mirror::Mirror;
pub use origin::OriginFetcher;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::RenderError;
use crate::pipeline::{Canvas, CanvasDecoder};
use crate::store::{CacheKeys, CacheStore};
use crate::trace::Trace;

/// A decoded image and where it came from.
#[derive(Debug)]
pub struct LocalAsset {
    pub canvas: Canvas,
    /// Set when the placeholder stands in for the requested resource
    pub placeholder: bool,
}

/// Coordinates mirror reads, locked origin fetches, and placeholder fallback.
pub struct FetchCoordinator {
    mirror: Mirror,
    origin: OriginFetcher,
    decoder: CanvasDecoder,
    store: Arc<dyn CacheStore>,
    keys: CacheKeys,
    lock_ttl: Duration,
    placeholder: String,
}

impl FetchCoordinator {
    pub fn new(
        mirror: Mirror,
        origin: OriginFetcher,
        decoder: CanvasDecoder,
        store: Arc<dyn CacheStore>,
        keys: CacheKeys,
        lock_ttl: Duration,
        placeholder: &str,
    ) -> Self {
        Self {
            mirror,
            origin,
            decoder,
            store,
            keys,
            lock_ttl,
            placeholder: placeholder.to_string(),
        }
    }

    /// Make `resource` available locally and decode it.
    ///
    /// `refresh` deletes the mirror first and bypasses the lock. Transient
    /// origin failures and lost lock claims resolve to the placeholder. The
    /// only errors are a failed mirror write after a successful fetch and an
    /// unobtainable placeholder.
    pub async fn ensure_local(
        &self,
        resource: &str,
        refresh: bool,
        trace: &Trace,
    ) -> Result<LocalAsset, RenderError> {
        let Some(path) = self.mirror.path_for(resource) else {
            tracing::warn!(resource = %resource, "Resource does not map to a mirror path");
            trace.note(format!("fetch: {resource} has no valid mirror path"));
            return self.placeholder(refresh, trace).await;
        };

        if refresh {
            self.mirror.remove(&path).await;
            trace.note(format!("fetch: refresh removed {}", path.display()));
        }

        if let Some(canvas) = self.load_mirror(&path, trace).await {
            return Ok(LocalAsset {
                canvas,
                placeholder: false,
            });
        }

        if !refresh && !self.claim(&path, trace).await {
            trace.note(format!("fetch: lock held for {}, serving placeholder", path.display()));
            return self.placeholder(refresh, trace).await;
        }

        let body = match self.origin.fetch(resource).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(resource = %resource, "Origin fetch failed: {e}");
                trace.note(format!("fetch: origin failed ({e}), serving placeholder"));
                return self.placeholder(refresh, trace).await;
            }
        };

        self.mirror.write(&path, &body).await?;
        trace.note(format!("fetch: mirrored {} bytes to {}", body.len(), path.display()));

        match self.decoder.decode(body.to_vec(), &path).await {
            Ok(canvas) => Ok(LocalAsset {
                canvas,
                placeholder: false,
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Fetched asset does not decode: {e}");
                trace.note(format!("fetch: decode failed ({e}), serving placeholder"));
                self.mirror.remove(&path).await;
                self.placeholder(refresh, trace).await
            }
        }
    }

    /// Load the placeholder through the same mirror, lock, and fetch tiers.
    ///
    /// `refresh` skips the lock claim, as for the requested asset. Any
    /// failure here is fatal for the request.
    pub async fn placeholder(
        &self,
        refresh: bool,
        trace: &Trace,
    ) -> Result<LocalAsset, RenderError> {
        let unavailable = |path: &Path, reason: String| RenderError::PlaceholderUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let path = self.mirror.path_for(&self.placeholder).ok_or_else(|| {
            unavailable(
                &self.mirror.base_dir().join(&self.placeholder),
                "not a valid mirror path".to_string(),
            )
        })?;

        if let Some(canvas) = self.load_mirror(&path, trace).await {
            trace.note("fetch: placeholder from mirror");
            return Ok(LocalAsset {
                canvas,
                placeholder: true,
            });
        }

        if !refresh && !self.claim(&path, trace).await {
            return Err(unavailable(
                &path,
                "fetch lock held by another worker".to_string(),
            ));
        }

        let body = self
            .origin
            .fetch(&self.placeholder)
            .await
            .map_err(|e| unavailable(&path, e.to_string()))?;
        self.mirror.write(&path, &body).await?;

        let canvas = self
            .decoder
            .decode(body.to_vec(), &path)
            .await
            .map_err(|e| unavailable(&path, e.to_string()))?;
        trace.note("fetch: placeholder from origin");
        Ok(LocalAsset {
            canvas,
            placeholder: true,
        })
    }

    /// Decode a mirrored file. A file that fails to decode is removed.
    async fn load_mirror(&self, path: &Path, trace: &Trace) -> Option<Canvas> {
        let bytes = self.mirror.read(path).await?;
        match self.decoder.decode(bytes, path).await {
            Ok(canvas) => {
                trace.note(format!("fetch: mirror hit {}", path.display()));
                Some(canvas)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Discarding undecodable mirror file: {e}");
                trace.note(format!("fetch: mirror {} corrupt, discarded", path.display()));
                self.mirror.remove(path).await;
                None
            }
        }
    }

    /// Claim the fetch lock. Store failures count as a lost claim.
    async fn claim(&self, path: &Path, trace: &Trace) -> bool {
        let key = self.keys.lock(&path.to_string_lossy());
        match self.store.claim(&key, self.lock_ttl).await {
            Ok(claimed) => {
                trace.note(format!("fetch: lock {key} claimed={claimed}"));
                claimed
            }
            Err(e) => {
                tracing::warn!(key = %key, "Fetch lock claim failed: {e}");
                false
            }
        }
    }
}
