//! Metadata service client.
//!
//! Looks up a content item by namespace and id with a fixed query. Raw
//! responses are cached in the shared store, keyed by the full query URL.

pub mod descriptor;

pub use descriptor::candidates;

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::store::{CacheKeys, CacheStore};
use crate::trace::Trace;
use descriptor::Envelope;

/// Fetches content-item descriptors from the metadata service.
pub struct MetadataClient {
    base_url: String,
    query_template: String,
    timeout: Duration,
    store: Arc<dyn CacheStore>,
    keys: CacheKeys,
    ttl: Duration,
    client: reqwest::Client,
}

impl MetadataClient {
    pub fn new(
        base_url: &str,
        query_template: &str,
        timeout: Duration,
        store: Arc<dyn CacheStore>,
        keys: CacheKeys,
        ttl: Duration,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            query_template: query_template.trim_start_matches('/').to_string(),
            timeout,
            store,
            keys,
            ttl,
            client: reqwest::Client::new(),
        }
    }

    /// Query URL with the namespace and id substituted.
    pub fn query_url(&self, id: &str, namespace: &str) -> String {
        let query = self
            .query_template
            .replacen("[NAMESPACE]", namespace, 1)
            .replacen("[KEYID]", id, 1);
        format!("{}/{query}", self.base_url)
    }

    /// Fetch the single document describing `id`.
    ///
    /// Returns `None` when the service is unreachable, the response does not
    /// parse, or the document list does not hold exactly one entry. Fetched
    /// bodies are cached whether or not they parse; failures are not cached.
    pub async fn fetch_descriptor(
        &self,
        id: &str,
        namespace: &str,
        refresh: bool,
        trace: &Trace,
    ) -> Option<serde_json::Value> {
        let url = self.query_url(id, namespace);
        let key = self.keys.object(&url);

        let cached = if refresh {
            None
        } else {
            self.cached(&key).await
        };

        let body = match cached {
            Some(body) => {
                trace.note(format!("metadata: cache hit for {namespace}/{id}"));
                body
            }
            None => {
                let body = match self.get(&url).await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::warn!(id = %id, "Metadata fetch failed: {e}");
                        trace.note(format!("metadata: fetch failed ({e})"));
                        return None;
                    }
                };
                trace.note(format!("metadata: fetched {} bytes from {url}", body.len()));
                if let Err(e) = self.store.set(&key, body.clone(), self.ttl).await {
                    tracing::warn!(key = %key, "Cannot cache metadata response: {e}");
                }
                body
            }
        };

        let envelope: Envelope = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(id = %id, "Cannot parse metadata response: {e}");
                trace.note(format!("metadata: unparseable response ({e})"));
                return None;
            }
        };

        let mut docs = envelope.response.docs;
        if docs.len() != 1 {
            tracing::warn!(id = %id, docs = docs.len(), "Expected exactly one metadata document");
            trace.note(format!("metadata: {} documents for {id}", docs.len()));
            return None;
        }
        docs.pop()
    }

    async fn cached(&self, key: &str) -> Option<Bytes> {
        match self.store.get(key).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(key = %key, "Metadata cache read failed: {e}");
                None
            }
        }
    }

    async fn get(&self, url: &str) -> Result<Bytes, FetchError> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.bytes().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }
}
