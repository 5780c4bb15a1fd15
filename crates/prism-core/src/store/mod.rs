//! Shared key-value cache store.
//!
//! One store backs four tiers, separated by key namespace:
//! - `lock_`: fetch lock claims, keyed by mirror path
//! - `cache_`: rendered result bytes, keyed by request path
//! - `cache_format_`: the format label of a rendered result
//! - `cache_object_`: raw metadata responses, keyed by query URL

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::StoreError;

/// A TTL-capable key-value store shared by every worker.
///
/// Uses `async_trait` because the store is held as `Arc<dyn CacheStore>`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a live value.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Write a value that expires after `ttl`.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError>;

    /// Set `key` only if no live value exists.
    ///
    /// Returns `true` when this caller now owns the key. Ownership lapses
    /// after `ttl`; there is no release.
    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;
}

/// Builds namespaced store keys.
#[derive(Debug, Clone)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn lock(&self, mirror_path: &str) -> String {
        format!("{}lock_{mirror_path}", self.prefix)
    }

    pub fn result(&self, request_path: &str) -> String {
        format!("{}cache_{request_path}", self.prefix)
    }

    pub fn format(&self, request_path: &str) -> String {
        format!("{}cache_format_{request_path}", self.prefix)
    }

    pub fn object(&self, query_url: &str) -> String {
        format!("{}cache_object_{query_url}", self.prefix)
    }
}
