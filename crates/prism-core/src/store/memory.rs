//! In-process cache store.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use super::CacheStore;
use crate::error::StoreError;

struct Slot {
    value: Bytes,
    expires_at: Instant,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// [`CacheStore`] backed by a concurrent map with per-entry expiry.
///
/// Expired entries are invisible to reads and are replaced by the next
/// write or claim on the same key.
#[derive(Default)]
pub struct MemoryStore {
    slots: DashMap<String, Slot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.slots.iter().filter(|slot| slot.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.slots.retain(|_, slot| slot.is_live(now));
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let now = Instant::now();
        Ok(self
            .slots
            .get(key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.value.clone()))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        self.slots.insert(
            key.to_string(),
            Slot {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let slot = Slot {
            value: Bytes::from_static(b"true"),
            expires_at: now + ttl,
        };
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut held) => {
                if held.get().is_live(now) {
                    Ok(false)
                } else {
                    held.insert(slot);
                    Ok(true)
                }
            }
            Entry::Vacant(free) => {
                free.insert(slot);
                Ok(true)
            }
        }
    }
}
