//! Store implementation
//!
//! `LruCache` behind a single mutex, with size validation and counters.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::error::{KvError, Result};
use super::stats::Counters;
use super::{Lookup, StoreStats, MAX_KEY_LEN, MAX_VALUE_LEN};

/// Bounded key-value store with LRU eviction
///
/// ## Concurrency Model
///
/// Every operation, reads included, takes the one `map` lock: a GET hit
/// moves its key to the most-recently-used position. The guard never
/// escapes a method, so no caller can hold it across socket I/O.
///
/// Shared between connections as `Arc<Store>`.
pub struct Store {
    /// Entries ordered by recency (front = most recently used)
    map: Mutex<LruCache<Vec<u8>, Vec<u8>>>,

    /// Maximum entry count
    capacity: NonZeroUsize,

    /// Operation counters (updated outside the lock)
    counters: Counters,
}

impl Store {
    /// Create an empty store holding at most `capacity` entries
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| KvError::Config("capacity must be at least 1".to_string()))?;

        Ok(Self {
            map: Mutex::new(LruCache::new(capacity)),
            capacity,
            counters: Counters::default(),
        })
    }

    /// Insert or overwrite a key
    ///
    /// Fails with [`KvError::TooLong`] if the key or value exceeds 256
    /// bytes, leaving the store untouched. On success the key becomes the
    /// most recently used; if that pushes the store over capacity, the
    /// least recently used entry is evicted.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.len() > MAX_KEY_LEN || value.len() > MAX_VALUE_LEN {
            self.counters.record_rejected();
            return Err(KvError::TooLong {
                key_len: key.len(),
                value_len: value.len(),
            });
        }

        // `push` hands back either the replaced pair (same key) or the
        // evicted LRU pair; both come out of the lock before we inspect them.
        let displaced = self.map.lock().push(key.to_vec(), value.to_vec());

        match displaced {
            Some((old_key, _)) if old_key == key => self.counters.record_update(),
            Some((evicted, _)) => {
                self.counters.record_insert();
                self.counters.record_eviction();
                tracing::trace!(evicted_len = evicted.len(), "evicted least recently used entry");
            }
            None => self.counters.record_insert(),
        }

        Ok(())
    }

    /// Look up a key, refreshing its recency on a hit
    pub fn get(&self, key: &[u8]) -> Lookup {
        let found = self.map.lock().get(key).cloned();

        match found {
            Some(value) => {
                self.counters.record_hit();
                Lookup::Found(value)
            }
            None => {
                self.counters.record_miss();
                Lookup::NotFound
            }
        }
    }

    /// Whether a key is present, without touching its recency
    pub fn contains(&self, key: &[u8]) -> bool {
        self.map.lock().contains(key)
    }

    /// Keys from most to least recently used
    pub fn keys_by_recency(&self) -> Vec<Vec<u8>> {
        self.map.lock().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Snapshot of the operation counters
    pub fn stats(&self) -> StoreStats {
        self.counters.snapshot(self.len())
    }
}
