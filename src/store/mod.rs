//! Store Module
//!
//! Bounded in-memory key-value map with least-recently-used eviction.
//!
//! ## Responsibilities
//! - Enforce the per-item size limits
//! - Keep entries ordered by recency of last access
//! - Evict the least-recently-used entry once capacity is exceeded
//! - Serialize all mutation through a single lock
//!
//! ## Data Structure Choice
//! `lru::LruCache` behind a `parking_lot::Mutex`:
//! - O(1) lookup, insert and move-to-front
//! - A GET hit reorders the list, so reads take the lock exclusively

mod stats;
mod table;

pub use stats::StoreStats;
pub use table::Store;

/// Maximum key length in bytes
pub const MAX_KEY_LEN: usize = 256;

/// Maximum value length in bytes
pub const MAX_VALUE_LEN: usize = 256;

/// Value sent back to clients in place of a value when a GET misses
pub const MISS_MARKER: &[u8] = b"Key not found";

/// Outcome of a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key is present; holds a copy of its value
    Found(Vec<u8>),

    /// The key is absent
    NotFound,
}

impl Lookup {
    /// Value bytes to put on the wire for this outcome
    pub fn into_wire_value(self) -> Vec<u8> {
        match self {
            Lookup::Found(value) => value,
            Lookup::NotFound => MISS_MARKER.to_vec(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}
