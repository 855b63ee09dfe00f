//! Thread-Safe Keyspaces
//!
//! This module implements the in-memory store behind every command.
//!
//! ## Design Decisions
//!
//! 1. **One lock per keyspace**: the string keyspace and the hash keyspace each
//!    sit behind their own `RwLock`, so string and hash commands never contend.
//! 2. **RwLock**: concurrent readers, exclusive writers. Every public method
//!    takes exactly one lock once, which makes each call atomic on its own.
//!    Nothing spans two calls.
//! 3. **Unbounded**: entries live until the process exits.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Store                     │
//! │  ┌──────────────────┐  ┌──────────────────┐  │
//! │  │  strings         │  │  hashes          │  │
//! │  │  RwLock<HashMap> │  │  RwLock<HashMap< │  │
//! │  │  key -> value    │  │   name, HashMap>>│  │
//! │  └──────────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

/// Fields of one hash, keyed by field name.
pub type HashFields = HashMap<Bytes, Bytes>;

/// The shared store.
///
/// Constructed once at startup, wrapped in an `Arc`, and handed to every
/// connection task through the command dispatcher.
///
/// # Example
///
/// ```
/// use respkv::storage::Store;
/// use bytes::Bytes;
///
/// let store = Store::new();
///
/// store.set(Bytes::from("name"), Bytes::from("blue"));
/// assert_eq!(store.get(b"name"), Some(Bytes::from("blue")));
///
/// store.hset(Bytes::from("user:1"), Bytes::from("city"), Bytes::from("Pune"));
/// assert_eq!(store.hget(b"user:1", b"city"), Some(Bytes::from("Pune")));
/// ```
#[derive(Debug, Default)]
pub struct Store {
    /// String keyspace
    strings: RwLock<HashMap<Bytes, Bytes>>,
    /// Hash keyspace
    hashes: RwLock<HashMap<Bytes, HashFields>>,
}

impl Store {
    /// Creates a store with both keyspaces empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a string key, overwriting any previous value.
    ///
    /// Returns `true` if the key was new.
    pub fn set(&self, key: Bytes, value: Bytes) -> bool {
        let mut strings = self.strings.write().unwrap();
        strings.insert(key, value).is_none()
    }

    /// Gets the value of a string key.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let strings = self.strings.read().unwrap();
        strings.get(key).cloned()
    }

    /// Sets a field in a hash, creating the hash on first write.
    ///
    /// Returns `true` if the field was new.
    pub fn hset(&self, hash: Bytes, field: Bytes, value: Bytes) -> bool {
        let mut hashes = self.hashes.write().unwrap();
        hashes
            .entry(hash)
            .or_default()
            .insert(field, value)
            .is_none()
    }

    /// Gets one field of a hash. `None` if either the hash or the field is missing.
    pub fn hget(&self, hash: &[u8], field: &[u8]) -> Option<Bytes> {
        let hashes = self.hashes.read().unwrap();
        hashes.get(hash).and_then(|fields| fields.get(field)).cloned()
    }

    /// Returns every field/value pair of a hash, in no particular order.
    ///
    /// `None` means the hash was never written.
    pub fn hgetall(&self, hash: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        let hashes = self.hashes.read().unwrap();
        hashes.get(hash).map(|fields| {
            fields
                .iter()
                .map(|(f, v)| (f.clone(), v.clone()))
                .collect()
        })
    }

    /// Number of keys in the string keyspace.
    pub fn len(&self) -> usize {
        self.strings.read().unwrap().len()
    }

    /// Returns true if the string keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of hashes in the hash keyspace.
    pub fn hash_len(&self) -> usize {
        self.hashes.read().unwrap().len()
    }
}
