//! The [`StoragePool`] trait defining the key-value storage contract.
//!
//! A pool is a persistent mapping from string key to JSON value with a
//! maximum total serialized-size quota. Two backends implement it --
//! [`crate::MemoryPool`] and [`crate::SqlitePool`] -- and are fully
//! swappable; stores and caches take the pool as an injected dependency so
//! tests can substitute the in-memory fake with deterministic quota
//! simulation.
//!
//! Each call is atomic at the pool level; there is no cross-call
//! transaction. Callers compose read-modify-write sequences over whole
//! collections and the design accepts that two independent processes doing
//! so can lose one write. The trait is synchronous for simplicity in the
//! single-threaded cooperative deployment model; `&mut self` on mutating
//! operations serializes callers within one process.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StorageError;

/// Size accounting for a pool: total serialized bytes against the quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUsage {
    pub used_bytes: usize,
    pub quota_bytes: usize,
    pub entry_count: usize,
}

impl PoolUsage {
    /// Fraction of the quota consumed, in percent.
    pub fn percentage_used(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.quota_bytes as f64 * 100.0
    }
}

/// Serialized size charged to the quota for one entry: key length plus
/// JSON text length. Both backends use the same accounting.
pub fn entry_size(key: &str, value: &Value) -> usize {
    key.len() + value.to_string().len()
}

/// The key-value storage contract.
///
/// `get`/`set`/`remove` operate on batches of keys in one atomic call.
/// A `set` that would exceed the quota fails with
/// [`StorageError::QuotaExceeded`] and writes nothing.
pub trait StoragePool {
    /// Fetches the requested keys; absent keys are simply missing from the
    /// returned map.
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StorageError>;

    /// Inserts or replaces all given entries atomically.
    fn set(&mut self, entries: HashMap<String, Value>) -> Result<(), StorageError>;

    /// Removes the given keys. Absent keys are ignored.
    fn remove(&mut self, keys: &[&str]) -> Result<(), StorageError>;

    /// Returns the full mapping.
    fn get_all(&self) -> Result<HashMap<String, Value>, StorageError>;

    /// Removes every entry.
    fn clear(&mut self) -> Result<(), StorageError>;

    /// Current size accounting.
    fn usage(&self) -> Result<PoolUsage, StorageError>;

    // -------------------------------------------------------------------
    // Typed convenience layer
    // -------------------------------------------------------------------

    /// Reads and deserializes a single key, `None` when absent.
    fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        Self: Sized,
    {
        let mut found = self.get(&[key])?;
        match found.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes and writes a single key.
    fn set_value<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError>
    where
        Self: Sized,
    {
        let mut entries = HashMap::with_capacity(1);
        entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.set(entries)
    }
}

/// Soft-failure read: an `Unavailable` pool is logged and treated as an
/// absent key, so callers get a safe default instead of a crash. All other
/// errors propagate.
pub(crate) fn read_or_default<T, P>(pool: &P, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
    P: StoragePool,
{
    match pool.get_value::<T>(key) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Ok(T::default()),
        Err(err) if err.is_unavailable() => {
            tracing::warn!(key, error = %err, "storage pool unavailable, using default");
            Ok(T::default())
        }
        Err(err) => Err(err),
    }
}
