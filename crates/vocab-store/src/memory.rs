//! In-memory implementation of [`StoragePool`].
//!
//! [`MemoryPool`] is a first-class backend for tests and ephemeral sessions,
//! with identical semantics to the SQLite backend. It adds two deterministic
//! failure switches the tests rely on: an explicit quota and an
//! `unavailable` flag simulating a torn-down host context.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::StorageError;
use crate::traits::{entry_size, PoolUsage, StoragePool};

/// HashMap-backed implementation of [`StoragePool`].
#[derive(Debug)]
pub struct MemoryPool {
    entries: HashMap<String, Value>,
    quota: usize,
    unavailable: bool,
}

impl MemoryPool {
    /// Creates an empty pool with the large-pool quota.
    pub fn new() -> Self {
        Self::with_quota(crate::keys::LARGE_POOL_QUOTA)
    }

    /// Creates an empty pool with an explicit quota in bytes.
    pub fn with_quota(quota: usize) -> Self {
        MemoryPool {
            entries: HashMap::new(),
            quota,
            unavailable: false,
        }
    }

    /// Simulates the backing store becoming unreachable; every operation
    /// fails with [`StorageError::Unavailable`] until switched back.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable {
                reason: "pool marked unavailable".into(),
            });
        }
        Ok(())
    }

    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| entry_size(k, v)).sum()
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePool for MemoryPool {
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StorageError> {
        self.check_available()?;
        Ok(keys
            .iter()
            .filter_map(|&k| self.entries.get(k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set(&mut self, entries: HashMap<String, Value>) -> Result<(), StorageError> {
        self.check_available()?;

        // Project the post-write size before touching anything so a failed
        // set writes nothing.
        let mut projected = self.used_bytes();
        for (key, value) in &entries {
            if let Some(old) = self.entries.get(key) {
                projected -= entry_size(key, old);
            }
            projected += entry_size(key, value);
        }
        if projected > self.quota {
            return Err(StorageError::QuotaExceeded {
                needed: projected,
                quota: self.quota,
            });
        }

        self.entries.extend(entries);
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<(), StorageError> {
        self.check_available()?;
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }

    fn get_all(&self) -> Result<HashMap<String, Value>, StorageError> {
        self.check_available()?;
        Ok(self.entries.clone())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.check_available()?;
        self.entries.clear();
        Ok(())
    }

    fn usage(&self) -> Result<PoolUsage, StorageError> {
        self.check_available()?;
        Ok(PoolUsage {
            used_bytes: self.used_bytes(),
            quota_bytes: self.quota,
            entry_count: self.entries.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_remove_roundtrip() {
        let mut pool = MemoryPool::new();
        pool.set_value("alpha", &json!({"n": 1})).unwrap();
        pool.set_value("beta", &json!([1, 2, 3])).unwrap();

        let got: Option<Value> = pool.get_value("alpha").unwrap();
        assert_eq!(got, Some(json!({"n": 1})));

        pool.remove(&["alpha"]).unwrap();
        let got: Option<Value> = pool.get_value("alpha").unwrap();
        assert!(got.is_none());
        assert_eq!(pool.usage().unwrap().entry_count, 1);
    }

    #[test]
    fn absent_keys_missing_from_get() {
        let pool = MemoryPool::new();
        let found = pool.get(&["nope"]).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn quota_rejects_oversized_write_atomically() {
        let mut pool = MemoryPool::with_quota(64);
        pool.set_value("small", &json!("x")).unwrap();

        let big = "y".repeat(200);
        let err = pool.set_value("big", &json!(big)).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        // The failed write left nothing behind.
        let got: Option<Value> = pool.get_value("big").unwrap();
        assert!(got.is_none());
        let kept: Option<Value> = pool.get_value("small").unwrap();
        assert!(kept.is_some());
    }

    #[test]
    fn replacing_a_key_frees_its_old_size() {
        let mut pool = MemoryPool::with_quota(64);
        pool.set_value("k", &json!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"))
            .unwrap();
        // Re-writing the same key with a smaller value must succeed even
        // though old + new together would exceed the quota.
        pool.set_value("k", &json!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"))
            .unwrap();
    }

    #[test]
    fn unavailable_pool_fails_every_operation() {
        let mut pool = MemoryPool::new();
        pool.set_value("k", &json!(1)).unwrap();
        pool.set_unavailable(true);

        assert!(pool.get(&["k"]).unwrap_err().is_unavailable());
        assert!(pool.get_all().unwrap_err().is_unavailable());
        assert!(pool.usage().unwrap_err().is_unavailable());
        assert!(pool
            .set_value("k", &json!(2))
            .unwrap_err()
            .is_unavailable());

        pool.set_unavailable(false);
        let got: Option<Value> = pool.get_value("k").unwrap();
        assert_eq!(got, Some(json!(1)));
    }

    #[test]
    fn clear_empties_the_pool() {
        let mut pool = MemoryPool::new();
        pool.set_value("a", &json!(1)).unwrap();
        pool.set_value("b", &json!(2)).unwrap();
        pool.clear().unwrap();
        assert_eq!(pool.usage().unwrap().entry_count, 0);
        assert_eq!(pool.usage().unwrap().used_bytes, 0);
    }
}
