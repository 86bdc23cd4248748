//! SQLite implementation of [`StoragePool`].
//!
//! [`SqlitePool`] persists the key-value mapping in a single `kv` table with
//! WAL mode, a transaction around every multi-key write, and automatic
//! schema migrations. Values are stored as JSON TEXT via serde_json, and
//! `byte_size` is maintained per row so quota checks are one SUM away.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::StorageError;
use crate::traits::{PoolUsage, StoragePool};

/// SQLite-backed implementation of [`StoragePool`].
pub struct SqlitePool {
    conn: Connection,
    quota: usize,
}

impl SqlitePool {
    /// Opens (or creates) a pool database at `path` with the given quota.
    pub fn open(path: &str, quota: usize) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqlitePool { conn, quota })
    }

    /// Opens an in-memory pool (for testing).
    pub fn in_memory(quota: usize) -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqlitePool { conn, quota })
    }

    fn total_bytes(conn: &Connection) -> Result<usize, StorageError> {
        let total: i64 =
            conn.query_row("SELECT COALESCE(SUM(byte_size), 0) FROM kv", [], |row| {
                row.get(0)
            })?;
        Ok(total as usize)
    }
}

impl StoragePool for SqlitePool {
    fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM kv WHERE key = ?1")?;
        let mut found = HashMap::with_capacity(keys.len());
        for &key in keys {
            let text: Option<String> = stmt
                .query_row(params![key], |row| row.get(0))
                .optional()?;
            if let Some(text) = text {
                found.insert(key.to_string(), serde_json::from_str(&text)?);
            }
        }
        Ok(found)
    }

    fn set(&mut self, entries: HashMap<String, Value>) -> Result<(), StorageError> {
        // Serialize up front; sizes feed both the quota check and the rows.
        let rows: Vec<(String, String, usize)> = entries
            .into_iter()
            .map(|(key, value)| {
                let text = value.to_string();
                let size = key.len() + text.len();
                (key, text, size)
            })
            .collect();

        let tx = self.conn.transaction()?;

        let mut projected = Self::total_bytes(&tx)?;
        {
            let mut old_stmt =
                tx.prepare_cached("SELECT byte_size FROM kv WHERE key = ?1")?;
            for (key, _, size) in &rows {
                let old: Option<i64> = old_stmt
                    .query_row(params![key], |row| row.get(0))
                    .optional()?;
                if let Some(old) = old {
                    projected -= old as usize;
                }
                projected += size;
            }
        }
        if projected > self.quota {
            // Dropping the uncommitted transaction rolls everything back.
            return Err(StorageError::QuotaExceeded {
                needed: projected,
                quota: self.quota,
            });
        }

        {
            let mut insert_stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO kv (key, value, byte_size) VALUES (?1, ?2, ?3)",
            )?;
            for (key, text, size) in &rows {
                insert_stmt.execute(params![key, text, *size as i64])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM kv WHERE key = ?1")?;
            for &key in keys {
                stmt.execute(params![key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_all(&self) -> Result<HashMap<String, Value>, StorageError> {
        let mut stmt = self.conn.prepare_cached("SELECT key, value FROM kv")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut all = HashMap::new();
        for row in rows {
            let (key, text) = row?;
            all.insert(key, serde_json::from_str(&text)?);
        }
        Ok(all)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }

    fn usage(&self) -> Result<PoolUsage, StorageError> {
        let (count, used): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(byte_size), 0) FROM kv",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(PoolUsage {
            used_bytes: used as usize,
            quota_bytes: self.quota,
            entry_count: count as usize,
        })
    }
}
