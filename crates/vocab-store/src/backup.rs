//! Bulk export/import of the entry collection and statistics.
//!
//! A [`Snapshot`] is a self-describing, serializable backup. Import is a
//! wholesale replacement of entries and statistics, not a merge; the
//! round-trip law is that importing a pool's own export reproduces an
//! identical listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vocab_core::{Statistics, VocabEntry};

use crate::error::StorageError;
use crate::keys;
use crate::traits::{read_or_default, StoragePool};

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

/// Serializable backup of the data layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: Vec<VocabEntry>,
    pub statistics: Statistics,
    pub exported_at: DateTime<Utc>,
    pub format_version: u32,
}

/// Captures a snapshot of the large pool's entries and statistics.
pub fn export<P: StoragePool>(pool: &P) -> Result<Snapshot, StorageError> {
    Ok(Snapshot {
        entries: read_or_default(pool, keys::WORDS)?,
        statistics: read_or_default(pool, keys::STATISTICS)?,
        exported_at: Utc::now(),
        format_version: FORMAT_VERSION,
    })
}

/// Replaces the pool's entries and statistics with the snapshot's contents.
///
/// Rejects snapshots from a newer format than this build understands.
pub fn import<P: StoragePool>(pool: &mut P, snapshot: &Snapshot) -> Result<(), StorageError> {
    if snapshot.format_version > FORMAT_VERSION {
        return Err(StorageError::UnsupportedSnapshot(snapshot.format_version));
    }
    pool.set_value(keys::WORDS, &snapshot.entries)?;
    pool.set_value(keys::STATISTICS, &snapshot.statistics)?;
    tracing::info!(count = snapshot.entries.len(), "imported snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPool;
    use crate::words::WordStore;
    use vocab_core::EntryDraft;

    #[test]
    fn export_import_roundtrip_reproduces_listing() {
        let mut pool = MemoryPool::new();
        {
            let mut store = WordStore::new(&mut pool, 200);
            let mut a = EntryDraft::new("hello");
            a.translation = Some("Xin chào".into());
            store.upsert(a).unwrap();
            store.upsert(EntryDraft::new("break a leg")).unwrap();
        }

        let snapshot = export(&pool).unwrap();
        assert_eq!(snapshot.format_version, FORMAT_VERSION);

        let mut restored = MemoryPool::new();
        import(&mut restored, &snapshot).unwrap();

        let original = WordStore::new(&mut pool, 200).list().unwrap();
        let roundtripped = WordStore::new(&mut restored, 200).list().unwrap();
        assert_eq!(original, roundtripped);
    }

    #[test]
    fn import_replaces_rather_than_merges() {
        let mut pool = MemoryPool::new();
        {
            let mut store = WordStore::new(&mut pool, 200);
            store.upsert(EntryDraft::new("doomed")).unwrap();
        }

        let mut other = MemoryPool::new();
        {
            let mut store = WordStore::new(&mut other, 200);
            store.upsert(EntryDraft::new("survivor")).unwrap();
        }
        let snapshot = export(&other).unwrap();

        import(&mut pool, &snapshot).unwrap();
        let entries = WordStore::new(&mut pool, 200).list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "survivor");
    }

    #[test]
    fn import_rejects_future_format() {
        let mut pool = MemoryPool::new();
        let mut snapshot = export(&pool).unwrap();
        snapshot.format_version = FORMAT_VERSION + 1;

        let err = import(&mut pool, &snapshot).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedSnapshot(_)));
    }

    #[test]
    fn snapshot_serializes_as_json() {
        let pool = MemoryPool::new();
        let snapshot = export(&pool).unwrap();
        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries.len(), 0);
    }
}
