//! One-time migration of legacy data from the small pool to the large pool.
//!
//! Early versions kept the entry collection and statistics in the
//! small-quota pool alongside settings; they now live in the large pool.
//! [`migrate`] is idempotent and safe to run on every startup: it copies
//! only into an empty or absent destination and never deletes from the
//! source, which stays behind as a recoverable fallback.

use serde::de::DeserializeOwned;
use vocab_core::{Statistics, VocabEntry};

use crate::error::StorageError;
use crate::keys;
use crate::traits::StoragePool;

/// What a [`migrate`] run actually copied, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Number of entries copied, `None` when the destination already had
    /// data or the source had none.
    pub words_copied: Option<usize>,
    pub statistics_copied: bool,
}

impl MigrationReport {
    /// True when nothing needed copying.
    pub fn is_noop(&self) -> bool {
        self.words_copied.is_none() && !self.statistics_copied
    }
}

/// Reads a legacy key from the source pool; an unavailable source is logged
/// and skipped rather than failing the whole startup.
fn read_legacy<T, P>(source: &P, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    P: StoragePool,
{
    match source.get_value::<T>(key) {
        Ok(found) => Ok(found),
        Err(err) if err.is_unavailable() => {
            tracing::warn!(key, error = %err, "legacy pool unavailable, skipping migration");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Copies legacy `words` and `statistics` from `source` into `dest`.
///
/// Words are copied only when the destination collection is absent or
/// empty; statistics only when the destination key is absent. Non-empty
/// destination data is never overwritten.
pub fn migrate<S, D>(source: &S, dest: &mut D) -> Result<MigrationReport, StorageError>
where
    S: StoragePool,
    D: StoragePool,
{
    let mut report = MigrationReport::default();

    let dest_words: Option<Vec<VocabEntry>> = dest.get_value(keys::WORDS)?;
    if dest_words.map_or(true, |w| w.is_empty()) {
        if let Some(legacy) = read_legacy::<Vec<VocabEntry>, _>(source, keys::WORDS)? {
            if !legacy.is_empty() {
                dest.set_value(keys::WORDS, &legacy)?;
                report.words_copied = Some(legacy.len());
                tracing::info!(count = legacy.len(), "migrated legacy entries to large pool");
            }
        }
    }

    let dest_stats: Option<Statistics> = dest.get_value(keys::STATISTICS)?;
    if dest_stats.is_none() {
        if let Some(legacy) = read_legacy::<Statistics, _>(source, keys::STATISTICS)? {
            dest.set_value(keys::STATISTICS, &legacy)?;
            report.statistics_copied = true;
            tracing::info!("migrated legacy statistics to large pool");
        }
    }

    Ok(report)
}
