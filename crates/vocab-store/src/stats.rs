//! Statistics engine: derives and persists the [`Statistics`] record.
//!
//! The record lives at the `statistics` key in the large pool. Recomputes
//! run after every record-store mutation; review completions come in as
//! explicit events. The streak policy itself is the pure logic in
//! [`vocab_core::stats`]; this module only wires it to storage.

use chrono::{DateTime, Duration, Utc};
use vocab_core::stats::{bump_streak, decayed_streak};
use vocab_core::{Statistics, VocabEntry};

use crate::error::StorageError;
use crate::keys;
use crate::traits::{read_or_default, StoragePool};

/// Recomputes and persists statistics from the current entry collection.
pub fn recompute<P: StoragePool>(pool: &mut P) -> Result<Statistics, StorageError> {
    recompute_at(pool, Utc::now())
}

/// [`recompute`] with an explicit clock, for deterministic tests.
pub fn recompute_at<P: StoragePool>(
    pool: &mut P,
    now: DateTime<Utc>,
) -> Result<Statistics, StorageError> {
    let entries: Vec<VocabEntry> = read_or_default(pool, keys::WORDS)?;
    let previous: Statistics = read_or_default(pool, keys::STATISTICS)?;

    let week_ago = now - Duration::days(7);
    let stats = Statistics {
        total_words: entries.len() as u32,
        words_this_week: entries
            .iter()
            .filter(|e| e.metadata.date_saved > week_ago)
            .count() as u32,
        current_streak: decayed_streak(&previous, now),
        last_review_date: previous.last_review_date,
    };

    pool.set_value(keys::STATISTICS, &stats)?;
    Ok(stats)
}

/// Records a completed review session. Idempotent within one local calendar
/// day; a next-day session extends the streak, a later one restarts it at 1.
pub fn record_review_complete<P: StoragePool>(pool: &mut P) -> Result<Statistics, StorageError> {
    record_review_complete_at(pool, Utc::now())
}

/// [`record_review_complete`] with an explicit clock.
pub fn record_review_complete_at<P: StoragePool>(
    pool: &mut P,
    now: DateTime<Utc>,
) -> Result<Statistics, StorageError> {
    let mut stats: Statistics = read_or_default(pool, keys::STATISTICS)?;

    match bump_streak(&stats, now) {
        Some(streak) => {
            stats.current_streak = streak;
            stats.last_review_date = Some(now);
            pool.set_value(keys::STATISTICS, &stats)?;
            tracing::debug!(streak, "review session recorded");
        }
        None => {
            tracing::debug!("review already recorded today, streak unchanged");
        }
    }
    Ok(stats)
}

/// Reads the persisted statistics, defaulting to zeros when absent.
pub fn load<P: StoragePool>(pool: &P) -> Result<Statistics, StorageError> {
    read_or_default(pool, keys::STATISTICS)
}
