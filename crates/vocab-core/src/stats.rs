//! Derived statistics and the calendar-day streak rules.
//!
//! The streak counts consecutive local calendar days containing at least one
//! completed review session. Two pure helpers implement the whole policy:
//!
//! - [`decayed_streak`]: what survives of a previous streak at time `now` --
//!   carried over while the gap since the last review is at most one
//!   calendar day, otherwise 0.
//! - [`bump_streak`]: the value after completing a review at `now` --
//!   `None` for a same-day repeat (idempotent), previous-day reviews extend
//!   the streak, anything older restarts it at 1.
//!
//! Both compare *local* calendar days, not 24-hour windows, so a review at
//! 23:55 followed by one at 00:10 counts as two distinct days.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Persisted aggregate derived from the record store plus review events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_words: u32,
    /// Entries saved within the trailing 7 days.
    pub words_this_week: u32,
    /// Consecutive calendar days with a completed review.
    pub current_streak: u32,
    pub last_review_date: Option<DateTime<Utc>>,
}

/// The local calendar day containing `ts`.
pub fn local_day(ts: DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

/// Whole calendar days from `earlier` to `later` (negative if reversed).
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (local_day(later) - local_day(earlier)).num_days()
}

/// Streak value carried into a recompute at `now`: unchanged within the
/// one-day grace window, 0 once the gap exceeds it, 0 when no review has
/// ever happened.
pub fn decayed_streak(stats: &Statistics, now: DateTime<Utc>) -> u32 {
    match stats.last_review_date {
        Some(last) if days_between(last, now) <= 1 => stats.current_streak,
        _ => 0,
    }
}

/// Streak value after completing a review at `now`, or `None` when a review
/// was already recorded on the same calendar day.
pub fn bump_streak(stats: &Statistics, now: DateTime<Utc>) -> Option<u32> {
    match stats.last_review_date {
        None => Some(1),
        Some(last) => match days_between(last, now) {
            0 => None,
            1 => Some(stats.current_streak + 1),
            _ => Some(1),
        },
    }
}
