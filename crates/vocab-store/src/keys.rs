//! Persisted key layout and pool quotas.
//!
//! Two pools exist: a *small* pool (settings plus legacy collections kept
//! for migration) and a *large* pool (the entry collection, statistics, and
//! one key per cache item).

/// Ordered entry collection, large pool. Also the legacy key in the small
/// pool until migrated.
pub const WORDS: &str = "words";

/// Persisted [`vocab_core::Statistics`], large pool (legacy: small pool).
pub const STATISTICS: &str = "statistics";

/// Persisted [`vocab_core::Settings`], small pool.
pub const SETTINGS: &str = "settings";

/// Prefix for per-item cache keys in the large pool:
/// `cache_<namespace>_<input>_<locale>`.
pub const CACHE_PREFIX: &str = "cache_";

/// Serialized-size quota of the small pool (100 KiB).
pub const SMALL_POOL_QUOTA: usize = 100 * 1024;

/// Serialized-size quota of the large pool (10 MiB).
pub const LARGE_POOL_QUOTA: usize = 10 * 1024 * 1024;
