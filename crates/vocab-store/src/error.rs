//! Storage error types for vocab-store.
//!
//! [`StorageError`] covers all anticipated failure modes of the data layer.
//! Two variants carry policy with them: `Unavailable` is never retried here
//! and readers degrade to an in-memory default instead of propagating it;
//! `QuotaExceeded` signals the caller to shrink the payload before retrying.
//! An expired cache entry is a normal miss, not an error.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying SQLite database reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema migration could not be applied.
    #[error("schema migration error: {0}")]
    Migration(String),

    /// A write would push the pool past its serialized-size quota.
    /// Nothing was written.
    #[error("write of {needed} bytes exceeds pool quota of {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    /// The backing pool cannot be reached (for example the host context was
    /// torn down). Surfaced as a soft failure, never retried internally.
    #[error("storage pool unavailable: {reason}")]
    Unavailable { reason: String },

    /// A key or id referenced by the caller does not exist.
    #[error("not found: {key}")]
    NotFound { key: String },

    /// An import payload declared a format version newer than this build
    /// understands.
    #[error("unsupported snapshot format version {0}")]
    UnsupportedSnapshot(u32),
}

impl StorageError {
    /// True for the soft-failure variant readers may absorb.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}
