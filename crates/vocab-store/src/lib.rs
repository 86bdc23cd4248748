//! Persistent data layer for captured vocabulary.
//!
//! Provides the [`StoragePool`] trait defining the key-value storage
//! contract, with [`MemoryPool`] and [`SqlitePool`] as first-class backends,
//! and the domain stores built on top of it.
//!
//! # Architecture
//!
//! Two pool instances exist side by side: a *small* pool (settings, legacy
//! data awaiting migration) and a *large* pool (the entry collection,
//! statistics, and one key per cached lookup). Stores are short-lived
//! borrowed views over a pool rather than owners, so several components can
//! share one pool within a single-threaded caller.
//!
//! Every store operation is a read-modify-write over a whole collection.
//! Pool calls are individually atomic but there is no cross-call
//! transaction: two independent processes interleaving such sequences can
//! lose one write. That risk is accepted and documented rather than papered
//! over with a locking protocol the backing stores cannot provide.
//!
//! # Modules
//!
//! - [`error`]: [`StorageError`] with all failure modes
//! - [`keys`]: persisted key layout and pool quotas
//! - [`traits`]: [`StoragePool`] trait definition
//! - [`memory`]: [`MemoryPool`] implementation
//! - [`schema`] / [`sqlite`]: [`SqlitePool`] implementation
//! - [`words`]: deduplicating, capacity-capped record store
//! - [`cache`]: TTL- and size-bounded lookup cache
//! - [`stats`]: statistics recompute and review events
//! - [`migrate`]: one-time small-pool to large-pool migration
//! - [`backup`]: snapshot export/import
//! - [`settings`]: settings accessor over the small pool
//! - [`enrich`]: seam for the external enrichment function

pub mod backup;
pub mod cache;
pub mod enrich;
pub mod error;
pub mod keys;
pub mod memory;
pub mod migrate;
pub mod schema;
pub mod settings;
pub mod sqlite;
pub mod stats;
pub mod traits;
pub mod words;

// Re-export key types for ergonomic use.
pub use backup::{export, import, Snapshot, FORMAT_VERSION};
pub use cache::{
    CacheConfig, CacheEntry, CacheKey, CacheNamespace, CacheStats, LookupCache, MAX_CACHE_SIZE,
};
pub use enrich::{EnrichError, EnrichedPayload, Enricher};
pub use error::StorageError;
pub use memory::MemoryPool;
pub use migrate::{migrate, MigrationReport};
pub use settings::SettingsStore;
pub use sqlite::SqlitePool;
pub use traits::{PoolUsage, StoragePool};
pub use words::{SortKey, WordStore};
