//! TTL- and size-bounded cache for enrichment lookups.
//!
//! Each cached item is one key in the large pool
//! (`cache_<namespace>_<input>_<locale>`), so expiry and eviction remove
//! exactly the keys they target. Two distinct removal policies coexist:
//!
//! - [`LookupCache::evict_to_capacity`] keeps the hot path cheap with pure
//!   LRU by `last_accessed`, run after every put.
//! - [`LookupCache::optimize`] is the heavier administrative pass, dropping
//!   the lowest 20% ranked by access count then recency (LFU, then LRU). It
//!   needs a full scan and sort, so it never runs on the hot path.
//!
//! TTL protects against stale external data; a hit re-stamps the entry
//! (sliding expiry) and bumps its access counter. An expired read is a
//! normal miss, not an error, and purges the entry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vocab_core::{normalize_text, Settings};

use crate::enrich::{EnrichError, EnrichedPayload, Enricher};
use crate::error::StorageError;
use crate::keys;
use crate::traits::StoragePool;

/// Hard ceiling on live cache entries.
pub const MAX_CACHE_SIZE: usize = 1000;

/// Default time-to-live for cached lookups.
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Which kind of lookup a cache entry memoizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheNamespace {
    /// Dictionary lookup for a single word.
    Word,
    /// Translation of a word or phrase.
    Translation,
}

impl CacheNamespace {
    fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Word => "word",
            CacheNamespace::Translation => "translation",
        }
    }
}

/// Composite cache key: operation kind + normalized input + locale.
///
/// Normalization (trim + lowercase) is applied once, here, so every call
/// site agrees on the canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub namespace: CacheNamespace,
    pub input: String,
    pub locale: String,
}

impl CacheKey {
    pub fn new(namespace: CacheNamespace, input: &str, locale: &str) -> Self {
        CacheKey {
            namespace,
            input: normalize_text(input),
            locale: normalize_text(locale),
        }
    }

    /// The pool key this entry is stored under.
    pub fn storage_key(&self) -> String {
        format!(
            "{}{}_{}_{}",
            keys::CACHE_PREFIX,
            self.namespace.as_str(),
            self.input,
            self.locale
        )
    }
}

/// Memoized result of one expensive lookup, with usage telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: Value,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Original TTL in milliseconds, reused when a hit re-stamps the entry.
    pub ttl_ms: i64,
    pub access_count: u64,
    pub last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    fn new(payload: Value, ttl: Duration, now: DateTime<Utc>) -> Self {
        CacheEntry {
            payload,
            cached_at: now,
            expires_at: now + ttl,
            ttl_ms: ttl.num_milliseconds(),
            access_count: 1,
            last_accessed: now,
        }
    }

    /// A zero or negative TTL means the entry was born expired.
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Cache tuning derived from [`Settings`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub default_ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            default_ttl: Duration::days(DEFAULT_TTL_DAYS),
            max_entries: MAX_CACHE_SIZE,
        }
    }
}

impl CacheConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        CacheConfig {
            enabled: settings.cache_enabled,
            default_ttl: settings.cache_ttl(),
            max_entries: MAX_CACHE_SIZE,
        }
    }
}

/// Counters reported by [`LookupCache::stats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub valid_entries: usize,
    pub total_access_count: u64,
    pub usage_percentage: f64,
}

/// Borrowed view over the large pool exposing the lookup-cache operations.
pub struct LookupCache<'a, P: StoragePool> {
    pool: &'a mut P,
    config: CacheConfig,
}

impl<'a, P: StoragePool> LookupCache<'a, P> {
    pub fn new(pool: &'a mut P, config: CacheConfig) -> Self {
        LookupCache { pool, config }
    }

    /// All live cache rows, skipping any that fail to parse.
    fn entries(&self) -> Result<Vec<(String, CacheEntry)>, StorageError> {
        let all = self.pool.get_all()?;
        let mut entries = Vec::new();
        for (key, value) in all {
            if !key.starts_with(keys::CACHE_PREFIX) {
                continue;
            }
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => entries.push((key, entry)),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "skipping unreadable cache entry");
                }
            }
        }
        Ok(entries)
    }

    /// Cache read. A hit bumps the access counter, re-stamps the expiry
    /// from the entry's own TTL, and re-persists; an expired entry is
    /// purged and reported as absent.
    pub fn get(&mut self, key: &CacheKey) -> Result<Option<Value>, StorageError> {
        self.get_at(key, Utc::now())
    }

    /// [`LookupCache::get`] with an explicit clock.
    pub fn get_at(
        &mut self,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> Result<Option<Value>, StorageError> {
        if !self.config.enabled {
            return Ok(None);
        }
        let storage_key = key.storage_key();

        let entry = match self.pool.get_value::<CacheEntry>(&storage_key) {
            Ok(found) => found,
            Err(err) if err.is_unavailable() => {
                tracing::warn!(key = %storage_key, "cache pool unavailable, treating as miss");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let Some(mut entry) = entry else {
            return Ok(None);
        };

        if entry.is_expired(now) {
            self.pool.remove(&[&storage_key])?;
            return Ok(None);
        }

        entry.access_count += 1;
        entry.last_accessed = now;
        entry.cached_at = now;
        entry.expires_at = now + Duration::milliseconds(entry.ttl_ms);
        // Telemetry persistence must not turn a hit into a failure.
        if let Err(err) = self.pool.set_value(&storage_key, &entry) {
            tracing::warn!(key = %storage_key, error = %err, "failed to re-persist cache hit");
        }
        Ok(Some(entry.payload))
    }

    /// Stores a payload under `key`, then enforces the size cap.
    pub fn put(
        &mut self,
        key: &CacheKey,
        payload: Value,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        self.put_at(key, payload, ttl, Utc::now())
    }

    /// [`LookupCache::put`] with an explicit clock.
    pub fn put_at(
        &mut self,
        key: &CacheKey,
        payload: Value,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if !self.config.enabled {
            return Ok(());
        }
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry::new(payload, ttl, now);
        self.pool.set_value(&key.storage_key(), &entry)?;
        self.evict_to_capacity()?;
        Ok(())
    }

    /// Removes one cached item.
    pub fn invalidate(&mut self, key: &CacheKey) -> Result<(), StorageError> {
        self.pool.remove(&[&key.storage_key()])
    }

    /// Removes every cache row, leaving non-cache keys untouched.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        let cache_keys: Vec<String> = self
            .pool
            .get_all()?
            .into_keys()
            .filter(|k| k.starts_with(keys::CACHE_PREFIX))
            .collect();
        let refs: Vec<&str> = cache_keys.iter().map(String::as_str).collect();
        self.pool.remove(&refs)
    }

    /// Scans all entries and removes the expired ones. Returns the count
    /// removed; intended to run periodically.
    pub fn sweep_expired(&mut self) -> Result<usize, StorageError> {
        self.sweep_expired_at(Utc::now())
    }

    /// [`LookupCache::sweep_expired`] with an explicit clock.
    pub fn sweep_expired_at(&mut self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let stale: Vec<String> = self
            .entries()?
            .into_iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k)
            .collect();
        if !stale.is_empty() {
            let refs: Vec<&str> = stale.iter().map(String::as_str).collect();
            self.pool.remove(&refs)?;
            tracing::debug!(count = stale.len(), "swept expired cache entries");
        }
        Ok(stale.len())
    }

    /// Strict LRU eviction down to the configured cap. Returns the count
    /// removed.
    pub fn evict_to_capacity(&mut self) -> Result<usize, StorageError> {
        let mut entries = self.entries()?;
        if entries.len() <= self.config.max_entries {
            return Ok(0);
        }

        entries.sort_by_key(|(_, e)| e.last_accessed);
        let excess = entries.len() - self.config.max_entries;
        let victims: Vec<String> = entries
            .into_iter()
            .take(excess)
            .map(|(k, _)| k)
            .collect();
        let refs: Vec<&str> = victims.iter().map(String::as_str).collect();
        self.pool.remove(&refs)?;
        tracing::debug!(count = excess, "evicted cache entries beyond capacity");
        Ok(excess)
    }

    /// Administrative cleanup: drops the lowest 20% of entries ranked by
    /// ascending access count, ties broken by least-recently-accessed.
    /// Returns the count removed.
    pub fn optimize(&mut self) -> Result<usize, StorageError> {
        let mut entries = self.entries()?;
        entries.sort_by_key(|(_, e)| (e.access_count, e.last_accessed));

        let remove_count = entries.len() / 5;
        if remove_count == 0 {
            return Ok(0);
        }
        let victims: Vec<String> = entries
            .into_iter()
            .take(remove_count)
            .map(|(k, _)| k)
            .collect();
        let refs: Vec<&str> = victims.iter().map(String::as_str).collect();
        self.pool.remove(&refs)?;
        tracing::info!(count = remove_count, "optimized cache, removed cold entries");
        Ok(remove_count)
    }

    /// Usage counters over the current cache population.
    pub fn stats(&self) -> Result<CacheStats, StorageError> {
        self.stats_at(Utc::now())
    }

    /// [`LookupCache::stats`] with an explicit clock.
    pub fn stats_at(&self, now: DateTime<Utc>) -> Result<CacheStats, StorageError> {
        let entries = self.entries()?;
        let total_entries = entries.len();
        let expired_entries = entries.iter().filter(|(_, e)| e.is_expired(now)).count();
        let total_access_count = entries.iter().map(|(_, e)| e.access_count).sum();
        Ok(CacheStats {
            total_entries,
            expired_entries,
            valid_entries: total_entries - expired_entries,
            total_access_count,
            usage_percentage: total_entries as f64 / self.config.max_entries as f64 * 100.0,
        })
    }

    /// Miss-fill read: serve from cache when possible, otherwise call the
    /// enricher and cache its result. Enrichment failures pass through
    /// uncached; cache storage trouble degrades to a direct fetch.
    pub fn get_or_fetch<E: Enricher>(
        &mut self,
        key: &CacheKey,
        enricher: &E,
    ) -> Result<EnrichedPayload, EnrichError> {
        match self.get(key) {
            Ok(Some(value)) => match serde_json::from_value::<EnrichedPayload>(value) {
                Ok(payload) => return Ok(payload),
                Err(err) => {
                    tracing::warn!(error = %err, "cached payload unreadable, refetching");
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "cache read failed, falling back to fetch");
            }
        }

        let payload = enricher.enrich(&key.input, &key.locale)?;

        match serde_json::to_value(&payload) {
            Ok(value) => {
                if let Err(err) = self.put(key, value, None) {
                    tracing::warn!(error = %err, "failed to cache enrichment result");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize enrichment result");
            }
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPool;
    use serde_json::json;
    use std::cell::Cell;

    fn key(input: &str) -> CacheKey {
        CacheKey::new(CacheNamespace::Word, input, "vi")
    }

    fn cache<'a>(pool: &'a mut MemoryPool) -> LookupCache<'a, MemoryPool> {
        LookupCache::new(pool, CacheConfig::default())
    }

    #[test]
    fn key_normalization_is_uniform() {
        let a = CacheKey::new(CacheNamespace::Word, "  Hello ", "VI");
        let b = CacheKey::new(CacheNamespace::Word, "hello", "vi");
        assert_eq!(a.storage_key(), b.storage_key());
        assert_eq!(a.storage_key(), "cache_word_hello_vi");
    }

    #[test]
    fn put_then_get_bumps_access_telemetry() {
        let mut pool = MemoryPool::new();
        let mut cache = cache(&mut pool);
        let now = Utc::now();

        cache.put_at(&key("hello"), json!({"m": 1}), None, now).unwrap();
        let hit = cache.get_at(&key("hello"), now + Duration::seconds(1)).unwrap();
        assert_eq!(hit, Some(json!({"m": 1})));

        let stats = cache.stats_at(now + Duration::seconds(2)).unwrap();
        // 1 from put, +1 from the hit.
        assert_eq!(stats.total_access_count, 2);
    }

    #[test]
    fn hit_slides_the_expiry_window() {
        let mut pool = MemoryPool::new();
        let mut cache = cache(&mut pool);
        let now = Utc::now();

        cache
            .put_at(&key("hello"), json!(1), Some(Duration::days(1)), now)
            .unwrap();
        // Touch just before expiry, then read again past the original
        // deadline: the re-stamp keeps it alive.
        let touch = now + Duration::hours(23);
        assert!(cache.get_at(&key("hello"), touch).unwrap().is_some());
        let later = now + Duration::hours(30);
        assert!(cache.get_at(&key("hello"), later).unwrap().is_some());
    }

    #[test]
    fn expired_entry_reads_absent_and_is_purged() {
        let mut pool = MemoryPool::new();
        let mut cache = cache(&mut pool);
        let now = Utc::now();

        cache
            .put_at(&key("stale"), json!(1), Some(Duration::days(1)), now)
            .unwrap();
        let later = now + Duration::days(2);
        assert!(cache.get_at(&key("stale"), later).unwrap().is_none());

        let stats = cache.stats_at(later).unwrap();
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn zero_ttl_is_born_expired() {
        let mut pool = MemoryPool::new();
        let mut cache = cache(&mut pool);
        let now = Utc::now();

        cache
            .put_at(&key("k"), json!("payload"), Some(Duration::zero()), now)
            .unwrap();
        assert!(cache.get_at(&key("k"), now).unwrap().is_none());
    }

    #[test]
    fn lru_evicts_exactly_the_oldest_accessed() {
        let mut pool = MemoryPool::new();
        let config = CacheConfig {
            max_entries: 5,
            ..Default::default()
        };
        let mut cache = LookupCache::new(&mut pool, config);
        let now = Utc::now();

        // 5 + 3 inserts with strictly increasing last_accessed, never
        // re-read: the 3 least recently accessed must go.
        for i in 0..8 {
            cache
                .put_at(
                    &key(&format!("w{i}")),
                    json!(i),
                    None,
                    now + Duration::seconds(i),
                )
                .unwrap();
        }

        let stats = cache.stats().unwrap();
        assert_eq!(stats.total_entries, 5);
        for i in 0..3 {
            assert!(cache.get(&key(&format!("w{i}"))).unwrap().is_none());
        }
        for i in 3..8 {
            assert!(cache.get(&key(&format!("w{i}"))).unwrap().is_some());
        }
    }

    #[test]
    fn sweep_removes_only_expired() {
        let mut pool = MemoryPool::new();
        let mut cache = cache(&mut pool);
        let now = Utc::now();

        cache
            .put_at(&key("short"), json!(1), Some(Duration::hours(1)), now)
            .unwrap();
        cache
            .put_at(&key("long"), json!(2), Some(Duration::days(30)), now)
            .unwrap();

        let removed = cache.sweep_expired_at(now + Duration::days(1)).unwrap();
        assert_eq!(removed, 1);
        assert!(cache
            .get_at(&key("long"), now + Duration::days(1))
            .unwrap()
            .is_some());
    }

    #[test]
    fn optimize_drops_least_frequently_used_first() {
        let mut pool = MemoryPool::new();
        let mut cache = cache(&mut pool);
        let now = Utc::now();

        for i in 0..10 {
            cache
                .put_at(&key(&format!("w{i}")), json!(i), None, now + Duration::seconds(i))
                .unwrap();
        }
        // Make w0 and w1 popular; the cold tail should be dropped instead.
        for _ in 0..5 {
            cache.get_at(&key("w0"), now + Duration::minutes(1)).unwrap();
            cache.get_at(&key("w1"), now + Duration::minutes(1)).unwrap();
        }

        // 20% of 10 = 2 removals, and never the popular ones.
        let removed = cache.optimize().unwrap();
        assert_eq!(removed, 2);
        assert!(cache.get(&key("w0")).unwrap().is_some());
        assert!(cache.get(&key("w1")).unwrap().is_some());
        assert_eq!(cache.stats().unwrap().total_entries, 8);
    }

    #[test]
    fn clear_leaves_non_cache_keys_alone() {
        let mut pool = MemoryPool::new();
        pool.set_value("words", &json!([])).unwrap();
        let mut cache = cache(&mut pool);
        cache.put(&key("hello"), json!(1), None).unwrap();

        cache.clear().unwrap();
        assert_eq!(cache.stats().unwrap().total_entries, 0);
        drop(cache);
        let words: Option<Value> = pool.get_value("words").unwrap();
        assert!(words.is_some());
    }

    #[test]
    fn disabled_cache_bypasses_storage() {
        let mut pool = MemoryPool::new();
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let mut cache = LookupCache::new(&mut pool, config);

        cache.put(&key("hello"), json!(1), None).unwrap();
        assert!(cache.get(&key("hello")).unwrap().is_none());
        drop(cache);
        assert_eq!(pool.usage().unwrap().entry_count, 0);
    }

    #[test]
    fn get_or_fetch_fills_on_miss_and_serves_from_cache() {
        let mut pool = MemoryPool::new();
        let mut cache = cache(&mut pool);
        let calls = Cell::new(0u32);
        let enricher = |_: &str, _: &str| -> Result<EnrichedPayload, EnrichError> {
            calls.set(calls.get() + 1);
            Ok(EnrichedPayload {
                meaning: Some("a greeting".into()),
                ..Default::default()
            })
        };

        let first = cache.get_or_fetch(&key("hello"), &enricher).unwrap();
        assert_eq!(first.meaning.as_deref(), Some("a greeting"));
        let second = cache.get_or_fetch(&key("hello"), &enricher).unwrap();
        assert_eq!(second, first);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failed_enrichment_is_never_cached() {
        let mut pool = MemoryPool::new();
        let mut cache = cache(&mut pool);
        let enricher = |text: &str, _: &str| -> Result<EnrichedPayload, EnrichError> {
            Err(EnrichError::NotFound { text: text.into() })
        };

        let err = cache.get_or_fetch(&key("ghost"), &enricher).unwrap_err();
        assert!(matches!(err, EnrichError::NotFound { .. }));
        assert_eq!(cache.stats().unwrap().total_entries, 0);
    }

    #[test]
    fn unavailable_pool_degrades_to_direct_fetch() {
        let mut pool = MemoryPool::new();
        pool.set_unavailable(true);
        let mut cache = cache(&mut pool);
        let enricher = |_: &str, _: &str| -> Result<EnrichedPayload, EnrichError> {
            Ok(EnrichedPayload {
                translation: Some("Xin chào".into()),
                ..Default::default()
            })
        };

        let payload = cache.get_or_fetch(&key("hello"), &enricher).unwrap();
        assert_eq!(payload.translation.as_deref(), Some("Xin chào"));
    }
}
