//! The record store: an ordered, deduplicated, capacity-capped collection
//! of vocabulary entries.
//!
//! [`WordStore`] is a borrowed view over the large pool; every operation
//! reads the full collection at the `words` key, mutates in memory, and
//! writes it back. Dedup identity is the case-insensitive text; the cap
//! eviction step always runs on save-date order so "oldest is dropped"
//! holds no matter which display sort a frontend selects.
//!
//! Mutations that change membership trigger a statistics recompute.

use chrono::{DateTime, Utc};
use vocab_core::{normalize_text, EntryDraft, EntryId, EntryPatch, MetadataPatch, VocabEntry};

use crate::error::StorageError;
use crate::keys;
use crate::stats;
use crate::traits::{read_or_default, StoragePool};

/// Selectable display orderings for [`WordStore::list_sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Newest `date_saved` first (the persisted order).
    Date,
    /// Ascending by normalized text.
    Alphabetical,
    /// Single words before phrases, then by normalized text.
    Kind,
}

/// Borrowed view over the large pool exposing the record-store operations.
pub struct WordStore<'a, P: StoragePool> {
    pool: &'a mut P,
    max_words: usize,
}

impl<'a, P: StoragePool> WordStore<'a, P> {
    /// Wraps `pool` with the configured entry cap (see
    /// [`vocab_core::Settings::max_words`]).
    pub fn new(pool: &'a mut P, max_words: usize) -> Self {
        WordStore { pool, max_words }
    }

    fn load(&self) -> Result<Vec<VocabEntry>, StorageError> {
        read_or_default(self.pool, keys::WORDS)
    }

    fn persist(&mut self, entries: &[VocabEntry]) -> Result<(), StorageError> {
        self.pool.set_value(keys::WORDS, &entries)
    }

    /// Insert-or-merge keyed by normalized text, then re-sort newest-first
    /// and truncate to the cap. Returns the stored entry.
    pub fn upsert(&mut self, draft: EntryDraft) -> Result<VocabEntry, StorageError> {
        self.upsert_at(draft, Utc::now())
    }

    /// [`WordStore::upsert`] with an explicit clock, for deterministic tests.
    pub fn upsert_at(
        &mut self,
        draft: EntryDraft,
        now: DateTime<Utc>,
    ) -> Result<VocabEntry, StorageError> {
        let mut entries = self.load()?;
        let needle = normalize_text(&draft.text);

        let stored = match entries.iter_mut().find(|e| e.matches_text(&needle)) {
            Some(existing) => {
                existing.merge_draft(draft, now);
                existing.clone()
            }
            None => {
                let entry = VocabEntry::from_draft(draft, now);
                entries.push(entry.clone());
                entry
            }
        };

        // Cap eviction always runs on date order, independent of any
        // display sort.
        entries.sort_by(|a, b| b.metadata.date_saved.cmp(&a.metadata.date_saved));
        if entries.len() > self.max_words {
            let dropped = entries.split_off(self.max_words);
            tracing::debug!(count = dropped.len(), "dropped oldest entries beyond cap");
        }

        self.persist(&entries)?;
        stats::recompute_at(self.pool, now)?;
        Ok(stored)
    }

    /// Applies a partial update to the entry with `id`. Returns false (and
    /// writes nothing) when the id is absent.
    pub fn update(&mut self, id: EntryId, patch: EntryPatch) -> Result<bool, StorageError> {
        let mut entries = self.load()?;
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.apply_patch(patch);
                self.persist(&entries)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the entry with `id`. Returns false when absent.
    pub fn delete(&mut self, id: EntryId) -> Result<bool, StorageError> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.persist(&entries)?;
        stats::recompute(self.pool)?;
        Ok(true)
    }

    /// Fetches a single entry by id.
    pub fn get(&self, id: EntryId) -> Result<Option<VocabEntry>, StorageError> {
        Ok(self.load()?.into_iter().find(|e| e.id == id))
    }

    /// Current collection in persisted (newest-first) order.
    pub fn list(&self) -> Result<Vec<VocabEntry>, StorageError> {
        self.load()
    }

    /// Collection re-sorted for display; the persisted order is untouched.
    pub fn list_sorted(&self, key: SortKey) -> Result<Vec<VocabEntry>, StorageError> {
        let mut entries = self.load()?;
        match key {
            SortKey::Date => {
                entries.sort_by(|a, b| b.metadata.date_saved.cmp(&a.metadata.date_saved));
            }
            SortKey::Alphabetical => {
                entries.sort_by_key(|e| normalize_text(&e.text));
            }
            SortKey::Kind => {
                entries.sort_by_key(|e| (e.kind, normalize_text(&e.text)));
            }
        }
        Ok(entries)
    }

    /// Case-insensitive substring match over text, translation, and context.
    pub fn search(&self, query: &str) -> Result<Vec<VocabEntry>, StorageError> {
        let needle = query.to_lowercase();
        Ok(self
            .load()?
            .into_iter()
            .filter(|e| {
                e.text.to_lowercase().contains(&needle)
                    || e.translation
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
                    || e.context
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// Empties the store and recomputes statistics.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.persist(&[])?;
        stats::recompute(self.pool)?;
        Ok(())
    }

    /// Entries saved within `[start, end]`.
    pub fn saved_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<VocabEntry>, StorageError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|e| e.metadata.date_saved >= start && e.metadata.date_saved <= end)
            .collect())
    }

    /// Entries saved at or after `cutoff`.
    pub fn saved_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<VocabEntry>, StorageError> {
        self.saved_between(cutoff, Utc::now())
    }

    /// Entries not yet marked reviewed.
    pub fn unreviewed(&self) -> Result<Vec<VocabEntry>, StorageError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|e| !e.metadata.is_reviewed)
            .collect())
    }

    /// Marks one entry reviewed, stamping `last_reviewed`. False when the
    /// id is absent.
    pub fn mark_reviewed(&mut self, id: EntryId) -> Result<bool, StorageError> {
        self.update(
            id,
            EntryPatch {
                metadata: Some(MetadataPatch {
                    is_reviewed: Some(true),
                    last_reviewed: Some(Utc::now()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
    }

    /// Flips every entry back to unreviewed (start of a new review round).
    pub fn reset_review_status(&mut self) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        for entry in &mut entries {
            entry.metadata.is_reviewed = false;
        }
        self.persist(&entries)
    }
}
