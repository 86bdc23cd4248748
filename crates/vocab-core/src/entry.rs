//! Vocabulary entry types and explicit merge semantics.
//!
//! A [`VocabEntry`] is one captured word or phrase. Identity for
//! deduplication is the case-insensitive captured text (see
//! [`normalize_text`]); identity for updates and deletes is the immutable
//! [`EntryId`] assigned at creation.
//!
//! Merging is spelled out field by field rather than done with a blanket
//! overlay: [`VocabEntry::merge_draft`] is the re-save path (candidate wins)
//! and [`VocabEntry::apply_patch`] is the partial-update path with a
//! deep-merged metadata sub-object.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical form of captured text used for dedup comparison and cache keys:
/// trimmed and lowercased.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Unique identifier for a stored entry, assigned at creation and never
/// reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Allocates a fresh random identifier.
    pub fn new() -> Self {
        EntryId(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EntryId(Uuid::parse_str(s)?))
    }
}

/// Whether an entry is a single word or a multi-word phrase.
///
/// The ordering (words before phrases) is what the `Kind` display sort uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WordKind {
    SingleWord,
    Phrase,
}

impl WordKind {
    /// Classifies raw captured text: any interior whitespace makes a phrase.
    pub fn classify(text: &str) -> Self {
        if text.trim().split_whitespace().count() > 1 {
            WordKind::Phrase
        } else {
            WordKind::SingleWord
        }
    }
}

/// Where an entry was captured from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSource {
    pub url: Option<String>,
    pub title: Option<String>,
    pub domain: Option<String>,
}

/// Bookkeeping attached to every entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Set on creation, refreshed on every re-save.
    pub date_saved: DateTime<Utc>,
    /// Number of re-saves of the same text (0 for a first save).
    pub review_count: u32,
    pub is_reviewed: bool,
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl EntryMetadata {
    fn new(now: DateTime<Utc>) -> Self {
        EntryMetadata {
            date_saved: now,
            review_count: 0,
            is_reviewed: false,
            last_reviewed: None,
        }
    }
}

/// One captured word or phrase with its enrichment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub id: EntryId,
    /// Original captured string. Dedup compares its normalized form.
    pub text: String,
    pub kind: WordKind,
    pub phonetic: Option<String>,
    /// Reference to pronunciation audio (a URL in practice).
    pub audio: Option<String>,
    /// Primary dictionary meaning.
    pub meaning: Option<String>,
    pub translation: Option<String>,
    /// Surrounding-text snippet captured at save time.
    pub context: Option<String>,
    pub source: Option<PageSource>,
    pub metadata: EntryMetadata,
}

impl VocabEntry {
    /// Builds a brand-new entry from a draft with a fresh id and default
    /// metadata.
    pub fn from_draft(draft: EntryDraft, now: DateTime<Utc>) -> Self {
        let kind = WordKind::classify(&draft.text);
        VocabEntry {
            id: EntryId::new(),
            text: draft.text,
            kind,
            phonetic: draft.phonetic,
            audio: draft.audio,
            meaning: draft.meaning,
            translation: draft.translation,
            context: draft.context,
            source: draft.source,
            metadata: EntryMetadata::new(now),
        }
    }

    /// Re-save merge: the candidate wins every conflict, including the
    /// stored `text` itself (its casing is replaced by the candidate's).
    /// Fields absent from the draft keep their stored values. The save
    /// timestamp is refreshed and the review counter bumped.
    pub fn merge_draft(&mut self, draft: EntryDraft, now: DateTime<Utc>) {
        self.kind = WordKind::classify(&draft.text);
        self.text = draft.text;
        if draft.phonetic.is_some() {
            self.phonetic = draft.phonetic;
        }
        if draft.audio.is_some() {
            self.audio = draft.audio;
        }
        if draft.meaning.is_some() {
            self.meaning = draft.meaning;
        }
        if draft.translation.is_some() {
            self.translation = draft.translation;
        }
        if draft.context.is_some() {
            self.context = draft.context;
        }
        if draft.source.is_some() {
            self.source = draft.source;
        }
        self.metadata.date_saved = now;
        self.metadata.review_count += 1;
    }

    /// Partial update: top-level fields are overwritten when present in the
    /// patch; the metadata sub-object is deep-merged field by field.
    pub fn apply_patch(&mut self, patch: EntryPatch) {
        if let Some(text) = patch.text {
            self.kind = WordKind::classify(&text);
            self.text = text;
        }
        if patch.phonetic.is_some() {
            self.phonetic = patch.phonetic;
        }
        if patch.audio.is_some() {
            self.audio = patch.audio;
        }
        if patch.meaning.is_some() {
            self.meaning = patch.meaning;
        }
        if patch.translation.is_some() {
            self.translation = patch.translation;
        }
        if patch.context.is_some() {
            self.context = patch.context;
        }
        if patch.source.is_some() {
            self.source = patch.source;
        }
        if let Some(meta) = patch.metadata {
            if let Some(date_saved) = meta.date_saved {
                self.metadata.date_saved = date_saved;
            }
            if let Some(review_count) = meta.review_count {
                self.metadata.review_count = review_count;
            }
            if let Some(is_reviewed) = meta.is_reviewed {
                self.metadata.is_reviewed = is_reviewed;
            }
            if meta.last_reviewed.is_some() {
                self.metadata.last_reviewed = meta.last_reviewed;
            }
        }
    }

    /// True when the entry's normalized text equals `normalized`.
    pub fn matches_text(&self, normalized: &str) -> bool {
        normalize_text(&self.text) == normalized
    }
}

/// Candidate entry as captured by a caller, before identity and metadata
/// are assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    pub text: String,
    pub phonetic: Option<String>,
    pub audio: Option<String>,
    pub meaning: Option<String>,
    pub translation: Option<String>,
    pub context: Option<String>,
    pub source: Option<PageSource>,
}

impl EntryDraft {
    pub fn new(text: impl Into<String>) -> Self {
        EntryDraft {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Partial update for [`VocabEntry::apply_patch`]. Every field is optional;
/// absent fields leave the entry untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPatch {
    pub text: Option<String>,
    pub phonetic: Option<String>,
    pub audio: Option<String>,
    pub meaning: Option<String>,
    pub translation: Option<String>,
    pub context: Option<String>,
    pub source: Option<PageSource>,
    pub metadata: Option<MetadataPatch>,
}

/// Deep-merge patch for the metadata sub-object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataPatch {
    pub date_saved: Option<DateTime<Utc>>,
    pub review_count: Option<u32>,
    pub is_reviewed: Option<bool>,
    pub last_reviewed: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_text("  Hello "), "hello");
        assert_eq!(normalize_text("Xin Chào"), "xin chào");
    }

    #[test]
    fn classify_word_vs_phrase() {
        assert_eq!(WordKind::classify("serendipity"), WordKind::SingleWord);
        assert_eq!(WordKind::classify("  break a leg "), WordKind::Phrase);
        assert_eq!(WordKind::classify(" one "), WordKind::SingleWord);
    }

    #[test]
    fn from_draft_assigns_default_metadata() {
        let now = Utc::now();
        let entry = VocabEntry::from_draft(EntryDraft::new("hello"), now);
        assert_eq!(entry.metadata.review_count, 0);
        assert!(!entry.metadata.is_reviewed);
        assert!(entry.metadata.last_reviewed.is_none());
        assert_eq!(entry.metadata.date_saved, now);
    }

    #[test]
    fn merge_draft_candidate_wins_and_bumps_counter() {
        let t0 = Utc::now();
        let mut entry = VocabEntry::from_draft(
            EntryDraft {
                text: "Hello".into(),
                meaning: Some("a greeting".into()),
                ..Default::default()
            },
            t0,
        );
        let original_id = entry.id;

        let t1 = t0 + chrono::Duration::seconds(5);
        let mut draft = EntryDraft::new("hello");
        draft.translation = Some("Xin chào".into());
        entry.merge_draft(draft, t1);

        // Candidate text overwrites the stored casing; untouched fields survive.
        assert_eq!(entry.id, original_id);
        assert_eq!(entry.text, "hello");
        assert_eq!(entry.meaning.as_deref(), Some("a greeting"));
        assert_eq!(entry.translation.as_deref(), Some("Xin chào"));
        assert_eq!(entry.metadata.review_count, 1);
        assert_eq!(entry.metadata.date_saved, t1);
    }

    #[test]
    fn apply_patch_deep_merges_metadata() {
        let now = Utc::now();
        let mut entry = VocabEntry::from_draft(EntryDraft::new("hello"), now);
        entry.metadata.review_count = 3;

        entry.apply_patch(EntryPatch {
            metadata: Some(MetadataPatch {
                is_reviewed: Some(true),
                last_reviewed: Some(now),
                ..Default::default()
            }),
            ..Default::default()
        });

        // Untouched metadata fields survive the deep merge.
        assert_eq!(entry.metadata.review_count, 3);
        assert!(entry.metadata.is_reviewed);
        assert_eq!(entry.metadata.last_reviewed, Some(now));
    }

    #[test]
    fn patch_with_text_reclassifies_kind() {
        let now = Utc::now();
        let mut entry = VocabEntry::from_draft(EntryDraft::new("hello"), now);
        assert_eq!(entry.kind, WordKind::SingleWord);

        entry.apply_patch(EntryPatch {
            text: Some("hello there".into()),
            ..Default::default()
        });
        assert_eq!(entry.kind, WordKind::Phrase);
    }

    #[test]
    fn entry_id_parse_roundtrip() {
        let id = EntryId::new();
        let parsed: EntryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_roundtrip() {
        let entry = VocabEntry::from_draft(EntryDraft::new("hello"), Utc::now());
        let json = serde_json::to_string(&entry).unwrap();
        let back: VocabEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
