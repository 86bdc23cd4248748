//! Domain types for the vocab capture store.
//!
//! This crate holds the pure data model shared by the storage layer and any
//! frontend: vocabulary entries with their merge semantics, derived
//! statistics with the calendar/streak rules, and user settings with their
//! defaults. Nothing here touches persistence.
//!
//! # Modules
//!
//! - [`entry`]: [`VocabEntry`], drafts, and explicit patch/merge types
//! - [`stats`]: [`Statistics`] and the pure streak/calendar helpers
//! - [`settings`]: [`Settings`] record with defaults and patch merging

pub mod entry;
pub mod settings;
pub mod stats;

// Re-export key types for ergonomic use.
pub use entry::{
    normalize_text, EntryDraft, EntryId, EntryMetadata, EntryPatch, MetadataPatch, PageSource,
    VocabEntry, WordKind,
};
pub use settings::{Settings, SettingsPatch};
pub use stats::Statistics;
