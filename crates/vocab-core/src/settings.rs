//! User-facing configuration record.
//!
//! Settings live in the small storage pool and are read by the record store
//! (word cap) and the lookup cache (TTL, enabled flag) as configuration, not
//! constants. `#[serde(default)]` keeps old persisted records loadable when
//! fields are added.

use serde::{Deserialize, Serialize};

/// Configuration knobs the data layer consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Target language for translations (BCP 47-ish code).
    pub user_language: String,
    /// Hard cap on stored entries; oldest beyond it are dropped.
    pub max_words: usize,
    /// Longest capture accepted as a phrase, in characters.
    pub max_phrase_length: usize,
    pub cache_enabled: bool,
    pub cache_ttl_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            user_language: "vi".into(),
            max_words: 200,
            max_phrase_length: 50,
            cache_enabled: true,
            cache_ttl_days: 7,
        }
    }
}

impl Settings {
    /// Cache TTL as a duration.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_ttl_days)
    }

    /// Overlays the fields present in `patch`.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(user_language) = patch.user_language {
            self.user_language = user_language;
        }
        if let Some(max_words) = patch.max_words {
            self.max_words = max_words;
        }
        if let Some(max_phrase_length) = patch.max_phrase_length {
            self.max_phrase_length = max_phrase_length;
        }
        if let Some(cache_enabled) = patch.cache_enabled {
            self.cache_enabled = cache_enabled;
        }
        if let Some(cache_ttl_days) = patch.cache_ttl_days {
            self.cache_ttl_days = cache_ttl_days;
        }
    }
}

/// Partial settings update; absent fields keep their current values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub user_language: Option<String>,
    pub max_words: Option<usize>,
    pub max_phrase_length: Option<usize>,
    pub cache_enabled: Option<bool>,
    pub cache_ttl_days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.user_language, "vi");
        assert_eq!(s.max_words, 200);
        assert!(s.cache_enabled);
        assert_eq!(s.cache_ttl(), chrono::Duration::days(7));
    }

    #[test]
    fn apply_overlays_present_fields_only() {
        let mut s = Settings::default();
        s.apply(SettingsPatch {
            max_words: Some(50),
            cache_enabled: Some(false),
            ..Default::default()
        });
        assert_eq!(s.max_words, 50);
        assert!(!s.cache_enabled);
        assert_eq!(s.user_language, "vi");
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let s: Settings = serde_json::from_str(r#"{"max_words": 10}"#).unwrap();
        assert_eq!(s.max_words, 10);
        assert_eq!(s.cache_ttl_days, 7);
    }
}
