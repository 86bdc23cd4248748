//! Seam for the external enrichment function (dictionary + translation).
//!
//! Network retrieval is out of scope for this crate; callers plug in
//! whatever fetches the data. The [`LookupCache`](crate::cache::LookupCache)
//! wraps an [`Enricher`] as its miss-fill strategy, and failures pass
//! through unmodified -- a failed lookup must never poison the cache with a
//! negative result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Enrichment result for one word or phrase. All fields optional and
/// kind-dependent (phrases typically only get a translation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPayload {
    pub phonetic: Option<String>,
    pub audio: Option<String>,
    pub meaning: Option<String>,
    pub translation: Option<String>,
}

/// Failures an enrichment provider can report. None of these are cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    #[error("no dictionary data found for \"{text}\"")]
    NotFound { text: String },

    #[error("enrichment provider rate limited")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),
}

/// An expensive lookup producing enrichment data for `text` in `locale`.
pub trait Enricher {
    fn enrich(&self, text: &str, locale: &str) -> Result<EnrichedPayload, EnrichError>;
}

// Closures work directly as enrichers, which keeps test fakes terse.
impl<F> Enricher for F
where
    F: Fn(&str, &str) -> Result<EnrichedPayload, EnrichError>,
{
    fn enrich(&self, text: &str, locale: &str) -> Result<EnrichedPayload, EnrichError> {
        self(text, locale)
    }
}
