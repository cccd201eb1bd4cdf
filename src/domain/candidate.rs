//! Transient discovery-run state: raw crawl output and validated metadata.
//!
//! Candidates are immutable; validation produces a new [`ValidatedCandidate`]
//! rather than mutating a candidate in place (§9 redesign note).

use chrono::{DateTime, Utc};

use super::value_objects::{MimeType, NormalizedUrl, SizeKb, SourceKey};

/// A URL encountered during crawl that might be the target artifact.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub key: SourceKey,
    pub url: NormalizedUrl,
    pub filename: String,
    pub score: u8,
    pub notes: Option<String>,
    /// Position in crawl order, used as the final tiebreaker when two
    /// candidates are otherwise equal (spec.md §8 boundary behavior).
    pub crawl_order: usize,
}

impl Candidate {
    pub fn new(key: SourceKey, url: NormalizedUrl, filename: String, crawl_order: usize) -> Self {
        Self {
            key,
            url,
            filename,
            score: 0,
            notes: None,
            crawl_order,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes = Some(note.into());
        self
    }
}

/// A candidate extended with metadata populated by the validator.
#[derive(Debug, Clone)]
pub struct ValidatedCandidate {
    pub candidate: Candidate,
    pub mime: MimeType,
    pub size_kb: SizeKb,
    pub last_modified: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl ValidatedCandidate {
    pub fn url(&self) -> &NormalizedUrl {
        &self.candidate.url
    }

    pub fn filename(&self) -> &str {
        &self.candidate.filename
    }

    pub fn score(&self) -> u8 {
        self.candidate.score
    }
}
