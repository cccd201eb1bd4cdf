//! The source contract: a declarative description of how to discover,
//! accept, and version a single source's artifact.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::value_objects::SourceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Html,
    Api,
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub allow_domains: Vec<String>,
    pub allow_paths_any: Vec<String>,
    pub max_depth: u32,
    pub max_candidates: usize,
}

impl Scope {
    /// Does `host` match an allowed domain exactly or as a subdomain?
    pub fn allows_host(&self, host: &str) -> bool {
        if self.allow_domains.is_empty() {
            return true;
        }
        self.allow_domains.iter().any(|domain| {
            host == domain.as_str() || host.ends_with(&format!(".{domain}"))
        })
    }

    /// Does `path` start with one of the allowed prefixes?
    pub fn allows_path(&self, path: &str) -> bool {
        if self.allow_paths_any.is_empty() {
            return true;
        }
        self.allow_paths_any.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Find {
    pub link_text_any: Vec<String>,
    pub url_tokens_any: Vec<String>,
}

impl Find {
    pub fn is_empty(&self) -> bool {
        self.link_text_any.is_empty() && self.url_tokens_any.is_empty()
    }

    pub fn accepts(&self, anchor_text: &str, url: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let text_lower = anchor_text.to_lowercase();
        let url_lower = url.to_lowercase();
        self.link_text_any.iter().any(|t| text_lower.contains(&t.to_lowercase()))
            || self.url_tokens_any.iter().any(|t| url_lower.contains(&t.to_lowercase()))
    }
}

/// Named regex patterns used to recognize a candidate's filename/URL shape
/// and, for those with a capture group, to pull a date out of it.
#[derive(Debug, Clone, Default)]
pub struct MatchPatterns {
    pub patterns: Vec<Regex>,
}

impl MatchPatterns {
    /// Try each pattern against `filename`, returning the first capture
    /// group from the first pattern that matches.
    pub fn first_capture(&self, filename: &str) -> Option<String> {
        for pattern in &self.patterns {
            if let Some(captures) = pattern.captures(filename) {
                if let Some(group) = captures.get(1) {
                    return Some(group.as_str().to_string());
                }
                return Some(captures.get(0).unwrap().as_str().to_string());
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewestByStrategy {
    LastModified,
    DateFromFilenameOrLastModified,
    BestEffortDateOrLastModified,
}

#[derive(Debug, Clone, Default)]
pub struct Select {
    pub prefer_ext: Vec<String>,
    pub newest_by: Option<NewestByStrategy>,
}

#[derive(Debug, Clone, Default)]
pub struct Expect {
    pub mime_any: Vec<String>,
    pub min_size_kb: f64,
    pub max_age_days: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningStrategy {
    DateToday,
    DateFromFilenameOrLastModified,
    BestEffortDateOrLastModified,
    None,
}

#[derive(Debug, Clone)]
pub struct Contract {
    pub key: SourceKey,
    pub source_type: SourceType,
    pub start_urls: Vec<String>,
    pub known_urls: Vec<String>,
    pub scope: Scope,
    pub find: Find,
    pub matching: MatchPatterns,
    pub select: Select,
    pub expect: Expect,
    pub versioning: VersioningStrategy,
    pub mirror: bool,
    /// Whether candidate deduplication should ignore the URL's query string.
    /// Resolves the open question in spec.md §9 as a per-contract opt-in,
    /// defaulting to `false` (query strings are significant).
    pub dedupe_ignore_query: bool,
}

impl Contract {
    /// Apply `--fast`: cap depth and candidate count to 1.
    pub fn with_fast_mode(mut self, fast: bool) -> Self {
        if fast {
            self.scope.max_depth = 1;
            self.scope.max_candidates = 1;
        }
        self
    }
}
