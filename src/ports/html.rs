//! HTML port (C4): link extraction from fetched page bytes.

use crate::domain::NormalizedUrl;

/// An `(absolute_url, anchor_text)` pair extracted from a page.
#[derive(Debug, Clone)]
pub struct ExtractedLink {
    pub url: NormalizedUrl,
    pub anchor_text: String,
}

/// Port over HTML parsing and link extraction (spec.md §4.2). No content
/// filtering happens here; callers (the crawler) apply the prefilter.
pub trait HtmlPort: Send + Sync {
    fn extract_links(&self, html_bytes: &[u8], base_url: &str) -> Vec<ExtractedLink>;
}
