//! Ranker (C6): pure heuristic scoring of crawl candidates.
//!
//! Scores are informational only — the selector, not the ranker, makes the
//! final choice (spec.md §4.4). Ranking only reorders a candidate list; it
//! never drops one.

use crate::domain::{Candidate, Contract, MatchPatterns};

/// Filename extensions that always earn the base "looks like a document"
/// bonus.
const DOCUMENT_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "pdf"];

/// Score one candidate against its contract's strong tokens and date
/// patterns, per spec.md §4.4:
/// - +30 if the filename ends in a known document extension
/// - +10 per strong token occurring anywhere in the URL
/// - +20 if the filename yields a parseable date under any contract regex
/// - +5 per strong token found specifically in the URL path
/// clamped to 100.
pub fn score(candidate: &Candidate, strong_tokens: &[String], matching: &MatchPatterns) -> u8 {
    let mut total: i32 = 0;
    let filename_lower = candidate.filename.to_lowercase();
    let url_lower = candidate.url.as_str().to_lowercase();
    let path_lower = candidate.url.path().to_lowercase();

    if DOCUMENT_EXTENSIONS.iter().any(|ext| filename_lower.ends_with(ext)) {
        total += 30;
    }

    for token in strong_tokens {
        let token_lower = token.to_lowercase();
        if url_lower.contains(&token_lower) {
            total += 10;
        }
        if path_lower.contains(&token_lower) {
            total += 5;
        }
    }

    if matching.first_capture(&candidate.filename).is_some() {
        total += 20;
    }

    total.clamp(0, 100) as u8
}

/// Rank a list of candidates, scoring each and sorting descending. Ties
/// keep their original crawl order (a stable sort on a descending score
/// key achieves this).
pub fn rank(mut candidates: Vec<Candidate>, strong_tokens: &[String], contract: &Contract) -> Vec<Candidate> {
    for candidate in &mut candidates {
        candidate.score = score(candidate, strong_tokens, &contract.matching);
    }
    candidates.sort_by(|a, b| b.score.cmp(&a.score).then(a.crawl_order.cmp(&b.crawl_order)));
    candidates
}
