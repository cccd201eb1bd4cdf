//! Selector (C8): choose the single winning candidate from a validated set.

use chrono::{DateTime, Utc};

use crate::domain::{Contract, MatchPatterns, NewestByStrategy, ValidatedCandidate};

use super::versioning::{date_from_filename, year_month_from_spanish_month};

/// Rank of the first preferred extension `candidate` matches (lower is
/// better); candidates matching no preferred extension rank last, and an
/// empty `prefer_ext` puts every candidate in the same rank (spec.md §4.6
/// step 1 — this must dominate the date comparison in step 2, not merely
/// break ties within it).
fn extension_rank(candidate: &ValidatedCandidate, prefer_ext: &[String]) -> usize {
    if prefer_ext.is_empty() {
        return 0;
    }
    let path_lower = candidate.url().path().to_lowercase();
    prefer_ext
        .iter()
        .position(|ext| path_lower.ends_with(&format!(".{}", ext.to_lowercase())))
        .unwrap_or(prefer_ext.len())
}

/// A sortable date key: candidates without a usable date sort as `-∞`.
fn date_key(candidate: &ValidatedCandidate, strategy: NewestByStrategy, matching: &MatchPatterns) -> Option<DateTime<Utc>> {
    match strategy {
        NewestByStrategy::LastModified => candidate.last_modified,
        NewestByStrategy::DateFromFilenameOrLastModified => {
            date_from_filename(candidate.filename(), matching)
                .and_then(|v| parse_version_date(&v))
                .or(candidate.last_modified)
        }
        NewestByStrategy::BestEffortDateOrLastModified => {
            year_month_from_spanish_month(candidate.filename())
                .and_then(|ym| parse_year_month(&ym))
                .or_else(|| date_from_filename(candidate.filename(), matching).and_then(|v| parse_version_date(&v)))
                .or(candidate.last_modified)
        }
    }
}

fn parse_version_date(v: &str) -> Option<DateTime<Utc>> {
    let stripped = v.strip_prefix('v').unwrap_or(v);
    chrono::NaiveDate::parse_from_str(stripped, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

fn parse_year_month(v: &str) -> Option<DateTime<Utc>> {
    let with_day = format!("{v}-01");
    chrono::NaiveDate::parse_from_str(&with_day, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

/// Select the winning candidate from a non-empty validated set (spec.md
/// §4.6). Returns `None` only when `candidates` is empty.
pub fn select(candidates: Vec<ValidatedCandidate>, contract: &Contract) -> Option<ValidatedCandidate> {
    if candidates.is_empty() {
        return None;
    }
    if candidates.len() == 1 {
        return candidates.into_iter().next();
    }

    let strategy = contract
        .select
        .newest_by
        .unwrap_or(NewestByStrategy::LastModified);

    // Extension preference is the dominant key (spec.md §4.6 step 1): a
    // candidate in an earlier bucket always wins over one in a later bucket,
    // regardless of date. Date (descending) only breaks ties within a
    // bucket, and original order only breaks ties within equal dates.
    let mut indexed: Vec<(usize, ValidatedCandidate)> = candidates.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        let ra = extension_rank(a, &contract.select.prefer_ext);
        let rb = extension_rank(b, &contract.select.prefer_ext);
        let da = date_key(a, strategy, &contract.matching);
        let db = date_key(b, strategy, &contract.matching);
        ra.cmp(&rb).then_with(|| db.cmp(&da)).then(ia.cmp(ib))
    });

    indexed.into_iter().next().map(|(_, c)| c)
}
