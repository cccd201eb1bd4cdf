//! Versioning (C9): deterministic policy functions deriving a canonical
//! version string from a filename, headers, and contract regexes.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::domain::{Contract, MatchPatterns, Version, VersioningStrategy};

/// Spanish month names (full and common three-letter abbreviations) mapped
/// to their numeric month.
const SPANISH_MONTHS: &[(&str, &str)] = &[
    ("enero", "01"),
    ("febrero", "02"),
    ("marzo", "03"),
    ("abril", "04"),
    ("mayo", "05"),
    ("junio", "06"),
    ("julio", "07"),
    ("agosto", "08"),
    ("septiembre", "09"),
    ("octubre", "10"),
    ("noviembre", "11"),
    ("diciembre", "12"),
    ("ene", "01"),
    ("feb", "02"),
    ("mar", "03"),
    ("abr", "04"),
    ("may", "05"),
    ("jun", "06"),
    ("jul", "07"),
    ("ago", "08"),
    ("sep", "09"),
    ("oct", "10"),
    ("nov", "11"),
    ("dic", "12"),
];

fn year_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})").unwrap())
}

fn rem_style_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)REM(\d{2})(\d{2})(\d{2})").unwrap())
}

fn iso_date_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap())
}

fn compact_date_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})(\d{2})(\d{2})").unwrap())
}

/// Extract `vYYYY-MM-DD` from a filename via the contract's regexes (first
/// capture group), falling back to the REM-style `REM<YY><MM><DD>` shape,
/// an ISO date, or a compact `YYYYMMDD` date found anywhere in the name.
pub fn date_from_filename(filename: &str, matching: &MatchPatterns) -> Option<String> {
    if let Some(captures) = rem_style_regex().captures(filename) {
        let yy: u32 = captures[1].parse().ok()?;
        let year = 2000 + yy;
        return Some(format!("v{}-{}-{}", year, &captures[2], &captures[3]));
    }

    if let Some(group) = matching.first_capture(filename) {
        if let Some(c) = iso_date_regex().captures(&group) {
            return Some(format!("v{}-{}-{}", &c[1], &c[2], &c[3]));
        }
        if let Some(c) = compact_date_regex().captures(&group) {
            return Some(format!("v{}-{}-{}", &c[1], &c[2], &c[3]));
        }
    }

    if let Some(c) = iso_date_regex().captures(filename) {
        return Some(format!("v{}-{}-{}", &c[1], &c[2], &c[3]));
    }

    None
}

/// Extract `YYYY-MM` from a Spanish month name plus a nearby four-digit
/// year in the filename.
pub fn year_month_from_spanish_month(filename: &str) -> Option<String> {
    let year = year_regex().captures(filename)?.get(1)?.as_str();
    let lower = filename.to_lowercase();
    for (name, number) in SPANISH_MONTHS {
        if lower.contains(name) {
            return Some(format!("{year}-{number}"));
        }
    }
    None
}

/// Parse an RFC 1123 `Last-Modified` header value into `vYYYY-MM-DD`.
pub fn date_from_last_modified(last_modified: &str) -> Option<String> {
    parse_last_modified(last_modified).map(|dt| format!("v{}", dt.format("%Y-%m-%d")))
}

pub fn parse_last_modified(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn date_from_filename_or_last_modified(
    filename: &str,
    last_modified: Option<&str>,
    matching: &MatchPatterns,
) -> Version {
    if let Some(v) = date_from_filename(filename, matching) {
        return Version::new(v);
    }
    if let Some(lm) = last_modified {
        if let Some(v) = date_from_last_modified(lm) {
            return Version::new(v);
        }
    }
    Version::unknown()
}

fn best_effort_date_or_last_modified(
    filename: &str,
    last_modified: Option<&str>,
    matching: &MatchPatterns,
) -> Version {
    if let Some(v) = year_month_from_spanish_month(filename) {
        return Version::new(v);
    }
    if let Some(v) = date_from_filename(filename, matching) {
        return Version::new(v);
    }
    if let Some(lm) = last_modified {
        if let Some(v) = date_from_last_modified(lm) {
            return Version::new(v);
        }
    }
    Version::unknown()
}

/// `vYYYY-MM-DD` for today, UTC.
pub fn date_today(now: DateTime<Utc>) -> Version {
    Version::new(format!("v{}", now.format("%Y-%m-%d")))
}

/// Derive the canonical version string for a selected candidate, per the
/// contract's versioning strategy.
pub fn derive_version(
    strategy: VersioningStrategy,
    filename: &str,
    last_modified: Option<&str>,
    matching: &MatchPatterns,
    now: DateTime<Utc>,
) -> Version {
    match strategy {
        VersioningStrategy::DateToday => date_today(now),
        VersioningStrategy::DateFromFilenameOrLastModified => {
            date_from_filename_or_last_modified(filename, last_modified, matching)
        }
        VersioningStrategy::BestEffortDateOrLastModified => {
            best_effort_date_or_last_modified(filename, last_modified, matching)
        }
        VersioningStrategy::None => Version::new("none"),
    }
}

/// Convenience wrapper taking a [`Contract`] directly.
pub fn derive_version_for_contract(
    contract: &Contract,
    filename: &str,
    last_modified: Option<&str>,
    now: DateTime<Utc>,
) -> Version {
    derive_version(contract.versioning, filename, last_modified, &contract.matching, now)
}
