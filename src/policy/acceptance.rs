//! Acceptance predicates (part of C7): the MIME/size/age/HTML-rejection
//! rules a validated candidate must satisfy.

use chrono::{DateTime, Utc};

use crate::domain::{Expect, MimeType, SizeKb};

const ATTACHMENT_FLOOR_KB: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Accepted, but exactly one soft constraint (size or age) was missed.
    AcceptSuspect,
    Reject,
}

/// Apply the acceptance rules in spec.md §4.5 order: HTML rejection first
/// (unless the response carried an attachment disposition and met the
/// floor size), then MIME, then size, then age.
pub fn evaluate(
    mime: &MimeType,
    size_kb: SizeKb,
    last_modified: Option<DateTime<Utc>>,
    has_attachment_disposition: bool,
    expect: &Expect,
    now: DateTime<Utc>,
) -> Verdict {
    if mime.is_html_like() {
        if has_attachment_disposition && size_kb.value() >= ATTACHMENT_FLOOR_KB {
            return Verdict::Accept;
        }
        return Verdict::Reject;
    }

    let mime_ok = expect.mime_any.is_empty() || mime.matches_any(&expect.mime_any);
    if !mime_ok {
        return Verdict::Reject;
    }

    let size_ok = expect.min_size_kb <= 0.0 || size_kb.value() >= expect.min_size_kb;

    let age_ok = match (expect.max_age_days, last_modified) {
        (Some(max_days), Some(lm)) => (now - lm).num_days() <= max_days,
        _ => true,
    };

    match (size_ok, age_ok) {
        (true, true) => Verdict::Accept,
        (false, true) | (true, false) => Verdict::AcceptSuspect,
        (false, false) => Verdict::Reject,
    }
}
