//! Validator (C7): per-candidate HEAD (fallback GET), metadata population,
//! and acceptance.

use tracing::debug;

use crate::domain::{Candidate, Contract, MimeType, SizeKb, ValidatedCandidate};
use crate::policy::acceptance::{self, Verdict};
use crate::policy::versioning::parse_last_modified;
use crate::ports::http::Headers;
use crate::ports::HttpPort;

/// Validate a ranked candidate list, dropping any candidate that fails a
/// required acceptance check. Network and parse errors drop the candidate
/// silently with a debug record (spec.md §4.5) rather than aborting the run.
pub async fn validate_all(candidates: Vec<Candidate>, contract: &Contract, http: &dyn HttpPort) -> Vec<ValidatedCandidate> {
    let mut accepted = Vec::new();
    for candidate in candidates {
        match validate_one(candidate, contract, http).await {
            Some(v) => accepted.push(v),
            None => continue,
        }
    }
    accepted
}

/// Validate a single candidate, returning metadata and the acceptance
/// verdict rather than dropping outright — used by both discovery (which
/// only keeps `Accept`) and `validate_source` revalidation (which keeps
/// `AcceptSuspect` too, recording `suspect` status).
pub async fn validate_one_with_verdict(
    candidate: &Candidate,
    contract: &Contract,
    http: &dyn HttpPort,
) -> Option<(ValidatedCandidate, Verdict)> {
    let url = candidate.url.as_str();

    let (headers, used_get_fallback) = match http.head(url).await {
        Ok(head) if head.status < 400 => (head.headers, false),
        _ => match http.get(url).await {
            Ok(get) => (get.headers, true),
            Err(err) => {
                debug!(url, %err, "validation fetch failed, dropping candidate");
                return None;
            }
        },
    };

    let metadata = metadata_from_headers(&headers);
    let verdict = acceptance::evaluate(
        &metadata.mime,
        metadata.size_kb,
        metadata.last_modified,
        headers.has_attachment_disposition(),
        &contract.expect,
        chrono::Utc::now(),
    );

    let mut notes = candidate.notes.clone();
    if used_get_fallback {
        notes = Some(append_note(notes, "head_failed_get_ok"));
    }

    let validated = ValidatedCandidate {
        candidate: candidate.clone(),
        mime: metadata.mime,
        size_kb: metadata.size_kb,
        last_modified: metadata.last_modified,
        notes,
    };

    Some((validated, verdict))
}

async fn validate_one(candidate: Candidate, contract: &Contract, http: &dyn HttpPort) -> Option<ValidatedCandidate> {
    let (validated, verdict) = validate_one_with_verdict(&candidate, contract, http).await?;
    match verdict {
        Verdict::Accept => Some(validated),
        Verdict::AcceptSuspect | Verdict::Reject => None,
    }
}

struct Metadata {
    mime: MimeType,
    size_kb: SizeKb,
    last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

fn metadata_from_headers(headers: &Headers) -> Metadata {
    let mime = MimeType::parse(headers.content_type().unwrap_or(""));
    let size_kb = SizeKb::from_bytes(headers.content_length().unwrap_or(0));
    let last_modified = headers.last_modified().and_then(parse_last_modified);
    Metadata {
        mime,
        size_kb,
        last_modified,
    }
}

fn append_note(existing: Option<String>, note: &str) -> String {
    match existing {
        Some(existing) if !existing.is_empty() => format!("{existing}; {note}"),
        _ => note.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Expect, Find, MatchPatterns, NormalizedUrl, Scope, Select, SourceKey, SourceType, VersioningStrategy};
    use crate::error::NetworkError;
    use crate::ports::http::{GetResult, HeadResult, StreamResult};
    use async_trait::async_trait;

    struct FakeHttp {
        head_status: Option<u16>,
        head_fails: bool,
        content_type: &'static str,
        content_length: Option<u64>,
    }

    #[async_trait]
    impl HttpPort for FakeHttp {
        async fn head(&self, url: &str) -> Result<HeadResult, NetworkError> {
            if self.head_fails {
                return Err(NetworkError::Status {
                    url: url.to_string(),
                    status: 405,
                });
            }
            let mut headers = Headers::new();
            headers.insert("content-type", self.content_type);
            if let Some(len) = self.content_length {
                headers.insert("content-length", len.to_string());
            }
            Ok(HeadResult {
                status: self.head_status.unwrap_or(200),
                headers,
            })
        }

        async fn get(&self, url: &str) -> Result<GetResult, NetworkError> {
            let mut headers = Headers::new();
            headers.insert("content-type", self.content_type);
            if let Some(len) = self.content_length {
                headers.insert("content-length", len.to_string());
            }
            let _ = url;
            Ok(GetResult {
                status: 200,
                headers,
                body: bytes::Bytes::from_static(b"x"),
            })
        }

        async fn stream(&self, _url: &str) -> Result<StreamResult, NetworkError> {
            unimplemented!()
        }
    }

    fn contract() -> Contract {
        Contract {
            key: SourceKey::new("k"),
            source_type: SourceType::Html,
            start_urls: vec![],
            known_urls: vec![],
            scope: Scope::default(),
            find: Find::default(),
            matching: MatchPatterns::default(),
            select: Select::default(),
            expect: Expect {
                mime_any: vec!["application/pdf".to_string()],
                min_size_kb: 200.0,
                max_age_days: None,
            },
            versioning: VersioningStrategy::None,
            mirror: false,
            dedupe_ignore_query: false,
        }
    }

    fn candidate() -> Candidate {
        Candidate::new(
            SourceKey::new("k"),
            NormalizedUrl::parse("https://example.gov/r.pdf", None).unwrap(),
            "r.pdf".to_string(),
            0,
        )
    }

    #[tokio::test]
    async fn head_unsupported_falls_back_to_get() {
        let http = FakeHttp {
            head_status: None,
            head_fails: true,
            content_type: "application/pdf",
            content_length: Some(300_000),
        };
        let accepted = validate_all(vec![candidate()], &contract(), &http).await;
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].notes.as_deref(), Some("head_failed_get_ok"));
    }

    #[tokio::test]
    async fn drops_candidate_below_min_size() {
        let http = FakeHttp {
            head_status: Some(200),
            head_fails: false,
            content_type: "application/pdf",
            content_length: Some(1024),
        };
        let accepted = validate_all(vec![candidate()], &contract(), &http).await;
        assert!(accepted.is_empty());
    }

    #[tokio::test]
    async fn drops_wrong_mime() {
        let http = FakeHttp {
            head_status: Some(200),
            head_fails: false,
            content_type: "text/html",
            content_length: Some(300_000),
        };
        let accepted = validate_all(vec![candidate()], &contract(), &http).await;
        assert!(accepted.is_empty());
    }
}
