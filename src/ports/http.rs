//! HTTP port (C3): the seam between the pipeline and the network.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::NetworkError;

/// Response headers, normalized to lowercase keys, plus status.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into().to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(&key.to_lowercase()).map(|s| s.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    pub fn content_length(&self) -> Option<u64> {
        self.get("content-length").and_then(|v| v.parse().ok())
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.get("last-modified")
    }

    pub fn content_disposition_filename(&self) -> Option<String> {
        let raw = self.get("content-disposition")?;
        parse_content_disposition_filename(raw)
    }

    pub fn has_attachment_disposition(&self) -> bool {
        self.get("content-disposition")
            .map(|v| v.to_lowercase().contains("attachment"))
            .unwrap_or(false)
    }
}

/// Parse `filename="report.pdf"` or `filename*=UTF-8''report.pdf` out of a
/// `Content-Disposition` header value.
pub fn parse_content_disposition_filename(raw: &str) -> Option<String> {
    for part in raw.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("filename*=") {
            let value = value.trim_matches('"');
            let decoded = value.rsplit('\'').next().unwrap_or(value);
            return urlencoding::decode(decoded).ok().map(|s| s.into_owned());
        }
        if let Some(value) = part.strip_prefix("filename=") {
            return Some(value.trim_matches('"').to_string());
        }
    }
    None
}

pub struct HeadResult {
    pub status: u16,
    pub headers: Headers,
}

pub struct GetResult {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

/// A chunked byte stream plus the headers observed before the first chunk.
pub struct StreamResult {
    pub status: u16,
    pub headers: Headers,
    pub chunks: std::pin::Pin<Box<dyn futures::Stream<Item = Result<Bytes, NetworkError>> + Send>>,
}

/// Port over HTTP HEAD/GET/stream with retry, redirect-follow, and
/// per-call timeout semantics baked into the implementation (spec.md §4.1).
#[async_trait]
pub trait HttpPort: Send + Sync {
    async fn head(&self, url: &str) -> Result<HeadResult, NetworkError>;
    async fn get(&self, url: &str) -> Result<GetResult, NetworkError>;
    async fn stream(&self, url: &str) -> Result<StreamResult, NetworkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_filename() {
        let v = parse_content_disposition_filename(r#"attachment; filename="report.pdf""#);
        assert_eq!(v.as_deref(), Some("report.pdf"));
    }

    #[test]
    fn parses_rfc5987_filename_star() {
        let v = parse_content_disposition_filename("attachment; filename*=UTF-8''report%20final.pdf");
        assert_eq!(v.as_deref(), Some("report final.pdf"));
    }

    #[test]
    fn headers_lowercase_keys() {
        let mut h = Headers::new();
        h.insert("Content-Type", "application/pdf");
        assert_eq!(h.content_type(), Some("application/pdf"));
    }
}
