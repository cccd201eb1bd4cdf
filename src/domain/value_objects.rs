//! Validated, normalized value types shared across the pipeline.
//!
//! These are intentionally thin: validation happens once at construction so
//! downstream code can treat the inner value as trustworthy.

use std::fmt;

use url::Url as ParsedUrl;

/// A stable string identifier for a logical source, independent of its
/// current URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SourceKey(String);

impl SourceKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A normalized, absolute URL.
///
/// Normalization percent-encodes each path segment individually (preserving
/// `/` as the separator) and strips fragments, matching the HTML port
/// contract. Normalization is idempotent: `normalize(normalize(u)) == normalize(u)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Parse and normalize a URL string, resolving it against an optional
    /// base URL first.
    pub fn parse(raw: &str, base: Option<&str>) -> Result<Self, url::ParseError> {
        let parsed = match base {
            Some(base) => {
                let base = ParsedUrl::parse(base)?;
                base.join(raw)?
            }
            None => ParsedUrl::parse(raw)?,
        };
        Ok(Self::from_parsed(parsed))
    }

    fn from_parsed(mut parsed: ParsedUrl) -> Self {
        parsed.set_fragment(None);
        let encoded_path = encode_path_segments(parsed.path());
        parsed.set_path(&encoded_path);
        Self(parsed.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn host(&self) -> Option<String> {
        ParsedUrl::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
    }

    pub fn path(&self) -> String {
        ParsedUrl::parse(&self.0)
            .map(|u| u.path().to_string())
            .unwrap_or_default()
    }

    /// Last path segment, percent-decoded, falling back to `"file"` when the
    /// path has no meaningful final segment (matches the crawler's filename
    /// fallback rule).
    pub fn filename(&self) -> String {
        let path = self.path();
        let last = path.rsplit('/').find(|s| !s.is_empty());
        match last {
            Some(segment) => urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string()),
            None => "file".to_string(),
        }
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Percent-encode each `/`-delimited path segment independently, preserving
/// the separators and leaving already-encoded segments untouched where
/// possible (re-decoding then re-encoding is what makes this idempotent).
fn encode_path_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            urlencoding::encode(&decoded).into_owned()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A 64-character lowercase hex SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    pub fn new(hex: impl Into<String>) -> Result<Self, String> {
        let hex = hex.into().to_lowercase();
        if hex.len() != 64 {
            return Err(format!("sha256 must be 64 hex characters, got {}", hex.len()));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("sha256 must contain only hex characters".to_string());
        }
        Ok(Self(hex))
    }

    pub fn from_bytes(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A MIME type with charset/boundary parameters stripped and the value
/// lowercased.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MimeType(String);

impl MimeType {
    pub fn parse(raw: &str) -> Self {
        let stripped = raw.split(';').next().unwrap_or(raw).trim().to_lowercase();
        Self(stripped)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches_any(&self, expected: &[String]) -> bool {
        expected.iter().any(|e| e.to_lowercase() == self.0)
    }

    pub fn is_html_like(&self) -> bool {
        matches!(
            self.0.as_str(),
            "text/html" | "text/plain" | "application/xhtml+xml"
        )
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative size in kilobytes, rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct SizeKb(f64);

impl SizeKb {
    pub fn from_bytes(bytes: u64) -> Self {
        Self::new(bytes as f64 / 1024.0)
    }

    pub fn new(value: f64) -> Self {
        let clamped = value.max(0.0);
        Self((clamped * 100.0).round() / 100.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// A canonical version string, produced by a [`crate::policy::versioning`]
/// strategy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Version(String);

impl Version {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
