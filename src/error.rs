//! Error taxonomy shared across the pipeline.
//!
//! Each variant corresponds to one of the error kinds in the discovery
//! design: contract loading, network I/O, per-candidate validation,
//! whole-run discovery failure, mirror writes, and registry reads/writes.
//! Per-candidate `ValidationError`s are swallowed by the validator itself
//! (so one broken link never aborts a run) and never reach this type; the
//! other kinds propagate to the use case and out to the CLI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("unexpected error contacting {url}: {message}")]
    Other { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("no contract found for key '{0}'")]
    NotFound(String),

    #[error("contract '{key}' is missing required field '{field}'")]
    MissingField { key: String, field: String },

    #[error("contract '{key}' has no start_urls and no known_urls")]
    EmptyStartUrls { key: String },

    #[error("failed to read contracts from {path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed contract stanza near line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("crawl for key '{key}' produced no acceptable candidates")]
    NoCandidates { key: String },

    #[error("no discoverer registered for key '{0}'")]
    NoDiscoverer(String),
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("failed to create mirror directory {path}: {message}")]
    CreateDir { path: String, message: String },

    #[error("failed to write mirror file {path}: {message}")]
    Write { path: String, message: String },

    #[error("failed to finalize mirror file {path}: {message}")]
    Finalize { path: String, message: String },

    #[error("download for mirroring failed: {0}")]
    Download(#[from] NetworkError),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry at {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to write registry at {path}: {message}")]
    Write { path: String, message: String },

    #[error("registry document at {path} is not valid JSON: {message}")]
    Corrupt { path: String, message: String },
}

/// Top-level error type returned by use cases and surfaced to the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Mirror(#[from] MirrorError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl AppError {
    /// Structured error kind, logged as a field and useful for tests that
    /// assert on failure category without matching the full message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Contract(_) => "contract",
            AppError::Network(_) => "network",
            AppError::Discovery(_) => "discovery",
            AppError::Mirror(_) => "mirror",
            AppError::Registry(_) => "registry",
        }
    }
}
