//! Configuration (C15): an immutable snapshot of the environment, loaded
//! once at startup and passed by value into the components that need it —
//! no process-wide global state (spec.md §9 redesign note).

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub registry_path: PathBuf,
    pub mirror_root: PathBuf,
    pub contracts_path: PathBuf,
    pub http_head_timeout: Duration,
    pub http_get_timeout: Duration,
    pub http_retries: u32,
    pub user_agent: String,
    pub ssl_verify: bool,
    pub remote_endpoint: Option<String>,
    pub remote_token: Option<String>,
    pub sync_concurrency: usize,
}

impl AppConfig {
    /// Load configuration from the process environment, falling back to
    /// the documented defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            registry_path: env_path("AUTODISCOVERY_REGISTRY_PATH", "./data/registry.json"),
            mirror_root: env_path("AUTODISCOVERY_MIRROR_ROOT", "./data/mirrors"),
            contracts_path: env_path("AUTODISCOVERY_CONTRACTS_PATH", "./data/contracts.txt"),
            http_head_timeout: Duration::from_secs(env_u64("AUTODISCOVERY_HTTP_HEAD_TIMEOUT_SECS", 5)),
            http_get_timeout: Duration::from_secs(env_u64("AUTODISCOVERY_HTTP_GET_TIMEOUT_SECS", 10)),
            http_retries: env_u64("AUTODISCOVERY_HTTP_RETRIES", 3) as u32,
            user_agent: std::env::var("AUTODISCOVERY_USER_AGENT").unwrap_or_else(|_| crate::http::USER_AGENT.to_string()),
            ssl_verify: env_bool("AUTODISCOVERY_SSL_VERIFY", true),
            remote_endpoint: non_empty_env("AUTODISCOVERY_REMOTE_ENDPOINT"),
            remote_token: non_empty_env("AUTODISCOVERY_REMOTE_TOKEN"),
            sync_concurrency: env_u64("AUTODISCOVERY_SYNC_CONCURRENCY", 1).max(1) as usize,
        }
    }

    /// Whether the remote mirror adapter should be constructed at all — an
    /// absent endpoint or token silently disables it (spec.md §6).
    pub fn remote_mirror_enabled(&self) -> bool {
        self.remote_endpoint.is_some() && self.remote_token.is_some()
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key).ok().map(|v| v == "true" || v == "1").unwrap_or(default)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
