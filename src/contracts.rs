//! Contracts adapter (C13): a line-oriented stanza format on disk.
//!
//! ```text
//! [key: bcra_rem_pdf]
//! source_type = html
//! start_urls = https://example.gov/publicaciones, https://example.gov/rem
//! scope.allow_domains = example.gov
//! ...
//! ```
//!
//! A blank line ends a stanza. Unknown keys are ignored with a warning so
//! future fields don't break old parsers.

use std::collections::HashMap;
use std::path::PathBuf;

use regex::Regex;
use tracing::warn;

use crate::domain::{
    Contract, Expect, Find, MatchPatterns, NewestByStrategy, Scope, Select, SourceKey, SourceType, VersioningStrategy,
};
use crate::error::ContractError;
use crate::ports::ContractsPort;

pub struct TextFileContracts {
    path: PathBuf,
}

impl TextFileContracts {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContractsPort for TextFileContracts {
    fn load_contracts(&self) -> Result<Vec<Contract>, ContractError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| ContractError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        parse_contracts(&contents)
    }

    fn get_contract(&self, key: &str) -> Result<Contract, ContractError> {
        self.load_contracts()?
            .into_iter()
            .find(|c| c.key.as_str() == key)
            .ok_or_else(|| ContractError::NotFound(key.to_string()))
    }

    fn all_keys(&self) -> Result<Vec<String>, ContractError> {
        Ok(self.load_contracts()?.into_iter().map(|c| c.key.as_str().to_string()).collect())
    }
}

fn parse_contracts(contents: &str) -> Result<Vec<Contract>, ContractError> {
    let mut contracts = Vec::new();
    let mut current: Option<(String, HashMap<String, String>, usize)> = None;

    for (idx, raw_line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();

        if line.is_empty() {
            if let Some((key, fields, started_at)) = current.take() {
                contracts.push(build_contract(&key, fields, started_at)?);
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        if let Some(key) = stanza_key(line) {
            if let Some((prev_key, fields, started_at)) = current.take() {
                contracts.push(build_contract(&prev_key, fields, started_at)?);
            }
            current = Some((key, HashMap::new(), line_no));
            continue;
        }

        let Some((_, fields, _)) = current.as_mut() else {
            return Err(ContractError::Parse {
                line: line_no,
                message: "field found before any '[key: ...]' stanza header".to_string(),
            });
        };

        match line.split_once('=') {
            Some((field, value)) => {
                fields.insert(field.trim().to_string(), value.trim().to_string());
            }
            None => {
                return Err(ContractError::Parse {
                    line: line_no,
                    message: format!("expected 'field = value', got '{line}'"),
                });
            }
        }
    }

    if let Some((key, fields, started_at)) = current.take() {
        contracts.push(build_contract(&key, fields, started_at)?);
    }

    Ok(contracts)
}

fn stanza_key(line: &str) -> Option<String> {
    let inner = line.strip_prefix("[key:")?.strip_suffix(']')?;
    Some(inner.trim().to_string())
}

fn build_contract(key: &str, fields: HashMap<String, String>, started_at: usize) -> Result<Contract, ContractError> {
    let field = |name: &str| fields.get(name).map(|s| s.as_str());
    let csv = |name: &str| -> Vec<String> {
        field(name)
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    };

    let source_type = match field("source_type") {
        Some("html") | None => SourceType::Html,
        Some("api") => SourceType::Api,
        Some(other) => {
            return Err(ContractError::Parse {
                line: started_at,
                message: format!("unknown source_type '{other}'"),
            })
        }
    };

    let start_urls = csv("start_urls");
    let known_urls = csv("known_urls");
    if start_urls.is_empty() && known_urls.is_empty() {
        return Err(ContractError::EmptyStartUrls { key: key.to_string() });
    }

    let scope = Scope {
        allow_domains: csv("scope.allow_domains"),
        allow_paths_any: csv("scope.allow_paths_any"),
        max_depth: field("scope.max_depth").and_then(|v| v.parse().ok()).unwrap_or(2),
        max_candidates: field("scope.max_candidates").and_then(|v| v.parse().ok()).unwrap_or(50),
    };

    let find = Find {
        link_text_any: csv("find.link_text_any"),
        url_tokens_any: csv("find.url_tokens_any"),
    };

    let mut patterns = Vec::new();
    for raw in ["match.filename_date", "match.pattern"] {
        if let Some(value) = field(raw) {
            match Regex::new(value) {
                Ok(re) => patterns.push(re),
                Err(e) => {
                    return Err(ContractError::Parse {
                        line: started_at,
                        message: format!("invalid regex in '{raw}': {e}"),
                    })
                }
            }
        }
    }
    let matching = MatchPatterns { patterns };

    let newest_by = match field("select.newest_by") {
        None => None,
        Some("last_modified") => Some(NewestByStrategy::LastModified),
        Some("date_from_filename_or_last_modified") => Some(NewestByStrategy::DateFromFilenameOrLastModified),
        Some("best_effort_date_or_last_modified") => Some(NewestByStrategy::BestEffortDateOrLastModified),
        Some(other) => {
            return Err(ContractError::Parse {
                line: started_at,
                message: format!("unknown select.newest_by '{other}'"),
            })
        }
    };
    let select = Select {
        prefer_ext: csv("select.prefer_ext"),
        newest_by,
    };

    let expect = Expect {
        mime_any: csv("expect.mime_any"),
        min_size_kb: field("expect.min_size_kb").and_then(|v| v.parse().ok()).unwrap_or(0.0),
        max_age_days: field("expect.max_age_days").and_then(|v| v.parse().ok()),
    };

    let versioning = match field("versioning") {
        None | Some("none") => VersioningStrategy::None,
        Some("date_today") => VersioningStrategy::DateToday,
        Some("date_from_filename_or_last_modified") => VersioningStrategy::DateFromFilenameOrLastModified,
        Some("best_effort_date_or_last_modified") => VersioningStrategy::BestEffortDateOrLastModified,
        Some(other) => {
            return Err(ContractError::Parse {
                line: started_at,
                message: format!("unknown versioning strategy '{other}'"),
            })
        }
    };

    let mirror = field("mirror").map(|v| v == "true").unwrap_or(false);
    let dedupe_ignore_query = field("dedupe_ignore_query").map(|v| v == "true").unwrap_or(false);

    for unknown in fields.keys() {
        if !KNOWN_FIELDS.contains(&unknown.as_str()) {
            warn!(key, field = unknown.as_str(), "ignoring unknown contract field");
        }
    }

    Ok(Contract {
        key: SourceKey::new(key),
        source_type,
        start_urls,
        known_urls,
        scope,
        find,
        matching,
        select,
        expect,
        versioning,
        mirror,
        dedupe_ignore_query,
    })
}

const KNOWN_FIELDS: &[&str] = &[
    "source_type",
    "start_urls",
    "known_urls",
    "scope.allow_domains",
    "scope.allow_paths_any",
    "scope.max_depth",
    "scope.max_candidates",
    "find.link_text_any",
    "find.url_tokens_any",
    "match.filename_date",
    "match.pattern",
    "select.prefer_ext",
    "select.newest_by",
    "expect.mime_any",
    "expect.min_size_kb",
    "expect.max_age_days",
    "versioning",
    "mirror",
    "dedupe_ignore_query",
];
