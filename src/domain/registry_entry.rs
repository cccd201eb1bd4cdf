//! The persistent registry entry: one per source key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Suspect,
    Broken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub key: String,
    pub url: String,
    pub version: String,
    pub filename: String,
    pub mime: String,
    pub size_kb: f64,
    pub sha256: String,
    pub last_checked: DateTime<Utc>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<String>>,
}

impl RegistryEntry {
    /// Transition this entry to `broken` after a failed revalidation,
    /// preserving the mirror path and hash (spec.md §9 open-question
    /// decision: the mirror is kept, not cleared).
    pub fn mark_broken(&mut self, checked_at: DateTime<Utc>, reason: impl Into<String>) {
        self.status = Status::Broken;
        self.last_checked = checked_at;
        self.notes = Some(reason.into());
    }

    pub fn status_label(&self) -> &'static str {
        match self.status {
            Status::Ok => "ok",
            Status::Suspect => "suspect",
            Status::Broken => "broken",
        }
    }
}
