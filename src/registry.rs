//! Registry (C11): a JSON document on disk, one entry per source key.
//!
//! Writes go through the same temp-file-and-rename idiom as the mirror
//! (spec.md §4.9) so a crash mid-write never leaves a truncated or
//! half-written registry behind. An in-process mutex serializes writers;
//! the rename itself is what protects concurrent readers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::RegistryEntry;
use crate::error::RegistryError;
use crate::ports::RegistryPort;

const SCHEMA_VERSION: u32 = 1;

pub struct JsonFileRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Reads the document, returning its entries plus the raw `_metadata`
    /// object if one was present, so a subsequent write can preserve it.
    async fn read_document(&self) -> Result<(BTreeMap<String, RegistryEntry>, Option<serde_json::Map<String, Value>>), RegistryError> {
        let path = &self.path;
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => parse_document(&contents, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((BTreeMap::new(), None)),
            Err(e) => Err(RegistryError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Writes the document, merging `updated_at`/`version` into whatever
    /// `_metadata` object already existed rather than replacing it.
    async fn write_document(
        &self,
        entries: &BTreeMap<String, RegistryEntry>,
        metadata: Option<serde_json::Map<String, Value>>,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let path = &self.path;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| RegistryError::Write {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }

        let mut metadata = metadata.unwrap_or_default();
        metadata.insert("version".to_string(), serde_json::json!(SCHEMA_VERSION));
        metadata.insert("updated_at".to_string(), serde_json::json!(now.to_rfc3339()));

        let mut document = serde_json::Map::new();
        document.insert("_metadata".to_string(), Value::Object(metadata));
        for (key, entry) in entries {
            document.insert(key.clone(), serde_json::to_value(entry).map_err(|e| RegistryError::Write {
                path: path.display().to_string(),
                message: e.to_string(),
            })?);
        }

        let rendered = serde_json::to_string_pretty(&Value::Object(document)).map_err(|e| RegistryError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, rendered).await.map_err(|e| RegistryError::Write {
            path: tmp_path.display().to_string(),
            message: e.to_string(),
        })?;
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| RegistryError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

fn parse_document(
    contents: &str,
    path: &Path,
) -> Result<(BTreeMap<String, RegistryEntry>, Option<serde_json::Map<String, Value>>), RegistryError> {
    if contents.trim().is_empty() {
        return Ok((BTreeMap::new(), None));
    }
    let raw: serde_json::Map<String, Value> = serde_json::from_str(contents).map_err(|e| RegistryError::Corrupt {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut entries = BTreeMap::new();
    let mut metadata = None;
    for (key, value) in raw {
        if key == "_metadata" {
            if let Value::Object(map) = value {
                metadata = Some(map);
            }
            continue;
        }
        if key.starts_with('_') {
            continue;
        }
        let entry: RegistryEntry = serde_json::from_value(value).map_err(|e| RegistryError::Corrupt {
            path: path.display().to_string(),
            message: format!("entry '{key}': {e}"),
        })?;
        entries.insert(key, entry);
    }
    Ok((entries, metadata))
}

#[async_trait]
impl RegistryPort for JsonFileRegistry {
    async fn get(&self, key: &str) -> Result<Option<RegistryEntry>, RegistryError> {
        let _guard = self.lock.lock().await;
        let (entries, _metadata) = self.read_document().await?;
        Ok(entries.get(key).cloned())
    }

    async fn upsert(&self, entry: RegistryEntry) -> Result<(), RegistryError> {
        let _guard = self.lock.lock().await;
        let (mut entries, metadata) = self.read_document().await?;
        entries.insert(entry.key.clone(), entry);
        self.write_document(&entries, metadata, Utc::now()).await
    }

    async fn has(&self, key: &str) -> Result<bool, RegistryError> {
        let _guard = self.lock.lock().await;
        let (entries, _metadata) = self.read_document().await?;
        Ok(entries.contains_key(key))
    }

    async fn list_keys(&self) -> Result<Vec<String>, RegistryError> {
        let _guard = self.lock.lock().await;
        let (entries, _metadata) = self.read_document().await?;
        Ok(entries.into_keys().collect())
    }

    async fn all(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        let _guard = self.lock.lock().await;
        let (entries, _metadata) = self.read_document().await?;
        Ok(entries.into_values().collect())
    }
}
