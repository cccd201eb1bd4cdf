//! Mirror (C10): atomic local write plus optional remote upload.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::domain::{SourceKey, Version};
use crate::error::MirrorError;
use crate::ports::mirror::{MirrorPort, MirrorResult, RemoteMirrorPort};
use crate::ports::HttpPort;

pub struct LocalMirror<'a> {
    root: PathBuf,
    http: &'a dyn HttpPort,
    remote: Option<&'a dyn RemoteMirrorPort>,
}

impl<'a> LocalMirror<'a> {
    pub fn new(root: impl Into<PathBuf>, http: &'a dyn HttpPort) -> Self {
        Self {
            root: root.into(),
            http,
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: &'a dyn RemoteMirrorPort) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Remove any stray `*.tmp` siblings under the mirror root, left behind
    /// by an aborted download (spec.md §5 cancellation handling). Should be
    /// called once at process startup.
    pub async fn sweep_stray_temp_files(&self) -> std::io::Result<usize> {
        sweep_dir(&self.root).await
    }
}

fn target_path(root: &Path, key: &SourceKey, version: &Version, filename: &str) -> PathBuf {
    root.join(key.as_str()).join(version.as_str()).join(filename)
}

#[async_trait]
impl<'a> MirrorPort for LocalMirror<'a> {
    async fn mirror_file(
        &self,
        url: &str,
        key: &SourceKey,
        version: &Version,
        filename: &str,
    ) -> Result<MirrorResult, MirrorError> {
        let target = target_path(&self.root, key, version, filename);
        let dir = target.parent().expect("target always has a parent").to_path_buf();

        tokio::fs::create_dir_all(&dir).await.map_err(|e| MirrorError::CreateDir {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let tmp_path = dir.join(format!(".{filename}.tmp"));
        let result = write_and_hash(self.http, url, &tmp_path).await;

        let digest = match result {
            Ok(digest) => digest,
            Err(err) => {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        };

        tokio::fs::rename(&tmp_path, &target).await.map_err(|e| MirrorError::Finalize {
            path: target.display().to_string(),
            message: e.to_string(),
        })?;

        if let Some(remote) = self.remote {
            let bytes = tokio::fs::read(&target).await.unwrap_or_default();
            let object_key = format!("{}/{}/{}", key.as_str(), version.as_str(), filename);
            if let Err(err) = remote.put(&object_key, &bytes).await {
                warn!(object_key, %err, "remote mirror upload failed, local mirror preserved");
            }
        }

        Ok(MirrorResult {
            local_path: target.display().to_string(),
            sha256: digest,
        })
    }
}

async fn write_and_hash(http: &dyn HttpPort, url: &str, tmp_path: &Path) -> Result<crate::domain::Sha256Digest, MirrorError> {
    let stream_result = http.stream(url).await.map_err(MirrorError::from)?;

    let mut file = tokio::fs::File::create(tmp_path).await.map_err(|e| MirrorError::Write {
        path: tmp_path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    let mut chunks = stream_result.chunks;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(MirrorError::from)?;
        hasher.update(&chunk);
        file.write_all(&chunk).await.map_err(|e| MirrorError::Write {
            path: tmp_path.display().to_string(),
            message: e.to_string(),
        })?;
    }
    file.sync_all().await.map_err(|e| MirrorError::Write {
        path: tmp_path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(crate::domain::Sha256Digest::from_bytes(&hasher.finalize()))
}

async fn sweep_dir(root: &Path) -> std::io::Result<usize> {
    let mut removed = 0usize;
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().map(|e| e == "tmp").unwrap_or(false) {
                if tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                }
            }
        }
    }
    Ok(removed)
}

/// Uploads to an HTTP endpoint via PUT, aligned with the existing reqwest
/// stack rather than a vendor-specific object-store SDK (DESIGN.md).
pub struct HttpRemoteMirror {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpRemoteMirror {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl RemoteMirrorPort for HttpRemoteMirror {
    async fn put(&self, object_key: &str, bytes: &[u8]) -> Result<(), String> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), object_key);
        let mut request = self.client.put(&url).body(bytes.to_vec());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("remote PUT {url} returned {}", response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::ports::http::{GetResult, HeadResult, Headers, StreamResult};
    use async_trait::async_trait;
    use bytes::Bytes;

    struct FakeStreamHttp {
        body: Vec<u8>,
    }

    #[async_trait]
    impl HttpPort for FakeStreamHttp {
        async fn head(&self, _url: &str) -> Result<HeadResult, NetworkError> {
            unimplemented!()
        }
        async fn get(&self, _url: &str) -> Result<GetResult, NetworkError> {
            unimplemented!()
        }
        async fn stream(&self, _url: &str) -> Result<StreamResult, NetworkError> {
            let body = self.body.clone();
            let stream = futures::stream::once(async move { Ok(Bytes::from(body)) });
            Ok(StreamResult {
                status: 200,
                headers: Headers::new(),
                chunks: Box::pin(stream),
            })
        }
    }

    #[tokio::test]
    async fn mirrors_and_hashes_bytes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let http = FakeStreamHttp { body: b"hello world".to_vec() };
        let mirror = LocalMirror::new(dir.path(), &http);

        let result = mirror
            .mirror_file("https://example.gov/x.pdf", &SourceKey::new("k"), &Version::new("v2025-01-01"), "x.pdf")
            .await
            .unwrap();

        let expected_hash = {
            let mut hasher = Sha256::new();
            hasher.update(b"hello world");
            crate::domain::Sha256Digest::from_bytes(&hasher.finalize())
        };
        assert_eq!(result.sha256.as_str(), expected_hash.as_str());
        assert!(Path::new(&result.local_path).exists());

        let tmp_path = dir.path().join("k").join("v2025-01-01").join(".x.pdf.tmp");
        assert!(!tmp_path.exists());
    }

    #[tokio::test]
    async fn sweep_removes_stray_tmp_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("k").join("v1");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(nested.join(".orphan.tmp"), b"x").await.unwrap();

        let http = FakeStreamHttp { body: vec![] };
        let mirror = LocalMirror::new(dir.path(), &http);
        let removed = mirror.sweep_stray_temp_files().await.unwrap();
        assert_eq!(removed, 1);
        assert!(!nested.join(".orphan.tmp").exists());
    }
}
