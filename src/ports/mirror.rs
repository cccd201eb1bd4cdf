//! Mirror ports (C10): the local write-once copy and the optional remote
//! upload.

use async_trait::async_trait;

use crate::domain::{SourceKey, Version};
use crate::error::MirrorError;

pub struct MirrorResult {
    pub local_path: String,
    pub sha256: crate::domain::Sha256Digest,
}

#[async_trait]
pub trait MirrorPort: Send + Sync {
    async fn mirror_file(
        &self,
        url: &str,
        key: &SourceKey,
        version: &Version,
        filename: &str,
    ) -> Result<MirrorResult, MirrorError>;
}

/// Uploader for the optional remote object store. Failures here are logged
/// but never fail the overall mirror (spec.md §4.8).
#[async_trait]
pub trait RemoteMirrorPort: Send + Sync {
    async fn put(&self, object_key: &str, bytes: &[u8]) -> Result<(), String>;
}
