//! Registry port (C11): the durable key → entry mapping.

use async_trait::async_trait;

use crate::domain::RegistryEntry;
use crate::error::RegistryError;

#[async_trait]
pub trait RegistryPort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<RegistryEntry>, RegistryError>;
    async fn upsert(&self, entry: RegistryEntry) -> Result<(), RegistryError>;
    async fn has(&self, key: &str) -> Result<bool, RegistryError>;
    async fn list_keys(&self) -> Result<Vec<String>, RegistryError>;
    async fn all(&self) -> Result<Vec<RegistryEntry>, RegistryError>;
}
