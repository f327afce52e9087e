use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::{ObjectStore, ObjectStoreError};

/// Local filesystem blob store. Each owner gets a subdirectory under the
/// storage root; blobs are written at `<root>/<owner>/<key>`.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, owner_id: &str, key: &str) -> PathBuf {
        self.base_path.join(owner_id).join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, owner_id: &str, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let path = self.object_path(owner_id, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn get(&self, owner_id: &str, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(owner_id, key);
        if !path.exists() {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, owner_id: &str, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(owner_id, key);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn exists(&self, owner_id: &str, key: &str) -> Result<bool, ObjectStoreError> {
        let path = self.object_path(owner_id, key);
        Ok(path.exists())
    }
}
