mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Abstraction over blob storage backends. Blobs live in one partition per
/// owner; keys are server-generated UUIDs, so no path component ever comes
/// from client input. The raw blobs are meaningless without the metadata DB.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, owner_id: &str, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
    async fn get(&self, owner_id: &str, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn delete(&self, owner_id: &str, key: &str) -> Result<(), ObjectStoreError>;
    async fn exists(&self, owner_id: &str, key: &str) -> Result<bool, ObjectStoreError>;
}

/// Hex-encoded SHA-256 of a payload. File checksums are always computed
/// from the bytes handed to the store, never trusted from the client.
pub fn checksum_sha256(data: &[u8]) -> String {
    hex::encode(ring::digest::digest(&ring::digest::SHA256, data))
}
