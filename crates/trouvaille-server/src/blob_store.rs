//! Content-addressed photo storage.
//!
//! Every blob is stored under the lowercase hex BLAKE3 hash of its bytes,
//! which makes uploads idempotent (re-uploading the same photo returns the
//! same address without a second write) and makes the on-disk name safe to
//! derive from client input.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::ServerError;

/// Length of a lowercase hex BLAKE3 hash.
pub const HASH_HEX_LEN: usize = 64;

/// Validate a client-supplied blob address: exactly 64 lowercase hex chars.
/// Anything else (including path separators and `..`) is rejected before a
/// filesystem path is ever built from it.
pub fn validate_hash(hash: &str) -> Result<(), ServerError> {
    if hash.len() != HASH_HEX_LEN
        || !hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(ServerError::BadRequest(format!(
            "Expected {HASH_HEX_LEN} lowercase hex chars"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    base_path: PathBuf,
    max_size: usize,
}

impl BlobStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::BlobStorage(format!(
                "Failed to create blob directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Blob store initialized");

        Ok(Self { base_path, max_size })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Store a blob and return its content address.
    ///
    /// A blob that is already present is not rewritten.
    pub async fn store_blob(&self, data: &[u8]) -> Result<String, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BlobStorage("Empty blob".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::BlobTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let hash = blake3::hash(data).to_hex().to_string();
        let path = self.blob_path(&hash)?;

        if fs::try_exists(&path).await.unwrap_or(false) {
            debug!(hash = %hash, "Blob already present");
            return Ok(hash);
        }

        fs::write(&path, data).await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to write blob {}: {}", hash, e))
        })?;

        debug!(hash = %hash, size = data.len(), "Stored blob");
        Ok(hash)
    }

    pub async fn get_blob(&self, hash: &str) -> Result<Vec<u8>, ServerError> {
        let path = self.blob_path(hash)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ServerError::BlobNotFound(hash.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to read blob {}: {}", hash, e))
        })?;

        debug!(hash = %hash, size = data.len(), "Retrieved blob");
        Ok(data)
    }

    fn blob_path(&self, hash: &str) -> Result<PathBuf, ServerError> {
        validate_hash(hash)?;
        Ok(self.base_path.join(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (BlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn store_and_get_round_trip() {
        let (store, _dir) = test_store().await;
        let data = b"jpeg-bytes";

        let hash = store.store_blob(data).await.unwrap();
        assert_eq!(hash.len(), HASH_HEX_LEN);
        assert_eq!(store.get_blob(&hash).await.unwrap(), data);
    }

    #[tokio::test]
    async fn duplicate_upload_is_idempotent() {
        let (store, _dir) = test_store().await;

        let first = store.store_blob(b"same-photo").await.unwrap();
        let second = store.store_blob(b"same-photo").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn oversized_blob_rejected() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf(), 8).await.unwrap();

        assert!(matches!(
            store.store_blob(b"way too many bytes").await,
            Err(ServerError::BlobTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn empty_blob_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.store_blob(b"").await.is_err());
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let (store, _dir) = test_store().await;
        let missing = blake3::hash(b"never stored").to_hex().to_string();
        assert!(matches!(
            store.get_blob(&missing).await,
            Err(ServerError::BlobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn traversal_addresses_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.get_blob("../../etc/passwd").await.is_err());
        assert!(store.get_blob("ABCD").await.is_err());
        let uppercase = "A".repeat(HASH_HEX_LEN);
        assert!(store.get_blob(&uppercase).await.is_err());
    }
}
