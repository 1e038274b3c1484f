use async_trait::async_trait;
use serde::Serialize;

use super::error::StorageError;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    /// Name of the file on disk, `{uuid}_{sanitised original name}`.
    pub file_name: String,
    /// Relative path clients use to refer to the image, e.g. `/uploads/{file_name}`.
    pub path: String,
    pub content_type: String,
    pub size: u64,
}

/// Storage backend for user-uploaded images (course covers, avatars, challenge banners).
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an image under a fresh unique name derived from `original_name`.
    async fn put(&self, original_name: &str, data: &[u8]) -> Result<StoredImage, StorageError>;

    /// Delete a previously stored image by its relative path.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;
}
