use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::error::StorageError;
use super::traits::{ImageStore, StoredImage};

const MAX_NAME_LEN: usize = 128;

/// Filesystem-backed image store.
///
/// Files land flat in `base_path` as `{uuid v4}_{original name}`; the path
/// handed back to clients is `{public_prefix}/{file name}`.
pub struct FilesystemImageStore {
    base_path: PathBuf,
    public_prefix: String,
    max_size: u64,
}

impl FilesystemImageStore {
    /// Create a new filesystem image store, creating `base_path` if needed.
    pub async fn new(
        base_path: PathBuf,
        public_prefix: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        let public_prefix = public_prefix.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_path,
            public_prefix,
            max_size,
        })
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Map a public path back to a file name inside the store, if it belongs here.
    fn file_name_of<'a>(&self, path: &'a str) -> Option<&'a str> {
        let name = path
            .strip_prefix(self.public_prefix.as_str())?
            .strip_prefix('/')?;
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(name)
    }
}

/// Strip directory components and control characters from a client-supplied
/// file name.
pub fn sanitize_file_name(original: &str) -> Result<String, StorageError> {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        return Err(StorageError::InvalidName(original.to_string()));
    }
    Ok(cleaned)
}

/// Resolve the image content type from the file extension.
pub fn image_content_type(file_name: &str) -> Result<String, StorageError> {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    if mime.type_().as_str() == "image" {
        Ok(mime.essence_str().to_string())
    } else {
        Err(StorageError::NotAnImage(mime.essence_str().to_string()))
    }
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn put(&self, original_name: &str, data: &[u8]) -> Result<StoredImage, StorageError> {
        if data.is_empty() {
            return Err(StorageError::Empty);
        }
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let clean = sanitize_file_name(original_name)?;
        let content_type = image_content_type(&clean)?;
        let file_name = format!("{}_{}", uuid::Uuid::new_v4(), clean);
        let target = self.base_path.join(&file_name);

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(file = %file_name, size = data.len(), "Stored image");
        Ok(StoredImage {
            path: format!("{}/{}", self.public_prefix, file_name),
            file_name,
            content_type,
            size: data.len() as u64,
        })
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let Some(name) = self.file_name_of(path) else {
            return Ok(false);
        };
        match fs::remove_file(self.base_path.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
