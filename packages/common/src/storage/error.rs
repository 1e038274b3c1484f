/// Errors that can occur while storing uploaded images.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The upload exceeds the configured size limit.
    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The upload is empty.
    #[error("file is empty")]
    Empty,
    /// The file name is missing or has nothing left after sanitising.
    #[error("invalid file name: {0}")]
    InvalidName(String),
    /// The file extension does not map to an image content type.
    #[error("unsupported content type '{0}', only images are accepted")]
    NotAnImage(String),
}

impl StorageError {
    /// Whether the error was caused by the uploaded content rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
