//! Object storage for uploaded clips and annotated results

pub mod object_storage;

pub use object_storage::{ObjectStorage, S3Config, S3ObjectStorage};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3Error(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("URL signing failed: {0}")]
    SigningError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;
