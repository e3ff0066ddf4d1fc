use thiserror::Error;

/// Failures of the settings key-value store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Temporary file error: {0}")]
    TempFile(#[from] tempfile::PersistError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Data corruption: {0}")]
    DataCorruption(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
