use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while persisting or loading setting records
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store rejected a write
    #[error("Failed to write setting {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    /// The backing store could not be read
    #[error("Failed to read setting {key}: {reason}")]
    ReadFailed { key: String, reason: String },
}
