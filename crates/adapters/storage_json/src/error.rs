//! Storage-specific error type.

use dhtnode_domain::error::NodeError;

/// Errors originating from the settings file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The file could not be read, written or replaced.
    #[error("settings file I/O error")]
    Io(#[from] std::io::Error),

    /// The file does not hold a settings object.
    #[error("settings file is not valid JSON")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for NodeError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
