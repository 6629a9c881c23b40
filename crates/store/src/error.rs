use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the request timed out.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The caller is not permitted to read or write the path.
    #[error("Permission denied for path {0}")]
    PermissionDenied(String),

    /// A concurrent writer invalidated this request.
    #[error("Write conflict at path {0}")]
    Conflict(String),

    /// No value exists at the requested path.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// The path is malformed.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
