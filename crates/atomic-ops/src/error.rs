//! Operation error type and the five-kind taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use store::StoreError;
use thiserror::Error;

/// The five kinds every handled failure is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Connectivity or availability failure. Retryable.
    Network,
    /// The request itself is malformed or violates a domain rule.
    Validation,
    /// The caller is not allowed to perform the operation.
    Permission,
    /// The referenced record does not exist.
    NotFound,
    /// A concurrent writer or lock holder got there first. Retryable.
    Conflict,
}

impl ErrorKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Permission => "PERMISSION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
        }
    }

    /// Returns true if operations failing with this kind may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Network | ErrorKind::Conflict)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operation failure, optionally pre-classified.
///
/// Errors produced by collaborators that know their own kind (the store, the
/// inventory allocator) carry an explicit kind; errors bubbled up from
/// arbitrary sources are classified by [`classify`](crate::classify) from
/// their message and code.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OpError {
    kind: Option<ErrorKind>,
    message: String,
    code: Option<String>,
    context: Map<String, Value>,
}

impl OpError {
    /// Creates an unclassified error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
            code: None,
            context: Map::new(),
        }
    }

    /// Creates an error with an explicit kind.
    pub fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            ..Self::new(message)
        }
    }

    /// Creates a NETWORK error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Network, message)
    }

    /// Creates a VALIDATION error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Validation, message)
    }

    /// Creates a PERMISSION error.
    pub fn permission(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Permission, message)
    }

    /// Creates a NOT_FOUND error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::NotFound, message)
    }

    /// Creates a CONFLICT error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Conflict, message)
    }

    /// Attaches an error code consulted during classification.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches a context entry.
    pub fn context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Merges caller-supplied context entries into this error's context.
    ///
    /// Entries already present (domain context) win over merged ones.
    pub fn merge_context(&mut self, extra: &Map<String, Value>) {
        for (key, value) in extra {
            self.context
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// The explicit kind, if one was set.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    /// Pins the kind on this error, making later classification idempotent.
    pub fn into_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error code, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The context map.
    pub fn context_entries(&self) -> &Map<String, Value> {
        &self.context
    }
}

impl From<StoreError> for OpError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => OpError::network(msg),
            StoreError::PermissionDenied(path) => {
                OpError::permission(format!("Permission denied for path {path}"))
                    .context("path", Value::String(path))
            }
            StoreError::Conflict(path) => {
                OpError::conflict(format!("Write conflict at path {path}"))
                    .context("path", Value::String(path))
            }
            StoreError::PathNotFound(path) => {
                OpError::not_found(format!("Path not found: {path}"))
                    .context("path", Value::String(path))
            }
            StoreError::InvalidPath(msg) => OpError::validation(format!("Invalid path: {msg}")),
            StoreError::Serialization(e) => {
                OpError::validation(format!("Invalid record shape: {e}"))
            }
        }
    }
}

/// Result type for operation-layer calls.
pub type Result<T> = std::result::Result<T, OpError>;
