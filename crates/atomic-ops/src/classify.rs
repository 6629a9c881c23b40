//! Failure classification.
//!
//! Maps an arbitrary failure into one of the five [`ErrorKind`]s. Errors
//! that already carry an explicit kind are returned unchanged; everything
//! else is matched against substring heuristics over the lowercased message
//! and code, in fixed priority order. Unrecognized failures default to
//! NETWORK.

use crate::{ErrorKind, OpError};

const NETWORK_MESSAGE_TOKENS: [&str; 4] = ["network", "timeout", "connection", "offline"];
const NETWORK_CODE_TOKENS: [&str; 2] = ["network", "unavailable"];
const PERMISSION_TOKENS: [&str; 4] = ["permission", "unauthorized", "forbidden", "auth"];
const NOT_FOUND_TOKENS: [&str; 2] = ["not found", "does not exist"];
const VALIDATION_TOKENS: [&str; 3] = ["validation", "invalid", "required"];
const CONFLICT_TOKENS: [&str; 3] = ["conflict", "already exists", "concurrent"];

/// Classifies an error into its kind.
pub fn classify(error: &OpError) -> ErrorKind {
    if let Some(kind) = error.kind() {
        return kind;
    }

    let message = error.message().to_lowercase();
    let code = error.error_code().unwrap_or_default().to_lowercase();

    let matches = |tokens: &[&str]| tokens.iter().any(|token| message.contains(token));

    if matches(&NETWORK_MESSAGE_TOKENS)
        || NETWORK_CODE_TOKENS.iter().any(|token| code.contains(token))
    {
        ErrorKind::Network
    } else if matches(&PERMISSION_TOKENS) {
        ErrorKind::Permission
    } else if matches(&NOT_FOUND_TOKENS) {
        ErrorKind::NotFound
    } else if matches(&VALIDATION_TOKENS) {
        ErrorKind::Validation
    } else if matches(&CONFLICT_TOKENS) {
        ErrorKind::Conflict
    } else {
        ErrorKind::Network
    }
}

/// Returns true if an error of this kind should be retried.
pub fn should_retry(kind: ErrorKind) -> bool {
    kind.is_retryable()
}
