//! Unified error system for the table ordering core
//!
//! Every operation returns a success/failure result with a stable
//! classification:
//!
//! - [`ErrorKind`]: stable error codes exposed to callers
//! - [`AppError`]: rich error type with kind and message
//! - [`AppResult`]: result alias used across all crates
//!
//! Internal failures (persistence, broadcast) are logged with detail but
//! surfaced to callers only as a generic message.

use thiserror::Error;

/// Stable error classification
///
/// The string code is part of the external contract; callers branch on it,
/// never on the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing or malformed input, rejected before any mutation
    Validation,
    /// Invalid or expired guest session token
    Session,
    /// Business state conflict (occupied table, immutable order, bad transition)
    Conflict,
    /// Unknown order/item/table/restaurant
    NotFound,
    /// Lock/version conflict that survived bounded internal retries
    ResourceBusy,
    /// Persistence or broadcast failure
    Internal,
}

impl ErrorKind {
    /// Get the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "E_VALIDATION",
            Self::Session => "E_SESSION",
            Self::Conflict => "E_CONFLICT",
            Self::NotFound => "E_NOT_FOUND",
            Self::ResourceBusy => "E_BUSY",
            Self::Internal => "E_INTERNAL",
        }
    }

    /// Whether a caller may transparently retry the operation
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ResourceBusy)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Unified error type for the ordering core
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Missing or malformed input
    #[error("{message}")]
    Validation { message: String },

    /// Invalid or expired guest session
    ///
    /// Deliberately uniform: "never existed" and "order no longer active"
    /// produce the same error so tokens cannot be probed.
    #[error("Invalid or expired session")]
    Session,

    /// Business state conflict
    #[error("{message}")]
    Conflict { message: String },

    /// Resource not found
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Concurrent mutation conflict after bounded retries
    #[error("Resource busy, please retry: {message}")]
    ResourceBusy { message: String },

    /// Internal failure; detail goes to the log, not the caller
    #[error("Internal error")]
    Internal { message: String },
}

impl AppError {
    // ========== Convenient constructors ==========

    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create the uniform Session error
    pub fn session() -> Self {
        Self::Session
    }

    /// Create a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a ResourceBusy error
    pub fn busy(message: impl Into<String>) -> Self {
        Self::ResourceBusy {
            message: message.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // ========== Error inspection methods ==========

    /// Get the stable classification for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Session => ErrorKind::Session,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ResourceBusy { .. } => ErrorKind::ResourceBusy,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Message safe to show to the caller
    ///
    /// Internal errors return a generic message; the detail is only logged.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal { .. } => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::validation(errors.to_string())
    }
}

/// Result type for all core operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_are_stable() {
        assert_eq!(AppError::validation("x").kind().code(), "E_VALIDATION");
        assert_eq!(AppError::session().kind().code(), "E_SESSION");
        assert_eq!(AppError::conflict("x").kind().code(), "E_CONFLICT");
        assert_eq!(AppError::not_found("Order").kind().code(), "E_NOT_FOUND");
        assert_eq!(AppError::busy("x").kind().code(), "E_BUSY");
        assert_eq!(AppError::internal("x").kind().code(), "E_INTERNAL");
    }

    #[test]
    fn session_error_is_uniform() {
        // The same text regardless of why validation failed
        assert_eq!(AppError::session().to_string(), "Invalid or expired session");
    }

    #[test]
    fn internal_detail_is_not_public() {
        let err = AppError::internal("gateway write failed: disk full");
        assert_eq!(err.public_message(), "Internal error");
    }

    #[test]
    fn busy_is_transient() {
        assert!(AppError::busy("version conflict").kind().is_transient());
        assert!(!AppError::conflict("occupied").kind().is_transient());
    }
}
