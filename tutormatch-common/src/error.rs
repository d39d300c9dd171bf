//! Common error types for TutorMatch

use thiserror::Error;

/// Common result type for TutorMatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across TutorMatch crates
///
/// Domain variants carry a stable machine-readable `code` that the HTTP
/// layer passes through to clients unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before reaching storage
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Requested resource not found
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    /// Write rejected because it would duplicate existing state
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    /// Caller is authenticated but may not act on this resource
    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    /// Resource exists but is not in a state that allows the operation
    #[error("{message}")]
    InvalidState { code: &'static str, message: String },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Error::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Error::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Error::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_state(code: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidState {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

/// Constraint violations are domain errors, everything else stays a storage error
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Error::conflict("DUPLICATE_ERROR", "A record with this value already exists");
            }
            if db_err.is_foreign_key_violation() {
                return Error::not_found("FOREIGN_KEY_ERROR", "Referenced record does not exist");
            }
        }
        Error::Database(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("JSON column error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_stays_database_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_domain_constructors_keep_code() {
        match Error::not_found("TUTOR_NOT_FOUND", "Tutor not found") {
            Error::NotFound { code, message } => {
                assert_eq!(code, "TUTOR_NOT_FOUND");
                assert_eq!(message, "Tutor not found");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_display_uses_message() {
        let err = Error::conflict("DUPLICATE_ENQUIRY", "Already pending");
        assert_eq!(err.to_string(), "Already pending");
    }
}
