//! HTTP error type
//!
//! Every failure leaves the service as
//! `{"error": {"code": "...", "message": "..."}}` with a matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    /// Request body or query failed validation (400, `VALIDATION_ERROR`)
    #[error("{0}")]
    Validation(String),

    /// Well-formed request the resource's state cannot accept (400)
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    /// Missing, malformed or expired credentials (401)
    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    /// Authenticated but not allowed (403)
    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    /// Conflict (409)
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    /// Internal server error (500); detail is logged, never returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::NotFound { code, .. }
            | ApiError::BadRequest { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::Forbidden { code, .. }
            | ApiError::Conflict { code, .. } => *code,
        }
    }
}

impl From<tutormatch_common::Error> for ApiError {
    fn from(err: tutormatch_common::Error) -> Self {
        use tutormatch_common::Error;

        match err {
            Error::Validation(message) => ApiError::Validation(message),
            Error::NotFound { code, message } => ApiError::NotFound { code, message },
            Error::Conflict { code, message } => ApiError::Conflict { code, message },
            Error::Forbidden { code, message } => ApiError::Forbidden { code, message },
            Error::InvalidState { code, message } => ApiError::BadRequest { code, message },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed with internal error");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// First failing rule, as `field: reason`
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(crate::validation::describe(&errors))
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
