//! HTTP API handlers for tutormatch-api

pub mod accounts;
pub mod enquiries;
pub mod extract;
pub mod health;
pub mod reviews;
pub mod students;
pub mod tutors;

pub use accounts::account_routes;
pub use enquiries::enquiry_routes;
pub use health::health_routes;
pub use reviews::review_routes;
pub use students::student_routes;
pub use tutors::tutor_routes;

use crate::error::ApiError;

/// Fallback for unmatched paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound {
        code: "NOT_FOUND",
        message: "Route not found".to_string(),
    }
}
