//! tutormatch-api library - marketplace HTTP service
//!
//! Accounts and roles, tutor discovery, student profiles, enquiries and
//! tutor reviews over a SQLite database.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod error;
pub mod pagination;
pub mod seed;
pub mod services;
pub mod validation;

pub use error::{ApiError, ApiResult};
use services::TutorLocks;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// HMAC key for bearer tokens
    pub token_secret: Arc<str>,
    /// Per-tutor serialization of review writes
    pub review_locks: TutorLocks,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(db: SqlitePool, token_secret: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            token_secret: token_secret.into(),
            review_locks: TutorLocks::new(),
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
///
/// Authentication is per handler, through the extractors in [`auth`].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::account_routes())
        .merge(api::tutor_routes())
        .merge(api::review_routes())
        .merge(api::student_routes())
        .merge(api::enquiry_routes())
        .fallback(api::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
