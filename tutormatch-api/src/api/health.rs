//! Health check and service info

use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use tutormatch_common::time;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
}

/// GET /health
///
/// No authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "tutormatch-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: time::now(),
        uptime_seconds: state.startup_time.elapsed().as_secs(),
    })
}

#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// GET /api
pub async fn api_info() -> Json<ApiInfoResponse> {
    let endpoints = BTreeMap::from([
        ("auth", "/api/auth"),
        ("tutors", "/api/tutors"),
        ("students", "/api/students"),
        ("enquiries", "/api/enquiries"),
        ("reviews", "/api/tutors/:id/reviews"),
    ]);

    Json(ApiInfoResponse {
        message: "Music Tutor API v1".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api", get(api_info))
}
