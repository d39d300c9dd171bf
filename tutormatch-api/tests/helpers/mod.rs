//! Test Helper Utilities
//!
//! Shared setup for tutormatch-api integration tests: a fresh database per
//! test, the real router, tokens and seeded users.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use tutormatch_api::services::accounts::create_user;
use tutormatch_api::services::tutors::{save_tutor_profile, TutorProfileUpdate};
use tutormatch_api::{build_router, AppState};
use tutormatch_common::auth::issue_token;
use tutormatch_common::db::init::init_database;
use tutormatch_common::models::{Account, ContactMode, NewUser, PreferredContact, Role};

pub const TEST_SECRET: &str = "integration-test-token-secret";

/// Router plus direct database access; the TempDir must outlive the pool
pub struct TestApp {
    _dir: TempDir,
    pub db: SqlitePool,
    pub state: AppState,
    router: Router,
}

pub async fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let db = init_database(&dir.path().join("tutormatch.db")).await.unwrap();
    let state = AppState::new(db.clone(), TEST_SECRET);
    let router = build_router(state.clone());

    TestApp {
        _dir: dir,
        db,
        state,
        router,
    }
}

impl TestApp {
    pub fn token(&self, user_id: Uuid) -> String {
        issue_token(TEST_SECRET, user_id).unwrap()
    }

    /// Send a request and decode the JSON response (Null for an empty body)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, token, Some(body)).await
    }

    pub async fn user(&self, email: &str, name: &str, role: Option<Role>) -> Account {
        create_user(&self.db, NewUser::new(email, name, role)).await.unwrap()
    }

    pub async fn student(&self, email: &str, name: &str) -> Account {
        self.user(email, name, Some(Role::Student)).await
    }

    /// Teacher with a completed onboarding and an email contact
    pub async fn teacher(&self, email: &str, name: &str, instrument: &str) -> Account {
        let account = self.user(email, name, Some(Role::Teacher)).await;
        let update = TutorProfileUpdate {
            instrument: Some(instrument.to_string()),
            hourly_rate: Some(50.0),
            city: Some("Austin".to_string()),
            state: Some("Texas".to_string()),
            preferred_contact: Some(Some(PreferredContact {
                mode: ContactMode::Email,
                value: email.to_string(),
            })),
            ..Default::default()
        };
        save_tutor_profile(&self.db, account.id(), update, true)
            .await
            .unwrap();
        account
    }
}
