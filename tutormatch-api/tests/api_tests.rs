//! Service surface, authentication and account endpoints

mod helpers;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::{json, Value};
use uuid::Uuid;

use helpers::*;
use tutormatch_common::auth::issue_token_at;
use tutormatch_common::models::Role;
use tutormatch_common::time;

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "tutormatch-api");
    assert!(body["version"].is_string());
    assert!(body["uptimeSeconds"].is_u64());
}

#[tokio::test]
async fn test_api_info_and_unknown_route() {
    let app = test_app().await;

    let (status, body) = app.get("/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Music Tutor API v1");
    assert_eq!(body["endpoints"]["tutors"], "/api/tutors");

    let (status, body) = app.get("/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_token_failures() {
    let app = test_app().await;
    let student = app.student("s@example.com", "Sam Student").await;

    let (status, body) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "NO_TOKEN");

    let (status, body) = app.get("/api/auth/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    let forged = issue_token_at("some-other-secret", student.id(), time::now(), Duration::hours(1))
        .unwrap();
    let (status, body) = app.get("/api/auth/me", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    let expired = issue_token_at(
        TEST_SECRET,
        student.id(),
        time::now() - Duration::days(2),
        Duration::days(1),
    )
    .unwrap();
    let (status, body) = app.get("/api/auth/me", Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");

    let ghost = app.token(Uuid::new_v4());
    let (status, body) = app.get("/api/auth/me", Some(&ghost)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_me_reports_role_and_profile() {
    let app = test_app().await;
    let student = app.student("s@example.com", "Sam Student").await;
    let token = app.token(student.id());

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "s@example.com");
    assert_eq!(body["role"], "student");
    assert_eq!(body["profile"]["level"], "beginner");
    assert_eq!(body["hasCompletedOnboarding"], true);

    let teacher = app.user("t@example.com", "Tara Teacher", Some(Role::Teacher)).await;
    let (_, body) = app.get("/api/auth/me", Some(&app.token(teacher.id()))).await;
    assert_eq!(body["role"], "teacher");
    assert_eq!(body["hasCompletedOnboarding"], false);
}

#[tokio::test]
async fn test_role_selection() {
    let app = test_app().await;
    let fresh = app.user("new@example.com", "New Person", None).await;
    let token = app.token(fresh.id());

    let (_, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(body["role"], Value::Null);
    assert_eq!(body["profile"], Value::Null);

    let (status, body) = app.get("/api/students/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "NO_ROLE");

    let (status, _) = app
        .patch("/api/auth/role", Some(&token), json!({ "role": "admin" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .patch("/api/auth/role", Some(&token), json!({ "role": "student" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "student");

    let (status, body) = app.get("/api/students/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["id"], fresh.id().to_string());
}

#[tokio::test]
async fn test_user_profile_update() {
    let app = test_app().await;
    let student = app.student("s@example.com", "Sam Student").await;
    let token = app.token(student.id());

    let (status, body) = app
        .patch(
            "/api/auth/profile",
            Some(&token),
            json!({ "name": "  Samantha  ", "photoUrl": "https://img.example.com/s.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Samantha");
    assert_eq!(body["user"]["photoUrl"], "https://img.example.com/s.png");

    let (_, body) = app
        .patch("/api/auth/profile", Some(&token), json!({ "photoUrl": null }))
        .await;
    assert_eq!(body["user"]["photoUrl"], Value::Null);
    assert_eq!(body["user"]["name"], "Samantha");

    for bad in [json!({ "name": "S" }), json!({ "photoUrl": "not a url" })] {
        let (status, body) = app.patch("/api/auth/profile", Some(&token), bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_student_profile_update() {
    let app = test_app().await;
    let student = app.student("s@example.com", "Sam Student").await;
    let token = app.token(student.id());

    let (status, body) = app
        .patch(
            "/api/students/profile",
            Some(&token),
            json!({ "level": "intermediate", "preferredInstruments": ["Piano", " Flute "], "bio": "Hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["level"], "intermediate");
    assert_eq!(body["profile"]["preferredInstruments"], json!(["Piano", "Flute"]));
    assert_eq!(body["profile"]["bio"], "Hi");

    let (_, body) = app
        .patch("/api/students/profile", Some(&token), json!({ "bio": null }))
        .await;
    assert_eq!(body["profile"]["bio"], Value::Null);
    assert_eq!(body["profile"]["level"], "intermediate");

    let (status, _) = app
        .patch("/api/students/profile", Some(&token), json!({ "level": "wizard" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
