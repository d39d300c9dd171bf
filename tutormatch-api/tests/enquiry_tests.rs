//! Enquiry lifecycle: send, list, inspect, answer

mod helpers;

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use helpers::*;

fn enquiry_body(tutor_id: Uuid) -> Value {
    json!({
        "tutorId": tutor_id.to_string(),
        "message": "  Hello, I would like weekly lessons please.  ",
        "studentLevel": "beginner",
        "preferredDays": ["tue", "thu"],
        "preferredTime": "evening"
    })
}

struct Scene {
    app: TestApp,
    tutor_id: Uuid,
    tutor_token: String,
    student_token: String,
    enquiry_id: String,
}

async fn scene() -> Scene {
    let app = test_app().await;
    let tutor = app.teacher("t@example.com", "Tara Teacher", "Piano").await;
    let student = app.student("s@example.com", "Sam Student").await;
    let tutor_token = app.token(tutor.id());
    let student_token = app.token(student.id());

    let (status, body) = app
        .post("/api/enquiries", Some(&student_token), enquiry_body(tutor.id()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let enquiry_id = body["enquiry"]["id"].as_str().unwrap().to_string();

    Scene {
        app,
        tutor_id: tutor.id(),
        tutor_token,
        student_token,
        enquiry_id,
    }
}

#[tokio::test]
async fn test_create_enquiry() {
    let s = scene().await;

    let (status, body) = s
        .app
        .get(&format!("/api/enquiries/{}", s.enquiry_id), Some(&s.student_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let enquiry = &body["enquiry"];
    assert_eq!(enquiry["status"], "pending");
    assert_eq!(enquiry["message"], "Hello, I would like weekly lessons please.");
    assert_eq!(enquiry["preferredDays"], json!(["tue", "thu"]));
    assert_eq!(enquiry["tutor"]["name"], "Tara Teacher");
    assert!(enquiry["tutor"].get("email").is_none());
    assert_eq!(enquiry["student"]["email"], "s@example.com");
    assert!(enquiry.get("tutorContact").is_none());
}

#[tokio::test]
async fn test_duplicate_pending_enquiry_conflicts() {
    let s = scene().await;

    let (status, body) = s
        .app
        .post("/api/enquiries", Some(&s.student_token), enquiry_body(s.tutor_id))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_ENQUIRY");

    // Once answered, a new enquiry is allowed
    let (status, _) = s
        .app
        .patch(
            &format!("/api/enquiries/{}", s.enquiry_id),
            Some(&s.tutor_token),
            json!({ "status": "declined" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = s
        .app
        .post("/api/enquiries", Some(&s.student_token), enquiry_body(s.tutor_id))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_validation_and_targets() {
    let app = test_app().await;
    let student = app.student("s@example.com", "Sam Student").await;
    let other = app.student("o@example.com", "Other Student").await;
    let token = app.token(student.id());

    let (status, body) = app
        .post("/api/enquiries", Some(&token), enquiry_body(Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "TUTOR_NOT_FOUND");

    let (status, _) = app
        .post("/api/enquiries", Some(&token), enquiry_body(other.id()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let tutor = app.teacher("t@example.com", "Tara Teacher", "Piano").await;
    for patch in [
        json!({ "message": "short" }),
        json!({ "preferredDays": [] }),
        json!({ "preferredDays": ["mon", "mon"] }),
        json!({ "tutorId": "abc" }),
    ] {
        let mut body = enquiry_body(tutor.id());
        for (key, value) in patch.as_object().unwrap() {
            body[key] = value.clone();
        }
        let (status, resp) = app.post("/api/enquiries", Some(&token), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", patch);
        assert_eq!(resp["error"]["code"], "VALIDATION_ERROR");
    }

    let tutor_token = app.token(tutor.id());
    let (status, _) = app
        .post("/api/enquiries", Some(&tutor_token), enquiry_body(tutor.id()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_lists_for_each_side() {
    let s = scene().await;

    let (status, body) = s.app.get("/api/enquiries", Some(&s.student_token)).await;
    assert_eq!(status, StatusCode::OK);
    let item = &body["enquiries"][0];
    assert_eq!(item["tutorName"], "Tara Teacher");
    assert_eq!(item["tutorInstrument"], "Piano");
    assert_eq!(item["tutorLocation"]["city"], "Austin");
    assert_eq!(item["tutorContact"], Value::Null);
    assert_eq!(body["pagination"]["total"], 1);

    let (status, body) = s.app.get("/api/enquiries", Some(&s.tutor_token)).await;
    assert_eq!(status, StatusCode::OK);
    let item = &body["enquiries"][0];
    assert_eq!(item["studentName"], "Sam Student");
    assert_eq!(item["studentEmail"], "s@example.com");
    assert_eq!(item["studentLevel"], "beginner");

    let (_, body) = s
        .app
        .get("/api/enquiries?status=accepted", Some(&s.tutor_token))
        .await;
    assert_eq!(body["enquiries"], json!([]));

    let (status, _) = s.app.get("/api/enquiries?status=bogus", Some(&s.tutor_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_accept_reveals_contact_once() {
    let s = scene().await;
    let uri = format!("/api/enquiries/{}", s.enquiry_id);

    let (status, body) = s
        .app
        .patch(&uri, Some(&s.tutor_token), json!({ "status": "accepted" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enquiry"]["status"], "accepted");
    assert!(body["enquiry"]["respondedAt"].is_string());

    let (_, body) = s.app.get(&uri, Some(&s.student_token)).await;
    assert_eq!(body["enquiry"]["tutorContact"]["mode"], "email");
    assert_eq!(body["enquiry"]["tutorContact"]["value"], "t@example.com");

    let (_, body) = s.app.get("/api/enquiries", Some(&s.student_token)).await;
    assert_eq!(body["enquiries"][0]["tutorContact"]["value"], "t@example.com");

    let (status, body) = s
        .app
        .patch(&uri, Some(&s.tutor_token), json!({ "status": "declined" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ALREADY_RESPONDED");

    let (status, _) = s
        .app
        .patch(&uri, Some(&s.tutor_token), json!({ "status": "pending" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_outsiders_are_refused() {
    let s = scene().await;
    let uri = format!("/api/enquiries/{}", s.enquiry_id);

    let other_tutor = s.app.teacher("o@example.com", "Other Teacher", "Cello").await;
    let other_token = s.app.token(other_tutor.id());
    let other_student = s.app.student("x@example.com", "Other Student").await;

    let (status, body) = s
        .app
        .get(&uri, Some(&s.app.token(other_student.id())))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = s
        .app
        .patch(&uri, Some(&other_token), json!({ "status": "accepted" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = s
        .app
        .get(&format!("/api/enquiries/{}", Uuid::new_v4()), Some(&s.tutor_token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ENQUIRY_NOT_FOUND");

    let (status, _) = s.app.get("/api/enquiries/nope", Some(&s.tutor_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_count_by_status() {
    let s = scene().await;
    let second = s.app.student("b@example.com", "Bea Student").await;
    let third = s.app.student("c@example.com", "Cal Student").await;

    let mut ids = vec![s.enquiry_id.clone()];
    for student in [&second, &third] {
        let (_, body) = s
            .app
            .post(
                "/api/enquiries",
                Some(&s.app.token(student.id())),
                enquiry_body(s.tutor_id),
            )
            .await;
        ids.push(body["enquiry"]["id"].as_str().unwrap().to_string());
    }

    s.app
        .patch(
            &format!("/api/enquiries/{}", ids[0]),
            Some(&s.tutor_token),
            json!({ "status": "accepted" }),
        )
        .await;
    s.app
        .patch(
            &format!("/api/enquiries/{}", ids[1]),
            Some(&s.tutor_token),
            json!({ "status": "declined" }),
        )
        .await;

    let (status, body) = s.app.get("/api/enquiries/stats", Some(&s.tutor_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "pending": 1, "accepted": 1, "declined": 1, "total": 3 })
    );

    let (status, _) = s.app.get("/api/enquiries/stats", Some(&s.student_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = s
        .app
        .get("/api/enquiries?sortBy=status&sortOrder=asc", Some(&s.tutor_token))
        .await;
    let statuses: Vec<&str> = body["enquiries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["accepted", "declined", "pending"]);
}
