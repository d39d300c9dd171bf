//! The student's own profile

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use tutormatch_common::models::{ProficiencyLevel, StudentProfile, User};

use super::extract::ApiJson;
use crate::auth::CurrentStudent;
use crate::error::ApiResult;
use crate::services::students::{self, StudentProfileUpdate};
use crate::validation::{nullable, rule_error};
use crate::AppState;

/// Student profile joined with the public user fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfileView {
    /// The student's user id
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub level: ProficiencyLevel,
    pub preferred_instruments: Vec<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentProfileView {
    pub fn new(user: &User, profile: StudentProfile) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            photo_url: user.photo_url.clone(),
            level: profile.level,
            preferred_instruments: profile.preferred_instruments,
            bio: profile.bio,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentProfileResponse {
    pub profile: StudentProfileView,
}

/// Body of `PATCH /api/students/profile`; `bio: null` clears the bio
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "instruments_named"))]
pub struct StudentProfileBody {
    pub level: Option<ProficiencyLevel>,
    #[validate(length(max = 10, message = "preferredInstruments: maximum 10 instruments allowed"))]
    pub preferred_instruments: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 500, message = "bio: must be at most 500 characters"))]
    pub bio: Option<Option<String>>,
}

fn instruments_named(body: &StudentProfileBody) -> Result<(), ValidationError> {
    let blank = body
        .preferred_instruments
        .iter()
        .flatten()
        .any(|i| i.trim().is_empty());
    if blank {
        return Err(rule_error(
            "instrument_name",
            "preferredInstruments: instrument name cannot be empty",
        ));
    }
    Ok(())
}

impl StudentProfileBody {
    fn into_update(self) -> ApiResult<StudentProfileUpdate> {
        self.validate()?;

        let preferred_instruments = self
            .preferred_instruments
            .map(|list| list.iter().map(|i| i.trim().to_string()).collect());

        // A blank bio clears it, like null
        let bio = self
            .bio
            .map(|bio| bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()));

        Ok(StudentProfileUpdate {
            level: self.level,
            preferred_instruments,
            bio,
        })
    }
}

/// GET /api/students/profile
pub async fn get_profile(student: CurrentStudent) -> Json<StudentProfileResponse> {
    Json(StudentProfileResponse {
        profile: StudentProfileView::new(&student.user, student.profile),
    })
}

/// PATCH /api/students/profile
pub async fn update_profile(
    State(state): State<AppState>,
    student: CurrentStudent,
    ApiJson(body): ApiJson<StudentProfileBody>,
) -> ApiResult<Json<StudentProfileResponse>> {
    let update = body.into_update()?;
    let profile = students::update_student_profile(&state.db, student.user.id, update).await?;

    Ok(Json(StudentProfileResponse {
        profile: StudentProfileView::new(&student.user, profile),
    }))
}

/// Build student routes
pub fn student_routes() -> Router<AppState> {
    Router::new().route("/api/students/profile", get(get_profile).patch(update_profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> StudentProfileBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_instrument_limits() {
        let eleven: Vec<String> = (0..11).map(|i| format!("instrument {}", i)).collect();
        let json = serde_json::json!({ "preferredInstruments": eleven }).to_string();
        assert!(body(&json).into_update().is_err());

        assert!(body(r#"{"preferredInstruments":["Piano","  "]}"#).into_update().is_err());

        let update = body(r#"{"preferredInstruments":[" Piano "]}"#).into_update().unwrap();
        assert_eq!(update.preferred_instruments, Some(vec!["Piano".to_string()]));
    }

    #[test]
    fn test_bio_null_and_blank_clear() {
        assert_eq!(body(r#"{"bio":null}"#).into_update().unwrap().bio, Some(None));
        assert_eq!(body(r#"{"bio":"   "}"#).into_update().unwrap().bio, Some(None));
        assert_eq!(body(r#"{}"#).into_update().unwrap().bio, None);

        let long = serde_json::json!({ "bio": "b".repeat(501) }).to_string();
        assert!(body(&long).into_update().is_err());
    }
}
