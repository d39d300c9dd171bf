//! The signed-in user's account: who am I, pick a role, edit name/photo
//!
//! Registration and sign-in live outside this service; these routes only
//! see callers that already hold a token.

use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use tutormatch_common::models::{Account, Role, RoleProfile, User};

use super::extract::ApiJson;
use super::students::StudentProfileView;
use super::tutors::TutorProfileView;
use crate::auth::CurrentAccount;
use crate::error::{ApiError, ApiResult};
use crate::services::accounts;
use crate::validation::nullable;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProfileView {
    Student(StudentProfileView),
    Teacher(TutorProfileView),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user: User,
    pub role: Option<Role>,
    pub profile: Option<ProfileView>,
    pub has_completed_onboarding: bool,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let role = account.role();
        let has_completed_onboarding = account.has_completed_onboarding();
        let profile = match account.profile {
            RoleProfile::Student(profile) => Some(ProfileView::Student(StudentProfileView::new(
                &account.user,
                profile,
            ))),
            RoleProfile::Teacher(profile) => Some(ProfileView::Teacher(profile.into())),
            RoleProfile::Unassigned | RoleProfile::Admin => None,
        };

        Self {
            user: account.user,
            role,
            profile,
            has_completed_onboarding,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

/// Body of `PATCH /api/auth/profile`; `photoUrl: null` removes the photo
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileBody {
    #[validate(length(min = 2, max = 255, message = "name: must be between 2 and 255 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(url(message = "photoUrl: invalid photo URL"))]
    pub photo_url: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// GET /api/auth/me
pub async fn me(CurrentAccount(account): CurrentAccount) -> Json<AccountResponse> {
    Json(account.into())
}

/// PATCH /api/auth/role
pub async fn set_role(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    ApiJson(body): ApiJson<RoleBody>,
) -> ApiResult<Json<AccountResponse>> {
    if body.role == Role::Admin {
        return Err(ApiError::validation("role: must be student or teacher"));
    }

    let account = accounts::set_role(&state.db, account.id(), body.role).await?;
    Ok(Json(account.into()))
}

/// PATCH /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    ApiJson(body): ApiJson<UserProfileBody>,
) -> ApiResult<Json<UserResponse>> {
    body.validate()?;
    let name = body.name.map(|n| n.trim().to_string());

    let user = accounts::update_user_profile(&state.db, account.id(), name, body.photo_url).await?;
    Ok(Json(UserResponse { user }))
}

/// Build account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/role", patch(set_role))
        .route("/api/auth/profile", patch(update_profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> UserProfileBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_profile_body_rules() {
        assert!(body(r#"{"name":"Sam","photoUrl":"https://img.example.com/s.png"}"#)
            .validate()
            .is_ok());
        assert!(body(r#"{"photoUrl":null}"#).validate().is_ok());
        assert!(body(r#"{"name":"S"}"#).validate().is_err());
        assert!(body(&format!(r#"{{"name":"{}"}}"#, "n".repeat(256))).validate().is_err());

        let err: ApiError = body(r#"{"photoUrl":"not a url"}"#).validate().unwrap_err().into();
        assert_eq!(err.to_string(), "photoUrl: invalid photo URL");
    }
}
