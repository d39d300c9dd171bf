//! Request authentication and role guards
//!
//! Handlers name the caller they need as an extractor argument:
//!
//! - [`CurrentAccount`]: any signed-in user, role or not
//! - [`CurrentStudent`] / [`CurrentTeacher`]: that role, with its profile
//! - [`CurrentParticipant`]: a student or a teacher
//!
//! Tokens come from `Authorization: Bearer <token>` and are checked with
//! [`tutormatch_common::auth::verify_token`].

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use tutormatch_common::auth::{verify_token, TokenError};
use tutormatch_common::models::{Account, RoleProfile, StudentProfile, TutorProfile, User};
use tutormatch_common::time;

use crate::error::ApiError;
use crate::services::accounts::load_account;
use crate::AppState;

fn no_token() -> ApiError {
    ApiError::unauthorized("NO_TOKEN", "No authentication token provided")
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts.headers.get(AUTHORIZATION).ok_or_else(no_token)?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("INVALID_TOKEN", "Invalid token"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(no_token)
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired { .. } => ApiError::unauthorized("TOKEN_EXPIRED", "Token has expired"),
            TokenError::InvalidKey => ApiError::Internal(err.to_string()),
            _ => ApiError::unauthorized("INVALID_TOKEN", "Invalid token"),
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

#[async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let user_id = verify_token(&state.token_secret, token, time::now()).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::from(e)
        })?;

        match load_account(&state.db, user_id).await? {
            Some(account) => Ok(CurrentAccount(account)),
            None => {
                warn!(user_id = %user_id, "Valid token for unknown user");
                Err(ApiError::unauthorized("USER_NOT_FOUND", "User not found"))
            }
        }
    }
}

fn no_role() -> ApiError {
    ApiError::forbidden("NO_ROLE", "Please select a role first")
}

fn wrong_role(required: &str) -> ApiError {
    ApiError::forbidden("FORBIDDEN", format!("Access denied. Required role: {}", required))
}

/// A caller with the student role
#[derive(Debug, Clone)]
pub struct CurrentStudent {
    pub user: User,
    pub profile: StudentProfile,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentAccount(account) = CurrentAccount::from_request_parts(parts, state).await?;

        match account.profile {
            RoleProfile::Student(profile) => Ok(CurrentStudent {
                user: account.user,
                profile,
            }),
            RoleProfile::Unassigned => Err(no_role()),
            _ => Err(wrong_role("student")),
        }
    }
}

/// A caller with the teacher role
#[derive(Debug, Clone)]
pub struct CurrentTeacher {
    pub user: User,
    pub profile: TutorProfile,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentTeacher {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentAccount(account) = CurrentAccount::from_request_parts(parts, state).await?;

        match account.profile {
            RoleProfile::Teacher(profile) => Ok(CurrentTeacher {
                user: account.user,
                profile,
            }),
            RoleProfile::Unassigned => Err(no_role()),
            _ => Err(wrong_role("teacher")),
        }
    }
}

/// Either side of an enquiry
#[derive(Debug, Clone)]
pub enum CurrentParticipant {
    Student(CurrentStudent),
    Teacher(CurrentTeacher),
}

impl CurrentParticipant {
    pub fn user(&self) -> &User {
        match self {
            CurrentParticipant::Student(student) => &student.user,
            CurrentParticipant::Teacher(teacher) => &teacher.user,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentParticipant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentAccount(account) = CurrentAccount::from_request_parts(parts, state).await?;

        match account.profile {
            RoleProfile::Student(profile) => Ok(CurrentParticipant::Student(CurrentStudent {
                user: account.user,
                profile,
            })),
            RoleProfile::Teacher(profile) => Ok(CurrentParticipant::Teacher(CurrentTeacher {
                user: account.user,
                profile,
            })),
            RoleProfile::Unassigned => Err(no_role()),
            RoleProfile::Admin => Err(wrong_role("student or teacher")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))).unwrap(), "abc.def");

        for header in [None, Some("Basic abc"), Some("Bearer "), Some("bearer abc")] {
            let err = bearer_token(&parts_with(header)).unwrap_err();
            assert_eq!(err.code(), "NO_TOKEN", "header {:?}", header);
        }
    }

    #[test]
    fn test_token_errors_map_to_codes() {
        let expired: ApiError = TokenError::Expired { expired_at: 0 }.into();
        assert_eq!(expired.code(), "TOKEN_EXPIRED");

        let forged: ApiError = TokenError::BadSignature.into();
        assert_eq!(forged.code(), "INVALID_TOKEN");
        assert_eq!(forged.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
