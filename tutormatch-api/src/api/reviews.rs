//! Tutor reviews

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use validator::Validate;

use tutormatch_common::models::TutorReview;

use super::extract::{ApiJson, ApiQuery};
use crate::auth::CurrentStudent;
use crate::error::ApiResult;
use crate::pagination::{PageQuery, PageRequest, Pagination};
use crate::services::reviews::{self, ReviewListItem};
use crate::services::tutors::parse_tutor_id;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    #[validate(range(min = 1, max = 5, message = "rating: must be an integer between 1 and 5"))]
    pub rating: i64,
    /// Bounded as sent, before trimming
    #[serde(default)]
    #[validate(length(max = 350, message = "reviewText: must be at most 350 characters"))]
    pub review_text: Option<String>,
}

impl ReviewBody {
    fn into_review(self) -> ApiResult<(i64, String)> {
        self.validate()?;
        let text = self.review_text.map(|t| t.trim().to_string()).unwrap_or_default();
        Ok((self.rating, text))
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub review: TutorReview,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewListItem>,
    pub pagination: Pagination,
}

/// POST /api/tutors/:id/reviews - create or replace the caller's review
pub async fn submit_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    student: CurrentStudent,
    ApiJson(body): ApiJson<ReviewBody>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    let tutor_id = parse_tutor_id(&id)?;
    let (rating, text) = body.into_review()?;

    let review = reviews::submit_review(
        &state.db,
        &state.review_locks,
        tutor_id,
        student.user.id,
        rating,
        &text,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse { review })))
}

/// GET /api/tutors/:id/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<ReviewListResponse>> {
    let tutor_id = parse_tutor_id(&id)?;
    let (reviews, pagination) =
        reviews::list_reviews_for_tutor(&state.db, tutor_id, PageRequest::from(query)).await?;

    Ok(Json(ReviewListResponse {
        reviews,
        pagination,
    }))
}

/// Build review routes
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/api/tutors/:id/reviews", get(list_reviews).post(submit_review))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn body(json: &str) -> ReviewBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_rating_must_be_whole_and_in_range() {
        assert_eq!(body(r#"{"rating":4}"#).into_review().unwrap(), (4, String::new()));
        for bad in ["0", "6", "-1"] {
            let json = format!(r#"{{"rating":{}}}"#, bad);
            assert!(body(&json).into_review().is_err(), "rating {} accepted", bad);
        }
        assert!(serde_json::from_str::<ReviewBody>(r#"{"rating":4.5}"#).is_err());
    }

    #[test]
    fn test_review_text_trimmed_and_bounded() {
        let (_, text) = body(r#"{"rating":5,"reviewText":"  Great teacher  "}"#)
            .into_review()
            .unwrap();
        assert_eq!(text, "Great teacher");

        let long = format!(r#"{{"rating":5,"reviewText":"{}"}}"#, "a".repeat(351));
        assert!(body(&long).into_review().is_err());
    }

    #[test]
    fn test_review_text_bounded_before_trimming() {
        // 350 characters of text, 352 as sent
        let padded = format!(r#"{{"rating":5,"reviewText":" {} "}}"#, "a".repeat(350));
        match body(&padded).into_review() {
            Err(ApiError::Validation(message)) => {
                assert_eq!(message, "reviewText: must be at most 350 characters")
            }
            other => panic!("unexpected: {:?}", other),
        }

        let exact = format!(r#"{{"rating":5,"reviewText":"{}"}}"#, "é".repeat(350));
        assert!(body(&exact).into_review().is_ok());
    }
}
