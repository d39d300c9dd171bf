//! Enquiry endpoints
//!
//! Students send and list their enquiries; teachers list, answer and count
//! the ones they received.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tutormatch_common::models::{
    DayOfWeek, EnquiryStats, EnquiryStatus, ProficiencyLevel, TimePreference,
};
use tutormatch_common::uuid_utils;

use super::extract::{ApiJson, ApiQuery};
use crate::auth::{CurrentParticipant, CurrentStudent, CurrentTeacher};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageRequest, Pagination};
use crate::services::enquiries::{
    self, EnquiryDetail, EnquiryListQuery, EnquiryResponse, EnquirySortBy, NewEnquiry,
    StudentEnquiryItem,
};
use crate::services::tutors::SortOrder;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnquiryBody {
    pub tutor_id: String,
    #[validate(length(min = 10, max = 1000, message = "message: must be between 10 and 1000 characters"))]
    pub message: String,
    pub student_level: ProficiencyLevel,
    #[validate(length(min = 1, max = 7, message = "preferredDays: select between 1 and 7 days"))]
    pub preferred_days: Vec<DayOfWeek>,
    pub preferred_time: TimePreference,
}

impl CreateEnquiryBody {
    fn into_new_enquiry(self) -> ApiResult<NewEnquiry> {
        self.validate()?;
        let tutor_id = uuid_utils::parse_id("tutor ID", &self.tutor_id)?;

        Ok(NewEnquiry {
            tutor_id,
            message: self.message.trim().to_string(),
            student_level: self.student_level,
            preferred_days: self.preferred_days,
            preferred_time: self.preferred_time,
        })
    }
}

/// Query string of `GET /api/enquiries`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryListParams {
    pub status: Option<EnquiryStatus>,
    pub sort_by: Option<EnquirySortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<EnquiryListParams> for EnquiryListQuery {
    fn from(params: EnquiryListParams) -> Self {
        EnquiryListQuery {
            status: params.status,
            sort_by: params.sort_by.unwrap_or_default(),
            sort_order: params.sort_order.unwrap_or_default(),
            page: PageRequest::new(params.page, params.limit),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: EnquiryStatus,
}

#[derive(Debug, Serialize)]
pub struct EnquiryListResponse<T> {
    pub enquiries: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct EnquiryEnvelope<T> {
    pub enquiry: T,
}

fn parse_enquiry_id(raw: &str) -> ApiResult<Uuid> {
    Ok(uuid_utils::parse_id("enquiry ID", raw)?)
}

/// POST /api/enquiries
pub async fn create_enquiry(
    State(state): State<AppState>,
    student: CurrentStudent,
    ApiJson(body): ApiJson<CreateEnquiryBody>,
) -> ApiResult<(StatusCode, Json<EnquiryEnvelope<StudentEnquiryItem>>)> {
    let new_enquiry = body.into_new_enquiry()?;
    let enquiry = enquiries::create_enquiry(&state.db, student.user.id, new_enquiry).await?;

    Ok((StatusCode::CREATED, Json(EnquiryEnvelope { enquiry })))
}

/// GET /api/enquiries - sent (student) or received (teacher)
pub async fn list_enquiries(
    State(state): State<AppState>,
    participant: CurrentParticipant,
    ApiQuery(params): ApiQuery<EnquiryListParams>,
) -> ApiResult<Response> {
    let query = EnquiryListQuery::from(params);

    let response = match participant {
        CurrentParticipant::Student(student) => {
            let (enquiries, pagination) =
                enquiries::list_student_enquiries(&state.db, student.user.id, &query).await?;
            Json(EnquiryListResponse {
                enquiries,
                pagination,
            })
            .into_response()
        }
        CurrentParticipant::Teacher(teacher) => {
            let (enquiries, pagination) =
                enquiries::list_tutor_enquiries(&state.db, teacher.user.id, &query).await?;
            Json(EnquiryListResponse {
                enquiries,
                pagination,
            })
            .into_response()
        }
    };

    Ok(response)
}

/// GET /api/enquiries/stats
pub async fn enquiry_stats(
    State(state): State<AppState>,
    teacher: CurrentTeacher,
) -> ApiResult<Json<EnquiryStats>> {
    Ok(Json(enquiries::enquiry_stats(&state.db, teacher.user.id).await?))
}

/// GET /api/enquiries/:id
pub async fn get_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    participant: CurrentParticipant,
) -> ApiResult<Json<EnquiryEnvelope<EnquiryDetail>>> {
    let enquiry_id = parse_enquiry_id(&id)?;
    let enquiry = enquiries::get_enquiry_for(&state.db, enquiry_id, participant.user().id).await?;

    Ok(Json(EnquiryEnvelope { enquiry }))
}

/// PATCH /api/enquiries/:id - accept or decline
pub async fn respond_to_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    teacher: CurrentTeacher,
    ApiJson(body): ApiJson<StatusBody>,
) -> ApiResult<Json<EnquiryEnvelope<EnquiryResponse>>> {
    let enquiry_id = parse_enquiry_id(&id)?;
    if body.status == EnquiryStatus::Pending {
        return Err(ApiError::validation("status: must be accepted or declined"));
    }

    let enquiry =
        enquiries::respond_to_enquiry(&state.db, teacher.user.id, enquiry_id, body.status).await?;

    Ok(Json(EnquiryEnvelope { enquiry }))
}

/// Build enquiry routes
pub fn enquiry_routes() -> Router<AppState> {
    Router::new()
        .route("/api/enquiries", get(list_enquiries).post(create_enquiry))
        .route("/api/enquiries/stats", get(enquiry_stats))
        .route("/api/enquiries/:id", get(get_enquiry).patch(respond_to_enquiry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> CreateEnquiryBody {
        serde_json::from_value(json).unwrap()
    }

    fn valid() -> serde_json::Value {
        serde_json::json!({
            "tutorId": Uuid::new_v4().to_string(),
            "message": "I'd like weekly piano lessons",
            "studentLevel": "beginner",
            "preferredDays": ["mon", "wed"],
            "preferredTime": "evening"
        })
    }

    #[test]
    fn test_valid_body_converts() {
        let enquiry = body(valid()).into_new_enquiry().unwrap();
        assert_eq!(enquiry.preferred_days, vec![DayOfWeek::Mon, DayOfWeek::Wed]);
    }

    #[test]
    fn test_bad_tutor_id_message() {
        let mut json = valid();
        json["tutorId"] = "nope".into();
        let err = body(json).into_new_enquiry().unwrap_err();
        assert_eq!(err.to_string(), "Invalid tutor ID format");
    }

    #[test]
    fn test_message_and_days_bounds() {
        let mut short = valid();
        short["message"] = "too short".into();
        assert!(body(short).into_new_enquiry().is_err());

        let mut no_days = valid();
        no_days["preferredDays"] = serde_json::json!([]);
        assert!(body(no_days).into_new_enquiry().is_err());
    }
}
