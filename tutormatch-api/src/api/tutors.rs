//! Tutor discovery and the teacher's own profile
//!
//! Public views never include the tutor's email or preferred contact; a
//! student only sees contact details through an accepted enquiry.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use tutormatch_common::models::tutor::ALLOWED_TIME_ZONES;
use tutormatch_common::models::{
    AvailabilitySlot, ContactMode, PreferredContact, ProficiencyLevel, TimeZoneSlot, TutorProfile,
};

use super::extract::{ApiJson, ApiQuery};
use crate::auth::CurrentTeacher;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageRequest, Pagination};
use crate::services::tutors::{self, SortOrder, TutorFilter, TutorProfileUpdate, TutorSortBy, TutorSummary};
use crate::validation::{is_clock_time, is_phone, nullable, rule_error, trimmed};
use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Location {
    fn of(profile: &TutorProfile) -> Self {
        Self {
            city: profile.city.clone(),
            state: profile.state.clone(),
            country: profile.country.clone(),
        }
    }
}

/// Tutor as shown to anyone browsing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorView {
    /// The tutor's user id
    pub id: Uuid,
    pub name: String,
    pub photo_url: Option<String>,
    pub instrument: Option<String>,
    pub proficiency_level: Option<ProficiencyLevel>,
    pub location: Location,
    pub hourly_rate: Option<f64>,
    pub rating: f64,
    pub review_count: i64,
    pub bio: Option<String>,
    pub availability: Vec<AvailabilitySlot>,
    pub time_zone_availability: Vec<TimeZoneSlot>,
    pub is_online: bool,
    pub is_verified: bool,
    pub years_of_experience: i64,
}

impl From<TutorSummary> for TutorView {
    fn from(summary: TutorSummary) -> Self {
        let location = Location::of(&summary.profile);
        let profile = summary.profile;
        Self {
            id: profile.user_id,
            name: summary.name,
            photo_url: summary.photo_url,
            instrument: profile.instrument,
            proficiency_level: profile.proficiency_level,
            location,
            hourly_rate: profile.hourly_rate,
            rating: profile.rating,
            review_count: profile.review_count,
            bio: profile.bio,
            availability: profile.availability,
            time_zone_availability: profile.time_zone_availability,
            is_online: profile.is_online,
            is_verified: profile.is_verified,
            years_of_experience: profile.years_of_experience,
        }
    }
}

/// The teacher's own profile, contact details included
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorProfileView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub instrument: Option<String>,
    pub proficiency_level: Option<ProficiencyLevel>,
    pub location: Location,
    pub hourly_rate: Option<f64>,
    pub bio: Option<String>,
    pub availability: Vec<AvailabilitySlot>,
    pub time_zone_availability: Vec<TimeZoneSlot>,
    pub preferred_contact_mode: Option<ContactMode>,
    pub preferred_contact_value: Option<String>,
    pub is_online: bool,
    pub is_verified: bool,
    pub years_of_experience: i64,
    pub rating: f64,
    pub review_count: i64,
    pub onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TutorProfile> for TutorProfileView {
    fn from(profile: TutorProfile) -> Self {
        let location = Location::of(&profile);
        let (preferred_contact_mode, preferred_contact_value) = match profile.preferred_contact {
            Some(contact) => (Some(contact.mode), Some(contact.value)),
            None => (None, None),
        };
        Self {
            id: profile.id,
            user_id: profile.user_id,
            instrument: profile.instrument,
            proficiency_level: profile.proficiency_level,
            location,
            hourly_rate: profile.hourly_rate,
            bio: profile.bio,
            availability: profile.availability,
            time_zone_availability: profile.time_zone_availability,
            preferred_contact_mode,
            preferred_contact_value,
            is_online: profile.is_online,
            is_verified: profile.is_verified,
            years_of_experience: profile.years_of_experience,
            rating: profile.rating,
            review_count: profile.review_count,
            onboarding_complete: profile.onboarding_complete,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Query string of `GET /api/tutors`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TutorListQuery {
    pub instrument: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "minRate: must be a positive number"))]
    pub min_rate: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "maxRate: must be a positive number"))]
    pub max_rate: Option<f64>,
    pub proficiency_level: Option<ProficiencyLevel>,
    pub is_online: Option<bool>,
    pub is_verified: Option<bool>,
    pub sort_by: Option<TutorSortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl TutorListQuery {
    fn into_filter(self) -> ApiResult<(TutorFilter, PageRequest)> {
        self.validate()?;

        let filter = TutorFilter {
            instrument: trimmed(self.instrument),
            city: trimmed(self.city),
            state: trimmed(self.state),
            min_rate: self.min_rate,
            max_rate: self.max_rate,
            proficiency_level: self.proficiency_level,
            is_online: self.is_online,
            is_verified: self.is_verified,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        };
        Ok((filter, PageRequest::new(self.page, self.limit)))
    }
}

#[derive(Debug, Serialize)]
pub struct TutorListResponse {
    pub tutors: Vec<TutorView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct TutorResponse {
    pub tutor: TutorView,
}

#[derive(Debug, Serialize)]
pub struct TutorProfileResponse {
    pub profile: TutorProfileView,
}

/// Body of `POST /api/tutors` and `PATCH /api/tutors`
///
/// Absent fields are left unchanged. `preferredContactMode: null` removes
/// the preferred contact.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "profile_rules"))]
pub struct TutorProfileBody {
    #[validate(length(min = 1, max = 100, message = "instrument: must be between 1 and 100 characters"))]
    pub instrument: Option<String>,
    pub proficiency_level: Option<ProficiencyLevel>,
    #[validate(range(exclusive_min = 0.0, max = 1000.0, message = "hourlyRate: must be positive and at most 1000"))]
    pub hourly_rate: Option<f64>,
    #[validate(length(max = 100, message = "city: must be at most 100 characters"))]
    pub city: Option<String>,
    #[validate(length(max = 100, message = "state: must be at most 100 characters"))]
    pub state: Option<String>,
    #[validate(length(max = 100, message = "country: must be at most 100 characters"))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "bio: must be between 1 and 2000 characters"))]
    pub bio: Option<String>,
    pub availability: Option<Vec<AvailabilitySlot>>,
    pub time_zone_availability: Option<Vec<TimeZoneSlot>>,
    #[serde(default, deserialize_with = "nullable")]
    pub preferred_contact_mode: Option<Option<ContactMode>>,
    #[serde(default, deserialize_with = "nullable")]
    pub preferred_contact_value: Option<Option<String>>,
    pub is_online: Option<bool>,
    #[validate(range(min = 0, max = 100, message = "yearsOfExperience: must be between 0 and 100"))]
    pub years_of_experience: Option<i64>,
}

fn availability_rules(slots: &[AvailabilitySlot]) -> Result<(), ValidationError> {
    if slots
        .iter()
        .any(|slot| !is_clock_time(&slot.start_time) || !is_clock_time(&slot.end_time))
    {
        return Err(rule_error(
            "clock_time",
            "availability: invalid time format (use HH:MM)",
        ));
    }
    Ok(())
}

fn time_zone_rules(slots: &[TimeZoneSlot]) -> Result<(), ValidationError> {
    for slot in slots {
        if !ALLOWED_TIME_ZONES.contains(&slot.time_zone.as_str()) {
            return Err(rule_error(
                "time_zone",
                format!(
                    "timeZoneAvailability: time zone must be one of: {}",
                    ALLOWED_TIME_ZONES.join(", ")
                ),
            ));
        }
        if !is_clock_time(&slot.start_time) || !is_clock_time(&slot.end_time) {
            return Err(rule_error(
                "clock_time",
                "timeZoneAvailability: invalid time format (use HH:MM)",
            ));
        }
    }
    Ok(())
}

fn contact_matches(mode: &ContactMode, value: &str) -> bool {
    value.chars().count() <= 255
        && match mode {
            ContactMode::Email => value.validate_email(),
            ContactMode::Phone => is_phone(value),
        }
}

/// A contact value needs a mode, and a mode needs a matching value
fn contact_rules(
    mode: Option<&Option<ContactMode>>,
    value: Option<&Option<String>>,
) -> Result<(), ValidationError> {
    let value = value
        .and_then(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (mode, value) {
        (None | Some(None), Some(_)) => Err(rule_error(
            "contact_mode",
            "preferredContactMode: required when preferredContactValue is set",
        )),
        (Some(Some(mode)), Some(value)) if contact_matches(mode, value) => Ok(()),
        (Some(Some(_)), _) => Err(rule_error(
            "contact_value",
            "preferredContactValue: when preferred contact is set, provide a valid email or phone number",
        )),
        _ => Ok(()),
    }
}

fn profile_rules(body: &TutorProfileBody) -> Result<(), ValidationError> {
    if let Some(slots) = &body.availability {
        availability_rules(slots)?;
    }
    if let Some(slots) = &body.time_zone_availability {
        time_zone_rules(slots)?;
    }
    contact_rules(
        body.preferred_contact_mode.as_ref(),
        body.preferred_contact_value.as_ref(),
    )
}

/// Absent leaves the contact alone, a null mode clears it
fn preferred_contact(
    mode: Option<Option<ContactMode>>,
    value: Option<Option<String>>,
) -> Option<Option<PreferredContact>> {
    match (mode, value) {
        (Some(Some(mode)), Some(Some(value))) => Some(Some(PreferredContact {
            mode,
            value: value.trim().to_string(),
        })),
        (Some(None), _) => Some(None),
        _ => None,
    }
}

impl TutorProfileBody {
    /// Validate and convert; onboarding requires an instrument
    pub fn into_update(self, onboarding: bool) -> ApiResult<TutorProfileUpdate> {
        self.validate()?;

        let instrument = trimmed(self.instrument);
        if instrument.is_none() && onboarding {
            return Err(ApiError::validation("instrument: is required"));
        }

        Ok(TutorProfileUpdate {
            instrument,
            proficiency_level: self.proficiency_level,
            hourly_rate: self.hourly_rate,
            city: trimmed(self.city),
            state: trimmed(self.state),
            country: trimmed(self.country),
            bio: trimmed(self.bio),
            availability: self.availability,
            time_zone_availability: self.time_zone_availability,
            preferred_contact: preferred_contact(
                self.preferred_contact_mode,
                self.preferred_contact_value,
            ),
            is_online: self.is_online,
            years_of_experience: self.years_of_experience,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "availability_body_rules"))]
pub struct AvailabilityBody {
    #[validate(length(min = 1, message = "availability: at least one availability slot is required"))]
    pub availability: Vec<AvailabilitySlot>,
}

fn availability_body_rules(body: &AvailabilityBody) -> Result<(), ValidationError> {
    availability_rules(&body.availability)
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub availability: Vec<AvailabilitySlot>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineStatus {
    pub is_online: bool,
}

/// GET /api/tutors
pub async fn list_tutors(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TutorListQuery>,
) -> ApiResult<Json<TutorListResponse>> {
    let (filter, page) = query.into_filter()?;
    let (tutors, total) = tutors::list_tutors(&state.db, &filter, page).await?;

    Ok(Json(TutorListResponse {
        tutors: tutors.into_iter().map(TutorView::from).collect(),
        pagination: Pagination::new(page, total),
    }))
}

/// GET /api/tutors/:id
pub async fn get_tutor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TutorResponse>> {
    let tutor_id = tutors::parse_tutor_id(&id)?;
    let tutor = tutors::get_tutor(&state.db, tutor_id).await?;

    Ok(Json(TutorResponse {
        tutor: tutor.into(),
    }))
}

/// POST /api/tutors - complete onboarding
pub async fn create_tutor_profile(
    State(state): State<AppState>,
    teacher: CurrentTeacher,
    ApiJson(body): ApiJson<TutorProfileBody>,
) -> ApiResult<(StatusCode, Json<TutorProfileResponse>)> {
    let update = body.into_update(true)?;
    let profile = tutors::save_tutor_profile(&state.db, teacher.user.id, update, true).await?;

    Ok((
        StatusCode::CREATED,
        Json(TutorProfileResponse {
            profile: profile.into(),
        }),
    ))
}

/// PATCH /api/tutors
pub async fn update_tutor_profile(
    State(state): State<AppState>,
    teacher: CurrentTeacher,
    ApiJson(body): ApiJson<TutorProfileBody>,
) -> ApiResult<Json<TutorProfileResponse>> {
    let update = body.into_update(false)?;
    let profile = tutors::save_tutor_profile(&state.db, teacher.user.id, update, false).await?;

    Ok(Json(TutorProfileResponse {
        profile: profile.into(),
    }))
}

/// PATCH /api/tutors/availability
pub async fn update_availability(
    State(state): State<AppState>,
    teacher: CurrentTeacher,
    ApiJson(body): ApiJson<AvailabilityBody>,
) -> ApiResult<Json<AvailabilityResponse>> {
    body.validate()?;

    let availability =
        tutors::update_availability(&state.db, teacher.user.id, body.availability).await?;
    Ok(Json(AvailabilityResponse { availability }))
}

/// PATCH /api/tutors/online-status
pub async fn update_online_status(
    State(state): State<AppState>,
    teacher: CurrentTeacher,
    ApiJson(body): ApiJson<OnlineStatus>,
) -> ApiResult<Json<OnlineStatus>> {
    let is_online = tutors::update_online_status(&state.db, teacher.user.id, body.is_online).await?;
    Ok(Json(OnlineStatus { is_online }))
}

/// Build tutor routes
pub fn tutor_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tutors",
            get(list_tutors)
                .post(create_tutor_profile)
                .patch(update_tutor_profile),
        )
        .route("/api/tutors/availability", patch(update_availability))
        .route("/api/tutors/online-status", patch(update_online_status))
        .route("/api/tutors/:id", get(get_tutor))
}
