//! Tutor profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use super::{text_enum, DayOfWeek, ProficiencyLevel};
use crate::{time, uuid_utils, Result};

text_enum! {
    ContactMode {
        Email => "email",
        Phone => "phone",
    }
}

/// IANA zones accepted in `timeZoneAvailability` slots
pub const ALLOWED_TIME_ZONES: &[&str] = &[
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "America/Phoenix",
    "America/Toronto",
    "America/Vancouver",
    "America/Mexico_City",
    "America/Sao_Paulo",
    "America/Buenos_Aires",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Europe/Madrid",
    "Europe/Rome",
    "Europe/Amsterdam",
    "Europe/Vienna",
    "Europe/Athens",
    "Europe/Moscow",
    "UTC",
];

/// Weekly teaching window, times as `HH:MM`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub day: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
}

/// Daily window expressed in a named time zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeZoneSlot {
    pub time_zone: String,
    pub start_time: String,
    pub end_time: String,
}

/// How an accepted student should reach the tutor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredContact {
    pub mode: ContactMode,
    pub value: String,
}

/// Row from `tutor_profiles`
///
/// `rating` and `review_count` are a projection of `tutor_reviews` and are
/// only ever written by the review service's recomputation step.
#[derive(Debug, Clone)]
pub struct TutorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub instrument: Option<String>,
    pub proficiency_level: Option<ProficiencyLevel>,
    pub hourly_rate: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub availability: Vec<AvailabilitySlot>,
    pub time_zone_availability: Vec<TimeZoneSlot>,
    pub preferred_contact: Option<PreferredContact>,
    pub is_online: bool,
    pub is_verified: bool,
    pub years_of_experience: i64,
    pub rating: f64,
    pub review_count: i64,
    pub onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TutorProfile {
    /// Empty profile as created when a user picks the teacher role
    pub fn new(user_id: Uuid) -> Self {
        let now = time::now();
        Self {
            id: uuid_utils::generate(),
            user_id,
            instrument: None,
            proficiency_level: None,
            hourly_rate: None,
            city: None,
            state: None,
            country: None,
            bio: None,
            availability: Vec::new(),
            time_zone_availability: Vec::new(),
            preferred_contact: None,
            is_online: false,
            is_verified: false,
            years_of_experience: 0,
            rating: 0.0,
            review_count: 0,
            onboarding_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Decode a row selected with the `tp.*` column set
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let level: Option<String> = row.try_get("proficiency_level")?;
        let availability: Option<Json<Vec<AvailabilitySlot>>> = row.try_get("availability")?;
        let time_zones: Option<Json<Vec<TimeZoneSlot>>> = row.try_get("time_zone_availability")?;
        let contact_mode: Option<String> = row.try_get("preferred_contact_mode")?;
        let contact_value: Option<String> = row.try_get("preferred_contact_value")?;

        let preferred_contact = match (contact_mode, contact_value) {
            (Some(mode), Some(value)) => Some(PreferredContact {
                mode: mode.parse()?,
                value,
            }),
            _ => None,
        };

        Ok(Self {
            id: uuid_utils::from_column(&id)?,
            user_id: uuid_utils::from_column(&user_id)?,
            instrument: row.try_get("instrument")?,
            proficiency_level: level.map(|l| l.parse()).transpose()?,
            hourly_rate: row.try_get("hourly_rate")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            country: row.try_get("country")?,
            bio: row.try_get("bio")?,
            availability: availability.map(|j| j.0).unwrap_or_default(),
            time_zone_availability: time_zones.map(|j| j.0).unwrap_or_default(),
            preferred_contact,
            is_online: row.try_get("is_online")?,
            is_verified: row.try_get("is_verified")?,
            years_of_experience: row.try_get("years_of_experience")?,
            rating: row.try_get("rating")?,
            review_count: row.try_get("review_count")?,
            onboarding_complete: row.try_get("onboarding_complete")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
