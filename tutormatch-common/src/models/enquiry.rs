//! Enquiries: contact requests from a student to a tutor

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use super::{text_enum, DayOfWeek, ProficiencyLevel};
use crate::{uuid_utils, Result};

pub const MIN_ENQUIRY_MESSAGE_CHARS: usize = 10;
pub const MAX_ENQUIRY_MESSAGE_CHARS: usize = 1000;

text_enum! {
    /// Lifecycle: `pending` moves once to `accepted` or `declined`
    EnquiryStatus {
        Pending => "pending",
        Accepted => "accepted",
        Declined => "declined",
    }
}

text_enum! {
    TimePreference {
        Morning => "morning",
        Afternoon => "afternoon",
        Evening => "evening",
        Flexible => "flexible",
    }
}

#[derive(Debug, Clone)]
pub struct Enquiry {
    pub id: Uuid,
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub message: String,
    pub student_level: ProficiencyLevel,
    pub preferred_days: Vec<DayOfWeek>,
    pub preferred_time: TimePreference,
    pub status: EnquiryStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enquiry {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let id: String = row.try_get("id")?;
        let student_id: String = row.try_get("student_id")?;
        let tutor_id: String = row.try_get("tutor_id")?;
        let level: String = row.try_get("student_level")?;
        let days: Json<Vec<DayOfWeek>> = row.try_get("preferred_days")?;
        let time: String = row.try_get("preferred_time")?;
        let status: String = row.try_get("status")?;

        Ok(Self {
            id: uuid_utils::from_column(&id)?,
            student_id: uuid_utils::from_column(&student_id)?,
            tutor_id: uuid_utils::from_column(&tutor_id)?,
            message: row.try_get("message")?,
            student_level: level.parse()?,
            preferred_days: days.0,
            preferred_time: time.parse()?,
            status: status.parse()?,
            responded_at: row.try_get("responded_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.student_id == user_id || self.tutor_id == user_id
    }
}

/// Per-status enquiry counts for a tutor's dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnquiryStats {
    pub pending: i64,
    pub accepted: i64,
    pub declined: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_serialize_flat() {
        let stats = EnquiryStats {
            pending: 2,
            accepted: 1,
            declined: 0,
            total: 3,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["pending"], 2);
        assert_eq!(json["total"], 3);
    }
}
