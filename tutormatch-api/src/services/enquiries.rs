//! Enquiries: a student's contact request to a tutor and the tutor's answer

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::info;
use uuid::Uuid;

use tutormatch_common::models::enquiry::{MAX_ENQUIRY_MESSAGE_CHARS, MIN_ENQUIRY_MESSAGE_CHARS};
use tutormatch_common::models::{
    ContactMode, DayOfWeek, Enquiry, EnquiryStats, EnquiryStatus, PreferredContact,
    ProficiencyLevel, TimePreference,
};
use tutormatch_common::{time, uuid_utils, Error, Result};

use super::tutors::SortOrder;
use crate::pagination::{PageRequest, Pagination};

const ENQUIRY_COLUMNS: &str = "e.id, e.student_id, e.tutor_id, e.message, e.student_level, \
    e.preferred_days, e.preferred_time, e.status, e.responded_at, e.created_at, e.updated_at";

#[derive(Debug, Clone)]
pub struct NewEnquiry {
    pub tutor_id: Uuid,
    pub message: String,
    pub student_level: ProficiencyLevel,
    pub preferred_days: Vec<DayOfWeek>,
    pub preferred_time: TimePreference,
}

impl NewEnquiry {
    /// Trim the message and check bounds
    fn normalized(mut self) -> Result<Self> {
        self.message = self.message.trim().to_string();

        let chars = self.message.chars().count();
        if chars < MIN_ENQUIRY_MESSAGE_CHARS {
            return Err(Error::validation(format!(
                "message: must be at least {} characters",
                MIN_ENQUIRY_MESSAGE_CHARS
            )));
        }
        if chars > MAX_ENQUIRY_MESSAGE_CHARS {
            return Err(Error::validation(format!(
                "message: must be at most {} characters",
                MAX_ENQUIRY_MESSAGE_CHARS
            )));
        }

        if self.preferred_days.is_empty() {
            return Err(Error::validation("preferredDays: at least one day is required"));
        }
        let distinct: HashSet<_> = self.preferred_days.iter().collect();
        if distinct.len() != self.preferred_days.len() {
            return Err(Error::validation("preferredDays: days must not repeat"));
        }

        Ok(self)
    }
}

/// Tutor-side location shown to the student
#[derive(Debug, Clone, Serialize)]
pub struct TutorLocation {
    pub city: Option<String>,
    pub state: Option<String>,
}

/// An enquiry as the sending student sees it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEnquiryItem {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub tutor_name: String,
    pub tutor_photo_url: Option<String>,
    pub tutor_instrument: Option<String>,
    pub tutor_location: Option<TutorLocation>,
    /// Only once the tutor has accepted
    pub tutor_contact: Option<PreferredContact>,
    pub message: String,
    pub student_level: ProficiencyLevel,
    pub preferred_days: Vec<DayOfWeek>,
    pub preferred_time: TimePreference,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl StudentEnquiryItem {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let enquiry = Enquiry::from_row(row)?;
        let profile_user: Option<String> = row.try_get("tutor_profile_user_id")?;
        let has_profile = profile_user.is_some();

        let tutor_contact = if enquiry.status == EnquiryStatus::Accepted {
            contact_from_row(row)?
        } else {
            None
        };

        Ok(Self {
            id: enquiry.id,
            tutor_id: enquiry.tutor_id,
            tutor_name: row.try_get("tutor_name")?,
            tutor_photo_url: row.try_get("tutor_photo_url")?,
            tutor_instrument: row.try_get("tutor_instrument")?,
            tutor_location: if has_profile {
                Some(TutorLocation {
                    city: row.try_get("tutor_city")?,
                    state: row.try_get("tutor_state")?,
                })
            } else {
                None
            },
            tutor_contact,
            message: enquiry.message,
            student_level: enquiry.student_level,
            preferred_days: enquiry.preferred_days,
            preferred_time: enquiry.preferred_time,
            status: enquiry.status,
            created_at: enquiry.created_at,
            responded_at: enquiry.responded_at,
        })
    }
}

/// An enquiry as the receiving tutor sees it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorEnquiryItem {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub student_photo_url: Option<String>,
    pub student_profile_level: Option<ProficiencyLevel>,
    pub student_level: ProficiencyLevel,
    pub message: String,
    pub preferred_days: Vec<DayOfWeek>,
    pub preferred_time: TimePreference,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl TutorEnquiryItem {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let enquiry = Enquiry::from_row(row)?;
        let profile_level: Option<String> = row.try_get("student_profile_level")?;

        Ok(Self {
            id: enquiry.id,
            student_id: enquiry.student_id,
            student_name: row.try_get("student_name")?,
            student_email: row.try_get("student_email")?,
            student_photo_url: row.try_get("student_photo_url")?,
            student_profile_level: profile_level.map(|l| l.parse()).transpose()?,
            student_level: enquiry.student_level,
            message: enquiry.message,
            preferred_days: enquiry.preferred_days,
            preferred_time: enquiry.preferred_time,
            status: enquiry.status,
            created_at: enquiry.created_at,
            responded_at: enquiry.responded_at,
        })
    }
}

/// Public user fields of an enquiry participant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryDetail {
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
    pub tutor: Participant,
    pub student: Participant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutor_contact: Option<PreferredContact>,
}

/// Result of a tutor's accept/decline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryResponse {
    pub id: Uuid,
    pub status: EnquiryStatus,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnquirySortBy {
    #[default]
    CreatedAt,
    Status,
}

impl EnquirySortBy {
    fn column(self) -> &'static str {
        match self {
            EnquirySortBy::CreatedAt => "e.created_at",
            EnquirySortBy::Status => "e.status",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnquiryListQuery {
    pub status: Option<EnquiryStatus>,
    pub sort_by: EnquirySortBy,
    pub sort_order: SortOrder,
    pub page: PageRequest,
}

fn contact_from_row(row: &SqliteRow) -> Result<Option<PreferredContact>> {
    let mode: Option<String> = row.try_get("preferred_contact_mode")?;
    let value: Option<String> = row.try_get("preferred_contact_value")?;

    match (mode, value) {
        (Some(mode), Some(value)) if !value.is_empty() => Ok(Some(PreferredContact {
            mode: mode.parse::<ContactMode>()?,
            value,
        })),
        _ => Ok(None),
    }
}

/// Which side of the enquiry a listing is for
#[derive(Debug, Clone, Copy)]
enum Side {
    Student,
    Tutor,
}

impl Side {
    fn owner_column(self) -> &'static str {
        match self {
            Side::Student => "e.student_id",
            Side::Tutor => "e.tutor_id",
        }
    }

    fn select(self) -> String {
        match self {
            Side::Student => format!(
                "SELECT {}, u.name AS tutor_name, u.photo_url AS tutor_photo_url, \
                 tp.user_id AS tutor_profile_user_id, tp.instrument AS tutor_instrument, \
                 tp.city AS tutor_city, tp.state AS tutor_state, \
                 tp.preferred_contact_mode, tp.preferred_contact_value \
                 FROM enquiries e \
                 JOIN users u ON u.id = e.tutor_id \
                 LEFT JOIN tutor_profiles tp ON tp.user_id = e.tutor_id",
                ENQUIRY_COLUMNS
            ),
            Side::Tutor => format!(
                "SELECT {}, u.name AS student_name, u.email AS student_email, \
                 u.photo_url AS student_photo_url, sp.level AS student_profile_level \
                 FROM enquiries e \
                 JOIN users u ON u.id = e.student_id \
                 LEFT JOIN student_profiles sp ON sp.user_id = e.student_id",
                ENQUIRY_COLUMNS
            ),
        }
    }
}

fn push_owner_filter(
    qb: &mut QueryBuilder<'_, Sqlite>,
    side: Side,
    user_id: Uuid,
    status: Option<EnquiryStatus>,
) {
    qb.push(format!(" WHERE {} = ", side.owner_column()))
        .push_bind(user_id.to_string());
    if let Some(status) = status {
        qb.push(" AND e.status = ").push_bind(status.as_str());
    }
}

async fn list_rows(
    db: &SqlitePool,
    side: Side,
    user_id: Uuid,
    query: &EnquiryListQuery,
) -> Result<(Vec<SqliteRow>, Pagination)> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM enquiries e");
    push_owner_filter(&mut count_qb, side, user_id, query.status);
    let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

    let mut qb = QueryBuilder::new(side.select());
    push_owner_filter(&mut qb, side, user_id, query.status);
    let order = query.sort_order.sql();
    qb.push(format!(
        " ORDER BY {} {}, e.rowid {} LIMIT ",
        query.sort_by.column(),
        order,
        order
    ))
    .push_bind(query.page.limit)
    .push(" OFFSET ")
    .push_bind(query.page.offset());

    let rows = qb.build().fetch_all(db).await?;
    Ok((rows, Pagination::new(query.page, total)))
}

/// Enquiries the student has sent
pub async fn list_student_enquiries(
    db: &SqlitePool,
    student_id: Uuid,
    query: &EnquiryListQuery,
) -> Result<(Vec<StudentEnquiryItem>, Pagination)> {
    let (rows, pagination) = list_rows(db, Side::Student, student_id, query).await?;
    let items = rows
        .iter()
        .map(StudentEnquiryItem::from_row)
        .collect::<Result<Vec<_>>>()?;
    Ok((items, pagination))
}

/// Enquiries the tutor has received
pub async fn list_tutor_enquiries(
    db: &SqlitePool,
    tutor_id: Uuid,
    query: &EnquiryListQuery,
) -> Result<(Vec<TutorEnquiryItem>, Pagination)> {
    let (rows, pagination) = list_rows(db, Side::Tutor, tutor_id, query).await?;
    let items = rows
        .iter()
        .map(TutorEnquiryItem::from_row)
        .collect::<Result<Vec<_>>>()?;
    Ok((items, pagination))
}

async fn fetch_student_item(db: &SqlitePool, enquiry_id: Uuid) -> Result<StudentEnquiryItem> {
    let mut qb = QueryBuilder::new(Side::Student.select());
    qb.push(" WHERE e.id = ").push_bind(enquiry_id.to_string());

    let row = qb.build().fetch_optional(db).await?;
    match row {
        Some(row) => StudentEnquiryItem::from_row(&row),
        None => Err(Error::not_found("ENQUIRY_NOT_FOUND", "Enquiry not found")),
    }
}

/// Send an enquiry from `student_id`
///
/// At most one pending enquiry exists per (student, tutor) pair.
pub async fn create_enquiry(
    db: &SqlitePool,
    student_id: Uuid,
    new_enquiry: NewEnquiry,
) -> Result<StudentEnquiryItem> {
    let new_enquiry = new_enquiry.normalized()?;
    let tutor_id = new_enquiry.tutor_id;

    let tutor: Option<(String, String)> =
        sqlx::query_as("SELECT name, email FROM users WHERE id = ? AND role = 'teacher'")
            .bind(tutor_id.to_string())
            .fetch_optional(db)
            .await?;
    let Some((tutor_name, tutor_email)) = tutor else {
        return Err(Error::not_found("TUTOR_NOT_FOUND", "Tutor not found"));
    };

    let duplicate = || {
        Error::conflict(
            "DUPLICATE_ENQUIRY",
            "You already have a pending enquiry with this tutor",
        )
    };

    let pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM enquiries WHERE student_id = ? AND tutor_id = ? AND status = 'pending'",
    )
    .bind(student_id.to_string())
    .bind(tutor_id.to_string())
    .fetch_one(db)
    .await?;
    if pending > 0 {
        return Err(duplicate());
    }

    let id = uuid_utils::generate();
    let now = time::now();

    // The partial unique index catches a concurrent duplicate that passed the check above
    sqlx::query(
        r#"
        INSERT INTO enquiries
            (id, student_id, tutor_id, message, student_level, preferred_days, preferred_time,
             status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(student_id.to_string())
    .bind(tutor_id.to_string())
    .bind(&new_enquiry.message)
    .bind(new_enquiry.student_level.as_str())
    .bind(Json(&new_enquiry.preferred_days))
    .bind(new_enquiry.preferred_time.as_str())
    .bind(now)
    .bind(now)
    .execute(db)
    .await
    .map_err(|e| match Error::from(e) {
        Error::Conflict { .. } => duplicate(),
        other => other,
    })?;

    let preview: String = new_enquiry.message.chars().take(50).collect();
    info!(
        target: "notification",
        enquiry_id = %id,
        tutor_id = %tutor_id,
        tutor_name = %tutor_name,
        to = %tutor_email,
        student_id = %student_id,
        preview = %preview,
        "New enquiry notification"
    );

    fetch_student_item(db, id).await
}

/// One enquiry as seen by `viewer_id`, who must be one of its participants
///
/// The student sees the tutor's preferred contact once the enquiry is accepted.
pub async fn get_enquiry_for(db: &SqlitePool, enquiry_id: Uuid, viewer_id: Uuid) -> Result<EnquiryDetail> {
    let sql = format!(
        "SELECT {}, \
         t.name AS tutor_name, t.photo_url AS tutor_photo_url, \
         s.name AS student_name, s.photo_url AS student_photo_url, s.email AS student_email, \
         tp.preferred_contact_mode, tp.preferred_contact_value \
         FROM enquiries e \
         JOIN users t ON t.id = e.tutor_id \
         JOIN users s ON s.id = e.student_id \
         LEFT JOIN tutor_profiles tp ON tp.user_id = e.tutor_id \
         WHERE e.id = ?",
        ENQUIRY_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(enquiry_id.to_string())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::not_found("ENQUIRY_NOT_FOUND", "Enquiry not found"))?;

    let enquiry = Enquiry::from_row(&row)?;
    if !enquiry.is_participant(viewer_id) {
        return Err(Error::forbidden("FORBIDDEN", "Access denied"));
    }

    let tutor_contact =
        if enquiry.student_id == viewer_id && enquiry.status == EnquiryStatus::Accepted {
            contact_from_row(&row)?
        } else {
            None
        };

    Ok(EnquiryDetail {
        id: enquiry.id,
        student_id: enquiry.student_id,
        tutor_id: enquiry.tutor_id,
        tutor: Participant {
            id: enquiry.tutor_id,
            name: row.try_get("tutor_name")?,
            photo_url: row.try_get("tutor_photo_url")?,
            email: None,
        },
        student: Participant {
            id: enquiry.student_id,
            name: row.try_get("student_name")?,
            photo_url: row.try_get("student_photo_url")?,
            email: Some(row.try_get("student_email")?),
        },
        message: enquiry.message,
        student_level: enquiry.student_level,
        preferred_days: enquiry.preferred_days,
        preferred_time: enquiry.preferred_time,
        status: enquiry.status,
        responded_at: enquiry.responded_at,
        created_at: enquiry.created_at,
        updated_at: enquiry.updated_at,
        tutor_contact,
    })
}

/// Accept or decline a pending enquiry addressed to `tutor_id`
///
/// The status guard lives in the UPDATE itself, so two concurrent responses
/// cannot both succeed.
pub async fn respond_to_enquiry(
    db: &SqlitePool,
    tutor_id: Uuid,
    enquiry_id: Uuid,
    status: EnquiryStatus,
) -> Result<EnquiryResponse> {
    if status == EnquiryStatus::Pending {
        return Err(Error::validation("status: must be accepted or declined"));
    }

    let now = time::now();
    let row = sqlx::query(
        r#"
        UPDATE enquiries SET status = ?, responded_at = ?, updated_at = ?
        WHERE id = ? AND tutor_id = ? AND status = 'pending'
        RETURNING id, student_id, status, responded_at
        "#,
    )
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .bind(enquiry_id.to_string())
    .bind(tutor_id.to_string())
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        let existing: Option<String> = sqlx::query_scalar("SELECT tutor_id FROM enquiries WHERE id = ?")
            .bind(enquiry_id.to_string())
            .fetch_optional(db)
            .await?;

        return Err(match existing {
            None => Error::not_found("ENQUIRY_NOT_FOUND", "Enquiry not found"),
            Some(owner) if owner != tutor_id.to_string() => {
                Error::forbidden("FORBIDDEN", "Access denied")
            }
            Some(_) => Error::invalid_state(
                "ALREADY_RESPONDED",
                "This enquiry has already been responded to",
            ),
        });
    };

    let student_id: String = row.try_get("student_id")?;
    let stored_status: String = row.try_get("status")?;
    let response = EnquiryResponse {
        id: enquiry_id,
        status: stored_status.parse()?,
        responded_at: row.try_get("responded_at")?,
    };

    info!(
        target: "notification",
        enquiry_id = %enquiry_id,
        tutor_id = %tutor_id,
        student_id = %student_id,
        status = %response.status,
        "Enquiry response notification"
    );

    Ok(response)
}

/// Per-status counts of the enquiries a tutor has received
pub async fn enquiry_stats(db: &SqlitePool, tutor_id: Uuid) -> Result<EnquiryStats> {
    let (pending, accepted, declined, total): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'accepted' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'declined' THEN 1 ELSE 0 END), 0),
            COUNT(*)
        FROM enquiries
        WHERE tutor_id = ?
        "#,
    )
    .bind(tutor_id.to_string())
    .fetch_one(db)
    .await?;

    Ok(EnquiryStats {
        pending,
        accepted,
        declined,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(message: &str, days: Vec<DayOfWeek>) -> NewEnquiry {
        NewEnquiry {
            tutor_id: Uuid::new_v4(),
            message: message.to_string(),
            student_level: ProficiencyLevel::Beginner,
            preferred_days: days,
            preferred_time: TimePreference::Evening,
        }
    }

    #[test]
    fn test_message_is_trimmed_before_length_check() {
        let ok = sample("   Hello there!   ", vec![DayOfWeek::Mon]).normalized().unwrap();
        assert_eq!(ok.message, "Hello there!");

        let short = sample("   hi       ", vec![DayOfWeek::Mon]).normalized();
        assert!(matches!(short, Err(Error::Validation(_))));
    }

    #[test]
    fn test_days_required_and_distinct() {
        assert!(matches!(
            sample("I would like lessons", vec![]).normalized(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            sample("I would like lessons", vec![DayOfWeek::Mon, DayOfWeek::Mon]).normalized(),
            Err(Error::Validation(_))
        ));
        assert!(sample("I would like lessons", DayOfWeek::ALL.to_vec())
            .normalized()
            .is_ok());
    }
}
