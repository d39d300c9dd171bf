//! Tutor profile persistence and discovery
//!
//! Nothing in this module writes `rating` or `review_count`; those belong to
//! the review service.

use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use tutormatch_common::models::{
    AvailabilitySlot, PreferredContact, ProficiencyLevel, TimeZoneSlot, TutorProfile,
};
use tutormatch_common::{time, uuid_utils, Error, Result};

use crate::pagination::PageRequest;

/// `tutor_profiles` columns aliased `tp`, in [`TutorProfile::from_row`] naming
pub(crate) const TUTOR_PROFILE_COLUMNS: &str = "tp.id, tp.user_id, tp.instrument, \
    tp.proficiency_level, tp.hourly_rate, tp.city, tp.state, tp.country, tp.bio, \
    tp.availability, tp.time_zone_availability, tp.preferred_contact_mode, \
    tp.preferred_contact_value, tp.is_online, tp.is_verified, tp.years_of_experience, \
    tp.rating, tp.review_count, tp.onboarding_complete, tp.created_at, tp.updated_at";

/// A teacher as shown in discovery: public user fields plus profile
#[derive(Debug, Clone)]
pub struct TutorSummary {
    pub name: String,
    pub photo_url: Option<String>,
    pub profile: TutorProfile,
}

impl TutorSummary {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            name: row.try_get("user_name")?,
            photo_url: row.try_get("user_photo_url")?,
            profile: TutorProfile::from_row(row)?,
        })
    }

    pub fn tutor_id(&self) -> Uuid {
        self.profile.user_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TutorSortBy {
    #[default]
    Rating,
    HourlyRate,
    YearsOfExperience,
    CreatedAt,
}

impl TutorSortBy {
    fn column(self) -> &'static str {
        match self {
            TutorSortBy::Rating => "tp.rating",
            TutorSortBy::HourlyRate => "tp.hourly_rate",
            TutorSortBy::YearsOfExperience => "tp.years_of_experience",
            TutorSortBy::CreatedAt => "tp.created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Discovery filters; text filters are case-insensitive substrings
#[derive(Debug, Clone, Default)]
pub struct TutorFilter {
    pub instrument: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub proficiency_level: Option<ProficiencyLevel>,
    pub is_online: Option<bool>,
    pub is_verified: Option<bool>,
    pub sort_by: TutorSortBy,
    pub sort_order: SortOrder,
}

/// Escape LIKE wildcards so user text matches literally (ESCAPE '\')
fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a TutorFilter) {
    qb.push(" WHERE u.role = 'teacher' AND tp.onboarding_complete = 1");

    for (column, value) in [
        ("tp.instrument", &filter.instrument),
        ("tp.city", &filter.city),
        ("tp.state", &filter.state),
    ] {
        if let Some(value) = value {
            qb.push(format!(" AND LOWER({}) LIKE ", column))
                .push_bind(like_pattern(value))
                .push(" ESCAPE '\\'");
        }
    }
    if let Some(min) = filter.min_rate {
        qb.push(" AND tp.hourly_rate >= ").push_bind(min);
    }
    if let Some(max) = filter.max_rate {
        qb.push(" AND tp.hourly_rate <= ").push_bind(max);
    }
    if let Some(level) = filter.proficiency_level {
        qb.push(" AND tp.proficiency_level = ").push_bind(level.as_str());
    }
    if let Some(online) = filter.is_online {
        qb.push(" AND tp.is_online = ").push_bind(online);
    }
    if let Some(verified) = filter.is_verified {
        qb.push(" AND tp.is_verified = ").push_bind(verified);
    }
}

/// Onboarded teachers matching `filter`, plus the total match count
pub async fn list_tutors(
    db: &SqlitePool,
    filter: &TutorFilter,
    page: PageRequest,
) -> Result<(Vec<TutorSummary>, i64)> {
    let mut count_qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM tutor_profiles tp JOIN users u ON u.id = tp.user_id",
    );
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

    let mut qb = QueryBuilder::new(format!(
        "SELECT {}, u.name AS user_name, u.photo_url AS user_photo_url \
         FROM tutor_profiles tp JOIN users u ON u.id = tp.user_id",
        TUTOR_PROFILE_COLUMNS
    ));
    push_filters(&mut qb, filter);
    qb.push(format!(
        " ORDER BY {} {}, tp.created_at DESC, tp.id ASC LIMIT ",
        filter.sort_by.column(),
        filter.sort_order.sql()
    ))
    .push_bind(page.limit)
    .push(" OFFSET ")
    .push_bind(page.offset());

    let rows = qb.build().fetch_all(db).await?;
    let tutors = rows
        .iter()
        .map(TutorSummary::from_row)
        .collect::<Result<Vec<_>>>()?;

    Ok((tutors, total))
}

/// Public view of one teacher, keyed by user id
pub async fn get_tutor(db: &SqlitePool, tutor_id: Uuid) -> Result<TutorSummary> {
    let sql = format!(
        "SELECT {}, u.name AS user_name, u.photo_url AS user_photo_url \
         FROM tutor_profiles tp JOIN users u ON u.id = tp.user_id \
         WHERE tp.user_id = ? AND u.role = 'teacher'",
        TUTOR_PROFILE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(tutor_id.to_string())
        .fetch_optional(db)
        .await?;

    match row {
        Some(row) => TutorSummary::from_row(&row),
        None => Err(Error::not_found("TUTOR_NOT_FOUND", "Tutor not found")),
    }
}

pub async fn fetch_tutor_profile(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> Result<Option<TutorProfile>> {
    let sql = format!(
        "SELECT {} FROM tutor_profiles tp WHERE tp.user_id = ?",
        TUTOR_PROFILE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(TutorProfile::from_row).transpose()
}

/// Create the profile row for a new teacher if it is missing
///
/// `rating` and `review_count` are left to their column defaults.
pub async fn ensure_tutor_profile(conn: &mut SqliteConnection, user_id: Uuid) -> Result<()> {
    let profile = TutorProfile::new(user_id);
    sqlx::query(
        r#"
        INSERT INTO tutor_profiles (id, user_id, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(profile.id.to_string())
    .bind(user_id.to_string())
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Editable tutor profile fields; `None` leaves the stored value alone
///
/// Double options clear the stored value with `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct TutorProfileUpdate {
    pub instrument: Option<String>,
    pub proficiency_level: Option<ProficiencyLevel>,
    pub hourly_rate: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub availability: Option<Vec<AvailabilitySlot>>,
    pub time_zone_availability: Option<Vec<TimeZoneSlot>>,
    pub preferred_contact: Option<Option<PreferredContact>>,
    pub is_online: Option<bool>,
    pub years_of_experience: Option<i64>,
}

impl TutorProfileUpdate {
    fn apply(self, profile: &mut TutorProfile) {
        macro_rules! merge {
            ($($field:ident),+) => {
                $(if let Some(value) = self.$field {
                    profile.$field = Some(value);
                })+
            };
        }
        merge!(instrument, proficiency_level, hourly_rate, city, state, country, bio);

        if let Some(slots) = self.availability {
            profile.availability = slots;
        }
        if let Some(slots) = self.time_zone_availability {
            profile.time_zone_availability = slots;
        }
        if let Some(contact) = self.preferred_contact {
            profile.preferred_contact = contact;
        }
        if let Some(online) = self.is_online {
            profile.is_online = online;
        }
        if let Some(years) = self.years_of_experience {
            profile.years_of_experience = years;
        }
    }
}

/// Merge `update` into the teacher's profile, creating it if needed
///
/// With `complete_onboarding` the profile becomes visible in discovery; a
/// completed onboarding is never reverted.
pub async fn save_tutor_profile(
    db: &SqlitePool,
    user_id: Uuid,
    update: TutorProfileUpdate,
    complete_onboarding: bool,
) -> Result<TutorProfile> {
    let mut tx = db.begin().await?;

    // Write first so the transaction holds the write lock before it reads
    ensure_tutor_profile(&mut tx, user_id).await?;

    let mut profile = fetch_tutor_profile(&mut tx, user_id)
        .await?
        .ok_or_else(|| Error::not_found("PROFILE_NOT_FOUND", "Tutor profile not found"))?;

    update.apply(&mut profile);
    profile.onboarding_complete |= complete_onboarding;
    profile.updated_at = time::now();

    let (contact_mode, contact_value) = match &profile.preferred_contact {
        Some(contact) => (Some(contact.mode.as_str()), Some(contact.value.as_str())),
        None => (None, None),
    };

    sqlx::query(
        r#"
        UPDATE tutor_profiles SET
            instrument = ?,
            proficiency_level = ?,
            hourly_rate = ?,
            city = ?,
            state = ?,
            country = ?,
            bio = ?,
            availability = ?,
            time_zone_availability = ?,
            preferred_contact_mode = ?,
            preferred_contact_value = ?,
            is_online = ?,
            years_of_experience = ?,
            onboarding_complete = ?,
            updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(&profile.instrument)
    .bind(profile.proficiency_level.map(|l| l.as_str()))
    .bind(profile.hourly_rate)
    .bind(&profile.city)
    .bind(&profile.state)
    .bind(&profile.country)
    .bind(&profile.bio)
    .bind(Json(&profile.availability))
    .bind(Json(&profile.time_zone_availability))
    .bind(contact_mode)
    .bind(contact_value)
    .bind(profile.is_online)
    .bind(profile.years_of_experience)
    .bind(profile.onboarding_complete)
    .bind(profile.updated_at)
    .bind(user_id.to_string())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(tutor_id = %user_id, onboarding_complete = profile.onboarding_complete, "Tutor profile saved");

    Ok(profile)
}

pub async fn update_availability(
    db: &SqlitePool,
    user_id: Uuid,
    availability: Vec<AvailabilitySlot>,
) -> Result<Vec<AvailabilitySlot>> {
    let result = sqlx::query(
        "UPDATE tutor_profiles SET availability = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(Json(&availability))
    .bind(time::now())
    .bind(user_id.to_string())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("PROFILE_NOT_FOUND", "Tutor profile not found"));
    }

    info!(tutor_id = %user_id, slots = availability.len(), "Tutor availability updated");
    Ok(availability)
}

pub async fn update_online_status(db: &SqlitePool, user_id: Uuid, is_online: bool) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE tutor_profiles SET is_online = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(is_online)
    .bind(time::now())
    .bind(user_id.to_string())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("PROFILE_NOT_FOUND", "Tutor profile not found"));
    }

    Ok(is_online)
}

/// Parse a client-supplied tutor id
pub fn parse_tutor_id(raw: &str) -> Result<Uuid> {
    uuid_utils::parse_id("tutor ID", raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Piano"), "%piano%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_update_merges_only_present_fields() {
        let mut profile = TutorProfile::new(Uuid::new_v4());
        profile.city = Some("Austin".into());
        profile.instrument = Some("Piano".into());

        TutorProfileUpdate {
            instrument: Some("Cello".into()),
            is_online: Some(true),
            ..Default::default()
        }
        .apply(&mut profile);

        assert_eq!(profile.instrument.as_deref(), Some("Cello"));
        assert_eq!(profile.city.as_deref(), Some("Austin"));
        assert!(profile.is_online);
        assert_eq!(profile.rating, 0.0);
    }

    #[test]
    fn test_update_can_clear_contact() {
        let mut profile = TutorProfile::new(Uuid::new_v4());
        profile.preferred_contact = Some(PreferredContact {
            mode: tutormatch_common::models::ContactMode::Phone,
            value: "+1 555 000 1111".into(),
        });

        TutorProfileUpdate {
            preferred_contact: Some(None),
            ..Default::default()
        }
        .apply(&mut profile);

        assert!(profile.preferred_contact.is_none());
    }

    #[test]
    fn test_sort_parse() {
        let by: TutorSortBy = serde_json::from_str("\"hourlyRate\"").unwrap();
        assert_eq!(by.column(), "tp.hourly_rate");
        let order: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(order.sql(), "ASC");
    }
}
