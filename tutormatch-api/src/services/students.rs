//! Student profile persistence

use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use tutormatch_common::models::{ProficiencyLevel, StudentProfile};
use tutormatch_common::{time, Error, Result};

const STUDENT_PROFILE_COLUMNS: &str =
    "id, user_id, level, preferred_instruments, bio, created_at, updated_at";

pub async fn fetch_student_profile(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> Result<Option<StudentProfile>> {
    let sql = format!(
        "SELECT {} FROM student_profiles WHERE user_id = ?",
        STUDENT_PROFILE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(StudentProfile::from_row).transpose()
}

/// Create the profile row for a new student if it is missing
pub async fn ensure_student_profile(conn: &mut SqliteConnection, user_id: Uuid) -> Result<()> {
    let profile = StudentProfile::new(user_id);
    sqlx::query(
        r#"
        INSERT INTO student_profiles (id, user_id, level, preferred_instruments, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(profile.id.to_string())
    .bind(user_id.to_string())
    .bind(profile.level.as_str())
    .bind(Json(&profile.preferred_instruments))
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Partial student profile update; `bio: Some(None)` clears the bio
#[derive(Debug, Clone, Default)]
pub struct StudentProfileUpdate {
    pub level: Option<ProficiencyLevel>,
    pub preferred_instruments: Option<Vec<String>>,
    pub bio: Option<Option<String>>,
}

/// Apply `update`, creating the profile first if the student has none
pub async fn update_student_profile(
    db: &SqlitePool,
    user_id: Uuid,
    update: StudentProfileUpdate,
) -> Result<StudentProfile> {
    let mut tx = db.begin().await?;

    ensure_student_profile(&mut tx, user_id).await?;

    let mut profile = fetch_student_profile(&mut tx, user_id)
        .await?
        .ok_or_else(|| Error::not_found("PROFILE_NOT_FOUND", "Student profile not found"))?;

    if let Some(level) = update.level {
        profile.level = level;
    }
    if let Some(instruments) = update.preferred_instruments {
        profile.preferred_instruments = instruments;
    }
    if let Some(bio) = update.bio {
        profile.bio = bio;
    }
    profile.updated_at = time::now();

    sqlx::query(
        r#"
        UPDATE student_profiles
        SET level = ?, preferred_instruments = ?, bio = ?, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(profile.level.as_str())
    .bind(Json(&profile.preferred_instruments))
    .bind(&profile.bio)
    .bind(profile.updated_at)
    .bind(user_id.to_string())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(target: "notification", student_id = %user_id, "Student profile updated");

    Ok(profile)
}
