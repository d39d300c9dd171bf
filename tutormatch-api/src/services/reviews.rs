//! Review submission and tutor rating aggregation
//!
//! A submission is one unit of work under the tutor's lock:
//!
//! 1. claim the tutor's profile row (write lock + existence check)
//! 2. upsert the review on `(tutor_id, student_id)`
//! 3. recompute `rating` / `review_count` from the full review set
//! 4. commit
//!
//! [`recalculate_tutor_stats`] is the only other path that writes the
//! aggregate, and it takes the same lock.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use chrono::{DateTime, Utc};
use tutormatch_common::models::review::is_valid_rating;
use tutormatch_common::models::{
    ReviewStats, RoleProfile, TutorReview, MAX_RATING, MAX_REVIEW_TEXT_CHARS, MIN_RATING,
};
use tutormatch_common::{time, uuid_utils, Error, Result};

use super::accounts::load_account;
use super::review_locks::TutorLocks;
use crate::pagination::{PageRequest, Pagination};

/// Review as listed publicly, with the author's display name
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListItem {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub rating: i64,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewListItem {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let review = TutorReview::from_row(row)?;
        Ok(Self {
            id: review.id,
            tutor_id: review.tutor_id,
            student_id: review.student_id,
            student_name: row.try_get("student_name")?,
            rating: review.rating,
            review_text: review.review_text,
            created_at: review.created_at,
            updated_at: review.updated_at,
        })
    }
}

fn validate_review(rating: i64, review_text: &str) -> Result<()> {
    if !is_valid_rating(rating) {
        return Err(Error::validation(format!(
            "rating: must be an integer between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    if review_text.chars().count() > MAX_REVIEW_TEXT_CHARS {
        return Err(Error::validation(format!(
            "reviewText: must be at most {} characters",
            MAX_REVIEW_TEXT_CHARS
        )));
    }
    Ok(())
}

/// Take the tutor's profile row for this transaction
///
/// A no-op write: it makes the profile the transaction's first write, so the
/// write lock is held before anything is read, and it fails when the tutor
/// has no profile.
async fn claim_tutor_profile(conn: &mut SqliteConnection, tutor_id: Uuid) -> Result<()> {
    let claimed = sqlx::query("UPDATE tutor_profiles SET updated_at = updated_at WHERE user_id = ?")
        .bind(tutor_id.to_string())
        .execute(&mut *conn)
        .await?;

    if claimed.rows_affected() == 0 {
        return Err(Error::not_found("TUTOR_NOT_FOUND", "Tutor profile not found"));
    }
    Ok(())
}

/// Recompute and store the aggregate inside the caller's transaction
async fn recompute_stats(conn: &mut SqliteConnection, tutor_id: Uuid) -> Result<ReviewStats> {
    let (count, sum): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(rating), 0) FROM tutor_reviews WHERE tutor_id = ?",
    )
    .bind(tutor_id.to_string())
    .fetch_one(&mut *conn)
    .await?;

    let stats = ReviewStats::from_totals(count, sum);

    let updated = sqlx::query(
        "UPDATE tutor_profiles SET rating = ?, review_count = ? WHERE user_id = ?",
    )
    .bind(stats.rating)
    .bind(stats.review_count)
    .bind(tutor_id.to_string())
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::not_found("TUTOR_NOT_FOUND", "Tutor profile not found"));
    }

    debug!(tutor_id = %tutor_id, rating = stats.rating, review_count = stats.review_count, "Tutor stats recomputed");
    Ok(stats)
}

/// Create or overwrite `student_id`'s review of `tutor_id` and refresh the
/// tutor's aggregate in the same transaction
pub async fn submit_review(
    db: &SqlitePool,
    locks: &TutorLocks,
    tutor_id: Uuid,
    student_id: Uuid,
    rating: i64,
    review_text: &str,
) -> Result<TutorReview> {
    validate_review(rating, review_text)?;

    let tutor = load_account(db, tutor_id).await?.map(|account| account.profile);
    if !matches!(tutor, Some(RoleProfile::Teacher(_))) {
        return Err(Error::not_found("TUTOR_NOT_FOUND", "Tutor not found"));
    }
    let student = load_account(db, student_id).await?.map(|account| account.profile);
    if !matches!(student, Some(RoleProfile::Student(_))) {
        return Err(Error::not_found("STUDENT_NOT_FOUND", "Student not found"));
    }

    let _guard = locks.acquire(tutor_id).await;
    let mut tx = db.begin().await?;

    claim_tutor_profile(&mut tx, tutor_id).await?;

    let now = time::now();
    let row = sqlx::query(
        r#"
        INSERT INTO tutor_reviews (id, tutor_id, student_id, rating, review_text, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(tutor_id, student_id) DO UPDATE SET
            rating = excluded.rating,
            review_text = excluded.review_text,
            updated_at = excluded.updated_at
        RETURNING id, tutor_id, student_id, rating, review_text, created_at, updated_at
        "#,
    )
    .bind(uuid_utils::generate().to_string())
    .bind(tutor_id.to_string())
    .bind(student_id.to_string())
    .bind(rating)
    .bind(review_text)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    let review = TutorReview::from_row(&row)?;

    let stats = recompute_stats(&mut tx, tutor_id).await?;

    tx.commit().await?;

    info!(
        tutor_id = %tutor_id,
        student_id = %student_id,
        review_id = %review.id,
        rating = review.rating,
        tutor_rating = stats.rating,
        review_count = stats.review_count,
        "Review stored"
    );

    Ok(review)
}

/// Recompute a tutor's aggregate from its reviews and persist it
///
/// Idempotent; serialized with submissions for the same tutor.
pub async fn recalculate_tutor_stats(
    db: &SqlitePool,
    locks: &TutorLocks,
    tutor_id: Uuid,
) -> Result<ReviewStats> {
    let _guard = locks.acquire(tutor_id).await;
    let mut tx = db.begin().await?;

    claim_tutor_profile(&mut tx, tutor_id).await?;
    let stats = recompute_stats(&mut tx, tutor_id).await?;

    tx.commit().await?;
    Ok(stats)
}

/// Newest-first page of a tutor's reviews
///
/// Unknown tutors simply have no reviews.
pub async fn list_reviews_for_tutor(
    db: &SqlitePool,
    tutor_id: Uuid,
    page: PageRequest,
) -> Result<(Vec<ReviewListItem>, Pagination)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tutor_reviews WHERE tutor_id = ?")
        .bind(tutor_id.to_string())
        .fetch_one(db)
        .await?;

    let rows = sqlx::query(
        r#"
        SELECT r.id, r.tutor_id, r.student_id, r.rating, r.review_text,
               r.created_at, r.updated_at, u.name AS student_name
        FROM tutor_reviews r
        JOIN users u ON u.id = r.student_id
        WHERE r.tutor_id = ?
        ORDER BY r.created_at DESC, r.rowid DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(tutor_id.to_string())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    let reviews = rows
        .iter()
        .map(ReviewListItem::from_row)
        .collect::<Result<Vec<_>>>()?;

    Ok((reviews, Pagination::new(page, total)))
}
