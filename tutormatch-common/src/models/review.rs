//! Tutor reviews and the aggregate derived from them

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{uuid_utils, Result};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
/// Counted in characters, not bytes
pub const MAX_REVIEW_TEXT_CHARS: usize = 350;

/// Row from `tutor_reviews`; at most one per (tutor, student) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorReview {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub rating: i64,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TutorReview {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let id: String = row.try_get("id")?;
        let tutor_id: String = row.try_get("tutor_id")?;
        let student_id: String = row.try_get("student_id")?;

        Ok(Self {
            id: uuid_utils::from_column(&id)?,
            tutor_id: uuid_utils::from_column(&tutor_id)?,
            student_id: uuid_utils::from_column(&student_id)?,
            rating: row.try_get("rating")?,
            review_text: row.try_get("review_text")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

pub fn is_valid_rating(rating: i64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Denormalized `rating` / `review_count` for one tutor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub rating: f64,
    pub review_count: i64,
}

impl ReviewStats {
    /// Mean rounded half-up to one decimal, 0 when there are no reviews
    ///
    /// Rounding happens on integer tenths so 3.45 style boundaries are exact.
    pub fn from_totals(review_count: i64, rating_sum: i64) -> Self {
        if review_count <= 0 {
            return Self {
                rating: 0.0,
                review_count: 0,
            };
        }
        let tenths = (20 * rating_sum + review_count) / (2 * review_count);
        Self {
            rating: tenths as f64 / 10.0,
            review_count,
        }
    }

    pub fn from_ratings(ratings: &[i64]) -> Self {
        Self::from_totals(ratings.len() as i64, ratings.iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty_is_zero() {
        let stats = ReviewStats::from_ratings(&[]);
        assert_eq!(stats.rating, 0.0);
        assert_eq!(stats.review_count, 0);
    }

    #[test]
    fn test_stats_mean_of_five_four_three() {
        let stats = ReviewStats::from_ratings(&[5, 4, 3]);
        assert_eq!(stats.rating, 4.0);
        assert_eq!(stats.review_count, 3);

        let stats = ReviewStats::from_ratings(&[5, 4, 3, 2]);
        assert_eq!(stats.rating, 3.5);
        assert_eq!(stats.review_count, 4);
    }

    #[test]
    fn test_stats_round_half_up() {
        // 4.25 -> 4.3
        assert_eq!(ReviewStats::from_ratings(&[5, 4, 4, 4]).rating, 4.3);
        // 4.333.. -> 4.3
        assert_eq!(ReviewStats::from_ratings(&[5, 4, 4]).rating, 4.3);
        // 4.666.. -> 4.7
        assert_eq!(ReviewStats::from_ratings(&[5, 5, 4]).rating, 4.7);
        // 1.05 -> 1.1
        let mut ratings = vec![1; 19];
        ratings.push(2);
        assert_eq!(ReviewStats::from_ratings(&ratings).rating, 1.1);
    }

    #[test]
    fn test_stats_single_review() {
        assert_eq!(ReviewStats::from_ratings(&[2]).rating, 2.0);
        assert_eq!(ReviewStats::from_totals(1, 5).rating, 5.0);
    }

    #[test]
    fn test_rating_bounds() {
        assert!(!is_valid_rating(0));
        assert!(is_valid_rating(1));
        assert!(is_valid_rating(5));
        assert!(!is_valid_rating(6));
    }

    #[test]
    fn test_review_serializes_camel_case() {
        let now = Utc::now();
        let review = TutorReview {
            id: Uuid::new_v4(),
            tutor_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            rating: 4,
            review_text: String::new(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["rating"], 4);
        assert_eq!(json["reviewText"], "");
        assert!(json.get("tutorId").is_some());
    }
}
