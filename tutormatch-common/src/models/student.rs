//! Student profiles

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use super::ProficiencyLevel;
use crate::{time, uuid_utils, Result};

#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub level: ProficiencyLevel,
    pub preferred_instruments: Vec<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentProfile {
    pub fn new(user_id: Uuid) -> Self {
        let now = time::now();
        Self {
            id: uuid_utils::generate(),
            user_id,
            level: ProficiencyLevel::Beginner,
            preferred_instruments: Vec::new(),
            bio: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let level: String = row.try_get("level")?;
        let instruments: Option<Json<Vec<String>>> = row.try_get("preferred_instruments")?;

        Ok(Self {
            id: uuid_utils::from_column(&id)?,
            user_id: uuid_utils::from_column(&user_id)?,
            level: level.parse()?,
            preferred_instruments: instruments.map(|j| j.0).unwrap_or_default(),
            bio: row.try_get("bio")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
