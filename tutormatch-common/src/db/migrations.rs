//! Database schema migrations
//!
//! Versioned upgrades for databases created by older builds, tracked in the
//! `schema_version` table. Every migration is idempotent: it checks for the
//! column or index it adds before touching the schema.
//!
//! # Migration Guidelines
//!
//! 1. Never modify existing migrations
//! 2. Add a new `migrate_vN` for each schema change and bump
//!    [`CURRENT_SCHEMA_VERSION`]
//! 3. Prefer `ALTER TABLE ... ADD COLUMN` over DROP/CREATE to preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    Ok(())
}

async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Migration v1: preferred contact and time zone availability on tutor profiles
///
/// Tutor profiles created before contact sharing existed lack these columns.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: tutor contact and time zone columns");

    let columns = [
        (
            "preferred_contact_mode",
            "ALTER TABLE tutor_profiles ADD COLUMN preferred_contact_mode TEXT \
             CHECK (preferred_contact_mode IS NULL OR preferred_contact_mode IN ('email', 'phone'))",
        ),
        (
            "preferred_contact_value",
            "ALTER TABLE tutor_profiles ADD COLUMN preferred_contact_value TEXT",
        ),
        (
            "time_zone_availability",
            "ALTER TABLE tutor_profiles ADD COLUMN time_zone_availability TEXT NOT NULL DEFAULT '[]'",
        ),
    ];

    for (column, ddl) in columns {
        if has_column(pool, "tutor_profiles", column).await? {
            info!("  {} column already exists - skipping", column);
            continue;
        }
        sqlx::query(ddl).execute(pool).await?;
        info!("  Added {} column to tutor_profiles", column);
    }

    Ok(())
}

/// Migration v2: secondary indexes
///
/// The partial unique index on enquiries backs the one-pending-enquiry-per-pair
/// rule so concurrent creates cannot both succeed.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: secondary indexes");

    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_tutor_profiles_instrument ON tutor_profiles(instrument)",
        "CREATE INDEX IF NOT EXISTS idx_tutor_profiles_city_state ON tutor_profiles(city, state)",
        "CREATE INDEX IF NOT EXISTS idx_tutor_profiles_rating ON tutor_profiles(rating)",
        "CREATE INDEX IF NOT EXISTS idx_tutor_profiles_hourly_rate ON tutor_profiles(hourly_rate)",
        "CREATE INDEX IF NOT EXISTS idx_enquiries_tutor_status ON enquiries(tutor_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_enquiries_student_status ON enquiries(student_id, status)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_enquiries_pending_pair \
         ON enquiries(student_id, tutor_id) WHERE status = 'pending'",
        "CREATE INDEX IF NOT EXISTS idx_tutor_reviews_tutor_created \
         ON tutor_reviews(tutor_id, created_at)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}
