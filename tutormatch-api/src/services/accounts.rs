//! Accounts: users together with their role-specific profile

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use tutormatch_common::models::{Account, AuthProvider, NewUser, Role, RoleProfile, User};
use tutormatch_common::{time, uuid_utils, Error, Result};

use super::students::{ensure_student_profile, fetch_student_profile};
use super::tutors::{ensure_tutor_profile, fetch_tutor_profile};

const USER_COLUMNS: &str = "id, email, name, photo_url, role, auth_provider, created_at, updated_at";

fn user_from_row(row: &SqliteRow) -> Result<(User, Option<Role>)> {
    let id: String = row.try_get("id")?;
    let role: Option<String> = row.try_get("role")?;
    let provider: String = row.try_get("auth_provider")?;

    let user = User {
        id: uuid_utils::from_column(&id)?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        photo_url: row.try_get("photo_url")?,
        auth_provider: provider.parse::<AuthProvider>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    };

    Ok((user, role.map(|r| r.parse::<Role>()).transpose()?))
}

async fn load_role_profile(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    role: Option<Role>,
) -> Result<RoleProfile> {
    let missing = || Error::Internal(format!("User {} has a role but no matching profile", user_id));

    Ok(match role {
        None => RoleProfile::Unassigned,
        Some(Role::Admin) => RoleProfile::Admin,
        Some(Role::Student) => RoleProfile::Student(
            fetch_student_profile(conn, user_id).await?.ok_or_else(missing)?,
        ),
        Some(Role::Teacher) => RoleProfile::Teacher(
            fetch_tutor_profile(conn, user_id).await?.ok_or_else(missing)?,
        ),
    })
}

async fn load_account_with(conn: &mut SqliteConnection, user_id: Uuid) -> Result<Option<Account>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let (user, role) = user_from_row(&row)?;
    let profile = load_role_profile(conn, user.id, role).await?;

    Ok(Some(Account { user, profile }))
}

/// Load a user and the profile matching their role
pub async fn load_account(db: &SqlitePool, user_id: Uuid) -> Result<Option<Account>> {
    let mut conn = db.acquire().await?;
    load_account_with(&mut conn, user_id).await
}

pub async fn find_account_by_email(db: &SqlitePool, email: &str) -> Result<Option<Account>> {
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;

    match id {
        Some(id) => load_account(db, uuid_utils::from_column(&id)?).await,
        None => Ok(None),
    }
}

/// Insert a user and, when a role is given, its empty profile
pub async fn create_user(db: &SqlitePool, new_user: NewUser) -> Result<Account> {
    let id = uuid_utils::generate();
    let now = time::now();
    let email = new_user.email.trim().to_lowercase();

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, photo_url, role, auth_provider, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&email)
    .bind(&new_user.name)
    .bind(&new_user.photo_url)
    .bind(new_user.role.map(|r| r.as_str()))
    .bind(new_user.auth_provider.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| match Error::from(e) {
        Error::Conflict { .. } => Error::conflict("EMAIL_EXISTS", "Email already registered"),
        other => other,
    })?;

    ensure_role_profile(&mut tx, id, new_user.role).await?;
    let account = load_account_with(&mut tx, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {} vanished during creation", id)))?;

    tx.commit().await?;

    info!(user_id = %id, role = ?account.role(), "User created");
    Ok(account)
}

async fn ensure_role_profile(conn: &mut SqliteConnection, user_id: Uuid, role: Option<Role>) -> Result<()> {
    match role {
        Some(Role::Student) => ensure_student_profile(conn, user_id).await,
        Some(Role::Teacher) => ensure_tutor_profile(conn, user_id).await,
        Some(Role::Admin) | None => Ok(()),
    }
}

/// Switch the user's role, creating the matching profile if missing
///
/// A profile left behind by a previous role is kept, so switching back
/// restores it.
pub async fn set_role(db: &SqlitePool, user_id: Uuid, role: Role) -> Result<Account> {
    let mut tx = db.begin().await?;

    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(time::now())
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("USER_NOT_FOUND", "User not found"));
    }

    ensure_role_profile(&mut tx, user_id, Some(role)).await?;
    let account = load_account_with(&mut tx, user_id)
        .await?
        .ok_or_else(|| Error::not_found("USER_NOT_FOUND", "User not found"))?;

    tx.commit().await?;

    info!(user_id = %user_id, role = %role, "User role set");
    Ok(account)
}

/// Update display name and/or photo; `photo_url: Some(None)` removes the photo
pub async fn update_user_profile(
    db: &SqlitePool,
    user_id: Uuid,
    name: Option<String>,
    photo_url: Option<Option<String>>,
) -> Result<User> {
    let sql = format!(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            photo_url = CASE WHEN ? THEN ? ELSE photo_url END,
            updated_at = ?
        WHERE id = ?
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    let row = sqlx::query(&sql)
        .bind(name)
        .bind(photo_url.is_some())
        .bind(photo_url.flatten())
        .bind(time::now())
        .bind(user_id.to_string())
        .fetch_optional(db)
        .await?;

    match row {
        Some(row) => Ok(user_from_row(&row)?.0),
        None => Err(Error::not_found("USER_NOT_FOUND", "User not found")),
    }
}
