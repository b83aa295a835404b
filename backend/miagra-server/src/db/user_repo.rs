/// User accounts repository
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{PublicUser, User};

/// Insert a new account. Duplicate username/email surface as `Conflict`
/// with a field-specific message, keyed off the violated constraint.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    full_name: Option<&str>,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, full_name)
        VALUES ($1, $2, $3, COALESCE($4, ''))
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .fetch_one(pool)
    .await
    .map_err(|e| match unique_violation_constraint(&e) {
        Some("users_username_key") => AppError::Conflict("Username is already taken".to_string()),
        Some("users_email_key") => AppError::Conflict("Email is already registered".to_string()),
        _ => {
            tracing::error!("Failed to create user: {}", e);
            AppError::Database(e)
        }
    })?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by id: {}", e);
            AppError::Database(e)
        })?;

    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by email: {}", e);
            AppError::Database(e)
        })?;

    Ok(user)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user by username: {}", e);
            AppError::Database(e)
        })?;

    Ok(user)
}

pub async fn exists(pool: &PgPool, user_id: Uuid) -> Result<bool> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check user existence: {}", e);
            AppError::Database(e)
        })?;

    Ok(row.0)
}

/// Update the editable profile fields. `None` leaves a field untouched.
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    full_name: Option<&str>,
    bio: Option<&str>,
    website: Option<&str>,
    avatar_url: Option<&str>,
    is_private: Option<bool>,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET full_name  = COALESCE($2, full_name),
            bio        = COALESCE($3, bio),
            website    = COALESCE($4, website),
            avatar_url = COALESCE($5, avatar_url),
            is_private = COALESCE($6, is_private),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(full_name)
    .bind(bio)
    .bind(website)
    .bind(avatar_url)
    .bind(is_private)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update profile: {}", e);
        AppError::Database(e)
    })?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(user)
}

pub async fn update_password(pool: &PgPool, user_id: Uuid, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update password: {}", e);
            AppError::Database(e)
        })?;

    Ok(())
}

/// Case-insensitive username/name search, excluding the searching user,
/// capped at `limit`.
pub async fn search(
    pool: &PgPool,
    query: &str,
    exclude: Uuid,
    limit: i64,
) -> Result<Vec<PublicUser>> {
    let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
    let users = sqlx::query_as::<_, PublicUser>(
        r#"
        SELECT id, username, full_name, avatar_url
        FROM users
        WHERE (username ILIKE $1 OR full_name ILIKE $1) AND id <> $2
        ORDER BY username
        LIMIT $3
        "#,
    )
    .bind(pattern)
    .bind(exclude)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to search users: {}", e);
        AppError::Database(e)
    })?;

    Ok(users)
}

/// Extract the constraint name when the error is a unique violation.
pub(crate) fn unique_violation_constraint(e: &sqlx::Error) -> Option<&str> {
    e.as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_on_non_db_error() {
        let e = sqlx::Error::RowNotFound;
        assert_eq!(unique_violation_constraint(&e), None);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        // The pattern built inside search() must not let callers smuggle
        // ILIKE wildcards through the query string.
        let escaped = format!("%{}%", "50%_off".replace('%', "\\%").replace('_', "\\_"));
        assert_eq!(escaped, "%50\\%\\_off%");
    }
}
