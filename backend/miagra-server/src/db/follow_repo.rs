/// Social graph repository (directed follow edges)
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::PublicUser;

/// Create a follow edge. The unique constraint is the source of truth for
/// duplicates; a violated foreign key means the target account is gone.
pub async fn create_follow(pool: &PgPool, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
    if follower_id == followee_id {
        return Err(AppError::Validation(
            "You cannot follow yourself".to_string(),
        ));
    }

    sqlx::query("INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2)")
        .bind(follower_id)
        .bind(followee_id)
        .execute(pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                AppError::Conflict("Already following this user".to_string())
            }
            Some(db) if db.is_foreign_key_violation() => {
                AppError::NotFound("User not found".to_string())
            }
            _ => {
                tracing::error!("Failed to create follow: {}", e);
                AppError::Database(e)
            }
        })?;

    Ok(())
}

/// Remove a follow edge; absent edges are reported, not swallowed.
pub async fn delete_follow(pool: &PgPool, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
        .bind(follower_id)
        .bind(followee_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete follow: {}", e);
            AppError::Database(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "You are not following this user".to_string(),
        ));
    }

    Ok(())
}

pub async fn is_following(pool: &PgPool, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to check follow status: {}", e);
        AppError::Database(e)
    })?;

    Ok(row.0)
}

pub async fn followers_count(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count followers: {}", e);
            AppError::Database(e)
        })?;

    Ok(row.0)
}

pub async fn following_count(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count following: {}", e);
            AppError::Database(e)
        })?;

    Ok(row.0)
}

/// Accounts following `user_id`, newest edge first.
pub async fn list_followers(pool: &PgPool, user_id: Uuid) -> Result<Vec<PublicUser>> {
    let users = sqlx::query_as::<_, PublicUser>(
        r#"
        SELECT u.id, u.username, u.full_name, u.avatar_url
        FROM follows f
        JOIN users u ON u.id = f.follower_id
        WHERE f.followee_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list followers: {}", e);
        AppError::Database(e)
    })?;

    Ok(users)
}

/// Accounts `user_id` follows, newest edge first.
pub async fn list_following(pool: &PgPool, user_id: Uuid) -> Result<Vec<PublicUser>> {
    let users = sqlx::query_as::<_, PublicUser>(
        r#"
        SELECT u.id, u.username, u.full_name, u.avatar_url
        FROM follows f
        JOIN users u ON u.id = f.followee_id
        WHERE f.follower_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list following: {}", e);
        AppError::Database(e)
    })?;

    Ok(users)
}
