/// Like membership repository
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Toggle the (post, user) like row and report the resulting state.
/// Applying it twice always restores the starting set.
pub async fn toggle(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<bool> {
    let deleted = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete like: {}", e);
            AppError::Database(e)
        })?;

    if deleted.rows_affected() > 0 {
        return Ok(false);
    }

    let inserted = sqlx::query("INSERT INTO likes (post_id, user_id) VALUES ($1, $2)")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await;

    match inserted {
        Ok(_) => Ok(true),
        Err(e) => match e.as_database_error() {
            // A concurrent toggle inserted first; the row exists, so the
            // post ended up liked either way.
            Some(db) if db.is_unique_violation() => Ok(true),
            Some(db) if db.is_foreign_key_violation() => {
                Err(AppError::NotFound("Post not found".to_string()))
            }
            _ => {
                tracing::error!("Failed to insert like: {}", e);
                Err(AppError::Database(e))
            }
        },
    }
}

pub async fn count_for_post(pool: &PgPool, post_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count likes: {}", e);
            AppError::Database(e)
        })?;

    Ok(row.0)
}

pub async fn is_liked(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE post_id = $1 AND user_id = $2)",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to check like: {}", e);
        AppError::Database(e)
    })?;

    Ok(row.0)
}
