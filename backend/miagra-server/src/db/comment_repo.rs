/// Comment repository
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Comment, CommentDto, PublicUser};

pub async fn insert(pool: &PgPool, post_id: Uuid, user_id: Uuid, text: &str) -> Result<Comment> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (post_id, user_id, text)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(text)
    .fetch_one(pool)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => {
            AppError::NotFound("Post not found".to_string())
        }
        _ => {
            tracing::error!("Failed to insert comment: {}", e);
            AppError::Database(e)
        }
    })?;

    Ok(comment)
}

/// Comments on a post, oldest first, with author profiles attached.
pub async fn list_for_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<CommentDto>> {
    let rows = sqlx::query(
        r#"
        SELECT
            c.id, c.post_id, c.text, c.created_at,
            u.id AS author_id, u.username, u.full_name, u.avatar_url
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.post_id = $1
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list comments: {}", e);
        AppError::Database(e)
    })?;

    let comments = rows
        .iter()
        .map(|r| CommentDto {
            id: r.get("id"),
            post_id: r.get("post_id"),
            author: PublicUser {
                id: r.get("author_id"),
                username: r.get("username"),
                full_name: r.get("full_name"),
                avatar_url: r.get("avatar_url"),
            },
            text: r.get("text"),
            created_at: r.get("created_at"),
        })
        .collect();

    Ok(comments)
}

pub async fn find_by_id(pool: &PgPool, comment_id: Uuid) -> Result<Option<Comment>> {
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch comment: {}", e);
            AppError::Database(e)
        })?;

    Ok(comment)
}

pub async fn delete(pool: &PgPool, comment_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete comment: {}", e);
            AppError::Database(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    Ok(())
}
