/// Post repository
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Post, PublicUser};

/// Post joined with its author and engagement counts, relative to the
/// viewing user. Image descriptors are attached by the service layer.
#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: Uuid,
    pub author: PublicUser,
    pub content: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const POST_ROW_SELECT: &str = r#"
    SELECT
        p.id, p.content, p.created_at, p.updated_at,
        u.id AS author_id, u.username, u.full_name, u.avatar_url,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
        EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1) AS is_liked
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

fn map_post_row(r: &sqlx::postgres::PgRow) -> PostRow {
    PostRow {
        id: r.get("id"),
        author: PublicUser {
            id: r.get("author_id"),
            username: r.get("username"),
            full_name: r.get("full_name"),
            avatar_url: r.get("avatar_url"),
        },
        content: r.get("content"),
        likes_count: r.get("likes_count"),
        comments_count: r.get("comments_count"),
        is_liked: r.get("is_liked"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

pub async fn insert_post(pool: &PgPool, author_id: Uuid, content: &str) -> Result<Post> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (author_id, content)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(author_id)
    .bind(content)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert post: {}", e);
        AppError::Database(e)
    })?;

    Ok(post)
}

pub async fn find_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch post: {}", e);
            AppError::Database(e)
        })?;

    Ok(post)
}

/// One post in the viewer-relative projection.
pub async fn fetch_row(pool: &PgPool, viewer_id: Uuid, post_id: Uuid) -> Result<Option<PostRow>> {
    let row = sqlx::query(&format!("{POST_ROW_SELECT} WHERE p.id = $2"))
        .bind(viewer_id)
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch post row: {}", e);
            AppError::Database(e)
        })?;

    Ok(row.as_ref().map(map_post_row))
}

/// Global feed page, newest first.
pub async fn list_page(
    pool: &PgPool,
    viewer_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostRow>> {
    let rows = sqlx::query(&format!(
        "{POST_ROW_SELECT} ORDER BY p.created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(viewer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list posts: {}", e);
        AppError::Database(e)
    })?;

    Ok(rows.iter().map(map_post_row).collect())
}

/// One author's posts, newest first.
pub async fn list_page_by_author(
    pool: &PgPool,
    viewer_id: Uuid,
    author_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostRow>> {
    let rows = sqlx::query(&format!(
        "{POST_ROW_SELECT} WHERE p.author_id = $2 ORDER BY p.created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(viewer_id)
    .bind(author_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list posts by author: {}", e);
        AppError::Database(e)
    })?;

    Ok(rows.iter().map(map_post_row).collect())
}

pub async fn count_all(pool: &PgPool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count posts: {}", e);
            AppError::Database(e)
        })?;

    Ok(row.0)
}

pub async fn count_by_author(pool: &PgPool, author_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count posts by author: {}", e);
            AppError::Database(e)
        })?;

    Ok(row.0)
}

pub async fn update_content(pool: &PgPool, post_id: Uuid, content: &str) -> Result<Post> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET content = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(post_id)
    .bind(content)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update post: {}", e);
        AppError::Database(e)
    })?
    .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(post)
}

/// Delete a post; images, likes and comments go with it via FK cascade.
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete post: {}", e);
            AppError::Database(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    Ok(())
}
