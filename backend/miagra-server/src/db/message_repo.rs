/// Direct message repository
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Message;

pub async fn insert_message(
    pool: &PgPool,
    sender_id: Uuid,
    receiver_id: Uuid,
    text: &str,
) -> Result<Message> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (sender_id, receiver_id, text)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(text)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert message: {}", e);
        AppError::Database(e)
    })?;

    Ok(message)
}

/// Full history between the pair, oldest first.
pub async fn list_between(pool: &PgPool, user_id: Uuid, peer_id: Uuid) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT * FROM messages
        WHERE (sender_id = $1 AND receiver_id = $2)
           OR (sender_id = $2 AND receiver_id = $1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(peer_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list messages: {}", e);
        AppError::Database(e)
    })?;

    Ok(messages)
}

/// Flip unread messages from `peer_id` to `user_id` to read. Safe to call
/// repeatedly; returns how many rows changed.
pub async fn mark_received_read(pool: &PgPool, user_id: Uuid, peer_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET is_read = TRUE
        WHERE receiver_id = $1 AND sender_id = $2 AND is_read = FALSE
        "#,
    )
    .bind(user_id)
    .bind(peer_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to mark messages read: {}", e);
        AppError::Database(e)
    })?;

    Ok(result.rows_affected())
}
