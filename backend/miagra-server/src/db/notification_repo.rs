/// Notification repository
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Notification, NotificationDto, NotificationKind, PublicUser};

/// Newest notifications are listed first; the feed is capped rather than
/// paginated.
pub const LIST_LIMIT: i64 = 50;

pub async fn insert(
    pool: &PgPool,
    recipient_id: Uuid,
    sender_id: Uuid,
    kind: NotificationKind,
    post_id: Option<Uuid>,
    text: Option<&str>,
) -> Result<Notification> {
    let notification = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (recipient_id, sender_id, kind, post_id, text)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(recipient_id)
    .bind(sender_id)
    .bind(kind)
    .bind(post_id)
    .bind(text)
    .fetch_one(pool)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => {
            AppError::NotFound("User not found".to_string())
        }
        _ => {
            tracing::error!("Failed to insert notification: {}", e);
            AppError::Database(e)
        }
    })?;

    Ok(notification)
}

/// The recipient's recent notifications with sender profiles attached.
pub async fn list_for_recipient(pool: &PgPool, recipient_id: Uuid) -> Result<Vec<NotificationDto>> {
    let rows = sqlx::query(
        r#"
        SELECT
            n.id, n.kind, n.post_id, n.text, n.is_read, n.created_at,
            u.id AS sender_id, u.username, u.full_name, u.avatar_url
        FROM notifications n
        JOIN users u ON u.id = n.sender_id
        WHERE n.recipient_id = $1
        ORDER BY n.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(recipient_id)
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list notifications: {}", e);
        AppError::Database(e)
    })?;

    let notifications = rows
        .iter()
        .map(|r| NotificationDto {
            id: r.get("id"),
            sender: PublicUser {
                id: r.get("sender_id"),
                username: r.get("username"),
                full_name: r.get("full_name"),
                avatar_url: r.get("avatar_url"),
            },
            kind: r.get("kind"),
            post_id: r.get("post_id"),
            text: r.get("text"),
            is_read: r.get("is_read"),
            created_at: r.get("created_at"),
        })
        .collect();

    Ok(notifications)
}

/// Mark one notification read. Scoped to the recipient so nobody can flip
/// someone else's rows; a miss on either count is NotFound.
pub async fn mark_read(pool: &PgPool, recipient_id: Uuid, notification_id: Uuid) -> Result<()> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2",
    )
    .bind(notification_id)
    .bind(recipient_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to mark notification read: {}", e);
        AppError::Database(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }

    Ok(())
}

pub async fn mark_all_read(pool: &PgPool, recipient_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND is_read = FALSE",
    )
    .bind(recipient_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to mark notifications read: {}", e);
        AppError::Database(e)
    })?;

    Ok(result.rows_affected())
}
