/// Conversation summary repository.
///
/// Conversations are stored once per pair with participants in canonical
/// order (`user_a < user_b`), so every lookup and upsert goes through the
/// same key regardless of who sent first.
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Conversation, ConversationDto, LastMessage, PublicUser};

/// Order a pair into the canonical `(user_a, user_b)` form.
pub fn canonical_pair(x: Uuid, y: Uuid) -> (Uuid, Uuid) {
    if x < y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Create the pair row if missing and return it either way. The conflict
/// arm is a no-op update so the existing row comes back without touching
/// `last_message_id` or `updated_at`.
pub async fn ensure_exists(pool: &PgPool, x: Uuid, y: Uuid) -> Result<Conversation> {
    let (user_a, user_b) = canonical_pair(x, y);

    let conversation = sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (user_a, user_b)
        VALUES ($1, $2)
        ON CONFLICT (user_a, user_b) DO UPDATE SET user_a = EXCLUDED.user_a
        RETURNING *
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to ensure conversation: {}", e);
        AppError::Database(e)
    })?;

    Ok(conversation)
}

/// Upsert the pair row and point it at the newest message, bumping
/// `updated_at`. One statement, so two concurrent first messages cannot
/// create two rows.
pub async fn upsert_with_last_message(
    pool: &PgPool,
    x: Uuid,
    y: Uuid,
    message_id: Uuid,
) -> Result<Conversation> {
    let (user_a, user_b) = canonical_pair(x, y);

    let conversation = sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (user_a, user_b, last_message_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_a, user_b)
        DO UPDATE SET last_message_id = EXCLUDED.last_message_id, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .bind(message_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert conversation: {}", e);
        AppError::Database(e)
    })?;

    Ok(conversation)
}

/// All conversations for a user, most recent activity first, each with the
/// partner's public profile and the last message when one exists.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConversationDto>> {
    let rows = sqlx::query(
        r#"
        SELECT
            c.id, c.updated_at,
            u.id AS partner_id, u.username, u.full_name, u.avatar_url,
            m.id AS message_id, m.sender_id, m.text, m.is_read,
            m.created_at AS message_created_at
        FROM conversations c
        JOIN users u ON u.id = CASE WHEN c.user_a = $1 THEN c.user_b ELSE c.user_a END
        LEFT JOIN messages m ON m.id = c.last_message_id
        WHERE c.user_a = $1 OR c.user_b = $1
        ORDER BY c.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list conversations: {}", e);
        AppError::Database(e)
    })?;

    let entries = rows
        .iter()
        .map(|r| {
            let last_message = r
                .get::<Option<Uuid>, _>("message_id")
                .map(|message_id| LastMessage {
                    id: message_id,
                    sender_id: r.get("sender_id"),
                    text: r.get("text"),
                    is_read: r.get("is_read"),
                    created_at: r.get("message_created_at"),
                });

            ConversationDto {
                id: r.get("id"),
                user: PublicUser {
                    id: r.get("partner_id"),
                    username: r.get("username"),
                    full_name: r.get("full_name"),
                    avatar_url: r.get("avatar_url"),
                },
                last_message,
                updated_at: r.get("updated_at"),
            }
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_orders_both_ways() {
        let a = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let b = Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap();

        assert_eq!(canonical_pair(a, b), (a, b));
        assert_eq!(canonical_pair(b, a), (a, b));
    }
}
