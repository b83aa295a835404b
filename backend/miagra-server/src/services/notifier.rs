/// Notification fan-out service.
///
/// Owns the record-then-push pairing: every notification row written here
/// is followed by a `newNotification` relay to the recipient's live
/// connections. The push is best-effort; only the row write can fail the
/// caller.
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::notification_repo;
use crate::error::Result;
use crate::models::{Notification, NotificationKind};
use crate::websocket::{ConnectionRegistry, ServerEvent};

/// Preview text keeps this many characters before the ellipsis.
const PREVIEW_CHARS: usize = 50;

/// Hard bound of the notifications.text column.
const TEXT_CHARS: usize = 200;

#[derive(Clone)]
pub struct Notifier {
    db: PgPool,
    registry: ConnectionRegistry,
}

impl Notifier {
    pub fn new(db: PgPool, registry: ConnectionRegistry) -> Self {
        Self { db, registry }
    }

    /// Record a notification and push it to the recipient.
    pub async fn notify(
        &self,
        recipient_id: Uuid,
        sender_id: Uuid,
        kind: NotificationKind,
        post_id: Option<Uuid>,
        text: Option<&str>,
    ) -> Result<Notification> {
        let clipped = text.map(|t| clip_chars(t, TEXT_CHARS));
        let notification = notification_repo::insert(
            &self.db,
            recipient_id,
            sender_id,
            kind,
            post_id,
            clipped.as_deref(),
        )
        .await?;

        let delivered = self
            .registry
            .relay_to_user(
                recipient_id,
                ServerEvent::NewNotification {
                    notification: notification.clone(),
                },
            )
            .await;
        tracing::debug!(
            %recipient_id,
            kind = kind.as_str(),
            delivered,
            "notification recorded"
        );

        Ok(notification)
    }
}

/// Shorten text for a notification preview: the first 50 characters plus a
/// trailing ellipsis when anything was cut.
pub fn message_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

fn clip_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_passes_through() {
        assert_eq!(message_preview("hello"), "hello");
    }

    #[test]
    fn test_exactly_fifty_chars_keeps_no_ellipsis() {
        let text = "a".repeat(50);
        assert_eq!(message_preview(&text), text);
    }

    #[test]
    fn test_long_text_is_clipped_with_ellipsis() {
        let text = "a".repeat(80);
        let preview = message_preview(&text);
        assert_eq!(preview.chars().count(), 53);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        // 60 multi-byte characters; byte-indexed slicing would panic here.
        let text = "ж".repeat(60);
        let preview = message_preview(&text);
        assert!(preview.starts_with('ж'));
        assert_eq!(preview.chars().count(), 53);
    }

    #[test]
    fn test_clip_chars_bounds_column_width() {
        let text = "b".repeat(500);
        assert_eq!(clip_chars(&text, 200).chars().count(), 200);
        assert_eq!(clip_chars("ok", 200), "ok");
    }
}
