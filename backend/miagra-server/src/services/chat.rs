/// Direct-message orchestration shared by the REST handlers and the
/// realtime gateway. Both surfaces run exactly this path; the WebSocket
/// layer only adds its room echo on top.
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{conversation_repo, message_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::{Conversation, ConversationDto, MessageDto, NotificationKind, PublicUser};
use crate::services::notifier::{message_preview, Notifier};
use crate::websocket::{ConnectionRegistry, ServerEvent};

/// Upper bound on a single message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Clone)]
pub struct ChatService {
    db: PgPool,
    registry: ConnectionRegistry,
    notifier: Notifier,
}

impl ChatService {
    pub fn new(db: PgPool, registry: ConnectionRegistry, notifier: Notifier) -> Self {
        Self {
            db,
            registry,
            notifier,
        }
    }

    /// Persist a message, update the pair's conversation summary, record a
    /// `message` notification and push `receiveMessage` to the receiver's
    /// live connections. Returns the stored message with the sender
    /// profile attached.
    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        text: &str,
    ) -> Result<MessageDto> {
        let text = text.trim();

        if sender_id == receiver_id {
            return Err(AppError::Validation(
                "You cannot message yourself".to_string(),
            ));
        }
        if text.is_empty() {
            return Err(AppError::Validation("Message text is required".to_string()));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::Validation(format!(
                "Message text must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let sender = user_repo::find_by_id(&self.db, sender_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if !user_repo::exists(&self.db, receiver_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let message = message_repo::insert_message(&self.db, sender_id, receiver_id, text).await?;
        conversation_repo::upsert_with_last_message(&self.db, sender_id, receiver_id, message.id)
            .await?;

        self.notifier
            .notify(
                receiver_id,
                sender_id,
                NotificationKind::Message,
                None,
                Some(&message_preview(text)),
            )
            .await?;

        let dto = MessageDto {
            id: message.id,
            sender: PublicUser::from(&sender),
            receiver_id,
            text: message.text,
            is_read: message.is_read,
            created_at: message.created_at,
        };

        self.registry
            .relay_to_user(
                receiver_id,
                ServerEvent::ReceiveMessage {
                    message: dto.clone(),
                },
            )
            .await;

        Ok(dto)
    }

    /// The full thread between the caller and a peer, oldest first. Before
    /// reading, unread messages from the peer are flipped to read; calling
    /// this twice changes nothing further.
    pub async fn list_messages(&self, user_id: Uuid, peer_id: Uuid) -> Result<Vec<MessageDto>> {
        let user = user_repo::find_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let peer = user_repo::find_by_id(&self.db, peer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        message_repo::mark_received_read(&self.db, user_id, peer_id).await?;
        let messages = message_repo::list_between(&self.db, user_id, peer_id).await?;

        let user_public = PublicUser::from(&user);
        let peer_public = PublicUser::from(&peer);

        Ok(messages
            .into_iter()
            .map(|m| {
                let sender = if m.sender_id == user_id {
                    user_public.clone()
                } else {
                    peer_public.clone()
                };
                MessageDto {
                    id: m.id,
                    sender,
                    receiver_id: m.receiver_id,
                    text: m.text,
                    is_read: m.is_read,
                    created_at: m.created_at,
                }
            })
            .collect())
    }

    /// Every conversation the caller participates in, most recent first.
    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationDto>> {
        conversation_repo::list_for_user(&self.db, user_id).await
    }

    /// Create (or fetch) the conversation row for a pair without writing a
    /// message.
    pub async fn create_conversation(&self, user_id: Uuid, peer_id: Uuid) -> Result<Conversation> {
        if user_id == peer_id {
            return Err(AppError::Validation(
                "You cannot start a conversation with yourself".to_string(),
            ));
        }
        if !user_repo::exists(&self.db, peer_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        conversation_repo::ensure_exists(&self.db, user_id, peer_id).await
    }

    /// Relay a typing indicator to the target's live connections. Nothing
    /// is persisted and an offline target is not an error.
    pub async fn relay_typing(&self, sender_id: Uuid, receiver_id: Uuid, is_typing: bool) {
        self.registry
            .relay_to_user(
                receiver_id,
                ServerEvent::UserTyping {
                    user_id: sender_id,
                    is_typing,
                },
            )
            .await;
    }
}
