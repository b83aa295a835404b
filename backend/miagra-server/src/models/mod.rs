use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account row. Credential hash stays in the store; only projections
/// of this struct are ever serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub bio: String,
    pub website: String,
    pub avatar_url: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public projection attached to posts, comments, messages, follows and
/// search results.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// The account owner's view of their own record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
    pub website: String,
    pub avatar_url: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            bio: user.bio,
            website: user.website,
            avatar_url: user.avatar_url,
            is_private: user.is_private,
            created_at: user.created_at,
        }
    }
}

/// One-row-per-pair conversation summary. Participants are stored in
/// canonical order (user_a < user_b) so the pair is unique regardless of
/// who wrote first.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub last_message_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the conversation list: the partner and the latest message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub id: Uuid,
    pub user: PublicUser,
    pub last_message: Option<LastMessage>,
    pub updated_at: DateTime<Utc>,
}

/// Trailing message summary embedded in a conversation entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Direct message row. Immutable after insert except `is_read`, which the
/// receiver's thread fetch flips in bulk.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Message with the sender's public profile attached, as returned to
/// clients and pushed over the realtime transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub sender: PublicUser,
    pub receiver_id: Uuid,
    pub text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Message,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::Message => "message",
        }
    }
}

/// Notification row, serialized as-is on the realtime push path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Option<Uuid>,
    pub text: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification with the sender's public profile, used by the list endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: Uuid,
    pub sender: PublicUser,
    pub kind: NotificationKind,
    pub post_id: Option<Uuid>,
    pub text: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Image descriptor without the payload bytes; the bytes are served by a
/// dedicated endpoint backed by the image store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostImageMeta {
    pub post_id: Uuid,
    pub position: i32,
    pub content_type: String,
    pub filename: String,
    pub byte_size: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostImageDto {
    pub position: i32,
    pub content_type: String,
    pub filename: String,
    pub size: i64,
    pub url: String,
}

impl From<PostImageMeta> for PostImageDto {
    fn from(meta: PostImageMeta) -> Self {
        let url = format!("/api/v1/posts/{}/images/{}", meta.post_id, meta.position);
        Self {
            position: meta.position,
            content_type: meta.content_type,
            filename: meta.filename,
            size: meta.byte_size,
            url,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: PublicUser,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Post as rendered in the feed: author attached, like/comment tallies and
/// whether the requesting user is in the like set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: Uuid,
    pub author: PublicUser,
    pub content: String,
    pub images: Vec<PostImageDto>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single-post view: the feed projection plus the comment thread.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetailDto {
    #[serde(flatten)]
    pub post: PostDto,
    pub comments: Vec<CommentDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_kind_as_str() {
        assert_eq!(NotificationKind::Like.as_str(), "like");
        assert_eq!(NotificationKind::Comment.as_str(), "comment");
        assert_eq!(NotificationKind::Follow.as_str(), "follow");
        assert_eq!(NotificationKind::Message.as_str(), "message");
    }

    #[test]
    fn test_notification_kind_serializes_lowercase() {
        let json = serde_json::to_string(&NotificationKind::Follow).unwrap();
        assert_eq!(json, "\"follow\"");
    }

    #[test]
    fn test_image_dto_url_points_at_image_endpoint() {
        let post_id = Uuid::new_v4();
        let meta = PostImageMeta {
            post_id,
            position: 2,
            content_type: "image/png".into(),
            filename: "beach.png".into(),
            byte_size: 1024,
        };
        let dto = PostImageDto::from(meta);
        assert_eq!(dto.url, format!("/api/v1/posts/{post_id}/images/2"));
        assert_eq!(dto.size, 1024);
    }

    #[test]
    fn test_public_user_projection_drops_private_fields() {
        let user = User {
            id: Uuid::new_v4(),
            username: "ansel".into(),
            email: "ansel@example.com".into(),
            password_hash: "hash".into(),
            full_name: "Ansel A.".into(),
            bio: "".into(),
            website: "".into(),
            avatar_url: "".into(),
            is_private: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let public = PublicUser::from(&user);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["username"], "ansel");
    }
}
