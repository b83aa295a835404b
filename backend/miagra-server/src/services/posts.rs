/// Post orchestration: creation with images, likes, comments, pagination.
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::post_repo::PostRow;
use crate::db::{comment_repo, like_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::{
    CommentDto, NotificationKind, PostDetailDto, PostDto, PostImageDto, PostImageMeta,
};
use crate::services::notifier::{message_preview, Notifier};
use crate::storage::{ImageStore, NewImage, StoredImage};

/// Upper bound on post content, in characters.
pub const MAX_CONTENT_CHARS: usize = 2200;

/// Upper bound on comment text, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// At most this many images per post.
pub const MAX_IMAGES: usize = 4;

/// Per-image payload cap, decoded bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A page of posts plus pagination metadata.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<PostDto>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy)]
pub struct LikeOutcome {
    pub is_liked: bool,
    pub likes_count: i64,
}

#[derive(Clone)]
pub struct PostService {
    db: PgPool,
    images: Arc<dyn ImageStore>,
    notifier: Notifier,
}

impl PostService {
    pub fn new(db: PgPool, images: Arc<dyn ImageStore>, notifier: Notifier) -> Self {
        Self {
            db,
            images,
            notifier,
        }
    }

    /// Create a post with up to four images. A post with neither content
    /// nor images is rejected.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        content: &str,
        images: Vec<NewImage>,
    ) -> Result<PostDto> {
        let content = content.trim();

        if content.is_empty() && images.is_empty() {
            return Err(AppError::Validation(
                "Post must have content or images".to_string(),
            ));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::Validation(format!(
                "Post content must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }
        if images.len() > MAX_IMAGES {
            return Err(AppError::Validation(format!(
                "A post can have at most {} images",
                MAX_IMAGES
            )));
        }
        for image in &images {
            if image.data.is_empty() {
                return Err(AppError::Validation("Image payload is empty".to_string()));
            }
            if image.data.len() > MAX_IMAGE_BYTES {
                return Err(AppError::Validation(
                    "Image exceeds the 5MB size limit".to_string(),
                ));
            }
        }

        let author = user_repo::find_by_id(&self.db, author_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let post = post_repo::insert_post(&self.db, author_id, content).await?;
        let saved = self.images.save_images(post.id, &images).await?;

        Ok(PostDto {
            id: post.id,
            author: (&author).into(),
            content: post.content,
            images: saved.into_iter().map(PostImageDto::from).collect(),
            likes_count: 0,
            comments_count: 0,
            is_liked: false,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }

    /// One post with comments, in the viewer-relative projection.
    pub async fn get_post(&self, viewer_id: Uuid, post_id: Uuid) -> Result<PostDetailDto> {
        let row = post_repo::fetch_row(&self.db, viewer_id, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let images = self.images.list_meta(post_id).await?;
        let comments = comment_repo::list_for_post(&self.db, post_id).await?;

        Ok(PostDetailDto {
            post: assemble(row, images),
            comments,
        })
    }

    /// Global feed page, newest first.
    pub async fn list_posts(&self, viewer_id: Uuid, page: i64, limit: i64) -> Result<PostPage> {
        let (page, limit) = clamp_page(page, limit);
        let offset = (page - 1) * limit;

        let rows = post_repo::list_page(&self.db, viewer_id, limit, offset).await?;
        let total = post_repo::count_all(&self.db).await?;

        self.into_page(rows, total, page, limit).await
    }

    /// One user's posts, newest first.
    pub async fn list_user_posts(
        &self,
        viewer_id: Uuid,
        username: &str,
        page: i64,
        limit: i64,
    ) -> Result<PostPage> {
        let author = user_repo::find_by_username(&self.db, username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let (page, limit) = clamp_page(page, limit);
        let offset = (page - 1) * limit;

        let rows = post_repo::list_page_by_author(&self.db, viewer_id, author.id, limit, offset)
            .await?;
        let total = post_repo::count_by_author(&self.db, author.id).await?;

        self.into_page(rows, total, page, limit).await
    }

    /// Author-only content edit.
    pub async fn update_post(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> Result<PostDto> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Content is required".to_string()));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::Validation(format!(
                "Post content must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }

        let post = post_repo::find_by_id(&self.db, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        if post.author_id != author_id {
            return Err(AppError::Authorization("Not your post".to_string()));
        }

        post_repo::update_content(&self.db, post_id, content).await?;

        let row = post_repo::fetch_row(&self.db, author_id, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let images = self.images.list_meta(post_id).await?;

        Ok(assemble(row, images))
    }

    /// Author-only delete; images, likes and comments cascade with the row.
    pub async fn delete_post(&self, author_id: Uuid, post_id: Uuid) -> Result<()> {
        let post = post_repo::find_by_id(&self.db, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        if post.author_id != author_id {
            return Err(AppError::Authorization("Not your post".to_string()));
        }

        post_repo::delete_post(&self.db, post_id).await
    }

    /// Toggle the caller's like on a post. Liking someone else's post
    /// notifies the author; unliking never does.
    pub async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> Result<LikeOutcome> {
        let post = post_repo::find_by_id(&self.db, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let is_liked = like_repo::toggle(&self.db, post_id, user_id).await?;
        let likes_count = like_repo::count_for_post(&self.db, post_id).await?;

        if is_liked && post.author_id != user_id {
            self.notifier
                .notify(
                    post.author_id,
                    user_id,
                    NotificationKind::Like,
                    Some(post_id),
                    None,
                )
                .await?;
        }

        Ok(LikeOutcome {
            is_liked,
            likes_count,
        })
    }

    /// Comment on a post; the post author is notified unless they comment
    /// on their own post.
    pub async fn add_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        text: &str,
    ) -> Result<CommentDto> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment text is required".to_string()));
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::Validation(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_CHARS
            )));
        }

        let post = post_repo::find_by_id(&self.db, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let author = user_repo::find_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let comment = comment_repo::insert(&self.db, post_id, user_id, text).await?;

        if post.author_id != user_id {
            self.notifier
                .notify(
                    post.author_id,
                    user_id,
                    NotificationKind::Comment,
                    Some(post_id),
                    Some(&message_preview(text)),
                )
                .await?;
        }

        Ok(CommentDto {
            id: comment.id,
            post_id: comment.post_id,
            author: (&author).into(),
            text: comment.text,
            created_at: comment.created_at,
        })
    }

    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentDto>> {
        if post_repo::find_by_id(&self.db, post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        comment_repo::list_for_post(&self.db, post_id).await
    }

    /// Delete a comment. Allowed to the comment author and to the author
    /// of the post it sits on.
    pub async fn delete_comment(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        let comment = comment_repo::find_by_id(&self.db, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if comment.user_id != user_id {
            let post = post_repo::find_by_id(&self.db, comment.post_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
            if post.author_id != user_id {
                return Err(AppError::Authorization(
                    "You cannot delete this comment".to_string(),
                ));
            }
        }

        comment_repo::delete(&self.db, comment_id).await
    }

    /// Raw image bytes for serving.
    pub async fn fetch_image(&self, post_id: Uuid, position: i32) -> Result<StoredImage> {
        self.images
            .fetch(post_id, position)
            .await?
            .ok_or_else(|| AppError::NotFound("Image not found".to_string()))
    }

    async fn into_page(
        &self,
        rows: Vec<PostRow>,
        total: i64,
        page: i64,
        limit: i64,
    ) -> Result<PostPage> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut images_by_post: HashMap<Uuid, Vec<PostImageMeta>> =
            self.images.list_meta_many(&ids).await?;

        let posts = rows
            .into_iter()
            .map(|row| {
                let images = images_by_post.remove(&row.id).unwrap_or_default();
                assemble(row, images)
            })
            .collect();

        Ok(PostPage {
            posts,
            total,
            page,
            pages: (total + limit - 1) / limit,
        })
    }
}

fn assemble(row: PostRow, images: Vec<PostImageMeta>) -> PostDto {
    PostDto {
        id: row.id,
        author: row.author,
        content: row.content,
        images: images.into_iter().map(PostImageDto::from).collect(),
        likes_count: row.likes_count,
        comments_count: row.comments_count,
        is_liked: row.is_liked,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Normalize pagination inputs: page starts at 1, limit stays in 1..=50.
fn clamp_page(page: i64, limit: i64) -> (i64, i64) {
    (page.max(1), limit.clamp(1, 50))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page_floors_and_caps() {
        assert_eq!(clamp_page(0, 10), (1, 10));
        assert_eq!(clamp_page(-3, 0), (1, 1));
        assert_eq!(clamp_page(2, 500), (2, 50));
        assert_eq!(clamp_page(7, 25), (7, 25));
    }

    #[test]
    fn test_pages_rounds_up() {
        let pages = |total: i64, limit: i64| (total + limit - 1) / limit;
        assert_eq!(pages(0, 10), 0);
        assert_eq!(pages(1, 10), 1);
        assert_eq!(pages(10, 10), 1);
        assert_eq!(pages(11, 10), 2);
    }
}
