/// Image storage port.
///
/// Post handlers and services only ever see this trait; the bytes
/// currently live in Postgres, but an object-store implementation can be
/// swapped in without touching the post model or handlers.
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::PostImageMeta;

/// Decoded image payload ready to be stored.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Image bytes plus the content type to serve them under.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist a post's images in order; `images[i]` gets position `i`.
    async fn save_images(&self, post_id: Uuid, images: &[NewImage]) -> Result<Vec<PostImageMeta>>;

    /// Descriptors for one post, ordered by position.
    async fn list_meta(&self, post_id: Uuid) -> Result<Vec<PostImageMeta>>;

    /// Descriptors for a batch of posts, keyed by post id. Posts without
    /// images are simply absent from the map.
    async fn list_meta_many(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<PostImageMeta>>>;

    /// The stored bytes for one image, if it exists.
    async fn fetch(&self, post_id: Uuid, position: i32) -> Result<Option<StoredImage>>;
}

/// Postgres-backed image store over the post_images table.
#[derive(Clone)]
pub struct PgImageStore {
    db: PgPool,
}

impl PgImageStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImageStore for PgImageStore {
    async fn save_images(&self, post_id: Uuid, images: &[NewImage]) -> Result<Vec<PostImageMeta>> {
        let mut saved = Vec::with_capacity(images.len());

        for (position, image) in images.iter().enumerate() {
            let meta = sqlx::query_as::<_, PostImageMeta>(
                r#"
                INSERT INTO post_images (post_id, position, data, content_type, filename, byte_size)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING post_id, position, content_type, filename, byte_size
                "#,
            )
            .bind(post_id)
            .bind(position as i32)
            .bind(&image.data)
            .bind(&image.content_type)
            .bind(&image.filename)
            .bind(image.data.len() as i64)
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store post image: {}", e);
                AppError::Database(e)
            })?;

            saved.push(meta);
        }

        Ok(saved)
    }

    async fn list_meta(&self, post_id: Uuid) -> Result<Vec<PostImageMeta>> {
        let meta = sqlx::query_as::<_, PostImageMeta>(
            r#"
            SELECT post_id, position, content_type, filename, byte_size
            FROM post_images
            WHERE post_id = $1
            ORDER BY position
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list post images: {}", e);
            AppError::Database(e)
        })?;

        Ok(meta)
    }

    async fn list_meta_many(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<PostImageMeta>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let meta = sqlx::query_as::<_, PostImageMeta>(
            r#"
            SELECT post_id, position, content_type, filename, byte_size
            FROM post_images
            WHERE post_id = ANY($1)
            ORDER BY post_id, position
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list post images: {}", e);
            AppError::Database(e)
        })?;

        let mut by_post: HashMap<Uuid, Vec<PostImageMeta>> = HashMap::new();
        for m in meta {
            by_post.entry(m.post_id).or_default().push(m);
        }

        Ok(by_post)
    }

    async fn fetch(&self, post_id: Uuid, position: i32) -> Result<Option<StoredImage>> {
        let row: Option<(Vec<u8>, String)> = sqlx::query_as(
            "SELECT data, content_type FROM post_images WHERE post_id = $1 AND position = $2",
        )
        .bind(post_id)
        .bind(position)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch post image: {}", e);
            AppError::Database(e)
        })?;

        Ok(row.map(|(data, content_type)| StoredImage { data, content_type }))
    }
}
