/// Post, like and comment endpoints, plus stored-image serving.
use actix_web::{delete, get, post, put, web, HttpResponse};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::state::AppState;
use crate::storage::NewImage;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    /// Base64-encoded image bytes.
    pub data: String,
    pub content_type: String,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: Option<String>,
    pub images: Option<Vec<ImageUpload>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: String,
    pub is_liked: bool,
    pub likes_count: i64,
}

fn decode_images(uploads: Vec<ImageUpload>) -> Result<Vec<NewImage>> {
    uploads
        .into_iter()
        .map(|upload| {
            let data = BASE64
                .decode(upload.data.as_bytes())
                .map_err(|_| AppError::Validation("Invalid image encoding".to_string()))?;
            Ok(NewImage {
                data,
                content_type: upload.content_type,
                filename: upload.filename.unwrap_or_else(|| "image".to_string()),
            })
        })
        .collect()
}

#[post("")]
pub async fn create_post(
    state: web::Data<AppState>,
    user: UserId,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    let images = decode_images(payload.images.unwrap_or_default())?;
    let content = payload.content.unwrap_or_default();

    let post = state.posts.create_post(user.0, &content, images).await?;

    tracing::info!(post_id = %post.id, author = %user.0, "post created");
    Ok(HttpResponse::Created().json(post))
}

#[get("")]
pub async fn list_posts(
    state: web::Data<AppState>,
    user: UserId,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = state
        .posts
        .list_posts(user.0, query.page.unwrap_or(1), query.limit.unwrap_or(10))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/user/{username}")]
pub async fn list_user_posts(
    state: web::Data<AppState>,
    user: UserId,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = state
        .posts
        .list_user_posts(
            user.0,
            &username,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(10),
        )
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/{id}")]
pub async fn get_post(
    state: web::Data<AppState>,
    user: UserId,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = state.posts.get_post(user.0, *id).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[put("/{id}")]
pub async fn update_post(
    state: web::Data<AppState>,
    user: UserId,
    id: web::Path<Uuid>,
    payload: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let post = state.posts.update_post(user.0, *id, &payload.content).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[delete("/{id}")]
pub async fn delete_post(
    state: web::Data<AppState>,
    user: UserId,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.delete_post(user.0, *id).await?;
    tracing::info!(post_id = %*id, author = %user.0, "post deleted");
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Post deleted".to_string(),
    }))
}

#[post("/{id}/like")]
pub async fn toggle_like(
    state: web::Data<AppState>,
    user: UserId,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = state.posts.toggle_like(user.0, *id).await?;
    Ok(HttpResponse::Ok().json(LikeResponse {
        message: if outcome.is_liked {
            "Post liked".to_string()
        } else {
            "Post unliked".to_string()
        },
        is_liked: outcome.is_liked,
        likes_count: outcome.likes_count,
    }))
}

#[get("/{id}/images/{position}")]
pub async fn get_image(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, i32)>,
) -> Result<HttpResponse> {
    let (post_id, position) = path.into_inner();
    let image = state.posts.fetch_image(post_id, position).await?;
    Ok(HttpResponse::Ok()
        .content_type(image.content_type)
        .body(image.data))
}

#[post("/{id}/comments")]
pub async fn add_comment(
    state: web::Data<AppState>,
    user: UserId,
    id: web::Path<Uuid>,
    payload: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let comment = state.posts.add_comment(user.0, *id, &payload.text).await?;
    Ok(HttpResponse::Created().json(comment))
}

#[get("/{id}/comments")]
pub async fn list_comments(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comments = state.posts.list_comments(*id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

#[delete("/{id}/comments/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (_post_id, comment_id) = path.into_inner();
    state.posts.delete_comment(user.0, comment_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Comment deleted".to_string(),
    }))
}
