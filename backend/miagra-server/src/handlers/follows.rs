/// Follow graph endpoints.
use actix_web::{delete, get, post, web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{follow_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::NotificationKind;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatusResponse {
    pub is_following: bool,
}

#[post("/{target_id}")]
pub async fn follow(
    state: web::Data<AppState>,
    user: UserId,
    target_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let target_id = target_id.into_inner();
    follow_repo::create_follow(&state.db, user.0, target_id).await?;

    tracing::info!(follower = %user.0, followee = %target_id, "follow created");

    state
        .notifier
        .notify(target_id, user.0, NotificationKind::Follow, None, None)
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "Followed".to_string(),
    }))
}

#[delete("/{target_id}")]
pub async fn unfollow(
    state: web::Data<AppState>,
    user: UserId,
    target_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let target_id = target_id.into_inner();
    follow_repo::delete_follow(&state.db, user.0, target_id).await?;

    tracing::info!(follower = %user.0, followee = %target_id, "follow removed");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Unfollowed".to_string(),
    }))
}

#[get("/{user_id}/followers")]
pub async fn followers(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = user_id.into_inner();
    if !user_repo::exists(&state.db, user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let users = follow_repo::list_followers(&state.db, user_id).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[get("/{user_id}/following")]
pub async fn following(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = user_id.into_inner();
    if !user_repo::exists(&state.db, user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let users = follow_repo::list_following(&state.db, user_id).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[get("/{target_id}/status")]
pub async fn status(
    state: web::Data<AppState>,
    user: UserId,
    target_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let is_following = follow_repo::is_following(&state.db, user.0, *target_id).await?;
    Ok(HttpResponse::Ok().json(FollowStatusResponse { is_following }))
}
