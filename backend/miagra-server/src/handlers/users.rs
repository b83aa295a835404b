/// Profile pages, profile edits and user search.
use actix_web::{get, put, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::{follow_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::UserProfile;
use crate::security::password;
use crate::state::AppState;

const SEARCH_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 150, message = "Bio must be at most 150 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 255, message = "Website must be at most 255 characters"))]
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// Another user's profile page: public fields plus read-time counters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub website: String,
    pub avatar_url: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub is_following: bool,
    pub is_own_profile: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[get("/search")]
pub async fn search_users(
    state: web::Data<AppState>,
    user: UserId,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::Validation("Search query is required".to_string()));
    }

    let users = user_repo::search(&state.db, q, user.0, SEARCH_LIMIT).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[get("/{username}")]
pub async fn get_profile(
    state: web::Data<AppState>,
    viewer: UserId,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let user = user_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let followers_count = follow_repo::followers_count(&state.db, user.id).await?;
    let following_count = follow_repo::following_count(&state.db, user.id).await?;
    let posts_count = post_repo::count_by_author(&state.db, user.id).await?;
    let is_own_profile = viewer.0 == user.id;
    let is_following = if is_own_profile {
        false
    } else {
        follow_repo::is_following(&state.db, viewer.0, user.id).await?
    };

    Ok(HttpResponse::Ok().json(ProfileResponse {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        bio: user.bio,
        website: user.website,
        avatar_url: user.avatar_url,
        is_private: user.is_private,
        created_at: user.created_at,
        followers_count,
        following_count,
        posts_count,
        is_following,
        is_own_profile,
    }))
}

#[put("/me")]
pub async fn update_me(
    state: web::Data<AppState>,
    user: UserId,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let updated = user_repo::update_profile(
        &state.db,
        user.0,
        payload.full_name.as_deref(),
        payload.bio.as_deref(),
        payload.website.as_deref(),
        payload.avatar_url.as_deref(),
        payload.is_private,
    )
    .await?;

    tracing::info!(user_id = %user.0, "profile updated");
    Ok(HttpResponse::Ok().json(UserProfile::from(updated)))
}

#[put("/me/password")]
pub async fn change_password(
    state: web::Data<AppState>,
    user: UserId,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let account = user_repo::find_by_id(&state.db, user.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&payload.current_password, &account.password_hash)? {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash_password(&payload.new_password)?;
    user_repo::update_password(&state.db, user.0, &new_hash).await?;

    tracing::info!(user_id = %user.0, "password changed");
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}
