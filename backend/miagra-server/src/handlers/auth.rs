/// Account registration, login and the caller's own profile.
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::UserProfile;
use crate::security::{jwt, password};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let password_hash = password::hash_password(&payload.password)?;
    let user = user_repo::create_user(
        &state.db,
        payload.username.trim(),
        payload.email.trim(),
        &password_hash,
        payload.full_name.as_deref().map(str::trim),
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "account registered");

    let token = jwt::generate_token(
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
        user.id,
        &user.email,
        &user.username,
    )?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    // Same answer whether the account is missing or the password is wrong.
    let user = user_repo::find_by_email(&state.db, payload.email.trim())
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    if !password::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!(user_id = %user.id, "login");

    let token = jwt::generate_token(
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
        user.id,
        &user.email,
        &user.username,
    )?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[get("/me")]
pub async fn me(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let user = user_repo::find_by_id(&state.db, user.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}
