/// Notification inbox endpoints.
use actix_web::{get, put, web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::db::notification_repo;
use crate::error::Result;
use crate::middleware::UserId;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[get("")]
pub async fn list(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let notifications = notification_repo::list_for_recipient(&state.db, user.0).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

#[put("/{id}/read")]
pub async fn mark_read(
    state: web::Data<AppState>,
    user: UserId,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    notification_repo::mark_read(&state.db, user.0, *id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Notification marked as read".to_string(),
    }))
}

#[put("/mark-all-read")]
pub async fn mark_all_read(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let updated = notification_repo::mark_all_read(&state.db, user.0).await?;
    tracing::debug!(user_id = %user.0, updated, "notifications marked read");
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "All notifications marked as read".to_string(),
    }))
}
