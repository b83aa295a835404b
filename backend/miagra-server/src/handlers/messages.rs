/// Direct-message REST surface. The WebSocket path reuses the same
/// `ChatService`, so both transports share validation and persistence.
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::UserId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[post("/conversations/{peer_id}")]
pub async fn create_conversation(
    state: web::Data<AppState>,
    user: UserId,
    peer_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let conversation = state.chat.create_conversation(user.0, *peer_id).await?;
    Ok(HttpResponse::Created().json(conversation))
}

#[get("/conversations")]
pub async fn list_conversations(
    state: web::Data<AppState>,
    user: UserId,
) -> Result<HttpResponse> {
    let conversations = state.chat.list_conversations(user.0).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

#[get("/{peer_id}")]
pub async fn list_messages(
    state: web::Data<AppState>,
    user: UserId,
    peer_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let messages = state.chat.list_messages(user.0, *peer_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[post("/{peer_id}")]
pub async fn send_message(
    state: web::Data<AppState>,
    user: UserId,
    peer_id: web::Path<Uuid>,
    payload: web::Json<SendMessageRequest>,
) -> Result<HttpResponse> {
    let message = state.chat.send_message(user.0, *peer_id, &payload.text).await?;
    Ok(HttpResponse::Created().json(message))
}
