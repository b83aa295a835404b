//! WebSocket session actor and the `/ws` upgrade handler.
//!
//! A connection authenticates during the HTTP upgrade (bearer token in the
//! query string or `Authorization` header) and is rejected with 401 before
//! the actor starts if the credential is missing or invalid. On success the
//! decoded user id is bound to the session for its lifetime, the connection
//! is registered, and a forwarding task drains registry pushes into the
//! actor.

use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use actix_web_actors::ws;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::security::jwt;
use crate::services::ChatService;
use crate::state::AppState;
use crate::websocket::events::{pair_room_key, ClientEvent, ServerEvent};
use crate::websocket::registry::{ConnectionId, ConnectionRegistry};

/// Push into the actor from outside the socket stream (registry relays,
/// spawned error frames).
#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct PushEvent(pub ServerEvent);

pub struct WsSession {
    user_id: Uuid,
    connection_id: ConnectionId,
    registry: ConnectionRegistry,
    chat: ChatService,
    hb: Instant,
}

impl WsSession {
    fn new(
        user_id: Uuid,
        connection_id: ConnectionId,
        registry: ConnectionRegistry,
        chat: ChatService,
    ) -> Self {
        Self {
            user_id,
            connection_id,
            registry,
            chat,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(Duration::from_secs(5), |act, ctx| {
            if Instant::now().duration_since(act.hb) > Duration::from_secs(30) {
                tracing::warn!(user_id = %act.user_id, "websocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn push(&self, ctx: &mut ws::WebsocketContext<Self>, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(json) => ctx.text(json),
            Err(e) => tracing::error!(error = %e, "failed to serialize websocket event"),
        }
    }

    fn handle_event(&mut self, event: ClientEvent, ctx: &mut ws::WebsocketContext<Self>) {
        match event {
            ClientEvent::JoinChat { peer_id } => {
                let room = pair_room_key(self.user_id, peer_id);
                let registry = self.registry.clone();
                let user_id = self.user_id;
                let connection_id = self.connection_id;
                actix::spawn(async move {
                    registry.join_room(&room, user_id, connection_id).await;
                });
            }
            ClientEvent::SendMessage { receiver_id, text } => {
                let chat = self.chat.clone();
                let registry = self.registry.clone();
                let sender_id = self.user_id;
                let addr = ctx.address();
                actix::spawn(async move {
                    match chat.send_message(sender_id, receiver_id, &text).await {
                        Ok(message) => {
                            // The service already delivered to the receiver's
                            // connections; the room echo covers everyone with
                            // the conversation open, sender included.
                            let room = pair_room_key(sender_id, receiver_id);
                            registry
                                .relay_to_room(&room, ServerEvent::ReceiveMessage { message })
                                .await;
                        }
                        Err(e) => {
                            addr.do_send(PushEvent(ServerEvent::Error {
                                message: e.public_message(),
                            }));
                        }
                    }
                });
            }
            ClientEvent::Typing {
                receiver_id,
                is_typing,
            } => {
                let chat = self.chat.clone();
                let sender_id = self.user_id;
                actix::spawn(async move {
                    chat.relay_typing(sender_id, receiver_id, is_typing).await;
                });
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "websocket session started");
        self.hb(ctx);
        self.push(
            ctx,
            &ServerEvent::Connected {
                user_id: self.user_id,
            },
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "websocket session stopped");
        let registry = self.registry.clone();
        let user_id = self.user_id;
        let connection_id = self.connection_id;
        actix::spawn(async move {
            registry.deregister(user_id, connection_id).await;
        });
    }
}

impl Handler<PushEvent> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: PushEvent, ctx: &mut Self::Context) {
        self.push(ctx, &msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => self.handle_event(event, ctx),
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, error = %e, "unparseable websocket event");
                    self.push(
                        ctx,
                        &ServerEvent::Error {
                            message: "Unrecognized event payload".into(),
                        },
                    );
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("binary websocket frames not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(user_id = %self.user_id, ?reason, "websocket close received");
                ctx.stop();
            }
            _ => {}
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// `GET /ws` — authenticate, register the connection, upgrade.
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsQuery>,
) -> actix_web::Result<HttpResponse> {
    let token = query
        .into_inner()
        .token
        .or_else(|| bearer_from_headers(&req));

    let Some(token) = token else {
        tracing::warn!("websocket rejected: no credential in handshake");
        return Ok(unauthorized("Missing authentication token"));
    };

    let user_id = match jwt::user_id_from_token(&state.config.jwt_secret, &token) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "websocket rejected: invalid credential");
            return Ok(e.error_response());
        }
    };

    let (connection_id, mut rx) = state.registry.register(user_id).await;
    let session = WsSession::new(
        user_id,
        connection_id,
        state.registry.clone(),
        state.chat.clone(),
    );

    let (addr, resp) = match ws::WsResponseBuilder::new(session, &req, stream).start_with_addr() {
        Ok(pair) => pair,
        Err(e) => {
            state.registry.deregister(user_id, connection_id).await;
            return Err(e);
        }
    };

    // Bridge registry pushes into the actor. The loop ends when
    // deregistration drops the sender side.
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            addr.do_send(PushEvent(event));
        }
    });

    Ok(resp)
}

fn bearer_from_headers(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// 401 with the same JSON body the HTTP API produces.
fn unauthorized(message: &str) -> HttpResponse {
    AppError::Authentication(message.to_string()).error_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_from_headers() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_from_headers(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_from_headers_requires_bearer_scheme() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(bearer_from_headers(&req).is_none());

        let req = TestRequest::default().to_http_request();
        assert!(bearer_from_headers(&req).is_none());
    }
}
