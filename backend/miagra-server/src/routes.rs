//! Route configuration.
//!
//! Everything under `/api/v1` except register/login runs behind the JWT
//! middleware; `/health`, `/ws` (which authenticates in its own handshake)
//! and stored-image serving stay public. Within a scope, literal paths are
//! registered before parameterized ones so `/messages/conversations` is
//! never captured as a peer id.

use std::sync::Arc;

use actix_web::web;

use crate::config::Config;
use crate::handlers;
use crate::middleware::JwtAuthMiddleware;
use crate::websocket;

pub fn configure_routes(cfg: &mut web::ServiceConfig, config: &Arc<Config>) {
    cfg.service(handlers::health::health_check)
        .route("/ws", web::get().to(websocket::ws_handler))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .service(handlers::auth::register)
                        .service(handlers::auth::login)
                        .service(
                            web::scope("")
                                .wrap(JwtAuthMiddleware::new(config.clone()))
                                .service(handlers::auth::me),
                        ),
                )
                .service(
                    web::scope("/users")
                        .wrap(JwtAuthMiddleware::new(config.clone()))
                        .service(handlers::users::search_users)
                        .service(handlers::users::update_me)
                        .service(handlers::users::change_password)
                        .service(handlers::users::get_profile),
                )
                .service(
                    web::scope("/follow")
                        .wrap(JwtAuthMiddleware::new(config.clone()))
                        .service(handlers::follows::follow)
                        .service(handlers::follows::unfollow)
                        .service(handlers::follows::followers)
                        .service(handlers::follows::following)
                        .service(handlers::follows::status),
                )
                .service(
                    web::scope("/messages")
                        .wrap(JwtAuthMiddleware::new(config.clone()))
                        .service(handlers::messages::create_conversation)
                        .service(handlers::messages::list_conversations)
                        .service(handlers::messages::list_messages)
                        .service(handlers::messages::send_message),
                )
                .service(
                    web::scope("/notifications")
                        .wrap(JwtAuthMiddleware::new(config.clone()))
                        .service(handlers::notifications::mark_all_read)
                        .service(handlers::notifications::list)
                        .service(handlers::notifications::mark_read),
                )
                .service(
                    web::scope("/posts")
                        // Image bytes are public so plain <img> tags work;
                        // everything else needs the bearer token.
                        .service(handlers::posts::get_image)
                        .service(
                            web::scope("")
                                .wrap(JwtAuthMiddleware::new(config.clone()))
                                .service(handlers::posts::create_post)
                                .service(handlers::posts::list_posts)
                                .service(handlers::posts::list_user_posts)
                                .service(handlers::posts::toggle_like)
                                .service(handlers::posts::add_comment)
                                .service(handlers::posts::list_comments)
                                .service(handlers::posts::delete_comment)
                                .service(handlers::posts::get_post)
                                .service(handlers::posts::update_post)
                                .service(handlers::posts::delete_post),
                        ),
                ),
        );
}
