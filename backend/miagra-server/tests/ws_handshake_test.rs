/// WebSocket handshake authentication.
///
/// A connection that fails the credential check must be rejected before it
/// is tracked anywhere: no registry entry, no pushes, ever.
use actix_web::{test, web, App};
use std::sync::Arc;

use miagra_server::routes::configure_routes;
use miagra_server::security::jwt;
use miagra_server::{AppState, Config};

fn test_state() -> AppState {
    let config = Arc::new(Config::test_defaults());
    let db = sqlx::PgPool::connect_lazy(&config.database_url).expect("lazy pool");
    AppState::new(db, config)
}

#[actix_web::test]
async fn test_handshake_without_token_is_rejected() {
    let state = test_state();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::get().uri("/ws").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "AUTHENTICATION_ERROR");
    assert_eq!(state.registry.connected_users_count().await, 0);
}

#[actix_web::test]
async fn test_handshake_with_invalid_token_is_rejected() {
    let state = test_state();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/ws?token=this.is.garbage")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(state.registry.connected_users_count().await, 0);
}

#[actix_web::test]
async fn test_failed_upgrade_leaves_no_registry_entry() {
    let state = test_state();
    let token = jwt::generate_token(
        &state.config.jwt_secret,
        1,
        uuid::Uuid::new_v4(),
        "a@example.com",
        "alice",
    )
    .unwrap();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    // Valid credential but a plain GET with no upgrade headers: the
    // websocket start fails after registration, which must roll back.
    let req = test::TestRequest::get()
        .uri(&format!("/ws?token={token}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    assert_eq!(state.registry.connected_users_count().await, 0);
}
