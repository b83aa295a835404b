/// Request-boundary behavior that needs no live database: payload
/// validation, the auth middleware, and the JSON error body shape.
///
/// The pool is created lazily, so routes only fail if a handler actually
/// reaches for the database.
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::json;
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
async fn test_protected_route_requires_token() {
    let state = test_state();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications")
        .to_request();

    // Middleware rejections surface as service-level errors rather than
    // materialized responses, so go through try_call_service.
    let err = test::try_call_service(&app, req)
        .await
        .expect_err("request without a token must be rejected");

    let resp = err.error_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let bytes = to_bytes(resp.into_body()).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "AUTHENTICATION_ERROR");
    assert_eq!(body["message"], "Authentication error: Missing Authorization header");
}

#[actix_web::test]
async fn test_invalid_bearer_token_is_rejected() {
    let state = test_state();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/conversations")
        .insert_header(("Authorization", "Bearer this.is.garbage"))
        .to_request();

    let err = test::try_call_service(&app, req)
        .await
        .expect_err("garbage token must be rejected");
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_valid_token_passes_the_middleware() {
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
            .app_data(web::Data::new(state))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;

    // The handler then fails on the unreachable database, but the request
    // made it past authentication.
    assert_ne!(resp.status(), 401);
}

#[actix_web::test]
async fn test_self_follow_is_rejected() {
    let state = test_state();
    let user_id = uuid::Uuid::new_v4();
    let token = jwt::generate_token(
        &state.config.jwt_secret,
        1,
        user_id,
        "a@example.com",
        "alice",
    )
    .unwrap();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    // Rejected before any row is touched, so the lazy pool never connects.
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/follow/{user_id}"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_register_rejects_malformed_payload() {
    let state = test_state();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "username": "ab",
            "email": "not-an-email",
            "password": "123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_login_rejects_malformed_email() {
    let state = test_state();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "nope", "password": "whatever" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_register_and_login_do_not_require_a_token() {
    let state = test_state();
    let config = state.config.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(move |cfg| configure_routes(cfg, &config)),
    )
    .await;

    // Missing body, not missing credentials: these must never 401.
    for uri in ["/api/v1/auth/register", "/api/v1/auth/login"] {
        let req = test::TestRequest::post().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_ne!(resp.status(), 401, "{uri} should be public");
    }
}
