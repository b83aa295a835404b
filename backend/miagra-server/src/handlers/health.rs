use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    database: String,
}

/// Basic liveness/readiness probe: pings the database, reports degraded
/// instead of failing the request when it is unreachable.
#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if database == "healthy" { "ok" } else { "degraded" }.to_string(),
        service: "miagra-server".to_string(),
        database: database.to_string(),
    })
}
