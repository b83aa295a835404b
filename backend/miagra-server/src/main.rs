use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use miagra_server::db;
use miagra_server::routes::configure_routes;
use miagra_server::{AppState, Config};

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    tracing::info!("Starting miagra-server v{}", env!("CARGO_PKG_VERSION"));

    let pool = db::init_pool(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to database");

    db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let config = Arc::new(config);
    let state = AppState::new(pool, config.clone());

    let bind_addr = (config.host.clone(), config.port);
    tracing::info!("Listening on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &config.cors_origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let config = config.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(|cfg| configure_routes(cfg, &config))
    })
    .bind(bind_addr)?
    .run()
    .await
}
