/// Database access layer: pool construction, embedded migrations and
/// one repository module per aggregate.
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub mod comment_repo;
pub mod conversation_repo;
pub mod follow_repo;
pub mod like_repo;
pub mod message_repo;
pub mod notification_repo;
pub mod post_repo;
pub mod user_repo;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create the PostgreSQL connection pool used by the whole server.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "database pool created");
    Ok(pool)
}
