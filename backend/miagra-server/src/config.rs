use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use std::env;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub cors_origins: Vec<String>,
}

impl Config {
    fn parse_origins(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow!("DATABASE_URL missing"))?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET missing"))?;
        if jwt_secret.trim().is_empty() {
            return Err(anyhow!("JWT_SECRET must not be empty"));
        }
        // Login tokens live for a week unless overridden.
        let jwt_expiry_hours = env::var("JWT_EXPIRY_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(168);

        let cors_origins_env =
            env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".into());
        let cors_origins = Self::parse_origins(&cors_origins_env);

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_expiry_hours,
            cors_origins,
        })
    }

    /// Fixture used by the test suite; never read in production paths.
    pub fn test_defaults() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            database_url: "postgres://localhost/miagra_test".into(),
            database_max_connections: 5,
            jwt_secret: "test-secret-key-not-for-production".into(),
            jwt_expiry_hours: 168,
            cors_origins: vec!["http://localhost:3000".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_splits_and_trims() {
        let origins = Config::parse_origins("http://a.example, http://b.example ,,");
        assert_eq!(origins, vec!["http://a.example", "http://b.example"]);
    }

    #[test]
    fn test_defaults_are_sane() {
        let config = Config::test_defaults();
        assert_eq!(config.jwt_expiry_hours, 168);
        assert!(!config.jwt_secret.is_empty());
    }
}
