pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;
pub mod storage;
pub mod websocket;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
