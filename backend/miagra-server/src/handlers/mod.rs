pub mod auth;
pub mod follows;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod users;
