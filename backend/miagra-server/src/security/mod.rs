/// Security module for authentication
/// Provides password hashing and login token management
pub mod jwt;
pub mod password;

pub use jwt::{generate_token, user_id_from_token, validate_token, Claims};
pub use password::{hash_password, verify_password};
