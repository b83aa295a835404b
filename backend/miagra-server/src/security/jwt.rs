/// Login token generation and validation (HS256, shared secret).
///
/// The signing secret and expiry are injected from `Config` rather than read
/// from ambient state, so callers in tests can use throwaway secrets.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Email address
    pub email: String,
    /// Username
    pub username: String,
}

/// Generate a signed login token for a user.
pub fn generate_token(
    secret: &str,
    expiry_hours: i64,
    user_id: Uuid,
    email: &str,
    username: &str,
) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::hours(expiry_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        email: email.to_string(),
        username: username.to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a token's signature and expiry, returning the decoded claims.
pub fn validate_token(secret: &str, token: &str) -> Result<TokenData<Claims>> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data)
}

/// Extract the user id from a validated token.
pub fn user_id_from_token(secret: &str, token: &str) -> Result<Uuid> {
    let token_data = validate_token(secret, token)?;
    Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| crate::error::AppError::Authentication("Invalid user ID in token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token(SECRET, 168, Uuid::new_v4(), "a@example.com", "a").unwrap();
        assert!(!token.is_empty());
        // JWT tokens have 3 parts separated by dots
        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn test_validate_round_trip() {
        let user_id = Uuid::new_v4();
        let token = generate_token(SECRET, 168, user_id, "a@example.com", "ansel").unwrap();

        let token_data = validate_token(SECRET, &token).unwrap();
        assert_eq!(token_data.claims.sub, user_id.to_string());
        assert_eq!(token_data.claims.email, "a@example.com");
        assert_eq!(token_data.claims.username, "ansel");
        assert!(token_data.claims.exp > token_data.claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = generate_token(SECRET, 168, Uuid::new_v4(), "a@example.com", "a").unwrap();
        assert!(validate_token("another-secret", &token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(validate_token(SECRET, "not.a.token").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Issue a token that expired two hours ago; default leeway is 60s.
        let token = generate_token(SECRET, -2, Uuid::new_v4(), "a@example.com", "a").unwrap();
        assert!(validate_token(SECRET, &token).is_err());
    }

    #[test]
    fn test_user_id_from_token() {
        let user_id = Uuid::new_v4();
        let token = generate_token(SECRET, 168, user_id, "a@example.com", "a").unwrap();
        assert_eq!(user_id_from_token(SECRET, &token).unwrap(), user_id);
    }

    #[test]
    fn test_expiry_matches_configured_hours() {
        let token = generate_token(SECRET, 168, Uuid::new_v4(), "a@example.com", "a").unwrap();
        let claims = validate_token(SECRET, &token).unwrap().claims;
        let expected = Utc::now().timestamp() + 168 * 3600;
        // Allow 1 second tolerance for execution time
        assert!((claims.exp - expected).abs() <= 1);
    }
}
