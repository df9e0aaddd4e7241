pub mod api_key;
pub mod otp;
pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::database::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub role_id: Option<Uuid>,
    /// Token id, used for logout revocation
    pub jti: String,
    #[serde(default)]
    pub refresh: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &User, lifetime: Duration, refresh: bool) -> Self {
        let now = Utc::now();
        Self {
            sub: user.user_id,
            email: user.email.clone(),
            role_id: user.role_id,
            jti: Uuid::new_v4().simple().to_string(),
            refresh,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

fn secret() -> Result<&'static [u8], JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret.as_bytes())
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?);
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn generate_access_token(user: &User) -> Result<String, JwtError> {
    let minutes = config::config().security.access_token_expiry_minutes;
    generate_jwt(&Claims::new(user, Duration::minutes(minutes), false))
}

pub fn generate_refresh_token(user: &User) -> Result<String, JwtError> {
    let days = config::config().security.refresh_token_expiry_days;
    generate_jwt(&Claims::new(user, Duration::days(days), true))
}

/// Verify signature and expiry, returning the claims
pub fn decode_token(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?);
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            user_id: Uuid::new_v4(),
            email: "grace@example.com".into(),
            phone_number: None,
            otp_code: None,
            otp_expiry: None,
            password_hash: None,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            role_id: Some(Uuid::new_v4()),
            status_active: true,
            is_verified: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let user = user();
        let token = generate_access_token(&user).unwrap();
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.role_id, user.role_id);
        assert!(!claims.refresh);
    }

    #[test]
    fn refresh_tokens_are_flagged_and_unique() {
        let user = user();
        let a = decode_token(&generate_refresh_token(&user).unwrap()).unwrap();
        let b = decode_token(&generate_refresh_token(&user).unwrap()).unwrap();
        assert!(a.refresh);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn expired_and_garbage_tokens_are_rejected() {
        let claims = Claims::new(&user(), Duration::minutes(-5), false);
        let token = generate_jwt(&claims).unwrap();
        assert!(matches!(decode_token(&token), Err(JwtError::InvalidToken(_))));
        assert!(matches!(decode_token("not.a.jwt"), Err(JwtError::InvalidToken(_))));
    }
}
