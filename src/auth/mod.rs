use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::Role;

pub mod cookie;
pub mod password;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug)]
pub enum TokenError {
    Expired,
    Invalid(String),
    MissingSecret,
    Signing(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Invalid(msg) => write!(f, "invalid token: {}", msg),
            TokenError::MissingSecret => write!(f, "JWT secret not configured"),
            TokenError::Signing(msg) => write!(f, "token signing error: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies the signed, stateless identity tokens carried by the
/// auth cookie. Holds no per-request state.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_hours: u64,
}

impl TokenService {
    pub fn new(security: &SecurityConfig) -> Result<Self, TokenError> {
        if security.jwt_secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            token_ttl_hours: security.token_ttl_hours,
        })
    }

    /// Sign a token embedding the user id and role, expiring after the
    /// configured lifetime.
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            exp: (now + Duration::hours(self.token_ttl_hours as i64)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn service() -> TokenService {
        let mut security = AppConfig::development().security;
        security.jwt_secret = "unit-test-secret".to_string();
        TokenService::new(&security).unwrap()
    }

    #[test]
    fn issue_then_verify_round_trips_identity() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id, Role::Teacher).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Teacher);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let tokens = service();

        let mut other = AppConfig::development().security;
        other.jwt_secret = "a-different-secret".to_string();
        let imposter = TokenService::new(&other).unwrap();

        let token = imposter.issue(Uuid::new_v4(), Role::Admin).unwrap();
        assert!(matches!(
            tokens.verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let tokens = service();
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::Student,
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        assert!(matches!(tokens.verify(&stale), Err(TokenError::Expired)));
    }

    #[test]
    fn rejects_garbage_token() {
        let tokens = service();
        assert!(tokens.verify("not-a-jwt").is_err());
    }

    #[test]
    fn empty_secret_is_a_startup_error() {
        let security = AppConfig::development().security;
        assert!(matches!(
            TokenService::new(&security),
            Err(TokenError::MissingSecret)
        ));
    }
}
