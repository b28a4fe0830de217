use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token payload. `sub` carries the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i32, username: &str, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verifies signature and expiry.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_keeps_identity() {
        let claims = Claims::new(7, "alice", 60);
        let token = encode_token(&claims, "secret").unwrap();
        let decoded = decode_token(&token, "secret").unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.user_id(), Some(7));
        assert_eq!(decoded.exp - decoded.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = encode_token(&Claims::new(1, "alice", 60), "secret").unwrap();
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Beyond the default 60s leeway
        let token = encode_token(&Claims::new(1, "alice", -5), "secret").unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }
}
