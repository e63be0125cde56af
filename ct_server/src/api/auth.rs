//! Bearer token verification.
//!
//! Tokens are HS256 JWTs whose `sub` claim is the club user id. They are
//! issued by the club application; this server only checks them.

use chrono::Utc;
use club_tourney::tournament::ParticipantId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: ParticipantId,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// HS256 access token verifier
#[derive(Clone)]
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decode and check a token, including its expiry
    pub fn verify(&self, token: &str) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Sign a token for `user_id`, valid for `ttl_secs`
    ///
    /// Used by operators and tests to mint tokens with the shared secret.
    pub fn issue(
        &self,
        user_id: ParticipantId,
        ttl_secs: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user_id,
            exp: now + ttl_secs,
            iat: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_for_testing_only_0123456789";

    #[test]
    fn test_issue_then_verify() {
        let verifier = TokenVerifier::new(SECRET);
        let token = verifier.issue(42, 900).unwrap();

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenVerifier::new(SECRET).issue(42, 900).unwrap();
        let other = TokenVerifier::new("another_secret_key_that_is_long_enough!!");

        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        // Well past the default leeway
        let token = verifier.issue(42, -3600).unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(verifier.verify("not.a.token").is_err());
    }
}
