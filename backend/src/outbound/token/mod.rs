//! Bearer token adapter (JWT, HS256).
//!
//! Tokens carry the subject user id in `sub` and an absolute UTC expiry in
//! `exp`, signed with the process-wide secret from settings.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{TokenCodec, TokenError};
use crate::domain::{AccessToken, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject user id, stringified. Optional so a structurally valid token
    /// without a subject is distinguishable from a corrupt one.
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    /// Absolute expiry as a UTC Unix timestamp.
    exp: i64,
}

/// JWT-backed implementation of the `TokenCodec` port.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenCodec {
    /// Build a codec around the shared signing secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact wall-clock UTC; no leeway window.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, subject: UserId, ttl: Duration) -> Result<AccessToken, TokenError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|err| TokenError::issue(format!("ttl out of range: {err}")))?;
        let claims = Claims {
            sub: Some(subject.to_string()),
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map(AccessToken::new)
            .map_err(|err| TokenError::issue(err.to_string()))
    }

    fn validate(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        let sub = data.claims.sub.ok_or(TokenError::MissingSubject)?;
        let id: i32 = sub.parse().map_err(|_| TokenError::MissingSubject)?;
        Ok(UserId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SECRET: &str = "09d25e094faa6ca2556c818166b7a9563b93f7099f6f0f4caa6cf63b88e8d3e7";

    fn codec() -> JwtTokenCodec {
        JwtTokenCodec::new(SECRET)
    }

    #[rstest]
    fn issue_then_validate_round_trips_the_subject() {
        let token = codec()
            .issue(UserId::new(42), Duration::from_secs(1800))
            .expect("issuing succeeds");
        let subject = codec().validate(token.as_str()).expect("token validates");
        assert_eq!(subject, UserId::new(42));
    }

    #[rstest]
    fn foreign_signature_is_invalid() {
        let token = JwtTokenCodec::new("other-secret")
            .issue(UserId::new(42), Duration::from_secs(1800))
            .expect("issuing succeeds");
        let err = codec().validate(token.as_str()).expect_err("must fail");
        assert_eq!(err, TokenError::Invalid);
    }

    #[rstest]
    #[case("")]
    #[case("not-a-token")]
    #[case("aaaa.bbbb.cccc")]
    fn malformed_tokens_are_invalid(#[case] token: &str) {
        assert_eq!(codec().validate(token), Err(TokenError::Invalid));
    }

    #[rstest]
    fn expired_tokens_are_invalid() {
        let claims = Claims {
            sub: Some("42".to_owned()),
            exp: (Utc::now() - chrono::Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encoding succeeds");

        assert_eq!(codec().validate(&token), Err(TokenError::Invalid));
    }

    #[rstest]
    fn token_without_subject_reports_missing_subject() {
        let claims = Claims {
            sub: None,
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encoding succeeds");

        assert_eq!(codec().validate(&token), Err(TokenError::MissingSubject));
    }

    #[rstest]
    fn non_numeric_subject_reports_missing_subject() {
        let claims = Claims {
            sub: Some("not-a-number".to_owned()),
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encoding succeeds");

        assert_eq!(codec().validate(&token), Err(TokenError::MissingSubject));
    }
}
