//! Supabase access token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::Error, types::UserId};

/// The subset of Supabase access token claims the service reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Auth user id
    pub sub: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub aud: Option<String>,
}

/// Verify an access token and return its claims.
pub fn verify_access_token(token: &str, config: &AuthConfig) -> Result<AccessTokenClaims, Error> {
    let secret = config.jwt_secret.as_deref().ok_or_else(|| Error::Internal {
        operation: "verify access token: auth.jwt_secret is not configured".to_string(),
    })?;

    let mut validation = Validation::new(Algorithm::HS256);
    match &config.jwt_audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<AccessTokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::ExpiredSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm => Error::Unauthenticated {
            message: Some("Invalid or expired access token".to_string()),
        },
        _ => Error::Internal {
            operation: format!("verify access token: {e}"),
        },
    })?;

    Ok(token_data.claims)
}

/// Sign claims the way Supabase does. Used to mint tokens in tests.
#[cfg(test)]
pub(crate) fn create_access_token(claims: &AccessTokenClaims, secret: &str) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes())).expect("encode test token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: Some("test-jwt-secret".to_string()),
            ..Default::default()
        }
    }

    fn claims(exp_offset: Duration, aud: &str) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: Uuid::new_v4(),
            email: Some("owner@example.com".to_string()),
            role: Some("authenticated".to_string()),
            exp: (Utc::now() + exp_offset).timestamp(),
            aud: Some(aud.to_string()),
        }
    }

    #[test]
    fn test_valid_token_round_trips_subject() {
        let claims = claims(Duration::hours(1), "authenticated");
        let token = create_access_token(&claims, "test-jwt-secret");

        let verified = verify_access_token(&token, &config()).unwrap();
        assert_eq!(verified.sub, claims.sub);
        assert_eq!(verified.email.as_deref(), Some("owner@example.com"));
    }

    #[test]
    fn test_rejected_tokens_are_unauthenticated() {
        let expired = create_access_token(&claims(-Duration::hours(1), "authenticated"), "test-jwt-secret");
        let wrong_secret = create_access_token(&claims(Duration::hours(1), "authenticated"), "other-secret");
        let anon_audience = create_access_token(&claims(Duration::hours(1), "anon"), "test-jwt-secret");

        for token in [expired.as_str(), wrong_secret.as_str(), anon_audience.as_str(), "not.a.token", ""] {
            let err = verify_access_token(token, &config()).unwrap_err();
            assert!(matches!(err, Error::Unauthenticated { .. }), "token {token:?} gave {err:?}");
        }
    }

    #[test]
    fn test_missing_secret_is_a_server_error() {
        let token = create_access_token(&claims(Duration::hours(1), "authenticated"), "test-jwt-secret");
        let err = verify_access_token(&token, &AuthConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
    }
}
