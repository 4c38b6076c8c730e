//! Extractor for the signed-in user.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument};

use crate::{
    AppState,
    auth::session::verify_access_token,
    errors::{Error, Result},
    types::{UserId, abbrev_uuid},
};

/// The caller, as identified by a verified bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<String>,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts).ok_or_else(|| Error::Unauthenticated {
            message: Some("Missing bearer token".to_string()),
        })?;

        let claims = verify_access_token(token, &state.config.auth)?;
        debug!("Authenticated user {}", abbrev_uuid(&claims.sub));

        Ok(CurrentUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("bearer   abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
