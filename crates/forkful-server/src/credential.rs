//! Bearer credential extraction.
//!
//! Handlers that need an authenticated caller take an [`AuthUser`] argument;
//! the request is rejected with a 401 before the handler runs if the token is
//! missing or fails verification.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::{debug, warn};

use forkful_shared::access::Credential;
use forkful_shared::TokenError;

use crate::api::AppState;
use crate::error::ServerError;

/// Deprecated header some clients still send instead of `Authorization`.
pub const LEGACY_HEADER: &str = "x-auth-token";

/// The verified caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Credential);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = presented_token(&parts.headers, state.config.legacy_auth_header)
            .ok_or(TokenError::Missing)?;

        match state.tokens.verify(token) {
            Ok(claims) => Ok(AuthUser(claims.credential())),
            Err(e) => {
                debug!(kind = ?e, path = %parts.uri.path(), "Rejected credential");
                Err(e.into())
            }
        }
    }
}

/// The raw token from `Authorization: Bearer`, or from the legacy header when
/// that is enabled.
fn presented_token(headers: &HeaderMap, allow_legacy: bool) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
        })
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    if !allow_legacy {
        return None;
    }
    let legacy = headers
        .get(LEGACY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())?;
    warn!("Credential sent in deprecated x-auth-token header");
    Some(legacy)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_bearer_header() {
        let h = headers(&[("authorization", "Bearer abc.def")]);
        assert_eq!(presented_token(&h, false), Some("abc.def"));

        let h = headers(&[("authorization", "bearer   abc.def ")]);
        assert_eq!(presented_token(&h, false), Some("abc.def"));
    }

    #[test]
    fn test_other_schemes_ignored() {
        let h = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(presented_token(&h, false), None);

        let h = headers(&[("authorization", "Bearer ")]);
        assert_eq!(presented_token(&h, false), None);
    }

    #[test]
    fn test_legacy_header_only_when_enabled() {
        let h = headers(&[("x-auth-token", "abc.def")]);
        assert_eq!(presented_token(&h, false), None);
        assert_eq!(presented_token(&h, true), Some("abc.def"));
    }

    #[test]
    fn test_bearer_wins_over_legacy() {
        let h = headers(&[("authorization", "Bearer one"), ("x-auth-token", "two")]);
        assert_eq!(presented_token(&h, true), Some("one"));
    }
}
