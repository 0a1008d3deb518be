/// Request authentication
///
/// Tokens are read from the `token` cookie first and from an
/// `Authorization: Bearer <token>` header second. A request without either
/// is unauthenticated (401); a request whose token does not validate is
/// forbidden (403).
///
/// After successful authentication the API layer inserts an [`AuthContext`]
/// into the request extensions, and handlers take it with
/// `Extension<AuthContext>`.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use bugboard_shared::auth::jwt::{create_token, Claims};
/// use bugboard_shared::auth::middleware::{authenticate, extract_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id, "alice"), "secret")?;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_str(&format!("token={}", token))?);
///
/// let auth = authenticate(extract_token(&headers), "secret")?;
/// assert_eq!(auth.user_id, user_id);
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Name of the cookie carrying the bearer token
pub const TOKEN_COOKIE: &str = "token";

/// Authenticated actor, added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// User display name embedded in the token
    pub name: String,
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token in cookie or header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Token present but invalid or expired
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Finds the bearer token in the request headers
///
/// The `token` cookie takes precedence over the `Authorization` header.
/// Empty values are treated as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty());

    let token = from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
    })?;

    (!token.is_empty()).then_some(token)
}

/// Turns an optional token into the authenticated actor
///
/// # Errors
///
/// - `AuthError::MissingCredentials` if `token` is `None`
/// - `AuthError::InvalidToken` if validation fails for any reason
pub fn authenticate(token: Option<&str>, secret: &str) -> Result<AuthContext, AuthError> {
    let token = token.ok_or(AuthError::MissingCredentials)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
        name: claims.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "middleware-test-secret";

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; token=abc.def.ghi; lang=en")]);
        assert_eq!(extract_token(&map), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&map), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "token=from-cookie"),
        ]);
        assert_eq!(extract_token(&map), Some("from-cookie"));
    }

    #[test]
    fn test_extract_token_absent() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&headers(&[(header::COOKIE, "tokenish=1")])), None);
        assert_eq!(extract_token(&headers(&[(header::COOKIE, "token=")])), None);
        assert_eq!(extract_token(&headers(&[(header::AUTHORIZATION, "Basic xyz")])), None);
    }

    #[test]
    fn test_authenticate_valid_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "alice"), SECRET).unwrap();

        let auth = authenticate(Some(token.as_str()), SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.name, "alice");
    }

    #[test]
    fn test_authenticate_missing_token() {
        assert!(matches!(
            authenticate(None, SECRET),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_authenticate_invalid_and_expired_tokens() {
        assert!(matches!(
            authenticate(Some("garbage"), SECRET),
            Err(AuthError::InvalidToken(_))
        ));

        let expired = Claims::with_expiration(Uuid::new_v4(), "alice", Duration::seconds(-60));
        let token = create_token(&expired, SECRET).unwrap();
        assert!(matches!(
            authenticate(Some(token.as_str()), SECRET),
            Err(AuthError::InvalidToken(msg)) if msg == "Token expired"
        ));
    }
}
