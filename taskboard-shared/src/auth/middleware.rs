/// Caller identity and bearer-token resolution
///
/// Transports turn whatever credentials a request carries into a [`Caller`]
/// and hand it to the `Board`. For HTTP that means reading the
/// `Authorization: Bearer <token>` header with [`resolve_caller`]; the API
/// crate runs it in an axum middleware layer and stores the result as a
/// request extension.
///
/// A request without an `Authorization` header resolves to
/// [`Caller::Anonymous`]. A header that is present but malformed, invalid or
/// expired is an error, never a silent downgrade to anonymous.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap};
/// use taskboard_shared::auth::jwt::JwtKeys;
/// use taskboard_shared::auth::middleware::{resolve_caller, Caller};
/// use chrono::Duration;
///
/// let keys = JwtKeys::new(
///     "access-secret-at-least-32-bytes-long!!",
///     "refresh-secret-at-least-32-bytes-long!",
///     Duration::minutes(15),
///     Duration::days(7),
/// );
///
/// let headers = HeaderMap::new();
/// assert!(matches!(resolve_caller(&headers, &keys), Ok(Caller::Anonymous)));
/// ```

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use super::jwt::{Claims, JwtError, JwtKeys};
use crate::error::CoreError;
use crate::models::Role;

/// Authenticated caller identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub login: String,
    pub role: Role,
}

impl AuthContext {
    /// Builds the context from verified access-token claims
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the claims carry no role
    pub fn from_claims(claims: Claims) -> Result<Self, AuthError> {
        let role = claims
            .role
            .ok_or_else(|| AuthError::InvalidToken("Token carries no role".to_string()))?;

        Ok(Self {
            user_id: claims.sub,
            login: claims.login,
            role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Who is calling a `Board` operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated(AuthContext),
}

impl Caller {
    pub fn context(&self) -> Option<&AuthContext> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(ctx) => Some(ctx),
        }
    }
}

impl From<AuthContext> for Caller {
    fn from(ctx: AuthContext) -> Self {
        Caller::Authenticated(ctx)
    }
}

/// Error type for credential resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Authorization header present but not a bearer credential
    #[error("{0}")]
    InvalidFormat(String),

    /// Token signature, issuer, type or claims are invalid
    #[error("{0}")]
    InvalidToken(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Expired => CoreError::TokenExpired,
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => {
                CoreError::Unauthenticated(msg)
            }
        }
    }
}

/// Extracts the bearer token from request headers
///
/// # Returns
///
/// `Ok(None)` if there is no `Authorization` header
///
/// # Errors
///
/// Returns `AuthError::InvalidFormat` if the header is not `Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Invalid Authorization header".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    Ok(Some(token))
}

/// Resolves request headers into a [`Caller`]
///
/// # Errors
///
/// Returns `AuthError::Expired` for an expired access token and
/// `AuthError::InvalidFormat` / `AuthError::InvalidToken` otherwise
pub fn resolve_caller(headers: &HeaderMap, keys: &JwtKeys) -> Result<Caller, AuthError> {
    let Some(token) = bearer_token(headers)? else {
        return Ok(Caller::Anonymous);
    };

    let claims = keys.verify_access_token(token)?;
    Ok(Caller::Authenticated(AuthContext::from_claims(claims)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn keys() -> JwtKeys {
        JwtKeys::new(
            "access-secret-for-tests-0123456789abcdef",
            "refresh-secret-for-tests-0123456789abcdef",
            Duration::minutes(15),
            Duration::days(7),
        )
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        assert_eq!(
            resolve_caller(&HeaderMap::new(), &keys()).unwrap(),
            Caller::Anonymous
        );
    }

    #[test]
    fn test_valid_bearer_token() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue_access_token(user_id, "ivan", Role::User).unwrap();

        let caller = resolve_caller(&headers_with(&format!("Bearer {}", token)), &keys).unwrap();
        let ctx = caller.context().unwrap();

        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.login, "ivan");
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_non_bearer_header_is_rejected() {
        assert!(matches!(
            resolve_caller(&headers_with("Basic dXNlcjpwYXNz"), &keys()),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            resolve_caller(&headers_with("Bearer "), &keys()),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        assert!(matches!(
            resolve_caller(&headers_with("Bearer garbage"), &keys()),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_refresh_token_is_not_accepted() {
        let keys = keys();
        let token = keys.issue_refresh_token(Uuid::new_v4(), "ivan").unwrap();

        assert!(matches!(
            resolve_caller(&headers_with(&format!("Bearer {}", token)), &keys),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let keys = keys();
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "ivan",
            Some(Role::User),
            TokenType::Access,
            Duration::hours(-2),
        );
        let token = keys.sign(&claims).unwrap();

        let err = resolve_caller(&headers_with(&format!("Bearer {}", token)), &keys).unwrap_err();
        assert_eq!(err, AuthError::Expired);
        assert_eq!(CoreError::from(err), CoreError::TokenExpired);
    }

    #[test]
    fn test_context_requires_role() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "ivan",
            None,
            TokenType::Access,
            Duration::minutes(5),
        );
        assert!(AuthContext::from_claims(claims).is_err());
    }
}
