/// JWT token generation and validation module
///
/// Tokens are signed using HS256 (HMAC-SHA256). Access and refresh tokens are
/// signed with *separate* secrets, so a refresh token can never be replayed as
/// an access token even if the type claim were ignored.
///
/// # Token Types
///
/// - **Access Token**: Short-lived (default 15 minutes), carries the role
/// - **Refresh Token**: Long-lived (default 7 days), used to obtain new access tokens
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::JwtKeys;
/// use taskboard_shared::models::Role;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = JwtKeys::new(
///     "access-secret-at-least-32-bytes-long!!",
///     "refresh-secret-at-least-32-bytes-long!",
///     Duration::minutes(15),
///     Duration::days(7),
/// );
///
/// let user_id = Uuid::new_v4();
/// let token = keys.issue_access_token(user_id, "ivan", Role::User)?;
/// let claims = keys.verify_access_token(&token)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

/// Value of the `iss` claim on every token
pub const ISSUER: &str = "taskboard";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token of the wrong type was presented
    #[error("Expected {expected} token")]
    WrongType { expected: &'static str },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "taskboard")
/// - `iat`, `exp`, `nbf`: Unix timestamps
///
/// # Custom Claims
///
/// - `login`: User login at issue time
/// - `role`: User role (access tokens only)
/// - `token_type`: Access or refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims that expire `expires_in` from now
    ///
    /// A negative duration yields already-expired claims, which is how the
    /// tests exercise expiry handling.
    pub fn with_expiration(
        user_id: Uuid,
        login: &str,
        role: Option<Role>,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            login: login.to_string(),
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a JWT token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token creation fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies signature, expiration, not-before and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired` for an expired token and
/// `JwtError::ValidationError` for every other failure
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongType {
            expected: expected.as_str(),
        });
    }

    Ok(claims)
}

/// Signing keys and lifetimes for both token types
#[derive(Clone)]
pub struct JwtKeys {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("access_secret", &"[redacted]")
            .field("refresh_secret", &"[redacted]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtKeys {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issues an access token carrying the user's current role
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        login: &str,
        role: Role,
    ) -> Result<String, JwtError> {
        let claims = Claims::with_expiration(
            user_id,
            login,
            Some(role),
            TokenType::Access,
            self.access_ttl,
        );
        create_token(&claims, &self.access_secret)
    }

    /// Issues a refresh token
    pub fn issue_refresh_token(&self, user_id: Uuid, login: &str) -> Result<String, JwtError> {
        let claims =
            Claims::with_expiration(user_id, login, None, TokenType::Refresh, self.refresh_ttl);
        create_token(&claims, &self.refresh_secret)
    }

    /// Signs arbitrary claims with the key matching their token type
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        match claims.token_type {
            TokenType::Access => create_token(claims, &self.access_secret),
            TokenType::Refresh => create_token(claims, &self.refresh_secret),
        }
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        validate_typed(token, &self.access_secret, TokenType::Access)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        validate_typed(token, &self.refresh_secret, TokenType::Refresh)
    }
}
