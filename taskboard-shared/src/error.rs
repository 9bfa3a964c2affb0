//! Domain error taxonomy
//!
//! Every `Board` operation returns [`CoreResult`]. Transports map the
//! variants onto their own status codes; the REST mapping lives in
//! `taskboard-api`.

use validator::ValidationErrors;

/// Errors produced by the core service and the stores behind it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Missing or invalid field
    #[error("{0}")]
    Validation(String),

    /// Referenced id or login does not exist
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthenticated(String),

    /// Access or refresh token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Caller's role or ownership is insufficient
    #[error("{0}")]
    Forbidden(String),

    /// Uniqueness violation (duplicate login)
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store or crypto failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias used across the crate
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable code for the variant
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation_error",
            CoreError::NotFound(_) => "not_found",
            CoreError::Unauthenticated(_) => "unauthorized",
            CoreError::TokenExpired => "token_expired",
            CoreError::Forbidden(_) => "forbidden",
            CoreError::Conflict(_) => "conflict",
            CoreError::Internal(_) => "internal_error",
        }
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    format!("{}: {}", field, message)
                })
            })
            .collect();
        messages.sort();

        CoreError::Validation(messages.join("; "))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => CoreError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => CoreError::Conflict("User with this login already exists".to_string()),
                // foreign_key_violation
                Some("23503") => {
                    CoreError::NotFound("Referenced user or project no longer exists".to_string())
                }
                // check_violation
                Some("23514") => CoreError::Validation(db_err.message().to_string()),
                _ => CoreError::Internal(format!("Database error: {}", err)),
            },
            _ => CoreError::Internal(format!("Database error: {}", err)),
        }
    }
}
