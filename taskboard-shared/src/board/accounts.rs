//! Registration, login, token refresh and user listing

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::Board;
use crate::auth::authorization::require_authenticated;
use crate::auth::jwt::JwtError;
use crate::auth::middleware::{AuthError, Caller};
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::error::{CoreError, CoreResult};
use crate::models::{required_text, Credentials, RegisterUser, Role, User, UserProfile};

const INVALID_CREDENTIALS: &str = "Invalid login or password";

/// Tokens issued by a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Fresh access token issued from a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedSession {
    pub access_token: String,
    pub user: UserProfile,
}

fn token_failure(err: JwtError) -> CoreError {
    match err {
        JwtError::CreateError(msg) => CoreError::internal(msg),
        other => AuthError::from(other).into(),
    }
}

impl Board {
    /// Creates an account
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank login, empty password or unknown role
    /// - `Conflict` if the login is taken
    pub async fn register(&self, input: RegisterUser) -> CoreResult<UserProfile> {
        input.validate()?;
        let login = required_text(&input.login, "Login")?;
        validate_password(&input.password).map_err(CoreError::Validation)?;
        let role = match input.role.as_deref() {
            Some(raw) => raw.trim().parse::<Role>()?,
            None => Role::default(),
        };

        if self.store.find_user_by_login(&login).await?.is_some() {
            return Err(CoreError::Conflict(
                "User with this login already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password, &self.config.password)
            .map_err(|e| CoreError::internal(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            login,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;

        info!(user_id = %user.id, login = %user.login, role = %user.role, "User registered");
        Ok(user.profile(Default::default()))
    }

    /// Verifies credentials and issues an access/refresh token pair
    ///
    /// Unknown login and wrong password produce the same error.
    pub async fn login(&self, input: Credentials) -> CoreResult<Session> {
        let login = input.login.trim();
        if login.is_empty() || input.password.is_empty() {
            return Err(CoreError::validation("Login and password are required"));
        }

        let Some(user) = self.store.find_user_by_login(login).await? else {
            warn!(login = %login, "Login rejected: unknown login");
            return Err(CoreError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        };

        let valid = verify_password(&input.password, &user.password_hash)
            .map_err(|e| CoreError::internal(e.to_string()))?;
        if !valid {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(CoreError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        let keys = &self.config.jwt;
        let access_token = keys
            .issue_access_token(user.id, &user.login, user.role)
            .map_err(token_failure)?;
        let refresh_token = keys
            .issue_refresh_token(user.id, &user.login)
            .map_err(token_failure)?;

        info!(user_id = %user.id, "User logged in");
        Ok(Session {
            access_token,
            refresh_token,
            user: self.profile(&user).await?,
        })
    }

    /// Issues a new access token from a refresh token
    ///
    /// The user is re-read so the new token carries the current role.
    pub async fn refresh(&self, refresh_token: &str) -> CoreResult<RefreshedSession> {
        let claims = self
            .config
            .jwt
            .verify_refresh_token(refresh_token.trim())
            .map_err(token_failure)?;

        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| CoreError::Unauthenticated("User no longer exists".to_string()))?;

        let access_token = self
            .config
            .jwt
            .issue_access_token(user.id, &user.login, user.role)
            .map_err(token_failure)?;

        Ok(RefreshedSession {
            access_token,
            user: self.profile(&user).await?,
        })
    }

    /// The calling user with derived project and task ids
    pub async fn me(&self, caller: &Caller) -> CoreResult<UserProfile> {
        let ctx = require_authenticated(caller)?;

        let user = self
            .store
            .find_user(ctx.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))?;

        self.profile(&user).await
    }

    /// Every user, without credentials
    pub async fn list_users(&self, caller: &Caller) -> CoreResult<Vec<UserProfile>> {
        require_authenticated(caller)?;

        let users = self.store.list_users().await?;
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let mut links = self.store.links_for_users(&ids).await?;

        Ok(users
            .iter()
            .map(|u| u.profile(links.remove(&u.id).unwrap_or_default()))
            .collect())
    }

    /// Whether any account exists yet
    pub async fn has_users(&self) -> CoreResult<bool> {
        Ok(!self.store.list_users().await?.is_empty())
    }

    async fn profile(&self, user: &User) -> CoreResult<UserProfile> {
        let mut links = self.store.links_for_users(&[user.id]).await?;
        Ok(user.profile(links.remove(&user.id).unwrap_or_default()))
    }
}
