/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `STORAGE`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_ACCESS_SECRET`: Access token signing key (required, 32+ chars)
/// - `JWT_REFRESH_SECRET`: Refresh token signing key (required, 32+ chars,
///   different from the access key)
/// - `ACCESS_TOKEN_TTL_MINUTES`: Access token lifetime (default: 15)
/// - `REFRESH_TOKEN_TTL_DAYS`: Refresh token lifetime (default: 7)
/// - `PASSWORD_MEMORY_KIB`, `PASSWORD_ITERATIONS`, `PASSWORD_PARALLELISM`:
///   Argon2id cost (default: 65536 / 3 / 4)
/// - `MAX_ATTACHMENT_BYTES`: Decoded attachment limit (default: 5 MiB)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```
use std::env;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::jwt::JwtKeys;
use taskboard_shared::auth::password::PasswordParams;
use taskboard_shared::board::BoardConfig;
use taskboard_shared::models::task::DEFAULT_MAX_ATTACHMENT_BYTES;

/// Minimum length of each signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Which store backs the service
    pub storage: StorageBackend,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Argon2id cost parameters
    pub password: PasswordConfig,

    /// Largest accepted decoded attachment, in bytes
    pub max_attachment_bytes: usize,

    /// Log output format
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("STORAGE must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: Option<String>,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for access tokens
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub access_secret: String,

    /// Secret key for refresh tokens, distinct from the access key
    pub refresh_secret: String,

    pub access_ttl_minutes: i64,

    pub refresh_ttl_days: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    /// - The signing secrets are too short or identical
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = parse_or(&var, "API_PORT", 5000u16)?;
        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let storage = match var("STORAGE") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::Postgres,
        };

        let database_url = var("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL environment variable is required for postgres storage");
        }
        let max_connections = parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let access_secret = var("JWT_ACCESS_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_ACCESS_SECRET environment variable is required"))?;
        let refresh_secret = var("JWT_REFRESH_SECRET").ok_or_else(|| {
            anyhow::anyhow!("JWT_REFRESH_SECRET environment variable is required")
        })?;

        if access_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_ACCESS_SECRET must be at least {} characters long",
                MIN_SECRET_LENGTH
            );
        }
        if refresh_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_REFRESH_SECRET must be at least {} characters long",
                MIN_SECRET_LENGTH
            );
        }
        if access_secret == refresh_secret {
            anyhow::bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ");
        }

        let access_ttl_minutes = parse_or(&var, "ACCESS_TOKEN_TTL_MINUTES", 15i64)?;
        let refresh_ttl_days = parse_or(&var, "REFRESH_TOKEN_TTL_DAYS", 7i64)?;
        if access_ttl_minutes <= 0 || refresh_ttl_days <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }

        let defaults = PasswordParams::default();
        let password = PasswordConfig {
            memory_kib: parse_or(&var, "PASSWORD_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&var, "PASSWORD_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&var, "PASSWORD_PARALLELISM", defaults.parallelism)?,
        };

        let max_attachment_bytes =
            parse_or(&var, "MAX_ATTACHMENT_BYTES", DEFAULT_MAX_ATTACHMENT_BYTES)?;

        let log_format = match var("LOG_FORMAT").as_deref().map(str::trim) {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            storage,
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
                access_ttl_minutes,
                refresh_ttl_days,
            },
            password,
            max_attachment_bytes,
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether CORS accepts any origin
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }

    /// Largest request body accepted on the API routes
    ///
    /// One attachment at the decoded limit arrives base64-encoded (4 bytes
    /// per 3) inside a JSON envelope. Never below axum's 2 MiB default.
    pub fn request_body_limit(&self) -> usize {
        let encoded = self.max_attachment_bytes.div_ceil(3).saturating_mul(4);
        encoded
            .saturating_add(BODY_ENVELOPE_BYTES)
            .max(MIN_REQUEST_BODY_BYTES)
    }

    /// Settings handed to the `Board` service
    pub fn board_config(&self) -> BoardConfig {
        let jwt = JwtKeys::new(
            self.jwt.access_secret.clone(),
            self.jwt.refresh_secret.clone(),
            Duration::minutes(self.jwt.access_ttl_minutes),
            Duration::days(self.jwt.refresh_ttl_days),
        );

        BoardConfig {
            jwt,
            password: PasswordParams {
                memory_kib: self.password.memory_kib,
                iterations: self.password.iterations,
                parallelism: self.password.parallelism,
            },
            max_attachment_bytes: self.max_attachment_bytes,
        }
    }
}

/// Room for JSON keys and non-attachment fields around the encoded payload
const BODY_ENVELOPE_BYTES: usize = 64 * 1024;

/// axum's built-in body limit
const MIN_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

fn parse_or<F, T>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const ACCESS: &str = "access-secret-for-tests-0123456789abcdef";
    const REFRESH: &str = "refresh-secret-for-tests-0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("STORAGE", "memory"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert!(config.cors_permissive());
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.jwt.access_ttl_minutes, 15);
        assert_eq!(config.jwt.refresh_ttl_days, 7);
        assert_eq!(config.password.memory_kib, 65536);
        assert_eq!(config.max_attachment_bytes, DEFAULT_MAX_ATTACHMENT_BYTES);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_request_body_limit_fits_encoded_attachment() {
        let config = load(&[
            ("STORAGE", "memory"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
        ])
        .unwrap();

        // 5 MiB decoded is just under 7 MiB once base64-encoded
        let encoded = DEFAULT_MAX_ATTACHMENT_BYTES.div_ceil(3) * 4;
        assert!(config.request_body_limit() > encoded);
        assert!(config.request_body_limit() > 2 * 1024 * 1024);

        let small = load(&[
            ("STORAGE", "memory"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
            ("MAX_ATTACHMENT_BYTES", "1024"),
        ])
        .unwrap();
        assert_eq!(small.request_body_limit(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/taskboard"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
        ])
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Postgres);
    }

    #[test]
    fn test_secrets_are_required() {
        let err = load(&[("STORAGE", "memory"), ("JWT_REFRESH_SECRET", REFRESH)]).unwrap_err();
        assert!(err.to_string().contains("JWT_ACCESS_SECRET"));

        let err = load(&[("STORAGE", "memory"), ("JWT_ACCESS_SECRET", ACCESS)]).unwrap_err();
        assert!(err.to_string().contains("JWT_REFRESH_SECRET"));
    }

    #[test]
    fn test_short_or_shared_secrets_rejected() {
        let short = load(&[
            ("STORAGE", "memory"),
            ("JWT_ACCESS_SECRET", "too-short"),
            ("JWT_REFRESH_SECRET", REFRESH),
        ]);
        assert!(short.is_err());

        let shared = load(&[
            ("STORAGE", "memory"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", ACCESS),
        ])
        .unwrap_err();
        assert!(shared.to_string().contains("must differ"));
    }

    #[test]
    fn test_cors_origins_list() {
        let config = load(&[
            ("STORAGE", "memory"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
            (
                "CORS_ORIGINS",
                "http://localhost:3000, https://board.example.com",
            ),
        ])
        .unwrap();

        assert!(!config.cors_permissive());
        assert_eq!(
            config.api.cors_origins,
            vec!["http://localhost:3000", "https://board.example.com"]
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let port = load(&[
            ("STORAGE", "memory"),
            ("API_PORT", "eighty"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
        ]);
        assert!(port.is_err());

        let storage = load(&[
            ("STORAGE", "mongo"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
        ]);
        assert!(storage.is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("STORAGE", "memory"),
            ("JWT_ACCESS_SECRET", ACCESS),
            ("JWT_REFRESH_SECRET", REFRESH),
        ])
        .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains(ACCESS));
        assert!(!rendered.contains(REFRESH));
    }
}
