/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory router (no database needed)
/// - Account helpers that register and log in over HTTP
/// - A request helper returning status and parsed JSON body
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::store::MemoryStore;
use tower::ServiceExt as _;

pub const PASSWORD: &str = "pw1";

/// Test context containing the router and its configuration
pub struct TestContext {
    pub app: axum::Router,
    pub config: Config,
}

impl TestContext {
    /// Creates a router over a fresh in-memory store
    pub fn new() -> Self {
        Self::with_attachment_limit("1024")
    }

    /// Creates a router whose decoded attachment limit is `max_bytes`
    pub fn with_attachment_limit(max_bytes: &str) -> Self {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STORAGE", "memory"),
            ("JWT_ACCESS_SECRET", "integration-access-secret-0123456789abcdef"),
            ("JWT_REFRESH_SECRET", "integration-refresh-secret-0123456789abcdef"),
            ("PASSWORD_MEMORY_KIB", "256"),
            ("PASSWORD_ITERATIONS", "1"),
            ("PASSWORD_PARALLELISM", "1"),
            ("MAX_ATTACHMENT_BYTES", max_bytes),
        ]);
        let config = Config::from_vars(|key| vars.get(key).map(|v| v.to_string()))
            .expect("test config should load");

        let state = AppState::new(Arc::new(MemoryStore::new()), config.clone());

        Self {
            app: build_router(state),
            config,
        }
    }

    /// Sends a request and returns the status with the parsed body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_raw(method, uri, token, body.map(|body| body.to_string()))
            .await
    }

    /// Like [`send`](Self::send) but with a body that need not be valid JSON
    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body)),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "Expected JSON body, got {}: {}",
                    status,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        (status, value)
    }

    /// Registers an account and returns its user id
    pub async fn register(&self, login: &str, role: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "login": login, "password": PASSWORD, "role": role })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        body["user"]["id"].as_str().unwrap().to_string()
    }

    /// Logs in and returns the full session body
    pub async fn login(&self, login: &str) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "login": login, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body
    }

    /// Registers an account and returns an access token for it
    pub async fn account(&self, login: &str, role: &str) -> String {
        self.register(login, role).await;
        let session = self.login(login).await;

        session["accessToken"].as_str().unwrap().to_string()
    }
}
