/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::app::{build_router, connect_store, AppState};
/// use taskboard_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let (store, _pg) = connect_store(&config).await?;
/// let state = AppState::new(store, config);
///
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use taskboard_shared::auth::middleware::resolve_caller;
use taskboard_shared::board::Board;
use taskboard_shared::db::migrations::{ensure_database_exists, run_migrations};
use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
use taskboard_shared::store::{MemoryStore, PgStore, Store};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::config::{Config, StorageBackend};
use crate::error::ApiError;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// The service every handler delegates to
    pub board: Arc<Board>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state over the given store
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let board = Board::new(store, config.board_config());
        Self {
            board: Arc::new(board),
            config: Arc::new(config),
        }
    }
}

/// Opens the configured store
///
/// For PostgreSQL this creates the database if needed, builds the pool and
/// applies migrations. The concrete `PgStore` is returned alongside so the
/// caller can close the pool on shutdown.
pub async fn connect_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgStore>)> {
    match config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres storage"))?;

            ensure_database_exists(&url).await?;
            let pool = create_pool(DatabaseConfig::new(url, config.database.max_connections)).await?;
            run_migrations(&pool).await?;

            let store = PgStore::new(pool);
            Ok((Arc::new(store.clone()), Some(store)))
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register    # public
///     │   ├── POST /login       # public
///     │   ├── POST /refresh     # public
///     │   └── GET  /me          # bearer
///     ├── /users                # bearer
///     ├── /projects[/:id]       # bearer, writes admin only
///     └── /tasks[/:id]          # bearer, writes gated per task
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Body limit sized for base64 attachments (protected routes only)
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Everything else resolves the bearer token first
    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/users", get(routes::users::list_users))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ))
        .layer(DefaultBodyLimit::max(state.config.request_body_limit()));

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.cors_permissive() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bearer authentication layer
///
/// Resolves the `Authorization` header into a `Caller` and inserts it into
/// request extensions. A request without the header proceeds as
/// `Caller::Anonymous`; the service rejects it where authentication is
/// required. A malformed, invalid or expired token is rejected here.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = resolve_caller(req.headers(), state.board.jwt())?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
