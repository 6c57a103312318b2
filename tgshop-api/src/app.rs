/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use tgshop_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = tgshop_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, identity::identity_layer};
use axum::{
    routing::{any, get},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Holds no
/// mutable state: the database is the only shared mutable resource.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── /health      # GET: health check; other methods go to the action router
/// └── /?action=…   # every storefront operation, any method
/// ```
///
/// Unmatched paths fall back to the action router as well, so every
/// response carries the JSON + CORS envelope.
///
/// # Middleware Stack
///
/// 1. Identity (`X-User-Id` → `Identity` extension)
/// 2. Logging (tower-http TraceLayer)
///
/// CORS headers are written by the response envelope, not by a layer, so
/// the preflight answer stays part of the route table.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    Router::new()
        .route(
            "/health",
            get(routes::health::health_check).fallback(routes::dispatch),
        )
        .route("/", any(routes::dispatch))
        .fallback(routes::dispatch)
        .layer(axum::middleware::from_fn(identity_layer))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
