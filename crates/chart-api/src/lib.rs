//! # chart-api: Axum API Service
//!
//! HTTP surface for the chart data store, built on Axum/Tower/Tokio.
//! Templates and datasets are plain CRUD resources, except that every
//! dataset write is run through the compliance engine and only the
//! reconciled document is stored.
//!
//! ## Routes
//!
//! - `/v1/templates/*`: Template CRUD
//! - `/v1/datasets/*`: Dataset CRUD with compliance enforcement
//! - `/v1/compliance/check`: Dry-run compliance check
//! - `/openapi.json`: Generated OpenAPI document
//! - `/health/*`, `/metrics`: Probes and Prometheus scrape (unauthenticated)
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → MetricsLayer → AuthLayer
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers; compliance lives in `chart-compliance`.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod auth;
pub mod compliance;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::extract::State;
use axum::http::header;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::templates::router())
        .merge(routes::datasets::router())
        .merge(routes::compliance::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    // Unauthenticated probes.
    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(render_metrics))
        .with_state(state);

    Router::new().merge(ops).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 when a configured database does not answer.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if let Some(pool) = &state.db_pool {
        db::ping(pool)
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("database unreachable: {e}")))?;
    }
    Ok("ready")
}

/// Prometheus scrape endpoint.
async fn render_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("metrics recorder not installed".into()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
