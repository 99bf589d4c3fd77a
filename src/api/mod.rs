//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for managing monitored accounts,
//! controlling the scheduler and observing the audit trail and archive.

use crate::{Archiver, Config, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Accounts
/// - `GET /accounts` - List monitored accounts
/// - `POST /accounts` - Add an account
/// - `GET /accounts/:id` - Get one account
/// - `DELETE /accounts/:id` - Remove an account
/// - `PUT /accounts/:id/status` - Pause, resume or re-enable an account
///
/// ## Observability
/// - `GET /logs?limit=` - Recent log entries, newest first
/// - `GET /archive` - Archived items, newest first
/// - `GET /stats` - Dashboard overview
///
/// ## Scheduler
/// - `GET /scheduler` - Run mode, interval and countdown
/// - `POST /scheduler/start` - Switch automatic monitoring on
/// - `POST /scheduler/stop` - Switch automatic monitoring off
/// - `POST /scheduler/check` - Run a cycle now
/// - `PUT /scheduler/interval` - Change the check interval
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
pub fn create_router(archiver: Arc<Archiver>, config: Arc<Config>) -> Router {
    let state = AppState::new(archiver, config.clone());

    let router = Router::new()
        // Accounts
        .route(
            "/accounts",
            get(routes::list_accounts).post(routes::add_account),
        )
        .route(
            "/accounts/:id",
            get(routes::get_account).delete(routes::remove_account),
        )
        .route("/accounts/:id/status", put(routes::set_account_status))
        // Observability
        .route("/logs", get(routes::list_logs))
        .route("/archive", get(routes::list_archive))
        .route("/stats", get(routes::get_stats))
        // Scheduler
        .route("/scheduler", get(routes::get_scheduler))
        .route("/scheduler/start", post(routes::start_scheduler))
        .route("/scheduler/stop", post(routes::stop_scheduler))
        .route("/scheduler/check", post(routes::trigger_check))
        .route("/scheduler/interval", put(routes::set_interval))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Swagger UI must be merged before the state is applied
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api/v1/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let router = if config.server.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.server.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    // CORS is the outermost layer so preflight requests never hit authentication
    if config.server.api.cors_enabled {
        router.layer(build_cors_layer(&config.server.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer from the configured origins ("*" or an empty list allows any)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    let cors = if allow_any || origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
    };

    cors.allow_methods(Any).allow_headers(Any)
}

/// Start the API server on the configured bind address
///
/// Runs until the server stops. Binding failures are returned as [`crate::Error::Io`].
///
/// # Example
///
/// ```no_run
/// use social_archiver::{Archiver, Backends, Config, LocalDirSink};
/// use social_archiver::source::ContentSource;
/// use std::sync::Arc;
///
/// # async fn example(source: Arc<dyn ContentSource>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let sink = Arc::new(LocalDirSink::new(config.archive.archive_dir.clone()));
/// let backends = Backends::new(&config, source, sink)?;
/// let archiver = Arc::new(Archiver::new(config.clone(), backends).await?);
///
/// // Blocks until the server stops
/// social_archiver::api::start_api_server(archiver, Arc::new(config)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(archiver: Arc<Archiver>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(archiver, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
