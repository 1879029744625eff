//! REST API server module
//!
//! Exposes the worker over HTTP: registration, spreadsheet upload and the
//! stored text pairs of a user.

use crate::{ParaphraseWorker, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Largest accepted upload (matches the Bot API download limit)
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Create the API router with all route definitions
///
/// # Routes
///
/// - `POST /users` - Register a user
/// - `GET /users/:id/texts` - Stored `(original, result)` pairs of a user
/// - `POST /documents` - Upload a spreadsheet, receive the annotated workbook
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
pub fn create_router(worker: ParaphraseWorker) -> Router {
    let config = worker.config().clone();
    let state = AppState::new(worker);

    let router = Router::new()
        .route("/users", post(routes::register_user))
        .route("/users/:id/texts", get(routes::get_user_texts))
        .route("/documents", post(routes::process_document))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    let router = if config.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    let router = router.layer(TraceLayer::new_for_http());

    if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins ("*" allows any)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on the configured bind address until `cancel` fires
pub async fn start_api_server(worker: ParaphraseWorker, cancel: CancellationToken) -> Result<()> {
    let bind_address = worker.config().api.bind_address;
    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, worker, cancel).await
}

/// Serve the API on an already bound listener until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    worker: ParaphraseWorker,
    cancel: CancellationToken,
) -> Result<()> {
    let address = listener.local_addr().map_err(crate::error::Error::Io)?;
    let app = create_router(worker);

    tracing::info!(address = %address, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
