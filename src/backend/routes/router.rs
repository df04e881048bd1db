/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Layers
 *
 * - CORS restricted to the configured frontend origin, with credentials
 * - Request tracing via `tower_http::trace::TraceLayer`
 */

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::collab::handlers::status;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::config::AppConfig;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state shared by every handler
/// * `config` - Supplies the allowed CORS origin
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
///
/// # Route Details
///
/// - `GET /status` - Health check
/// - `/api/...` - See `api_routes`
///
/// Unknown routes fall back to a JSON 404.
pub fn create_router(app_state: AppState, config: &AppConfig) -> Router<()> {
    let router = Router::new().route("/status", get(status));
    let router = configure_api_routes(router);

    let router = router.fallback(|| async {
        (
            axum::http::StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "error": "Not found", "status": 404 })),
        )
    });

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.frontend_url)),
        )
        .with_state(app_state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!("[Server] FRONTEND_URL is not a valid origin ({}), CORS disabled", e);
            cors
        }
    }
}
