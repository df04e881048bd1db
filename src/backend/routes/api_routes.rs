/**
 * API Route Handlers
 *
 * # Routes
 *
 * ## Documents
 * - `GET /api/document/{id}` - Load (or create) a document
 * - `PUT /api/document/{id}` - Apply an edit
 * - `GET /api/changes/{document_id}` - Recent change history
 *
 * ## Realtime
 * - `GET /api/ws` - WebSocket session
 *
 * ## Stats
 * - `GET /api/stats` - Edit counters and online sessions
 */

use axum::routing::get;
use axum::Router;

use crate::backend::collab::handlers::{get_changes, get_document, get_stats, update_document};
use crate::backend::realtime::handle_websocket;
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// # Arguments
///
/// * `router` - The router to add routes to
///
/// # Returns
///
/// Router with API routes configured
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/ws", get(handle_websocket))
        .route("/api/document/{id}", get(get_document).put(update_document))
        .route("/api/changes/{document_id}", get(get_changes))
        .route("/api/stats", get(get_stats))
}
