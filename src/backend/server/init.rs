/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, store selection, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Open the document store (PostgreSQL or in-memory)
 * 2. Start the connection hub
 * 3. Build the moderation client and sidecar
 * 4. Assemble the edit pipeline and application state
 * 5. Create the router
 */

use axum::Router;
use std::sync::Arc;
use std::time::Instant;

use crate::backend::collab::pipeline::EditPipeline;
use crate::backend::collab::store::SharedStore;
use crate::backend::moderation::{ModerationClient, ModerationError, ModerationSidecar, SharedModerator};
use crate::backend::realtime::hub::{Hub, HubConfig};
use crate::backend::realtime::session::SessionConfig;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{open_store, AppConfig};
use crate::backend::server::state::AppState;

/// Assemble application state from already-built parts
///
/// Starts a hub on the current runtime. Used by `create_app` and by tests
/// that inject their own store or moderator.
pub fn build_state(config: &AppConfig, store: SharedStore, moderator: SharedModerator) -> AppState {
    let hub = Hub::spawn(HubConfig {
        queue_depth: config.session_queue_depth,
    });

    let moderation =
        ModerationSidecar::new(store.clone(), moderator, hub.clone()).with_timeout(config.moderation_timeout);
    let pipeline = EditPipeline::new(store.clone(), hub.clone(), moderation);

    AppState {
        hub,
        store,
        pipeline,
        session_config: SessionConfig {
            edit_cooldown: config.edit_cooldown,
            ..SessionConfig::default()
        },
        started_at: Instant::now(),
    }
}

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails only if the moderation HTTP client cannot be built. An unreachable
/// database is logged and replaced by the in-memory store.
pub async fn create_app(config: &AppConfig) -> Result<Router<()>, ModerationError> {
    tracing::info!("Initializing StoryChain backend server");

    let store = open_store(config).await;
    let moderator = ModerationClient::new(&config.moderation_url, config.moderation_timeout)?;
    tracing::info!("[Moderation] Using classifier at {}", moderator.endpoint());

    let state = build_state(config, store, Arc::new(moderator));
    Ok(create_router(state, config))
}
