/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The connection hub
 * - The document store
 * - The edit pipeline (which owns the moderation sidecar)
 * - Session timing
 * - The server start time for `/status`
 *
 * Every field is a cheap clone handle, so cloning `AppState` per request
 * is fine.
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`:
 *
 * ```rust,ignore
 * use axum::extract::State;
 * use storychain::backend::collab::store::SharedStore;
 *
 * async fn handler(State(store): State<SharedStore>) {
 *     let stats = store.stats().await;
 * }
 * ```
 */

use axum::extract::FromRef;
use std::time::Instant;

use crate::backend::collab::pipeline::EditPipeline;
use crate::backend::collab::store::SharedStore;
use crate::backend::realtime::hub::Hub;
use crate::backend::realtime::session::SessionConfig;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub store: SharedStore,
    pub pipeline: EditPipeline,
    pub session_config: SessionConfig,
    pub started_at: Instant,
}

impl FromRef<AppState> for Hub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for EditPipeline {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pipeline.clone()
    }
}

impl FromRef<AppState> for SessionConfig {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_config
    }
}
