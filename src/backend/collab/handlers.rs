/**
 * Document HTTP Handlers
 *
 * - `GET /api/document/{id}` - Load a document, creating it on first access
 * - `PUT /api/document/{id}` - Apply one edit through the edit pipeline
 * - `GET /api/changes/{document_id}` - Most recent changes, newest first
 * - `GET /api/stats` - Edit counters and number of connected sessions
 * - `GET /status` - Liveness and database reachability
 *
 * The read endpoints fail soft: storage errors are logged and a usable
 * default is returned instead of an error status.
 */

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::collab::pipeline::EditPipeline;
use crate::backend::collab::store::SharedStore;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::{Change, Document, EditRequest, EditStats};

/// Number of entries returned by `GET /api/changes/{document_id}`
pub const RECENT_CHANGES_LIMIT: usize = 50;

/// Content of a freshly created (or unreadable) document
pub const WELCOME_TEXT: &str = "# Welcome to StoryChain\n\nThis is a collaborative text editor where you can edit text in real-time with other users.\n\n## How it works\n- Click on any word to edit it\n- Click between words or at the end to add new text\n- You get a 10-second cooldown after each edit\n- Changes are saved automatically and synced with all users\n\n## Features\n- **Real-time collaboration**: See changes from other users instantly\n- **Markdown support**: Use markdown syntax for formatting\n- **Change history**: Track all edits in the sidebar\n- **User presence**: See who's online and editing\n\nStart editing by clicking on any word above!";

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub change: Change,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub total_edits: i64,
    pub unique_users: i64,
    pub online_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub timestamp: String,
    pub database: String,
}

fn parse_document_id(raw: &str) -> Result<Uuid, BackendError> {
    Uuid::parse_str(raw).map_err(|_| BackendError::bad_request("Invalid document ID"))
}

/// Handle `GET /api/document/{id}`
///
/// # Returns
///
/// - the stored document, with empty content replaced by the welcome text
/// - a new welcome document if none exists (persisted when possible)
/// - an unsaved welcome document if the store fails
pub async fn get_document(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Document>, BackendError> {
    let id = parse_document_id(&id)?;

    match store.get_document(id).await {
        Ok(Some(mut document)) => {
            if document.content.is_empty() {
                document.content = WELCOME_TEXT.to_string();
            }
            Ok(Json(document))
        }
        Ok(None) => {
            let document = Document::new(id, WELCOME_TEXT);
            if let Err(e) = store.create_document(&document).await {
                tracing::warn!("[Collab] Failed to create document {}: {}", id, e);
            } else {
                tracing::info!("[Collab] Created document {}", id);
            }
            Ok(Json(document))
        }
        Err(e) => {
            tracing::warn!("[Collab] Failed to load document {}: {}", id, e);
            Ok(Json(Document::new(id, WELCOME_TEXT)))
        }
    }
}

/// Handle `PUT /api/document/{id}`
pub async fn update_document(
    State(pipeline): State<EditPipeline>,
    Path(id): Path<String>,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, BackendError> {
    let id = parse_document_id(&id)?;
    let Json(request) = payload.map_err(|e| {
        tracing::debug!("[Collab] Rejected edit body: {}", e);
        BackendError::bad_request("Invalid request body")
    })?;

    let change = pipeline.apply_edit(id, request).await?;
    Ok(Json(UpdateResponse { success: true, change }))
}

/// Handle `GET /api/changes/{document_id}`
pub async fn get_changes(
    State(store): State<SharedStore>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<Change>>, BackendError> {
    let document_id = parse_document_id(&document_id)?;

    let changes = store
        .list_recent_changes(document_id, RECENT_CHANGES_LIMIT)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("[Collab] Failed to list changes of {}: {}", document_id, e);
            Vec::new()
        });

    Ok(Json(changes))
}

/// Handle `GET /api/stats`
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let EditStats { total_edits, unique_users } = state.store.stats().await.unwrap_or_else(|e| {
        tracing::warn!("[Collab] Failed to read stats: {}", e);
        EditStats::default()
    });

    Json(StatsResponse {
        total_edits,
        unique_users,
        online_count: state.hub.online_count().await,
    })
}

/// Handle `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("[Server] Database ping failed: {}", e);
            "error"
        }
    };

    Json(StatusResponse {
        status: "ok".to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        database: database.to_string(),
    })
}
