/**
 * WebSocket Endpoint
 *
 * `GET /api/ws?name=...` upgrades the request and runs one client session
 * until either pump stops. The session is then unregistered exactly once.
 */

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::StreamExt;
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::realtime::hub::Hub;
use crate::backend::realtime::session::{read_pump, write_pump, ClientSession, SessionConfig, MAX_MESSAGE_BYTES};

/// Name shown for sessions that connect without one
pub const ANONYMOUS_NAME: &str = "Anonymous";

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub name: Option<String>,
}

impl ConnectParams {
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => ANONYMOUS_NAME.to_string(),
        }
    }
}

/// Upgrade to a WebSocket and attach a new session to the hub
pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    State(hub): State<Hub>,
    State(config): State<SessionConfig>,
    Query(params): Query<ConnectParams>,
) -> Response {
    let name = params.display_name();
    ws.max_message_size(MAX_MESSAGE_BYTES)
        .on_upgrade(move |socket| run_connection(socket, hub, name, config))
}

/// Drive one connection from registration to unregistration
pub async fn run_connection(socket: WebSocket, hub: Hub, name: String, config: SessionConfig) {
    let id = Uuid::new_v4();

    let outbound = match hub.register(id, name.clone()).await {
        Ok(outbound) => outbound,
        Err(e) => {
            tracing::warn!("[Realtime] Could not register {}: {}", name, e);
            return;
        }
    };

    tracing::info!("[Realtime] {} connected as {}", name, id);

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_pump(sink, outbound, config));
    let mut session = ClientSession::new(id, name, config);

    tokio::select! {
        _ = read_pump(stream, &mut session, &hub) => {}
        _ = &mut writer => {}
    }

    // The writer exits on its own once the hub drops the session's queue
    if let Err(e) = hub.unregister(id).await {
        tracing::warn!("[Realtime] Could not unregister {}: {}", id, e);
    }

    tracing::info!("[Realtime] {} disconnected", session.name);
}
