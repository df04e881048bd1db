/**
 * Connection Hub
 *
 * The hub owns the registry of connected sessions and fans every broadcast
 * out to each session's bounded outbound queue.
 *
 * # Architecture
 *
 * All mutations go through one coordination loop (`HubLoop::run`) fed by a
 * single-consumer command queue, so every session observes broadcasts in the
 * same relative order. `Hub` is the cheap clone handle given to handlers.
 *
 * # Backpressure
 *
 * Fan-out uses `try_send` and never waits on a session. A session whose
 * queue is full (or already closed) is evicted right after the pass: its
 * sender is dropped, which closes the queue and makes the session's writer
 * shut the socket. Eviction emits no presence event.
 *
 * # Locking
 *
 * The registry sits behind an `RwLock`. Fan-out and `online_count` take the
 * read lock; register, unregister and eviction take the write lock, and the
 * write lock is never requested while the read lock is held.
 */

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, RwLock};
use uuid::Uuid;

use crate::shared::{ServerEvent, SharedError};

/// Default capacity of each session's outbound queue
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

const COMMAND_QUEUE_DEPTH: usize = 1024;

/// Hub tuning
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Capacity of each session's outbound queue
    pub queue_depth: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

#[derive(Debug, Error)]
pub enum HubError {
    /// The coordination loop is no longer running
    #[error("Hub loop has stopped")]
    Stopped,

    /// An event could not be encoded
    #[error("Failed to encode event: {0}")]
    Encode(#[from] SharedError),
}

struct SessionHandle {
    name: String,
    outbound: mpsc::Sender<Bytes>,
}

type Registry = Arc<RwLock<HashMap<Uuid, SessionHandle>>>;

enum HubCommand {
    Register {
        id: Uuid,
        name: String,
        ack: oneshot::Sender<mpsc::Receiver<Bytes>>,
    },
    Unregister {
        id: Uuid,
    },
    Broadcast(Bytes),
    Flush(oneshot::Sender<()>),
}

/// Handle to the connection hub
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<HubCommand>,
    registry: Registry,
}

/// The hub's coordination loop, see [`HubLoop::run`]
pub struct HubLoop {
    commands: mpsc::Receiver<HubCommand>,
    registry: Registry,
    queue_depth: usize,
}

impl Hub {
    /// Create a hub handle and its (not yet running) loop
    pub fn new(config: HubConfig) -> (Self, HubLoop) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let registry: Registry = Arc::new(RwLock::new(HashMap::new()));

        let hub = Self {
            commands: commands_tx,
            registry: registry.clone(),
        };
        let hub_loop = HubLoop {
            commands: commands_rx,
            registry,
            queue_depth: config.queue_depth.max(1),
        };
        (hub, hub_loop)
    }

    /// Create a hub and run its loop on the current Tokio runtime
    pub fn spawn(config: HubConfig) -> Self {
        let (hub, hub_loop) = Self::new(config);
        tokio::spawn(hub_loop.run());
        hub
    }

    /// Register a session and return the receiving end of its outbound queue
    ///
    /// Resolves once the session is in the registry. The first frame queued
    /// for the new session is its own `user_presence: joined` event.
    ///
    /// # Errors
    ///
    /// `HubError::Stopped` if the loop is gone.
    pub async fn register(&self, id: Uuid, name: impl Into<String>) -> Result<mpsc::Receiver<Bytes>, HubError> {
        let (ack, registered) = oneshot::channel();
        self.send(HubCommand::Register {
            id,
            name: name.into(),
            ack,
        })
        .await?;
        registered.await.map_err(|_| HubError::Stopped)
    }

    /// Remove a session, closing its outbound queue
    ///
    /// Unknown or already-removed ids are ignored.
    pub async fn unregister(&self, id: Uuid) -> Result<(), HubError> {
        self.send(HubCommand::Unregister { id }).await
    }

    /// Queue a raw frame for delivery to every registered session
    pub async fn broadcast(&self, frame: impl Into<Bytes>) -> Result<(), HubError> {
        self.send(HubCommand::Broadcast(frame.into())).await
    }

    /// Encode `event` and queue it for every registered session
    pub async fn broadcast_event(&self, event: &ServerEvent) -> Result<(), HubError> {
        let frame = event.to_json()?;
        self.broadcast(frame).await
    }

    /// Wait until every command issued before this call has been processed
    pub async fn flush(&self) -> Result<(), HubError> {
        let (done, processed) = oneshot::channel();
        self.send(HubCommand::Flush(done)).await?;
        processed.await.map_err(|_| HubError::Stopped)
    }

    /// Number of sessions currently registered
    pub async fn online_count(&self) -> usize {
        self.registry.read().await.len()
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands.send(command).await.map_err(|_| HubError::Stopped)
    }
}

impl HubLoop {
    /// Process commands until every `Hub` handle has been dropped
    pub async fn run(mut self) {
        tracing::info!("[Hub] Coordination loop started (queue depth {})", self.queue_depth);

        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { id, name, ack } => self.register(id, name, ack).await,
                HubCommand::Unregister { id } => self.unregister(id).await,
                HubCommand::Broadcast(frame) => self.fan_out(frame).await,
                HubCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        tracing::info!("[Hub] All handles dropped, coordination loop stopped");
    }

    async fn register(&self, id: Uuid, name: String, ack: oneshot::Sender<mpsc::Receiver<Bytes>>) {
        let (outbound, receiver) = mpsc::channel(self.queue_depth);
        self.registry.write().await.insert(
            id,
            SessionHandle {
                name: name.clone(),
                outbound,
            },
        );

        if ack.send(receiver).is_err() {
            // Caller went away before the registration completed
            self.registry.write().await.remove(&id);
            return;
        }

        tracing::info!("[Hub] Session {} ({}) registered", id, name);
        self.fan_out_event(&ServerEvent::joined(id, name)).await;
    }

    async fn unregister(&self, id: Uuid) {
        let removed = self.registry.write().await.remove(&id);

        if let Some(session) = removed {
            tracing::info!("[Hub] Session {} ({}) unregistered", id, session.name);
            let SessionHandle { name, outbound } = session;
            drop(outbound);
            self.fan_out_event(&ServerEvent::left(id, name)).await;
        }
    }

    async fn fan_out_event(&self, event: &ServerEvent) {
        match event.to_json() {
            Ok(frame) => self.fan_out(Bytes::from(frame)).await,
            Err(e) => tracing::error!("[Hub] Failed to encode presence event: {}", e),
        }
    }

    async fn fan_out(&self, frame: Bytes) {
        let stale: Vec<Uuid> = {
            let registry = self.registry.read().await;
            registry
                .iter()
                .filter_map(|(id, session)| match session.outbound.try_send(frame.clone()) {
                    Ok(()) => None,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!("[Hub] Outbound queue of {} is full, evicting", id);
                        Some(*id)
                    }
                    Err(TrySendError::Closed(_)) => Some(*id),
                })
                .collect()
        };

        if stale.is_empty() {
            return;
        }

        let mut registry = self.registry.write().await;
        for id in stale {
            registry.remove(&id);
        }
    }
}
