/**
 * Client Session
 *
 * One connected editor. A session runs two pumps over its socket:
 *
 * - the read pump classifies client frames and relays accepted ones through
 *   the hub
 * - the write pump drains the session's outbound queue into the socket and
 *   keeps the connection alive with pings
 *
 * # Edit cooldown
 *
 * A session may relay at most one `text_change` per cooldown window. Frames
 * arriving while the window is open are dropped without notice. Cursor
 * updates are never throttled.
 */

use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use axum::extract::ws::Message;

use crate::backend::realtime::hub::Hub;
use crate::shared::{CommandTag, InboundFrame};

/// Minimum time between two relayed edits of one session
pub const DEFAULT_EDIT_COOLDOWN: Duration = Duration::from_secs(10);

/// Client frames above this size are dropped
pub const MAX_INBOUND_FRAME_BYTES: usize = 4096;

/// Messages above this size are refused by the WebSocket layer
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// A session that sends nothing (not even a pong) for this long is closed
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound for every socket write
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Keepalive period, shorter than `READ_TIMEOUT` so the peer's pong arrives in time
pub const PING_INTERVAL: Duration = Duration::from_secs(54);

/// Timing parameters of a session
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub edit_cooldown: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub ping_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            edit_cooldown: DEFAULT_EDIT_COOLDOWN,
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
            ping_interval: PING_INTERVAL,
        }
    }
}

/// Per-session edit throttle
#[derive(Debug, Clone)]
pub struct Cooldown {
    duration: Duration,
    expires_at: Option<Instant>,
}

impl Cooldown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            expires_at: None,
        }
    }

    /// Whether the window is open at `now`
    pub fn is_active(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now < expires_at)
    }

    /// Start a new window unless one is open
    ///
    /// Returns `true` if the caller may proceed.
    pub fn try_start(&mut self, now: Instant) -> bool {
        if self.is_active(now) {
            return false;
        }
        self.expires_at = Some(now + self.duration);
        true
    }
}

/// Why an inbound frame was not relayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Oversized(usize),
    Malformed,
    CoolingDown,
    UnknownType(String),
}

/// Decision for one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundAction {
    /// Broadcast the frame unchanged
    Relay,
    Drop(DropReason),
}

/// State of one connected client
#[derive(Debug)]
pub struct ClientSession {
    pub id: Uuid,
    pub name: String,
    cooldown: Cooldown,
    config: SessionConfig,
}

impl ClientSession {
    pub fn new(id: Uuid, name: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            id,
            name: name.into(),
            cooldown: Cooldown::new(config.edit_cooldown),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Decide what to do with a client frame received at `now`
    pub fn classify(&mut self, frame: &str, now: Instant) -> InboundAction {
        if frame.len() > MAX_INBOUND_FRAME_BYTES {
            return InboundAction::Drop(DropReason::Oversized(frame.len()));
        }

        let Ok(inbound) = InboundFrame::parse(frame) else {
            return InboundAction::Drop(DropReason::Malformed);
        };

        match inbound.tag() {
            CommandTag::TextChange => {
                if self.cooldown.try_start(now) {
                    InboundAction::Relay
                } else {
                    InboundAction::Drop(DropReason::CoolingDown)
                }
            }
            CommandTag::CursorPosition => InboundAction::Relay,
            CommandTag::Other(kind) => InboundAction::Drop(DropReason::UnknownType(kind)),
        }
    }
}

/// Read client frames until the peer goes away or stops responding
///
/// Accepted frames are broadcast verbatim. Returns when the stream ends, a
/// close frame or a protocol error arrives, the read timeout elapses or the
/// hub has stopped.
pub async fn read_pump<S, E>(mut stream: S, session: &mut ClientSession, hub: &Hub)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let read_timeout = session.config.read_timeout;

    loop {
        let next = match tokio::time::timeout(read_timeout, stream.next()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::info!("[Session] {} timed out waiting for frames", session.id);
                return;
            }
        };

        match next {
            Some(Ok(Message::Text(text))) => match session.classify(text.as_str(), Instant::now()) {
                InboundAction::Relay => {
                    if hub.broadcast(Bytes::copy_from_slice(text.as_bytes())).await.is_err() {
                        tracing::warn!("[Session] Hub stopped, closing {}", session.id);
                        return;
                    }
                }
                InboundAction::Drop(reason) => {
                    tracing::debug!("[Session] Dropped frame from {}: {:?}", session.id, reason);
                }
            },
            Some(Ok(Message::Close(_))) | None => return,
            // Pings are answered by the socket layer; pongs only refresh the timeout
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!("[Session] Read error on {}: {}", session.id, e);
                return;
            }
        }
    }
}

#[derive(Debug, Error)]
enum WriteError {
    #[error("write timed out")]
    Timeout,
    #[error("socket error: {0}")]
    Socket(String),
}

/// Drain `outbound` into `sink` until the queue closes or a write fails
///
/// Frames already queued when a write starts are fed together and flushed
/// once. Each frame stays its own WebSocket message.
pub async fn write_pump<W>(mut sink: W, mut outbound: mpsc::Receiver<Bytes>, config: SessionConfig)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let mut keepalive = tokio::time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);

    loop {
        tokio::select! {
            biased;

            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    // Queue closed by the hub
                    let _ = tokio::time::timeout(config.write_timeout, sink.send(Message::Close(None))).await;
                    return;
                };
                if let Err(e) = write_batch(&mut sink, frame, &mut outbound, config.write_timeout).await {
                    tracing::debug!("[Session] Write failed: {}", e);
                    return;
                }
            }
            _ = keepalive.tick() => {
                let ping = tokio::time::timeout(config.write_timeout, sink.send(Message::Ping(Bytes::new())));
                match ping.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!("[Session] Ping failed: {}", e);
                        return;
                    }
                    Err(_) => {
                        tracing::debug!("[Session] Ping timed out");
                        return;
                    }
                }
            }
        }
    }
}

async fn write_batch<W>(
    sink: &mut W,
    first: Bytes,
    outbound: &mut mpsc::Receiver<Bytes>,
    write_timeout: Duration,
) -> Result<(), WriteError>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let pending = outbound.len();
    let batch = async {
        sink.feed(to_message(first)).await?;
        for _ in 0..pending {
            match outbound.try_recv() {
                Ok(frame) => sink.feed(to_message(frame)).await?,
                Err(_) => break,
            }
        }
        sink.flush().await
    };

    match tokio::time::timeout(write_timeout, batch).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(WriteError::Socket(e.to_string())),
        Err(_) => Err(WriteError::Timeout),
    }
}

fn to_message(frame: Bytes) -> Message {
    if let Ok(text) = std::str::from_utf8(&frame) {
        return Message::Text(text.into());
    }
    Message::Binary(frame)
}
