//! Real-time Collaboration Module
//!
//! This module connects browser sessions to each other over WebSockets.
//!
//! # Architecture
//!
//! - **`hub`** - Session registry and ordered fan-out with backpressure eviction
//! - **`session`** - Per-connection edit cooldown plus the read and write pumps
//! - **`handler`** - `GET /api/ws` upgrade handler
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs     - Module exports and documentation
//! ├── hub.rs     - Connection hub and its coordination loop
//! ├── session.rs - Client session, cooldown, pumps
//! └── handler.rs - WebSocket endpoint
//! ```
//!
//! # Wire Format
//!
//! Every frame is a JSON envelope `{"type": ..., "data": ...}`, see
//! `shared::event`. Client frames are relayed verbatim; the server only
//! produces `text_change` and `user_presence` events itself.

/// Connection hub
pub mod hub;

/// Client sessions and socket pumps
pub mod session;

/// WebSocket upgrade handler
pub mod handler;

// Re-export commonly used types
pub use handler::handle_websocket;
pub use hub::{Hub, HubConfig, HubError};
pub use session::{ClientSession, Cooldown, SessionConfig};
