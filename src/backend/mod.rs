//! Backend Module
//!
//! This module contains all server-side code for StoryChain: an Axum HTTP
//! server for a shared document that many browser sessions edit at once.
//!
//! # Overview
//!
//! The backend module includes:
//! - Axum HTTP server setup and configuration
//! - A WebSocket hub relaying edits, cursors and presence to every session
//! - The edit pipeline applying HTTP edits to the stored document
//! - Asynchronous moderation that reverts flagged edits
//! - Document persistence (PostgreSQL, or in-memory without a database)
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Connection hub, client sessions, WebSocket endpoint
//! - **`collab`** - Document store, edit pipeline, document handlers
//! - **`moderation`** - Moderation client and check-and-revert sidecar
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── realtime/       - WebSocket hub and sessions
//! ├── collab/         - Documents and edits
//! ├── moderation/     - Content moderation
//! └── error/          - Error types
//! ```
//!
//! # Data Flow
//!
//! ```text
//! PUT /api/document/{id} -> EditPipeline -> DocumentStore
//!                                        -> Hub -> every session
//!                                        -> ModerationSidecar (background)
//!
//! session frame -> read pump -> Hub -> every session's write pump
//! ```
//!
//! # Error Handling
//!
//! Handlers return `Result<_, BackendError>`; `BackendError` converts into a
//! JSON response carrying the matching status code.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// WebSocket hub and client sessions
pub mod realtime;

/// Document store, edit pipeline and handlers
pub mod collab;

/// Content moderation
pub mod moderation;

/// Backend error types
pub mod error;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::{create_app, AppConfig, AppState};
