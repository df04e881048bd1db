//! Routes Module
//!
//! This module assembles the HTTP surface of the server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Router creation, CORS and tracing layers
//! └── api_routes.rs - /api endpoints
//! ```
//!
//! # Dependencies
//!
//! - `backend::server::state` - Application state
//! - `backend::collab::handlers` - Document, stats and status handlers
//! - `backend::realtime` - WebSocket handler

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

// Re-export commonly used functions
pub use router::create_router;
