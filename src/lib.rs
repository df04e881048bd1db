//! StoryChain - Main Library
//!
//! StoryChain is a collaborative text editor backend: many browser sessions
//! edit one shared document, see each other's edits and cursors in real
//! time, and have profane contributions reverted automatically.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by the server and its clients
//!   - Change model (patches and their inverses)
//!   - Documents, changes and edit requests
//!   - Wire events
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP and WebSocket server
//!   - Connection hub with backpressure eviction
//!   - Edit pipeline and document stores
//!   - Moderation sidecar
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend modules and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use storychain::backend::{create_app, AppConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let app = create_app(&config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `Result<T, E>` for fallible operations
//! - Custom error types in `shared::error` and `backend::error`

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
