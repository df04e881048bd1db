//! Collaborative Editing Module
//!
//! This module contains the server-side document workflow:
//! - the document store surface and its PostgreSQL and in-memory backends
//! - the edit pipeline (validate, apply, commit, broadcast, moderate)
//! - the document HTTP handlers
//!
//! # Module Structure
//!
//! ```text
//! collab/
//! ├── mod.rs      - Module exports and documentation
//! ├── store.rs    - DocumentStore trait and StoreError
//! ├── memory.rs   - In-memory store
//! ├── db.rs       - PostgreSQL store
//! ├── links.rs    - URL and e-mail filter for edit content
//! ├── pipeline.rs - Edit pipeline
//! └── handlers.rs - HTTP handlers
//! ```

/// Document store surface
pub mod store;

/// In-memory document store
pub mod memory;

/// PostgreSQL document store
pub mod db;

/// Link filter
pub mod links;

/// Edit pipeline
pub mod pipeline;

/// Document HTTP handlers
pub mod handlers;

/// Re-export commonly used types
pub use memory::MemoryStore;
pub use db::PostgresStore;
pub use pipeline::EditPipeline;
pub use store::{DocumentStore, SharedStore, StoreError};
