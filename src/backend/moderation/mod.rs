//! Content Moderation Module
//!
//! Accepted edits are checked against an external profanity classifier after
//! they are committed. Flagged edits are reverted by a system-authored change.
//!
//! # Module Structure
//!
//! ```text
//! moderation/
//! ├── mod.rs     - Module exports and documentation
//! ├── client.rs  - ContentModerator trait and HTTP client
//! ├── verdict.rs - Response shape decision table
//! └── sidecar.rs - Asynchronous check-and-revert workflow
//! ```
//!
//! # Failure Policy
//!
//! Moderation fails open: an unreachable, slow or confused classifier never
//! blocks or reverts an edit.

/// Moderation service client
pub mod client;

/// Moderation response normalisation
pub mod verdict;

/// Check-and-revert workflow
pub mod sidecar;

// Re-export commonly used types
pub use client::{ContentModerator, ModerationClient, ModerationError, SharedModerator};
pub use sidecar::{ModerationJob, ModerationOutcome, ModerationSidecar};
