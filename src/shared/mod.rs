//! Shared Module
//!
//! This module contains types that do not depend on the server runtime:
//! the positional patch model, the document and change records, the realtime
//! wire envelope and the shared error type.
//!
//! # Overview
//!
//! Everything here is plain data plus pure functions. The backend builds on
//! these types for persistence, broadcasting and moderation.

/// Positional patches and their inverses
pub mod change;

/// Document, change log and request records
pub mod document;

/// Realtime wire envelope
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use change::{AppliedPatch, ChangeKind, Patch};
pub use document::{Author, Change, Document, EditRequest, EditStats, SYSTEM_AUTHOR_NAME};
pub use event::{CommandTag, InboundFrame, PresenceStatus, ServerEvent, TextChangeEvent, UserPresence};
pub use error::SharedError;
