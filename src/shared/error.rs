//! Shared Error Types
//!
//! This module defines error types that are independent of the server
//! runtime: failures of the change model and of wire (de)serialization.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures
//! - `PatchBoundary` - A patch offset that splits a UTF-8 character
//!
//! # Usage
//!
//! ```rust
//! use storychain::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "Links are not allowed in content");
//! ```
use thiserror::Error;

/// Errors produced by shared types
#[derive(Debug, Error, Clone)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Patch offset does not fall on a UTF-8 character boundary
    #[error("Byte offset {offset} is not on a character boundary")]
    PatchBoundary {
        /// The offending byte offset
        offset: usize,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new patch boundary error
    pub fn patch_boundary(offset: usize) -> Self {
        Self::PatchBoundary { offset }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
