/**
 * Positional Text Patches
 *
 * This module defines the patch type used by the edit pipeline and the
 * moderation sidecar. A patch is an insert, delete or replace at a byte
 * offset into the document content. Applying a patch yields the new content
 * together with the inverse patch that restores the previous content.
 *
 * # Offsets
 *
 * `position` and `length` are byte offsets into the UTF-8 content, never
 * character indices. Out-of-range offsets are clamped the same way for every
 * kind (see `Patch::apply`). A split point that lands inside a multi-byte
 * character is rejected with `SharedError::PatchBoundary`.
 *
 * # Concurrency
 *
 * Patches carry no version information. A patch computed against stale
 * content is applied to whatever content is current when it runs.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::error::SharedError;

/// Kind of positional edit
///
/// Unrecognized kinds deserialize to `Unknown` and are applied as no-ops.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Delete,
    Replace,
    #[serde(other)]
    Unknown,
}

impl ChangeKind {
    /// Wire and storage name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a stored kind name, falling back to `Unknown`
    pub fn parse(value: &str) -> Self {
        match value {
            "insert" => Self::Insert,
            "delete" => Self::Delete,
            "replace" => Self::Replace,
            _ => Self::Unknown,
        }
    }

    /// Whether the kind introduces new text into the document
    pub fn adds_text(&self) -> bool {
        matches!(self, Self::Insert | Self::Replace)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positional edit against document content
///
/// # Fields
/// * `kind` - Insert, delete, replace or unknown
/// * `content` - New text (empty for delete)
/// * `position` - Byte offset where the edit starts
/// * `length` - Number of bytes affected (ignored for insert)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patch {
    pub kind: ChangeKind,
    pub content: String,
    pub position: usize,
    pub length: usize,
}

/// Result of applying a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPatch {
    /// Content after the patch
    pub content: String,
    /// Patch that turns `content` back into the input content
    pub inverse: Patch,
}

impl Patch {
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Insert,
            content: content.into(),
            position,
            length: 0,
        }
    }

    pub fn delete(position: usize, length: usize) -> Self {
        Self {
            kind: ChangeKind::Delete,
            content: String::new(),
            position,
            length,
        }
    }

    pub fn replace(position: usize, length: usize, content: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Replace,
            content: content.into(),
            position,
            length,
        }
    }

    /// A patch that leaves any content unchanged
    pub fn noop(position: usize) -> Self {
        Self {
            kind: ChangeKind::Unknown,
            content: String::new(),
            position,
            length: 0,
        }
    }

    /// Whether applying this patch can never change content
    pub fn is_noop(&self) -> bool {
        match self.kind {
            ChangeKind::Unknown => true,
            ChangeKind::Insert => self.content.is_empty(),
            ChangeKind::Delete => self.length == 0,
            ChangeKind::Replace => self.length == 0 && self.content.is_empty(),
        }
    }

    /// Apply the patch to `content` and compute its inverse
    ///
    /// Bounds handling:
    /// - insert past the end appends
    /// - delete starting at or past the end is a no-op
    /// - delete/replace ranges running past the end stop at the end
    /// - replace starting past the end appends
    /// - unknown kinds are no-ops
    ///
    /// # Errors
    ///
    /// `SharedError::PatchBoundary` if a split point is not on a UTF-8
    /// character boundary.
    pub fn apply(&self, content: &str) -> Result<AppliedPatch, SharedError> {
        let len = content.len();

        match self.kind {
            ChangeKind::Insert => {
                let at = self.position.min(len);
                let (before, after) = split_at(content, at)?;
                Ok(AppliedPatch {
                    content: [before, self.content.as_str(), after].concat(),
                    inverse: Patch::delete(at, self.content.len()),
                })
            }
            ChangeKind::Delete => {
                if self.position >= len {
                    return Ok(AppliedPatch {
                        content: content.to_string(),
                        inverse: Patch::noop(self.position),
                    });
                }
                let end = self.position.saturating_add(self.length).min(len);
                let (before, removed, after) = split_range(content, self.position, end)?;
                Ok(AppliedPatch {
                    content: [before, after].concat(),
                    inverse: Patch::insert(self.position, removed),
                })
            }
            ChangeKind::Replace => {
                let at = self.position.min(len);
                let end = at.saturating_add(self.length).min(len);
                let (before, replaced, after) = split_range(content, at, end)?;
                Ok(AppliedPatch {
                    content: [before, self.content.as_str(), after].concat(),
                    inverse: Patch::replace(at, self.content.len(), replaced),
                })
            }
            ChangeKind::Unknown => Ok(AppliedPatch {
                content: content.to_string(),
                inverse: Patch::noop(self.position),
            }),
        }
    }
}

fn split_at(content: &str, at: usize) -> Result<(&str, &str), SharedError> {
    if !content.is_char_boundary(at) {
        return Err(SharedError::patch_boundary(at));
    }
    Ok(content.split_at(at))
}

fn split_range(content: &str, start: usize, end: usize) -> Result<(&str, &str, &str), SharedError> {
    let (before, rest) = split_at(content, start)?;
    let (middle, after) = split_at(rest, end - start).map_err(|_| SharedError::patch_boundary(end))?;
    Ok((before, middle, after))
}
