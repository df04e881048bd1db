/**
 * Document and Change Records
 *
 * This module defines the persisted records of the editor: the shared
 * document and the append-only change log. Both are serialized to JSON for
 * the HTTP API and mapped to rows by the document stores.
 *
 * A `Change` is never mutated after creation. Moderation reverts are
 * recorded as new changes authored by `Author::system()`.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::change::{ChangeKind, Patch};

/// Display name of the moderation author
pub const SYSTEM_AUTHOR_NAME: &str = "StoryChain Moderation";

/// The shared document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a document stamped with the current time
    pub fn new(id: Uuid, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Who made a change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
}

impl Author {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The identity used for compensating changes
    pub fn system() -> Self {
        Self::new(Uuid::nil(), SYSTEM_AUTHOR_NAME)
    }

    pub fn is_system(&self) -> bool {
        self.id.is_nil()
    }
}

/// One entry of a document's change log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Change {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub change_type: ChangeKind,
    pub content: String,
    pub position: usize,
    pub length: usize,
    pub timestamp: DateTime<Utc>,
}

impl Change {
    /// Record `patch` as a new change with a fresh id
    pub fn new(document_id: Uuid, author: &Author, patch: &Patch, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            user_id: author.id,
            user_name: author.name.clone(),
            change_type: patch.kind,
            content: patch.content.clone(),
            position: patch.position,
            length: patch.length,
            timestamp,
        }
    }

    /// The patch this change describes
    pub fn patch(&self) -> Patch {
        Patch {
            kind: self.change_type,
            content: self.content.clone(),
            position: self.position,
            length: self.length,
        }
    }

    pub fn author(&self) -> Author {
        Author::new(self.user_id, self.user_name.clone())
    }
}

/// Body of `PUT /api/document/{id}`
///
/// Offsets are byte offsets into the document content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditRequest {
    pub user_id: Uuid,
    pub user_name: String,
    pub change_type: ChangeKind,
    #[serde(default)]
    pub content: String,
    pub position: usize,
    #[serde(default)]
    pub length: usize,
}

impl EditRequest {
    pub fn patch(&self) -> Patch {
        Patch {
            kind: self.change_type,
            content: self.content.clone(),
            position: self.position,
            length: self.length,
        }
    }

    pub fn author(&self) -> Author {
        Author::new(self.user_id, self.user_name.clone())
    }
}

/// Aggregate counters reported by `GET /api/stats`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditStats {
    pub total_edits: i64,
    pub unique_users: i64,
}
