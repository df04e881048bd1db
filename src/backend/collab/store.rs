/**
 * Document Store
 *
 * This module defines the storage surface the edit pipeline and the
 * moderation sidecar depend on. Two implementations exist:
 *
 * - `MemoryStore` (`collab::memory`) - process-local, used when no database
 *   is configured and in tests
 * - `PostgresStore` (`collab::db`) - PostgreSQL via sqlx
 *
 * # Consistency
 *
 * The store offers no document-level locking or version check. Callers
 * perform read-modify-write sequences (`get_content` then `commit_change`)
 * and two concurrent writers to the same document race: the later commit
 * wins even though both changes stay in the log.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::{Change, Document, EditStats};

/// Errors returned by document stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist
    #[error("Document {0} not found")]
    NotFound(Uuid),

    /// The database rejected or failed the operation
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Shared handle to a document store
pub type SharedStore = Arc<dyn DocumentStore>;

/// Transactional read/update/append surface over documents and their change logs
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document, `None` if it does not exist
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Load only the current content of a document
    async fn get_content(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.get_document(id).await?.map(|doc| doc.content))
    }

    /// Insert a document unless one with the same id exists
    async fn create_document(&self, document: &Document) -> Result<(), StoreError>;

    /// Overwrite the content of an existing document
    async fn replace_content(&self, id: Uuid, content: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Append one entry to the change log
    async fn append_change(&self, change: &Change) -> Result<(), StoreError>;

    /// Overwrite content and append `change` as one unit
    ///
    /// Either both happen or neither does. The default implementation runs
    /// the two steps in order and is only atomic if `replace_content` is the
    /// sole fallible step; stores with transactions override it.
    async fn commit_change(&self, id: Uuid, content: &str, change: &Change) -> Result<(), StoreError> {
        self.replace_content(id, content, change.timestamp).await?;
        self.append_change(change).await
    }

    /// Most recent changes of a document, newest first
    async fn list_recent_changes(&self, id: Uuid, limit: usize) -> Result<Vec<Change>, StoreError>;

    /// Aggregate edit counters across all documents
    async fn stats(&self) -> Result<EditStats, StoreError>;

    /// Check that the backing storage is reachable
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
