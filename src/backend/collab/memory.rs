/**
 * In-Memory Document Store
 *
 * Keeps documents and change logs in process memory behind a single
 * `RwLock`. Used when `DATABASE_URL` is not configured and by the test
 * suite. State is lost on restart.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::collab::store::{DocumentStore, StoreError};
use crate::shared::{Change, Document, EditStats};

#[derive(Debug, Default)]
struct MemoryInner {
    documents: HashMap<Uuid, Document>,
    changes: Vec<Change>,
}

impl MemoryInner {
    fn replace(&mut self, id: Uuid, content: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let doc = self.documents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        doc.content = content.to_string();
        doc.updated_at = at;
        Ok(())
    }
}

/// Process-local document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one document
    pub async fn with_document(document: Document) -> Self {
        let store = Self::new();
        store.inner.write().await.documents.insert(document.id, document);
        store
    }

    /// Every change of a document in append order
    pub async fn changes_for(&self, id: Uuid) -> Vec<Change> {
        let inner = self.inner.read().await;
        inner
            .changes
            .iter()
            .filter(|change| change.document_id == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.read().await.documents.get(&id).cloned())
    }

    async fn create_document(&self, document: &Document) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .documents
            .entry(document.id)
            .or_insert_with(|| document.clone());
        Ok(())
    }

    async fn replace_content(&self, id: Uuid, content: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.write().await.replace(id, content, at)
    }

    async fn append_change(&self, change: &Change) -> Result<(), StoreError> {
        self.inner.write().await.changes.push(change.clone());
        Ok(())
    }

    async fn commit_change(&self, id: Uuid, content: &str, change: &Change) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.replace(id, content, change.timestamp)?;
        inner.changes.push(change.clone());
        Ok(())
    }

    async fn list_recent_changes(&self, id: Uuid, limit: usize) -> Result<Vec<Change>, StoreError> {
        let inner = self.inner.read().await;
        // Reverse first so that equal timestamps keep newest-first order
        let mut changes: Vec<Change> = inner
            .changes
            .iter()
            .rev()
            .filter(|change| change.document_id == id)
            .cloned()
            .collect();
        changes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        changes.truncate(limit);
        Ok(changes)
    }

    async fn stats(&self) -> Result<EditStats, StoreError> {
        let inner = self.inner.read().await;
        let unique: HashSet<Uuid> = inner.changes.iter().map(|change| change.user_id).collect();
        Ok(EditStats {
            total_edits: inner.changes.len() as i64,
            unique_users: unique.len() as i64,
        })
    }
}
