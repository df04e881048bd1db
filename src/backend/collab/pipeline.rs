/**
 * Edit Pipeline
 *
 * Applies one edit submitted over HTTP:
 *
 * 1. Reject content carrying links or e-mail addresses
 * 2. Read the current content
 * 3. Apply the patch and compute its inverse
 * 4. Commit the new content and the change record together
 * 5. Broadcast the change to every connected session
 * 6. Hand the edit to the moderation sidecar
 *
 * There is no version check between steps 2 and 4. Two edits to the same
 * document racing through the pipeline both get recorded, but the content
 * written last wins.
 */

use chrono::Utc;
use uuid::Uuid;

use crate::backend::collab::links::contains_links;
use crate::backend::collab::store::{SharedStore, StoreError};
use crate::backend::error::BackendError;
use crate::backend::moderation::{ModerationJob, ModerationSidecar};
use crate::backend::realtime::hub::Hub;
use crate::shared::{Change, EditRequest, ServerEvent, SharedError, TextChangeEvent};

#[derive(Clone)]
pub struct EditPipeline {
    store: SharedStore,
    hub: Hub,
    moderation: ModerationSidecar,
}

impl EditPipeline {
    pub fn new(store: SharedStore, hub: Hub, moderation: ModerationSidecar) -> Self {
        Self { store, hub, moderation }
    }

    /// Apply `request` to the document `document_id`
    ///
    /// # Returns
    ///
    /// The recorded change. By then it has been committed and queued for
    /// broadcast; moderation runs afterwards in the background.
    ///
    /// # Errors
    ///
    /// - `SharedError::ValidationError` if the user id is the reserved system
    ///   id or the content contains links
    /// - `StoreError::NotFound` if the document does not exist
    /// - `SharedError::PatchBoundary` if an offset splits a character
    /// - `StoreError::Database` if reading or committing fails
    pub async fn apply_edit(&self, document_id: Uuid, request: EditRequest) -> Result<Change, BackendError> {
        // The nil id marks moderation reverts
        if request.author().is_system() {
            return Err(SharedError::validation("user_id", "User ID is reserved").into());
        }

        if contains_links(&request.content) {
            return Err(SharedError::validation("content", "Links are not allowed in content").into());
        }

        let current = self
            .store
            .get_content(document_id)
            .await?
            .ok_or(StoreError::NotFound(document_id))?;

        let patch = request.patch();
        let applied = patch.apply(&current)?;

        let change = Change::new(document_id, &request.author(), &patch, Utc::now());
        self.store.commit_change(document_id, &applied.content, &change).await?;

        tracing::info!(
            "[Collab] {} applied {} at {} to document {}",
            change.user_name,
            change.change_type,
            change.position,
            document_id
        );

        let event = ServerEvent::TextChange(TextChangeEvent::from(&change));
        if let Err(e) = self.hub.broadcast_event(&event).await {
            tracing::warn!("[Collab] Change {} stored but not broadcast: {}", change.id, e);
        }

        self.moderation.spawn(ModerationJob {
            document_id,
            pre_edit_content: current,
            patch,
            inverse: applied.inverse,
        });

        Ok(change)
    }
}
