/**
 * Moderation Sidecar
 *
 * Every accepted edit that adds text is checked after it has been committed
 * and broadcast. The check runs in its own task, so the editing request never
 * waits on the classifier.
 *
 * # Workflow
 *
 * 1. Skip edits that add no text (deletes, whitespace-only payloads)
 * 2. Build a short context: a few words either side of the edit, taken from
 *    the content as it was before the edit
 * 3. Ask the moderator; errors and timeouts count as clean
 * 4. If flagged, write the pre-edit content back, record a system-authored
 *    change carrying the inverse patch, and broadcast it
 *
 * A failed revert is logged and not retried.
 *
 * # Races
 *
 * The revert overwrites the whole document with its pre-edit snapshot, so
 * any edit committed between the flagged edit and the revert is lost.
 */

use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

use crate::backend::collab::store::SharedStore;
use crate::backend::moderation::client::{ModerationError, SharedModerator, DEFAULT_MODERATION_TIMEOUT};
use crate::backend::realtime::hub::Hub;
use crate::shared::{Author, Change, ChangeKind, Patch, ServerEvent, TextChangeEvent};

/// Words of surrounding text sent along with the new text on each side
pub const CONTEXT_WORDS: usize = 3;

/// Everything needed to check, and possibly undo, one committed edit
#[derive(Debug, Clone)]
pub struct ModerationJob {
    pub document_id: Uuid,
    /// Document content before the edit was applied
    pub pre_edit_content: String,
    pub patch: Patch,
    pub inverse: Patch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModerationOutcome {
    /// The edit added no text worth checking
    Skipped,
    Clean,
    /// The edit was undone by this system change
    Reverted(Change),
    RevertFailed,
}

#[derive(Clone)]
pub struct ModerationSidecar {
    store: SharedStore,
    moderator: SharedModerator,
    hub: Hub,
    timeout: Duration,
}

impl ModerationSidecar {
    pub fn new(store: SharedStore, moderator: SharedModerator, hub: Hub) -> Self {
        Self {
            store,
            moderator,
            hub,
            timeout: DEFAULT_MODERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check `job` in the background
    pub fn spawn(&self, job: ModerationJob) {
        let sidecar = self.clone();
        tokio::spawn(async move {
            let outcome = sidecar.run(job).await;
            tracing::debug!("[Moderation] Job finished: {:?}", outcome);
        });
    }

    /// Check `job` and revert the edit if it is flagged
    pub async fn run(&self, job: ModerationJob) -> ModerationOutcome {
        if !job.patch.kind.adds_text() || job.patch.content.trim().is_empty() {
            return ModerationOutcome::Skipped;
        }

        let context = moderation_context(&job.pre_edit_content, &job.patch);

        let checked = match tokio::time::timeout(self.timeout, self.moderator.check(&context)).await {
            Ok(result) => result,
            Err(_) => Err(ModerationError::Timeout),
        };

        let flagged = match checked {
            Ok(flagged) => flagged,
            Err(e) => {
                tracing::warn!("[Moderation] Check failed, treating edit as clean: {}", e);
                false
            }
        };

        if !flagged {
            return ModerationOutcome::Clean;
        }

        tracing::info!("[Moderation] Edit to document {} flagged, reverting", job.document_id);
        self.revert(job).await
    }

    async fn revert(&self, job: ModerationJob) -> ModerationOutcome {
        let change = Change::new(job.document_id, &Author::system(), &job.inverse, Utc::now());

        if let Err(e) = self
            .store
            .commit_change(job.document_id, &job.pre_edit_content, &change)
            .await
        {
            tracing::error!("[Moderation] Failed to revert document {}: {}", job.document_id, e);
            return ModerationOutcome::RevertFailed;
        }

        let event = ServerEvent::TextChange(TextChangeEvent::from(&change));
        if let Err(e) = self.hub.broadcast_event(&event).await {
            tracing::warn!("[Moderation] Revert of {} stored but not broadcast: {}", job.document_id, e);
        }

        ModerationOutcome::Reverted(change)
    }
}

/// Text sent to the moderator for `patch` applied to `pre_edit`
///
/// The new text is joined with up to `CONTEXT_WORDS` whitespace-separated
/// words before the edit position and after the replaced range.
pub fn moderation_context(pre_edit: &str, patch: &Patch) -> String {
    let len = pre_edit.len();
    let start = patch.position.min(len);
    let end = match patch.kind {
        ChangeKind::Replace => start.saturating_add(patch.length).min(len),
        _ => start,
    };

    let before: Vec<&str> = pre_edit.get(..start).unwrap_or_default().split_whitespace().collect();
    let after = pre_edit.get(end..).unwrap_or_default().split_whitespace().take(CONTEXT_WORDS);

    let mut words: Vec<&str> = before[before.len().saturating_sub(CONTEXT_WORDS)..].to_vec();
    words.push(patch.content.trim());
    words.extend(after);
    words.join(" ")
}
