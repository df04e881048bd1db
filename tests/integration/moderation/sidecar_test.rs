//! Moderation sidecar tests
//!
//! Runs the check-and-revert workflow synchronously against the in-memory
//! store and a stub moderator

#[cfg(feature = "ssr")]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    use crate::common::{next_event, FailingStore, StubModerator};
    use storychain::backend::collab::store::{DocumentStore, SharedStore};
    use storychain::backend::collab::MemoryStore;
    use storychain::backend::moderation::{ModerationJob, ModerationOutcome, ModerationSidecar};
    use storychain::backend::realtime::hub::{Hub, HubConfig};
    use storychain::shared::{Author, Change, Document, Patch, ServerEvent, SYSTEM_AUTHOR_NAME};

    struct Fixture {
        store: Arc<MemoryStore>,
        moderator: Arc<StubModerator>,
        hub: Hub,
        sidecar: ModerationSidecar,
        document_id: Uuid,
    }

    /// A document that has just received `patch` on top of `pre_edit`
    async fn fixture(pre_edit: &str, patch: &Patch, moderator: StubModerator) -> (Fixture, ModerationJob) {
        let document_id = Uuid::new_v4();
        let applied = patch.apply(pre_edit).unwrap();

        let store = Arc::new(MemoryStore::with_document(Document::new(document_id, pre_edit)).await);
        let change = Change::new(document_id, &Author::new(Uuid::new_v4(), "Alice"), patch, Utc::now());
        store.commit_change(document_id, &applied.content, &change).await.unwrap();

        let moderator = Arc::new(moderator);
        let hub = Hub::spawn(HubConfig::default());
        let sidecar = ModerationSidecar::new(store.clone(), moderator.clone(), hub.clone())
            .with_timeout(Duration::from_millis(200));

        let job = ModerationJob {
            document_id,
            pre_edit_content: pre_edit.to_string(),
            patch: patch.clone(),
            inverse: applied.inverse,
        };

        (
            Fixture {
                store,
                moderator,
                hub,
                sidecar,
                document_id,
            },
            job,
        )
    }

    impl Fixture {
        async fn content(&self) -> String {
            self.store.get_content(self.document_id).await.unwrap().unwrap()
        }

        async fn system_changes(&self) -> Vec<Change> {
            self.store
                .changes_for(self.document_id)
                .await
                .into_iter()
                .filter(|change| change.author().is_system())
                .collect()
        }
    }

    #[tokio::test]
    async fn test_flagged_insert_reverted_and_broadcast() {
        let patch = Patch::insert(6, "awful ");
        let (fx, job) = fixture("a nice day", &patch, StubModerator::flagging()).await;
        let mut first = fx.hub.register(Uuid::new_v4(), "First").await.unwrap();
        let mut second = fx.hub.register(Uuid::new_v4(), "Second").await.unwrap();

        let outcome = fx.sidecar.run(job).await;

        let revert = assert_matches!(outcome, ModerationOutcome::Reverted(change) => change);
        assert_eq!(revert.user_id, Uuid::nil());
        assert_eq!(revert.user_name, SYSTEM_AUTHOR_NAME);
        assert_eq!(revert.patch(), Patch::delete(6, 6));

        assert_eq!(fx.content().await, "a nice day");
        assert_eq!(fx.system_changes().await, vec![revert.clone()]);

        // First saw two joins, second one
        for _ in 0..2 {
            next_event(&mut first).await;
        }
        next_event(&mut second).await;

        for receiver in [&mut first, &mut second] {
            match next_event(receiver).await {
                ServerEvent::TextChange(event) => {
                    assert_eq!(event.change_id, revert.id);
                    assert_eq!(event.user_name, SYSTEM_AUTHOR_NAME);
                }
                other => panic!("expected text_change, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_flagged_replace_restores_original_word() {
        let patch = Patch::replace(2, 4, "vile");
        let (fx, job) = fixture("a kind word", &patch, StubModerator::flagging()).await;
        assert_eq!(fx.content().await, "a vile word");

        assert_matches!(fx.sidecar.run(job).await, ModerationOutcome::Reverted(_));
        assert_eq!(fx.content().await, "a kind word");
        assert_eq!(fx.moderator.calls(), vec!["a vile word".to_string()]);
    }

    #[tokio::test]
    async fn test_clean_edit_untouched() {
        let patch = Patch::insert(0, "Hello ");
        let (fx, job) = fixture("world", &patch, StubModerator::clean()).await;

        assert_eq!(fx.sidecar.run(job).await, ModerationOutcome::Clean);
        assert_eq!(fx.content().await, "Hello world");
        assert!(fx.system_changes().await.is_empty());
    }

    #[tokio::test]
    async fn test_deletes_and_blank_inserts_skipped() {
        let (fx, job) = fixture("some text", &Patch::delete(0, 5), StubModerator::flagging()).await;
        assert_eq!(fx.sidecar.run(job).await, ModerationOutcome::Skipped);

        let (fx2, job2) = fixture("some text", &Patch::insert(4, "   "), StubModerator::flagging()).await;
        assert_eq!(fx2.sidecar.run(job2).await, ModerationOutcome::Skipped);

        assert!(fx.moderator.calls().is_empty());
        assert!(fx2.moderator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_moderator_failure_fails_open() {
        let (fx, job) = fixture("abc", &Patch::insert(3, " def"), StubModerator::failing()).await;

        assert_eq!(fx.sidecar.run(job).await, ModerationOutcome::Clean);
        assert_eq!(fx.content().await, "abc def");
    }

    #[tokio::test]
    async fn test_moderator_timeout_fails_open() {
        let moderator = StubModerator::flagging().slow(Duration::from_secs(5));
        let (fx, job) = fixture("abc", &Patch::insert(3, " def"), moderator).await;

        assert_eq!(fx.sidecar.run(job).await, ModerationOutcome::Clean);
        assert_eq!(fx.content().await, "abc def");
    }

    #[tokio::test]
    async fn test_revert_failure_not_broadcast() {
        let store: SharedStore = Arc::new(FailingStore);
        let hub = Hub::spawn(HubConfig::default());
        let mut listener = hub.register(Uuid::new_v4(), "Listener").await.unwrap();
        next_event(&mut listener).await;

        let sidecar = ModerationSidecar::new(store, Arc::new(StubModerator::flagging()), hub.clone());
        let patch = Patch::insert(0, "bad ");
        let job = ModerationJob {
            document_id: Uuid::new_v4(),
            pre_edit_content: "text".to_string(),
            inverse: patch.apply("text").unwrap().inverse,
            patch,
        };

        assert_eq!(sidecar.run(job).await, ModerationOutcome::RevertFailed);
        hub.flush().await.unwrap();
        assert!(listener.try_recv().is_err());
    }
}
