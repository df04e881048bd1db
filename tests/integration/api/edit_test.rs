//! Edit API integration tests
//!
//! Tests for `PUT /api/document/{id}`: patch semantics, validation,
//! broadcast and moderation

#[cfg(feature = "ssr")]
mod tests {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::common::{eventually, next_event, serve, FailingStore, StubModerator, TestApp};
    use storychain::backend::collab::handlers::UpdateResponse;
    use storychain::shared::{ChangeKind, ServerEvent, SYSTEM_AUTHOR_NAME};

    fn edit(change_type: &str, content: &str, position: usize, length: usize) -> serde_json::Value {
        json!({
            "user_id": Uuid::new_v4(),
            "user_name": "Alice",
            "change_type": change_type,
            "content": content,
            "position": position,
            "length": length,
        })
    }

    #[tokio::test]
    async fn test_insert_applied_and_recorded() {
        let app = TestApp::spawn().await;
        let id = app.seed("Hello world").await;

        let response = app
            .server
            .put(&format!("/api/document/{}", id))
            .json(&edit("insert", ", there", 5, 0))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: UpdateResponse = response.json();
        assert!(body.success);
        assert_eq!(body.change.change_type, ChangeKind::Insert);
        assert_eq!(body.change.document_id, id);
        assert_eq!(body.change.user_name, "Alice");

        assert_eq!(app.content(id).await, "Hello, there world");
        assert_eq!(app.memory.changes_for(id).await, vec![body.change]);
    }

    #[tokio::test]
    async fn test_delete_and_replace() {
        let app = TestApp::spawn().await;
        let id = app.seed("Hello, there world").await;
        let url = format!("/api/document/{}", id);

        app.server.put(&url).json(&edit("delete", "", 5, 7)).await.assert_status_ok();
        assert_eq!(app.content(id).await, "Hello world");

        app.server.put(&url).json(&edit("replace", "earth", 6, 5)).await.assert_status_ok();
        assert_eq!(app.content(id).await, "Hello earth");
    }

    #[tokio::test]
    async fn test_out_of_range_edits_are_clamped() {
        let app = TestApp::spawn().await;
        let id = app.seed("abc").await;
        let url = format!("/api/document/{}", id);

        app.server.put(&url).json(&edit("insert", "!", 99, 0)).await.assert_status_ok();
        assert_eq!(app.content(id).await, "abc!");

        app.server.put(&url).json(&edit("delete", "", 99, 3)).await.assert_status_ok();
        assert_eq!(app.content(id).await, "abc!");

        app.server.put(&url).json(&edit("delete", "", 2, 99)).await.assert_status_ok();
        assert_eq!(app.content(id).await, "ab");
    }

    #[tokio::test]
    async fn test_links_rejected() {
        let app = TestApp::spawn().await;
        let id = app.seed("Hello").await;

        for content in ["see https://example.com", "www.example.org", "mail bob@example.com"] {
            let response = app
                .server
                .put(&format!("/api/document/{}", id))
                .json(&edit("insert", content, 0, 0))
                .await;
            assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

            let body: serde_json::Value = response.json();
            assert_eq!(body["error"], "Links are not allowed in content");
        }

        assert_eq!(app.content(id).await, "Hello");
        assert!(app.memory.changes_for(id).await.is_empty());
    }

    #[tokio::test]
    async fn test_system_identity_rejected() {
        let app = TestApp::spawn().await;
        let id = app.seed("Hello").await;
        let mut session = app.state.hub.register(Uuid::new_v4(), "Watcher").await.unwrap();
        next_event(&mut session).await;

        let response = app
            .server
            .put(&format!("/api/document/{}", id))
            .json(&json!({
                "user_id": Uuid::nil(),
                "user_name": SYSTEM_AUTHOR_NAME,
                "change_type": "insert",
                "content": " x",
                "position": 5,
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "User ID is reserved");

        assert_eq!(app.content(id).await, "Hello");
        assert!(app.memory.changes_for(id).await.is_empty());
        app.state.hub.flush().await.unwrap();
        assert!(session.try_recv().is_err());
        assert!(app.moderator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_document() {
        let app = TestApp::spawn().await;

        let response = app
            .server
            .put(&format!("/api/document/{}", Uuid::new_v4()))
            .json(&edit("insert", "x", 0, 0))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let app = TestApp::spawn().await;
        let id = app.seed("Hello").await;

        let response = app
            .server
            .put(&format!("/api/document/{}", id))
            .json(&json!({ "content": "no author" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_offset_inside_multibyte_character() {
        let app = TestApp::spawn().await;
        let id = app.seed("héllo").await;

        // Byte 2 falls inside 'é'
        let response = app
            .server
            .put(&format!("/api/document/{}", id))
            .json(&edit("insert", "x", 2, 0))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(app.content(id).await, "héllo");
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let (server, _state) = serve(Arc::new(FailingStore), Arc::new(StubModerator::clean()));

        let response = server
            .put(&format!("/api/document/{}", Uuid::new_v4()))
            .json(&edit("insert", "x", 0, 0))
            .await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Failed to update document");
    }

    #[tokio::test]
    async fn test_edit_broadcast_to_sessions() {
        let app = TestApp::spawn().await;
        let id = app.seed("Hello").await;
        let mut session = app.state.hub.register(Uuid::new_v4(), "Watcher").await.unwrap();
        next_event(&mut session).await;

        let body: UpdateResponse = app
            .server
            .put(&format!("/api/document/{}", id))
            .json(&edit("insert", " world", 5, 0))
            .await
            .json();

        match next_event(&mut session).await {
            ServerEvent::TextChange(event) => {
                assert_eq!(event.change_id, body.change.id);
                assert_eq!(event.document_id, id);
                assert_eq!(event.content, " world");
                assert_eq!(event.position, 5);
            }
            other => panic!("expected text_change, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flagged_edit_is_reverted() {
        let app = TestApp::with_moderator(StubModerator::flagging()).await;
        let id = app.seed("a clean story").await;
        let mut session = app.state.hub.register(Uuid::new_v4(), "Watcher").await.unwrap();
        next_event(&mut session).await;

        app.server
            .put(&format!("/api/document/{}", id))
            .json(&edit("replace", "rude", 2, 5))
            .await
            .assert_status_ok();

        let memory = &app.memory;
        let reverted = eventually(move || async move { memory.changes_for(id).await.len() == 2 }).await;
        assert!(reverted, "flagged edit was not reverted");
        assert_eq!(app.content(id).await, "a clean story");

        let changes = app.memory.changes_for(id).await;
        assert_eq!(changes[1].user_id, Uuid::nil());
        assert_eq!(changes[1].user_name, SYSTEM_AUTHOR_NAME);
        assert_eq!(changes[1].content, "clean");

        // The edit itself, then its revert
        for expected in ["rude", "clean"] {
            match next_event(&mut session).await {
                ServerEvent::TextChange(event) => assert_eq!(event.content, expected),
                other => panic!("expected text_change, got {:?}", other),
            }
        }

        assert_eq!(app.moderator.calls(), vec!["a rude story".to_string()]);
    }

    #[tokio::test]
    async fn test_clean_edit_is_kept() {
        let app = TestApp::spawn().await;
        let id = app.seed("a story").await;

        app.server
            .put(&format!("/api/document/{}", id))
            .json(&edit("insert", "nice ", 2, 0))
            .await
            .assert_status_ok();

        let moderator = &app.moderator;
        assert!(eventually(move || async move { !moderator.calls().is_empty() }).await);
        assert_eq!(app.content(id).await, "a nice story");
        assert_eq!(app.memory.changes_for(id).await.len(), 1);
    }
}
