//! Moderation client tests against a mock classifier

#[cfg(feature = "ssr")]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use storychain::backend::moderation::{ContentModerator, ModerationClient, ModerationError};

    async fn client_for(server: &MockServer) -> ModerationClient {
        ModerationClient::new(format!("{}/check", server.uri()), Duration::from_millis(300)).unwrap()
    }

    async fn respond_with(body: serde_json::Value) -> (MockServer, ModerationClient) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        (server, client)
    }

    #[tokio::test]
    async fn test_posts_message_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "message": "some words" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isProfane": false })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(!assert_ok!(client.check("some words").await));
    }

    #[tokio::test]
    async fn test_response_shapes() {
        let cases = [
            (json!(true), true),
            (json!({ "isProfane": true }), true),
            (json!({ "profanity": false }), false),
            (json!({ "reason": "slur detected" }), true),
            (json!({ "label": "Profanity" }), true),
            (json!({ "labels": ["neutral"] }), false),
            (json!({ "score": 0.93 }), true),
            (json!({ "scores": { "profane": 0.2 } }), false),
            (json!({ "confidence": { "profanity": 0.85 } }), true),
            (json!({}), false),
        ];

        for (body, expected) in cases {
            let (_server, client) = respond_with(body.clone()).await;
            let flagged = assert_ok!(client.check("text").await);
            assert_eq!(flagged, expected, "response {}", body);
        }
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client_for(&server).await.check("text").await;
        assert_matches!(result, Err(ModerationError::Status(status)) if status.as_u16() == 500);
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).await.check("text").await;
        assert_err!(result, ModerationError::Decode(_));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!(true))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).await.check("text").await;
        assert_matches!(result, Err(ModerationError::Transport(e)) if e.is_timeout());
    }
}
