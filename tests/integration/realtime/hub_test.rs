//! Connection hub integration tests
//!
//! Fan-out ordering under concurrent producers, presence, eviction and
//! relay of client frames through sessions

#[cfg(feature = "ssr")]
mod tests {
    use bytes::Bytes;
    use futures_util::stream;
    use std::convert::Infallible;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use axum::extract::ws::Message;

    use crate::common::next_event;
    use storychain::backend::realtime::hub::{Hub, HubConfig};
    use storychain::backend::realtime::session::{read_pump, ClientSession, SessionConfig};
    use storychain::shared::{PresenceStatus, ServerEvent};

    async fn drain(receiver: &mut mpsc::Receiver<Bytes>, count: usize) -> Vec<Bytes> {
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            let frame = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
                .await
                .expect("timed out waiting for a frame")
                .expect("session queue closed");
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn test_all_sessions_see_same_order() {
        let hub = Hub::spawn(HubConfig::default());
        let mut receivers = Vec::new();
        for name in ["A", "B", "C"] {
            receivers.push(hub.register(Uuid::new_v4(), name).await.unwrap());
        }
        hub.flush().await.unwrap();

        // Skip presence: A saw three joins, B two, C one
        for (receiver, joins) in receivers.iter_mut().zip([3, 2, 1]) {
            drain(receiver, joins).await;
        }

        let producers: Vec<_> = ["x", "y"]
            .into_iter()
            .map(|prefix| {
                let hub = hub.clone();
                tokio::spawn(async move {
                    for i in 0..50 {
                        hub.broadcast(format!("{}{}", prefix, i)).await.unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }

        let mut sequences = Vec::new();
        for receiver in receivers.iter_mut() {
            sequences.push(drain(receiver, 100).await);
        }

        assert_eq!(sequences[0], sequences[1]);
        assert_eq!(sequences[1], sequences[2]);

        // Each producer's own frames stay in order
        let xs: Vec<_> = sequences[0].iter().filter(|frame| frame.starts_with(b"x")).collect();
        let expected: Vec<Bytes> = (0..50).map(|i| Bytes::from(format!("x{}", i))).collect();
        assert_eq!(xs, expected.iter().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_existing_sessions_see_joins_and_leaves() {
        let hub = Hub::spawn(HubConfig::default());
        let mut first = hub.register(Uuid::new_v4(), "First").await.unwrap();
        next_event(&mut first).await;

        let second_id = Uuid::new_v4();
        let _second = hub.register(second_id, "Second").await.unwrap();
        hub.unregister(second_id).await.unwrap();

        for expected in [PresenceStatus::Joined, PresenceStatus::Left] {
            match next_event(&mut first).await {
                ServerEvent::UserPresence(presence) => {
                    assert_eq!(presence.user_id, second_id);
                    assert_eq!(presence.user_name, "Second");
                    assert_eq!(presence.status, expected);
                }
                other => panic!("expected presence, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_slow_session_evicted_others_unaffected() {
        let hub = Hub::spawn(HubConfig { queue_depth: 4 });
        let _stalled = hub.register(Uuid::new_v4(), "Stalled").await.unwrap();
        let mut healthy = hub.register(Uuid::new_v4(), "Healthy").await.unwrap();
        assert_eq!(hub.online_count().await, 2);

        for i in 0..10 {
            hub.broadcast(format!("frame {}", i)).await.unwrap();
            // Keep the healthy session drained
            drain(&mut healthy, if i == 0 { 2 } else { 1 }).await;
        }
        hub.flush().await.unwrap();

        assert_eq!(hub.online_count().await, 1);
    }

    #[tokio::test]
    async fn test_relayed_edits_respect_cooldown() {
        let hub = Hub::spawn(HubConfig::default());
        let mut listener = hub.register(Uuid::new_v4(), "Listener").await.unwrap();
        next_event(&mut listener).await;

        let edit = r#"{"type":"text_change","data":{"content":"x","position":0}}"#;
        let cursor = r#"{"type":"cursor_position","data":{"userID":"u","position":4}}"#;
        let frames = vec![
            Ok::<_, Infallible>(Message::Text(edit.into())),
            Ok(Message::Text(cursor.into())),
            Ok(Message::Text(edit.into())),
            Ok(Message::Text(r#"{"type":"shout","data":"hi"}"#.into())),
            Ok(Message::Text("{broken".into())),
            Ok(Message::Text(cursor.into())),
        ];

        let mut session = ClientSession::new(Uuid::new_v4(), "Typist", SessionConfig::default());
        read_pump(stream::iter(frames), &mut session, &hub).await;
        hub.flush().await.unwrap();

        let relayed = drain(&mut listener, 3).await;
        assert_eq!(relayed[0], Bytes::from(edit));
        assert_eq!(relayed[1], Bytes::from(cursor));
        assert_eq!(relayed[2], Bytes::from(cursor));
        assert!(listener.try_recv().is_err());
    }
}
