use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use prompter_client::{ClientEvent, ConnectionManager};
use prompter_schema::PlatformConfig;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

async fn recv_event(
    rx: &mut tokio::sync::broadcast::Receiver<ClientEvent>,
    secs: u64,
) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(secs), rx.recv())
        .await
        .expect("timed out waiting for client event")
        .expect("event channel closed")
}

#[tokio::test]
async fn sends_start_session_and_forwards_broadcasts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();

        let first = socket.next().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(first.to_text().unwrap()).unwrap();
        assert_eq!(value["type"], "START_SESSION");
        assert_eq!(value["platform"], "zoom");
        assert_eq!(
            value["config"]["meetingLink"].as_str(),
            Some("https://zoom.us/j/1")
        );
        assert!(value["sessionId"].as_str().is_some());

        let second = socket.next().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(second.to_text().unwrap()).unwrap();
        assert_eq!(value["type"], "TRANSCRIPTION");
        assert_eq!(value["text"], "What is your greatest strength?");

        socket
            .send(Message::Text(
                r#"{"type":"AI_RESPONSE","suggestions":[{"text":"lead with results","confidence":0.8}]}"#
                    .into(),
            ))
            .await
            .unwrap();

        while socket.next().await.is_some() {}
    });

    let manager = ConnectionManager::new(
        format!("ws://{addr}"),
        "zoom",
        PlatformConfig::with_meeting_link("https://zoom.us/j/1"),
    );
    let mut events = manager.subscribe();
    manager.connect().await;
    manager
        .send_transcription("What is your greatest strength?", None)
        .await
        .unwrap();

    match recv_event(&mut events, 5).await {
        ClientEvent::Suggestions(suggestions) => {
            assert_eq!(suggestions.len(), 1);
            assert_eq!(suggestions[0].text, "lead with results");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    manager.disconnect().await;
    server.abort();
}

#[tokio::test]
async fn reconnects_and_resends_start_after_unexpected_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        // first connection is dropped right after the session start arrives
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = socket.next().await;
        drop(socket);

        // the client comes back after one backoff period
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let first = socket.next().await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(first.to_text().unwrap()).unwrap();
        assert_eq!(value["type"], "START_SESSION");
        value["sessionId"].as_str().unwrap().to_string()
    });

    let manager = ConnectionManager::new(format!("ws://{addr}"), "zoom", PlatformConfig::default());
    manager.connect().await;

    let resent_session = tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .expect("no reconnect observed")
        .unwrap();
    assert_eq!(resent_session, manager.session_id());

    manager.disconnect().await;
}

#[tokio::test]
async fn manual_disconnect_suppresses_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (connected_tx, connected_rx) = tokio::sync::oneshot::channel();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = socket.next().await;
        connected_tx.send(()).ok();
        while socket.next().await.is_some() {}

        // a reconnect would show up as a second accept
        tokio::time::timeout(Duration::from_secs(3), listener.accept())
            .await
            .is_ok()
    });

    let manager = ConnectionManager::new(format!("ws://{addr}"), "zoom", PlatformConfig::default());
    manager.connect().await;
    connected_rx.await.unwrap();

    manager.disconnect().await;

    let reconnected = server.await.unwrap();
    assert!(!reconnected, "manual disconnect must not reconnect");
}
