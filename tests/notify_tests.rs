use file_vault::notify::{LocalHub, NotificationHub, PushEvent};

fn file_list_event(names: &[&str]) -> PushEvent {
    PushEvent::FileList {
        files_list: names
            .iter()
            .map(|n| serde_json::json!({ "original_name": n }))
            .collect(),
    }
}

#[tokio::test]
async fn test_broadcast_reaches_subscriber() {
    let hub = LocalHub::new();
    let mut rx = hub.subscribe("sess-1");

    hub.broadcast("sess-1", &file_list_event(&["a.txt"]));

    let payload = rx.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(parsed["type"], "file.list");
    assert_eq!(parsed["filesList"][0]["original_name"], "a.txt");
}

#[tokio::test]
async fn test_broadcast_reaches_every_channel_of_session() {
    let hub = LocalHub::new();
    let mut rx_a = hub.subscribe("sess-1");
    let mut rx_b = hub.subscribe("sess-1");

    hub.broadcast("sess-1", &file_list_event(&["a.txt", "b.txt"]));

    assert!(rx_a.recv().await.is_ok());
    assert!(rx_b.recv().await.is_ok());
}

#[tokio::test]
async fn test_broadcast_does_not_cross_sessions() {
    let hub = LocalHub::new();
    let mut acting = hub.subscribe("sess-1");
    let mut other = hub.subscribe("sess-2");

    hub.broadcast("sess-1", &file_list_event(&["a.txt"]));

    assert!(acting.try_recv().is_ok());
    assert!(other.try_recv().is_err());
}

#[tokio::test]
async fn test_broadcast_without_subscribers_is_noop() {
    let hub = LocalHub::new();
    // Nothing registered for this session; must not panic or block
    hub.broadcast("sess-ghost", &file_list_event(&["a.txt"]));
}

#[tokio::test]
async fn test_dropped_receiver_is_pruned() {
    let hub = LocalHub::new();
    let rx = hub.subscribe("sess-1");
    drop(rx);

    // First broadcast after the drop finds no receivers and prunes the entry
    hub.broadcast("sess-1", &file_list_event(&["a.txt"]));

    // A fresh subscription on the same session works again
    let mut rx = hub.subscribe("sess-1");
    hub.broadcast("sess-1", &file_list_event(&["b.txt"]));
    let payload = rx.recv().await.unwrap();
    assert!(payload.contains("b.txt"));
}

#[tokio::test]
async fn test_events_arrive_in_order() {
    let hub = LocalHub::new();
    let mut rx = hub.subscribe("sess-1");

    hub.broadcast("sess-1", &file_list_event(&["first.txt"]));
    hub.broadcast("sess-1", &file_list_event(&["first.txt", "second.txt"]));

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert!(!first.contains("second.txt"));
    assert!(second.contains("second.txt"));
}
