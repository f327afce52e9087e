use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use super::{NotificationHub, PushEvent};

/// Buffered events per session channel; a receiver that falls further
/// behind starts losing events, which at-most-once delivery permits.
const CHANNEL_CAPACITY: usize = 64;

/// In-process notification hub: one broadcast channel per session id.
///
/// The registry is rebuilt empty on process restart; existing push
/// connections are lost and clients reconnect.
pub struct LocalHub {
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub for LocalHub {
    fn subscribe(&self, session_id: &str) -> broadcast::Receiver<String> {
        let mut channels = self.channels.lock().expect("hub lock poisoned");
        channels
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn broadcast(&self, session_id: &str, event: &PushEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize push event");
                return;
            }
        };

        let mut channels = self.channels.lock().expect("hub lock poisoned");
        if let Some(tx) = channels.get(session_id) {
            // Send fails only when every receiver is gone; prune the entry.
            if tx.send(payload).is_err() {
                channels.remove(session_id);
            }
        }
    }
}
