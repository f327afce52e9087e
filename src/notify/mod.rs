mod local;

pub use local::LocalHub;

use serde::Serialize;
use tokio::sync::broadcast;

/// Envelope pushed to every socket of a session after a mutating file
/// operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PushEvent {
    #[serde(rename = "file.list")]
    FileList {
        #[serde(rename = "filesList")]
        files_list: Vec<serde_json::Value>,
    },
}

/// Per-session fan-out of file-set change events.
///
/// Delivery is fire-and-forget, at-most-once: broadcasting to a session
/// with no subscribers is a no-op, and closed or lagging receivers are
/// silently skipped. Callers must only broadcast after the database write
/// that produced the advertised state has committed.
///
/// The in-process [`LocalHub`] is the single-instance backend; a
/// multi-instance deployment swaps in a brokered implementation behind this
/// same contract.
pub trait NotificationHub: Send + Sync {
    /// Register a listener for a session's events. The subscription ends
    /// when the returned receiver is dropped; stale channels are pruned on
    /// the next broadcast.
    fn subscribe(&self, session_id: &str) -> broadcast::Receiver<String>;

    /// Serialize the event once and deliver it to every open channel of the
    /// session.
    fn broadcast(&self, session_id: &str, event: &PushEvent);
}
