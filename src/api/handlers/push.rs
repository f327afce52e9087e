//! Push-channel upgrade and connection handling.

use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::api::response::AppQuery;
use crate::AppState;

/// Close code sent when the client omits the session id (policy violation).
const CLOSE_POLICY_VIOLATION: u16 = 1008;

#[derive(Debug, Deserialize)]
pub struct PushQuery {
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

pub async fn push_channel(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PushQuery>,
) -> Response {
    ws.on_upgrade(move |socket| push_connection(socket, state, query.session_id))
}

async fn push_connection(mut socket: WebSocket, state: Arc<AppState>, session_id: Option<String>) {
    let session_id = match session_id {
        Some(id) if !id.is_empty() => id,
        _ => {
            let _ = socket
                .send(WsMessage::Close(Some(CloseFrame {
                    code: CLOSE_POLICY_VIOLATION,
                    reason: "sessionId required".into(),
                })))
                .await;
            return;
        }
    };

    let mut rx = state.hub.subscribe(&session_id);
    tracing::debug!(session_id = %session_id, "Push channel opened");

    loop {
        tokio::select! {
            // Forward file-set events to the client
            result = rx.recv() => {
                match result {
                    Ok(payload) => {
                        if socket.send(WsMessage::Text(payload)).await.is_err() {
                            break; // client disconnected
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // At-most-once delivery: skipped events are gone.
                        tracing::debug!(session_id = %session_id, skipped = n, "Push channel lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // No client-to-server messages are defined on this channel
            msg = socket.recv() => {
                match msg {
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = socket.send(WsMessage::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::debug!(session_id = %session_id, "Push channel closed");
}
