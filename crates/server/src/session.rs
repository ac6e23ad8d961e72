//! WebSocket session lifecycle.
//!
//! One task per connection: validate the join, register with the room,
//! send the initial snapshot, then loop over outbound frames, inbound
//! frames and the liveness probe until the peer goes away. All document
//! semantics live in the sync engine and presence relay; this module only
//! owns the socket.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use coedit_protocol::{ClientMessage, ServerMessage};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppState;
use crate::registry::{ConnId, RoomMember, OUTBOUND_QUEUE_DEPTH};

/// Join parameters carried in the upgrade request's query string.
#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    #[serde(rename = "docId")]
    pub doc_id: Option<String>,
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connecting,
    Joined,
    Closed,
}

struct Session {
    conn_id: ConnId,
    doc_id: String,
    client_id: String,
    state: SessionState,
    last_seen: Instant,
}

impl Session {
    fn new(conn_id: ConnId, doc_id: String, client_id: String) -> Self {
        Self {
            conn_id,
            doc_id,
            client_id,
            state: SessionState::Connecting,
            last_seen: Instant::now(),
        }
    }

    /// Any inbound frame counts as proof of liveness.
    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }
}

/// Handle a WebSocket upgrade request.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<JoinQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query))
}

/// Drive an established connection until it closes.
async fn handle_socket(mut socket: WebSocket, state: AppState, query: JoinQuery) {
    // The upgrade has already succeeded, so a join without a document id is
    // rejected with a policy close frame rather than an HTTP status.
    let Some(doc_id) = query.doc_id.filter(|id| !id.is_empty()) else {
        warn!("rejecting join without docId");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: Utf8Bytes::from_static("docId required"),
            })))
            .await;
        return;
    };

    let client_id = query
        .client_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let conn_id = state.registry.allocate_conn_id();
    let mut session = Session::new(conn_id, doc_id, client_id);

    let (tx, mut rx) = mpsc::channel::<Utf8Bytes>(OUTBOUND_QUEUE_DEPTH);
    state
        .registry
        .join(
            &session.doc_id,
            conn_id,
            RoomMember::new(session.client_id.clone(), tx),
        )
        .await;

    // Initial snapshot. A document that has never been written joins as
    // ("", 0); a store failure degrades to the same so the room stays usable.
    let (content, version) = match state.store.load(&session.doc_id).await {
        Ok(Some(doc)) => (doc.content, doc.version),
        Ok(None) => (String::new(), 0),
        Err(e) => {
            warn!(doc_id = %session.doc_id, error = %e, "snapshot load failed, joining with empty state");
            (String::new(), 0)
        }
    };
    if send_message(&mut socket, &ServerMessage::Init { content, version })
        .await
        .is_err()
    {
        finish(&state, &mut session).await;
        return;
    }
    session.state = SessionState::Joined;
    info!(conn_id, doc_id = %session.doc_id, client_id = %session.client_id, "session joined");

    let liveness_timeout = state.config.liveness_timeout();
    let mut probe = interval(state.config.probe_interval);
    probe.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Frames queued by the registry (broadcasts from other sessions).
            Some(frame) = rx.recv() => {
                if let Err(e) = socket.send(Message::Text(frame)).await {
                    debug!(conn_id, "outbound send failed: {}", e);
                    break;
                }
            }

            // Liveness probe: reap the session if the client has been silent
            // past the tolerance, otherwise ping it.
            _ = probe.tick() => {
                if session.last_seen.elapsed() > liveness_timeout {
                    warn!(conn_id, doc_id = %session.doc_id, "no activity for {:?}, reaping session", liveness_timeout);
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                if let Err(e) = socket.send(Message::Ping(Bytes::new())).await {
                    debug!(conn_id, "ping failed: {}", e);
                    break;
                }
            }

            // Inbound frames from this client.
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        session.touch();
                        dispatch(&state, &session, text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        session.touch();
                        match std::str::from_utf8(&data) {
                            Ok(text) => dispatch(&state, &session, text).await,
                            Err(_) => debug!(conn_id, "dropping non-utf8 binary frame"),
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        session.touch();
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(conn_id, "client closed");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(conn_id, "socket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    finish(&state, &mut session).await;
}

/// Route one raw frame. Malformed payloads are logged and dropped; the
/// session itself stays up.
async fn dispatch(state: &AppState, session: &Session, raw: &str) {
    let message: ClientMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(e) => {
            warn!(conn_id = session.conn_id, error = %e, "dropping malformed frame");
            return;
        }
    };

    match message {
        ClientMessage::Change { content } => {
            if let Err(e) = state
                .engine
                .apply_change(&session.doc_id, content, &session.client_id, session.conn_id)
                .await
            {
                warn!(doc_id = %session.doc_id, error = %e, "dropping change, persistence failed");
            }
        }
        ClientMessage::Cursor { cursor } => {
            state
                .presence
                .relay(&session.doc_id, &session.client_id, session.conn_id, cursor)
                .await;
        }
        ClientMessage::Ping {} => {
            // Liveness was already recorded on receipt; no reply.
        }
    }
}

/// Leave the room and mark the session closed. Idempotent: both the error
/// path and the loop exit may land here.
async fn finish(state: &AppState, session: &mut Session) {
    if session.state == SessionState::Closed {
        return;
    }
    session.state = SessionState::Closed;
    state.registry.leave(&session.doc_id, session.conn_id).await;
    info!(conn_id = session.conn_id, doc_id = %session.doc_id, "session closed");
}

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}
