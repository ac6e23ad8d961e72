//! Connection registry: which live connections belong to which document.
//!
//! Rooms are created implicitly by the first join and removed by the last
//! leave, so the map never accumulates empty entries. All operations take a
//! consistent snapshot under one lock and never await while holding it;
//! actual frame delivery happens on each member's outbound queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Utf8Bytes;
use coedit_protocol::ServerMessage;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error};

/// Per-process connection identifier. Distinct from the client id: two
/// browser tabs may share a client id but never a connection id.
pub type ConnId = u64;

/// Outbound frames are queued per connection; a member that falls this far
/// behind gets skipped rather than stalling the room.
pub const OUTBOUND_QUEUE_DEPTH: usize = 256;

/// A registered connection inside a room.
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub client_id: String,
    sender: mpsc::Sender<Utf8Bytes>,
}

impl RoomMember {
    pub fn new(client_id: String, sender: mpsc::Sender<Utf8Bytes>) -> Self {
        Self { client_id, sender }
    }
}

pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, HashMap<ConnId, RoomMember>>>,
    next_conn_id: AtomicU64,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Hand out a fresh connection id. Never reused within a process.
    pub fn allocate_conn_id(&self) -> ConnId {
        self.next_conn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Add a connection to a document's room, creating the room on first join.
    pub async fn join(&self, doc_id: &str, conn_id: ConnId, member: RoomMember) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(doc_id.to_string()).or_default().insert(conn_id, member);
        debug!(doc_id, conn_id, members = rooms[doc_id].len(), "joined room");
    }

    /// Remove a connection. Dropping the last member removes the room
    /// entirely. Unknown rooms and already-removed members are no-ops, so
    /// calling this twice on teardown is harmless.
    pub async fn leave(&self, doc_id: &str, conn_id: ConnId) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(doc_id) {
            if let Some(member) = members.remove(&conn_id) {
                debug!(doc_id, conn_id, client_id = %member.client_id, "left room");
            }
            if members.is_empty() {
                rooms.remove(doc_id);
                debug!(doc_id, "room empty, removed");
            }
        }
    }

    /// Serialize `message` once and queue it to every room member except
    /// `exclude`. Members whose queue is full or closed are skipped; their
    /// own session loop notices the dead socket and cleans up. Returns how
    /// many members accepted the frame.
    pub async fn broadcast(&self, doc_id: &str, message: &ServerMessage, exclude: ConnId) -> usize {
        let frame: Utf8Bytes = match serde_json::to_string(message) {
            Ok(json) => json.into(),
            Err(e) => {
                error!(doc_id, error = %e, "failed to encode broadcast frame");
                return 0;
            }
        };

        let targets: Vec<(ConnId, mpsc::Sender<Utf8Bytes>)> = {
            let rooms = self.rooms.read().await;
            match rooms.get(doc_id) {
                Some(members) => members
                    .iter()
                    .filter(|(id, _)| **id != exclude)
                    .map(|(id, member)| (*id, member.sender.clone()))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (conn_id, sender) in targets {
            if sender.try_send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(doc_id, conn_id, "skipping unwritable room member");
            }
        }
        delivered
    }

    /// Number of connections currently in a room (0 if it does not exist).
    pub async fn room_size(&self, doc_id: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(doc_id)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    /// Whether a room currently exists at all.
    pub async fn contains(&self, doc_id: &str) -> bool {
        self.rooms.read().await.contains_key(doc_id)
    }
}
