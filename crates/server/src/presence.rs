//! Presence relay: ephemeral cursor/selection fanout.
//!
//! Nothing here touches the store. Cursor payloads are opaque JSON relayed
//! to the rest of the room and lost on disconnect; late joiners learn about
//! a peer the next time that peer moves.

use std::sync::Arc;

use coedit_protocol::ServerMessage;
use tracing::trace;

use crate::registry::{ConnId, RoomRegistry};

pub struct PresenceRelay {
    registry: Arc<RoomRegistry>,
}

impl PresenceRelay {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Rebroadcast a cursor signal to everyone else in the room, tagged with
    /// the sender's client id. The payload is passed through untouched.
    pub async fn relay(&self, doc_id: &str, from: &str, origin: ConnId, cursor: serde_json::Value) {
        let message = ServerMessage::Cursor {
            from: from.to_string(),
            cursor,
        };
        let delivered = self.registry.broadcast(doc_id, &message, origin).await;
        trace!(doc_id, delivered, "relayed cursor");
    }
}
