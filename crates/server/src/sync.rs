//! Last-write-wins sync engine.
//!
//! Every accepted edit replaces the whole document body. The version number
//! is bookkeeping, not concurrency control: the engine reads the current
//! version only to pick a candidate, and the row returned by the store's
//! upsert is what actually gets persisted and fanned out. Two racing writers
//! therefore converge on whichever write the store applied last, never on a
//! merge of the two.

use std::sync::Arc;

use chrono::Utc;
use coedit_protocol::{Document, ServerMessage};
use tracing::debug;

use crate::registry::{ConnId, RoomRegistry};
use crate::store::{DocumentStore, StoreError};

pub struct SyncEngine {
    store: Arc<dyn DocumentStore>,
    registry: Arc<RoomRegistry>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn DocumentStore>, registry: Arc<RoomRegistry>) -> Self {
        Self { store, registry }
    }

    /// Persist a full-content change and fan the stored row out to the rest
    /// of the room. `from` names the editing client in the outgoing frames;
    /// `origin` is the connection that must not receive its own edit back.
    pub async fn apply_change(
        &self,
        doc_id: &str,
        content: String,
        from: &str,
        origin: ConnId,
    ) -> Result<Document, StoreError> {
        let current_version = match self.store.load(doc_id).await? {
            Some(doc) => doc.version,
            None => 0,
        };

        // Advisory read: a racing writer may bump the row between the load
        // and the upsert. The upsert's returned row wins either way.
        let candidate = current_version + 1;
        let stored = self
            .store
            .upsert(doc_id, &content, candidate, Utc::now())
            .await?;

        let message = ServerMessage::Change {
            from: from.to_string(),
            content: stored.content.clone(),
            version: stored.version,
            updated_at: stored.updated_at,
        };
        let delivered = self.registry.broadcast(doc_id, &message, origin).await;
        debug!(doc_id, version = stored.version, delivered, "change persisted and fanned out");

        Ok(stored)
    }
}
