//! Wire protocol for coedit realtime document sync.
//!
//! Messages are internally-tagged JSON enums (`{"type": "change", ...}`),
//! split into client-to-server and server-to-client directions. Field names
//! are camelCase on the wire and timestamps travel as epoch milliseconds,
//! matching what browser clients already speak. Treat the shapes here as
//! frozen: additive changes only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted document row as exposed over the REST surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub version: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Messages sent from an editor client to the server.
///
/// Browser clients also include a `from` field on `change`; the server
/// identifies the sender from the connection instead, so the field is
/// accepted and ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Full replacement text for the document, sent after a local quiet
    /// period. No diffs: the payload is the whole buffer.
    Change { content: String },

    /// Ephemeral cursor/selection state, relayed to the rest of the room
    /// without validation or persistence.
    Cursor {
        #[serde(default)]
        cursor: serde_json::Value,
    },

    /// Application-level keep-alive. The server treats it as proof of
    /// liveness and sends no reply.
    Ping {},
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Messages sent from the server to connected editor clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Initial snapshot, sent exactly once right after a join is accepted.
    /// A document that has never been written is `("", 0)`.
    Init { content: String, version: i64 },

    /// Canonical post-write state fanned out to every room member except
    /// the originator. Carries whatever the store returned, not what the
    /// client sent.
    #[serde(rename_all = "camelCase")]
    Change {
        from: String,
        content: String,
        version: i64,
        #[serde(with = "chrono::serde::ts_milliseconds")]
        updated_at: DateTime<Utc>,
    },

    /// Relayed presence signal from another room member.
    Cursor {
        from: String,
        cursor: serde_json::Value,
    },
}
