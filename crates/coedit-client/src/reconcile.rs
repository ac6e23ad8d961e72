//! Local mirror of the shared document and reconciliation of remote frames.
//!
//! The server fans out whole-document replacements, so reconciliation is
//! not a merge: a remote change either replaces the buffer or is ignored.
//! Selections survive a replacement positionally, clamped to the new text.

/// A selection (or caret, when collapsed) as char offsets into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// A collapsed selection at one offset.
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

/// Map a selection across a whole-buffer replacement. Offsets keep their
/// numeric position and clamp to the end of the new text. The mapping is
/// positional, not content-aware, so a concurrent edit near the caret can
/// still nudge it visibly.
pub fn map_selection(selection: Selection, new_content: &str) -> Selection {
    let len = new_content.chars().count();
    Selection {
        start: selection.start.min(len),
        end: selection.end.min(len),
    }
}

/// What a remote change frame did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// Our own edit came back; ignored entirely, version untouched.
    Echo,
    /// Version bookkeeping advanced but the text already matched.
    Noop,
    /// The buffer was replaced; live selections need remapping.
    Replaced,
}

/// The client's view of one document.
pub struct DocumentMirror {
    client_id: String,
    content: String,
    version: i64,
}

impl DocumentMirror {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            content: String::new(),
            version: 0,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Replace everything with an authoritative snapshot. Runs on every
    /// connect, so a reconnect discards whatever the local buffer drifted to.
    pub fn apply_init(&mut self, content: String, version: i64) {
        self.content = content;
        self.version = version;
    }

    /// Record a local edit. Versions only move on server frames.
    pub fn record_local_edit(&mut self, content: String) {
        self.content = content;
    }

    /// Reconcile a remote change frame against the local buffer.
    pub fn apply_remote_change(&mut self, from: &str, content: &str, version: i64) -> RemoteOutcome {
        if from == self.client_id {
            return RemoteOutcome::Echo;
        }

        self.version = version;
        if self.content == content {
            return RemoteOutcome::Noop;
        }

        self.content = content.to_string();
        RemoteOutcome::Replaced
    }
}
