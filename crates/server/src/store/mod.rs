//! Document persistence.
//!
//! The rest of the server only sees the [`DocumentStore`] trait: load a row,
//! upsert a row, create a row. SQLite backs the real server; the in-memory
//! store backs tests and ephemeral runs.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coedit_protocol::Document;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage contract for document rows.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id. `None` when the row has never been written.
    async fn load(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write the full row for `id`, creating it if absent, and return the
    /// row as stored. Whatever comes back is what callers must treat as
    /// canonical, even if a racing writer got in between.
    async fn upsert(
        &self,
        id: &str,
        content: &str,
        version: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<Document, StoreError>;

    /// Create a fresh empty document with a generated id.
    async fn create(&self, title: &str) -> Result<Document, StoreError>;
}
