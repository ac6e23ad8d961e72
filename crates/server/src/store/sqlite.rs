//! SQLite-backed document store.
//!
//! One table, whole-row writes. `upsert` is the serialization point for
//! concurrent writers: SQLite applies the statements in some order and each
//! caller gets back the row its own write produced.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coedit_protocol::Document;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::{DocumentStore, StoreError};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                version INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        info!("[Store] SQLite ready at {:?}", path);
        Ok(Self { pool })
    }
}

type DocumentRow = (String, String, String, i64, String);

fn row_into_document(row: DocumentRow) -> Document {
    let (id, title, content, version, updated_at) = row;
    Document {
        id,
        title,
        content,
        version,
        updated_at: updated_at.parse().unwrap_or_else(|_| Utc::now()),
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn load(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT id, title, content, version, updated_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_into_document))
    }

    async fn upsert(
        &self,
        id: &str,
        content: &str,
        version: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<Document, StoreError> {
        // A row created by the upsert itself gets the default title; an
        // existing row keeps whatever title it was created with.
        let row: DocumentRow = sqlx::query_as(
            r#"
            INSERT INTO documents (id, title, content, version, updated_at)
            VALUES (?, 'Untitled', ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                version = excluded.version,
                updated_at = excluded.updated_at
            RETURNING id, title, content, version, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(version)
        .bind(updated_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(row_into_document(row))
    }

    async fn create(&self, title: &str) -> Result<Document, StoreError> {
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: String::new(),
            version: 0,
            updated_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO documents (id, title, content, version, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&doc.id)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(doc.version)
        .bind(doc.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> SqliteStore {
        SqliteStore::open(&dir.path().join("docs.sqlite"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_creates_row_with_default_title() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        let stored = store.upsert("d1", "hello", 1, Utc::now()).await.unwrap();
        assert_eq!(stored.id, "d1");
        assert_eq!(stored.title, "Untitled");
        assert_eq!(stored.content, "hello");
        assert_eq!(stored.version, 1);

        let loaded = store.load("d1").await.unwrap().unwrap();
        assert_eq!(loaded.content, "hello");
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_and_preserves_title() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        let doc = store.create("Meeting Notes").await.unwrap();
        assert_eq!(doc.content, "");
        assert_eq!(doc.version, 0);

        let stored = store.upsert(&doc.id, "agenda", 1, Utc::now()).await.unwrap();
        assert_eq!(stored.title, "Meeting Notes");
        assert_eq!(stored.content, "agenda");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs.sqlite");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            store.upsert("d1", "persisted", 3, Utc::now()).await.unwrap();
        }

        let store = SqliteStore::open(&path).await.unwrap();
        let loaded = store.load("d1").await.unwrap().unwrap();
        assert_eq!(loaded.content, "persisted");
        assert_eq!(loaded.version, 3);
    }
}
