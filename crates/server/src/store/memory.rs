//! In-memory document store for tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coedit_protocol::Document;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn upsert(
        &self,
        id: &str,
        content: &str,
        version: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<Document, StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .entry(id.to_string())
            .and_modify(|doc| {
                doc.content = content.to_string();
                doc.version = version;
                doc.updated_at = updated_at;
            })
            .or_insert_with(|| Document {
                id: id.to_string(),
                title: "Untitled".to_string(),
                content: content.to_string(),
                version,
                updated_at,
            });

        Ok(doc.clone())
    }

    async fn create(&self, title: &str) -> Result<Document, StoreError> {
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: String::new(),
            version: 0,
            updated_at: Utc::now(),
        };

        self.docs.write().await.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_then_load() {
        let store = MemoryStore::new();

        store.upsert("d1", "hello", 1, Utc::now()).await.unwrap();
        let loaded = store.load("d1").await.unwrap().unwrap();
        assert_eq!(loaded.content, "hello");
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_create_generates_distinct_ids() {
        let store = MemoryStore::new();

        let a = store.create("A").await.unwrap();
        let b = store.create("B").await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.version, 0);
        assert_eq!(a.content, "");
    }
}
