//! In-process document store used for dry runs and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::application::repos::{DocumentStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<(String, String), Value>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Raw stored document, bypassing the cache record layout.
    pub fn document(&self, collection: &str, key: &str) -> Option<Value> {
        self.documents
            .get(&(collection.to_string(), key.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Keys of one collection, sorted.
    pub fn keys(&self, collection: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.document(collection, key))
    }

    async fn put(&self, collection: &str, key: &str, document: Value) -> Result<(), StoreError> {
        self.documents
            .insert((collection.to_string(), key.to_string()), document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = InMemoryDocumentStore::new();
        store.put("a", "k", json!(1)).await.expect("put");
        store.put("b", "k", json!(2)).await.expect("put");

        assert_eq!(store.get("a", "k").await.expect("get"), Some(json!(1)));
        assert_eq!(store.get("b", "k").await.expect("get"), Some(json!(2)));
        assert_eq!(store.get("c", "k").await.expect("get"), None);
        assert_eq!(store.keys("a"), vec!["k".to_string()]);
        assert_eq!(store.len(), 2);
    }
}
