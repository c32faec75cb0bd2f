//! Document DataLoader for batched id lookups.
//!
//! Requests for documents by (collection, id) accumulated within one
//! execution collapse into a single `$in` query per collection, so
//! `findByIds` and nested reference fields stay one storage round trip.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::Loader;
use docgraph_storage::{DocumentStore, DynStore, FindOptions};
use serde_json::{Value, json};
use tracing::{debug, instrument, trace};

use crate::error::OperationError;

/// Key for looking up a document by collection and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    /// The storage collection.
    pub collection: String,
    /// The document id.
    pub id: String,
}

impl DocumentKey {
    /// Creates a new document key.
    #[must_use]
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// DataLoader for fetching documents by (collection, id) pairs.
pub struct DocumentLoader {
    store: DynStore,
}

impl DocumentLoader {
    /// Creates a new document loader.
    #[must_use]
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }
}

impl Loader<DocumentKey> for DocumentLoader {
    type Value = Value;
    type Error = Arc<OperationError>;

    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn load(
        &self,
        keys: &[DocumentKey],
    ) -> Result<HashMap<DocumentKey, Self::Value>, Self::Error> {
        debug!(key_count = keys.len(), "Loading document batch");

        // One $in query per collection.
        let mut by_collection: HashMap<&str, Vec<&str>> = HashMap::new();
        for key in keys {
            by_collection
                .entry(&key.collection)
                .or_default()
                .push(&key.id);
        }

        let mut results: HashMap<DocumentKey, Value> = HashMap::with_capacity(keys.len());
        for (collection, ids) in by_collection {
            trace!(collection = %collection, count = ids.len(), "Fetching collection batch");
            let query = json!({ "_id": { "$in": ids } });
            let docs = self
                .store
                .find_many(collection, &query, &FindOptions::default())
                .await
                .map_err(|e| Arc::new(OperationError::from(e)))?;

            for doc in docs {
                if let Some(id) = doc.get("_id").and_then(Value::as_str) {
                    results.insert(DocumentKey::new(collection, id), doc);
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use docgraph_storage::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_batch_load_keyed_by_id() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let a = store
            .insert_one("users", &json!({"name": "a"}))
            .await
            .unwrap();
        let b = store
            .insert_one("users", &json!({"name": "b"}))
            .await
            .unwrap();
        let a_id = a["_id"].as_str().unwrap().to_string();
        let b_id = b["_id"].as_str().unwrap().to_string();

        let loader = DocumentLoader::new(store);
        let keys = vec![
            DocumentKey::new("users", &a_id),
            DocumentKey::new("users", &b_id),
            DocumentKey::new("users", "ffffffffffffffffffffffff"),
        ];
        let loaded = loader.load(&keys).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[&keys[0]]["name"], "a");
        assert_eq!(loaded[&keys[1]]["name"], "b");
        assert!(!loaded.contains_key(&keys[2]));
    }
}
