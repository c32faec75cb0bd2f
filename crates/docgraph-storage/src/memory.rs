//! In-memory document store.
//!
//! `MemoryStore` keeps per-collection ordered maps of documents behind an
//! `RwLock`. It exists for tests and demos; it implements the full
//! [`DocumentStore`] contract including unique-index enforcement so the
//! GraphQL layer's duplicate-key handling can be exercised without a real
//! database.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use crate::error::StorageError;
use crate::query;
use crate::traits::DocumentStore;
use crate::types::FindOptions;

type Collection = IndexMap<String, Value>;

/// In-memory [`DocumentStore`] backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    unique_indexes: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unique index on a path of a collection. Inserts and
    /// updates violating it fail with `StorageError::DuplicateKey`.
    pub fn ensure_unique_index(&self, collection: &str, path: &str) {
        let mut indexes = self.unique_indexes.write().expect("lock poisoned");
        let paths = indexes.entry(collection.to_string()).or_default();
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    }

    /// Generates a 24-hex-char document id.
    fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()[..24].to_string()
    }

    fn check_unique(
        &self,
        collection_name: &str,
        collection: &Collection,
        doc: &Value,
        skip_id: Option<&str>,
    ) -> Result<(), StorageError> {
        let indexes = self.unique_indexes.read().expect("lock poisoned");
        let Some(paths) = indexes.get(collection_name) else {
            return Ok(());
        };
        for path in paths {
            let Some(candidate) = lookup(doc, path) else {
                continue;
            };
            for (id, existing) in collection {
                if skip_id == Some(id.as_str()) {
                    continue;
                }
                if lookup(existing, path) == Some(candidate) {
                    return Err(StorageError::duplicate_key(collection_name, path.clone()));
                }
            }
        }
        Ok(())
    }

    fn matching_ids(
        collection: &Collection,
        query_doc: &Value,
    ) -> Result<Vec<String>, StorageError> {
        let mut ids = Vec::new();
        for (id, doc) in collection {
            if query::matches(doc, query_doc)? {
                ids.push(id.clone());
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: &str,
        query_doc: &Value,
    ) -> Result<Option<Value>, StorageError> {
        let collections = self.collections.read().expect("lock poisoned");
        let Some(docs) = collections.get(collection) else {
            return Ok(None);
        };
        for doc in docs.values() {
            if query::matches(doc, query_doc)? {
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn find_many(
        &self,
        collection: &str,
        query_doc: &Value,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StorageError> {
        let collections = self.collections.read().expect("lock poisoned");
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched = Vec::new();
        for doc in docs.values() {
            if query::matches(doc, query_doc)? {
                matched.push(doc.clone());
            }
        }
        drop(collections);

        if let Some(sort) = &options.sort {
            query::sort_documents(&mut matched, sort);
        }
        let skip = options.skip.unwrap_or(0) as usize;
        let matched: Vec<Value> = matched.into_iter().skip(skip).collect();
        let matched: Vec<Value> = match options.limit {
            Some(limit) => matched.into_iter().take(limit as usize).collect(),
            None => matched,
        };

        trace!(collection, count = matched.len(), "find_many");
        Ok(matched
            .iter()
            .map(|doc| query::apply_projection(doc, &options.projection))
            .collect())
    }

    async fn count(&self, collection: &str, query_doc: &Value) -> Result<u64, StorageError> {
        let collections = self.collections.read().expect("lock poisoned");
        let Some(docs) = collections.get(collection) else {
            return Ok(0);
        };
        let mut count = 0;
        for doc in docs.values() {
            if query::matches(doc, query_doc)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn insert_one(&self, collection: &str, doc: &Value) -> Result<Value, StorageError> {
        let mut stored = doc.clone();
        let id = match stored.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Self::generate_id();
                if let Some(obj) = stored.as_object_mut() {
                    obj.insert("_id".to_string(), Value::String(id.clone()));
                }
                id
            }
        };

        let mut collections = self.collections.write().expect("lock poisoned");
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StorageError::duplicate_key(collection, "_id"));
        }
        self.check_unique(collection, docs, &stored, None)?;
        docs.insert(id, stored.clone());
        trace!(collection, "insert_one");
        Ok(stored)
    }

    async fn insert_many(
        &self,
        collection: &str,
        docs: &[Value],
    ) -> Result<Vec<Value>, StorageError> {
        let mut prepared = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut stored = doc.clone();
            if stored.get("_id").is_none()
                && let Some(obj) = stored.as_object_mut()
            {
                obj.insert("_id".to_string(), Value::String(Self::generate_id()));
            }
            prepared.push(stored);
        }

        let mut collections = self.collections.write().expect("lock poisoned");
        let existing = collections.entry(collection.to_string()).or_default();

        // Validate the whole batch before touching the collection.
        let mut staged = existing.clone();
        for stored in &prepared {
            let id = stored
                .get("_id")
                .and_then(Value::as_str)
                .ok_or_else(|| StorageError::internal("document _id must be a string"))?;
            if staged.contains_key(id) {
                return Err(StorageError::duplicate_key(collection, "_id"));
            }
            self.check_unique(collection, &staged, stored, None)?;
            staged.insert(id.to_string(), stored.clone());
        }
        *existing = staged;
        trace!(collection, count = prepared.len(), "insert_many");
        Ok(prepared)
    }

    async fn update_one(
        &self,
        collection: &str,
        query_doc: &Value,
        update: &Value,
    ) -> Result<Option<Value>, StorageError> {
        let mut collections = self.collections.write().expect("lock poisoned");
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(id) = Self::matching_ids(docs, query_doc)?.into_iter().next() else {
            return Ok(None);
        };

        let mut updated = docs.get(&id).cloned().expect("id just matched");
        apply_update(&mut updated, update)?;
        self.check_unique(collection, docs, &updated, Some(&id))?;
        docs.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn update_many(
        &self,
        collection: &str,
        query_doc: &Value,
        update: &Value,
    ) -> Result<u64, StorageError> {
        let mut collections = self.collections.write().expect("lock poisoned");
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let ids = Self::matching_ids(docs, query_doc)?;
        for id in &ids {
            let mut updated = docs.get(id).cloned().expect("id just matched");
            apply_update(&mut updated, update)?;
            self.check_unique(collection, docs, &updated, Some(id))?;
            docs.insert(id.clone(), updated);
        }
        Ok(ids.len() as u64)
    }

    async fn delete_one(
        &self,
        collection: &str,
        query_doc: &Value,
    ) -> Result<Option<Value>, StorageError> {
        let mut collections = self.collections.write().expect("lock poisoned");
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(id) = Self::matching_ids(docs, query_doc)?.into_iter().next() else {
            return Ok(None);
        };
        Ok(docs.shift_remove(&id))
    }

    async fn delete_many(&self, collection: &str, query_doc: &Value) -> Result<u64, StorageError> {
        let mut collections = self.collections.write().expect("lock poisoned");
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let ids = Self::matching_ids(docs, query_doc)?;
        for id in &ids {
            docs.shift_remove(id);
        }
        Ok(ids.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Applies a `$set`-style update. A bare object (no `$set` key) is treated as
/// a `$set` of its entries.
fn apply_update(doc: &mut Value, update: &Value) -> Result<(), StorageError> {
    let Some(update_obj) = update.as_object() else {
        return Err(StorageError::invalid_query("update must be an object"));
    };
    let entries = match update_obj.get("$set") {
        Some(set) => set
            .as_object()
            .ok_or_else(|| StorageError::invalid_query("$set must be an object"))?,
        None => update_obj,
    };
    for (path, value) in entries {
        if path.starts_with('$') {
            return Err(StorageError::invalid_query(format!(
                "unsupported update operator: {path}"
            )));
        }
        set_path(doc, path, value.clone());
    }
    Ok(())
}

/// Sets a dotted path inside a document, creating intermediate objects.
fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut current = doc;
    let segments: Vec<&str> = path.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let obj = current.as_object_mut().expect("just ensured object");
        if i == segments.len() - 1 {
            obj.insert((*segment).to_string(), value);
            return;
        }
        current = obj
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{Projection, SortOrder, SortSpec};

    #[tokio::test]
    async fn test_insert_generates_id() {
        let store = MemoryStore::new();
        let stored = store
            .insert_one("users", &json!({"name": "Ada"}))
            .await
            .unwrap();
        let id = stored["_id"].as_str().unwrap();
        assert_eq!(id.len(), 24);
    }

    #[tokio::test]
    async fn test_find_roundtrip() {
        let store = MemoryStore::new();
        store
            .insert_one("users", &json!({"name": "Ada", "age": 36}))
            .await
            .unwrap();
        store
            .insert_one("users", &json!({"name": "Bob", "age": 20}))
            .await
            .unwrap();

        let found = store
            .find_one("users", &json!({"age": {"$gt": 30}}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["name"], "Ada");

        assert_eq!(store.count("users", &json!({})).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_many_sort_skip_limit() {
        let store = MemoryStore::new();
        for (name, age) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            store
                .insert_one("users", &json!({"name": name, "age": age}))
                .await
                .unwrap();
        }

        let mut sort = SortSpec::new();
        sort.insert("age".to_string(), SortOrder::Descending);
        let opts = FindOptions {
            sort: Some(sort),
            skip: Some(1),
            limit: Some(2),
            projection: Projection::All,
        };
        let found = store.find_many("users", &json!({}), &opts).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["age"], 3);
        assert_eq!(found[1]["age"], 2);
    }

    #[tokio::test]
    async fn test_projection_applied() {
        let store = MemoryStore::new();
        store
            .insert_one("users", &json!({"name": "Ada", "age": 36}))
            .await
            .unwrap();
        let opts = FindOptions {
            projection: Projection::Fields(vec!["name".into()]),
            ..Default::default()
        };
        let found = store.find_many("users", &json!({}), &opts).await.unwrap();
        assert!(found[0].get("age").is_none());
        assert!(found[0].get("name").is_some());
        assert!(found[0].get("_id").is_some());
    }

    #[tokio::test]
    async fn test_update_one_sets_fields() {
        let store = MemoryStore::new();
        store
            .insert_one("users", &json!({"name": "Ada", "age": 36}))
            .await
            .unwrap();

        let updated = store
            .update_one("users", &json!({"name": "Ada"}), &json!({"$set": {"age": 37}}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["age"], 37);
        assert_eq!(updated["name"], "Ada");
    }

    #[tokio::test]
    async fn test_update_dotted_path() {
        let store = MemoryStore::new();
        store
            .insert_one("users", &json!({"name": "Ada"}))
            .await
            .unwrap();
        let updated = store
            .update_one(
                "users",
                &json!({"name": "Ada"}),
                &json!({"address.city": "London"}),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["address"]["city"], "London");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.insert_one("users", &json!({"name": "Ada"})).await.unwrap();
        store.insert_one("users", &json!({"name": "Bob"})).await.unwrap();

        let removed = store
            .delete_one("users", &json!({"name": "Ada"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(removed["name"], "Ada");
        assert_eq!(store.count("users", &json!({})).await.unwrap(), 1);

        let count = store.delete_many("users", &json!({})).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_unique_index_enforced() {
        let store = MemoryStore::new();
        store.ensure_unique_index("users", "email");
        store
            .insert_one("users", &json!({"email": "a@x.io"}))
            .await
            .unwrap();

        let err = store
            .insert_one("users", &json!({"email": "a@x.io"}))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_insert_many_all_or_nothing() {
        let store = MemoryStore::new();
        store.ensure_unique_index("users", "email");
        let err = store
            .insert_many(
                "users",
                &[json!({"email": "a@x.io"}), json!({"email": "a@x.io"})],
            )
            .await
            .unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(store.count("users", &json!({})).await.unwrap(), 0);
    }
}
