//! The document store trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::FindOptions;

/// Convenience alias for a shared store handle.
pub type DynStore = Arc<dyn DocumentStore>;

/// The narrow storage surface the GraphQL layer consumes.
///
/// Documents are `serde_json::Value` objects addressed by Mongo-style query
/// documents. Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use docgraph_storage::{DocumentStore, StorageError};
///
/// async fn first_user(store: &dyn DocumentStore) -> Result<serde_json::Value, StorageError> {
///     store
///         .find_one("users", &serde_json::json!({}))
///         .await?
///         .ok_or_else(|| StorageError::not_found("users"))
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Finds the first document matching the query.
    async fn find_one(
        &self,
        collection: &str,
        query: &Value,
    ) -> Result<Option<Value>, StorageError>;

    /// Finds all documents matching the query, honoring sort/skip/limit/
    /// projection options.
    async fn find_many(
        &self,
        collection: &str,
        query: &Value,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StorageError>;

    /// Counts documents matching the query.
    async fn count(&self, collection: &str, query: &Value) -> Result<u64, StorageError>;

    /// Inserts one document, generating an `_id` when absent.
    ///
    /// Returns the stored document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DuplicateKey` when a unique index is violated.
    async fn insert_one(&self, collection: &str, doc: &Value) -> Result<Value, StorageError>;

    /// Inserts several documents. All-or-nothing: a duplicate-key failure
    /// leaves none of the batch stored.
    async fn insert_many(
        &self,
        collection: &str,
        docs: &[Value],
    ) -> Result<Vec<Value>, StorageError>;

    /// Applies a `$set`-style update document to the first match.
    ///
    /// Returns the updated document, or `None` when nothing matched.
    async fn update_one(
        &self,
        collection: &str,
        query: &Value,
        update: &Value,
    ) -> Result<Option<Value>, StorageError>;

    /// Applies a `$set`-style update document to every match.
    ///
    /// Returns the number of updated documents.
    async fn update_many(
        &self,
        collection: &str,
        query: &Value,
        update: &Value,
    ) -> Result<u64, StorageError>;

    /// Removes the first matching document, returning it.
    async fn delete_one(
        &self,
        collection: &str,
        query: &Value,
    ) -> Result<Option<Value>, StorageError>;

    /// Removes every matching document, returning the removed count.
    async fn delete_many(&self, collection: &str, query: &Value) -> Result<u64, StorageError>;

    /// The backend name, for logging.
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test that DocumentStore is object-safe.
    fn _assert_store_object_safe(_: &dyn DocumentStore) {}
}
