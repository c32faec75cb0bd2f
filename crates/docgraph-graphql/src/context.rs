//! GraphQL execution context.
//!
//! The context is constructed per-request and carries everything resolvers
//! need: the document store and the request-scoped DataLoaders. It travels
//! through the async-graphql data system.
//!
//! # Example
//!
//! ```ignore
//! use docgraph_graphql::GraphQLContextBuilder;
//!
//! let context = GraphQLContextBuilder::new()
//!     .with_store(store.clone())
//!     .build()?;
//! let response = schema.execute(Request::new(query).data(context)).await;
//! ```

use docgraph_storage::DynStore;

use crate::loaders::{DataLoaders, DocumentKey};

/// GraphQL execution context.
///
/// `Clone` and `Send + Sync`: shared state sits behind `Arc`.
#[derive(Clone)]
pub struct GraphQLContext {
    /// Document storage.
    pub store: DynStore,

    /// DataLoaders for batched document loading.
    ///
    /// Loaders batch and cache document loads within a single request,
    /// preventing N+1 query problems.
    pub loaders: DataLoaders,
}

impl GraphQLContext {
    /// Loads a document by collection and id through the DataLoader.
    ///
    /// Returns `None` when the document does not exist or the load failed;
    /// load errors surface on the operation that owns the selection.
    pub async fn load_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Option<serde_json::Value> {
        let key = DocumentKey::new(collection, id);
        self.loaders
            .document_loader
            .load_one(key)
            .await
            .ok()
            .flatten()
    }

    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> GraphQLContextBuilder {
        GraphQLContextBuilder::default()
    }
}

/// Builder for constructing a [`GraphQLContext`].
#[derive(Default)]
pub struct GraphQLContextBuilder {
    store: Option<DynStore>,
    loader_delay: Option<std::time::Duration>,
}

impl GraphQLContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document store.
    #[must_use]
    pub fn with_store(mut self, store: DynStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets a custom DataLoader batch delay.
    #[must_use]
    pub fn with_loader_delay(mut self, delay: std::time::Duration) -> Self {
        self.loader_delay = Some(delay);
        self
    }

    /// Builds the context. Each context gets its own loaders so batching
    /// stays request-scoped.
    ///
    /// # Errors
    ///
    /// Returns an error when required fields are missing.
    pub fn build(self) -> Result<GraphQLContext, ContextBuilderError> {
        let store = self.store.ok_or(ContextBuilderError::MissingField("store"))?;

        let loaders = match self.loader_delay {
            Some(delay) => DataLoaders::with_delay(store.clone(), delay),
            None => DataLoaders::new(store.clone()),
        };

        Ok(GraphQLContext { store, loaders })
    }
}

/// Errors raised while building a [`GraphQLContext`].
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docgraph_storage::{DocumentStore, MemoryStore};

    use super::*;

    #[test]
    fn test_builder_missing_store() {
        let result = GraphQLContextBuilder::new().build();
        assert!(matches!(
            result,
            Err(ContextBuilderError::MissingField("store"))
        ));
    }

    #[tokio::test]
    async fn test_builder_complete() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let context = GraphQLContextBuilder::new()
            .with_store(store)
            .build()
            .unwrap();
        assert_eq!(context.store.backend_name(), "memory");
    }
}
