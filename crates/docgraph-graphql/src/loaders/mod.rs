//! DataLoaders for batched document loading.
//!
//! Loaders batch and cache id lookups within a single GraphQL execution,
//! preventing N+1 storage queries when a selection touches many documents
//! of the same collection.

mod document;

pub use document::{DocumentKey, DocumentLoader};

use std::sync::Arc;

use async_graphql::dataloader::DataLoader;
use docgraph_storage::DynStore;

/// Collection of DataLoaders for one GraphQL request.
///
/// Created once per request so batching and caching stay request-scoped.
#[derive(Clone)]
pub struct DataLoaders {
    /// Loader for fetching documents by (collection, id).
    pub document_loader: Arc<DataLoader<DocumentLoader>>,
}

impl DataLoaders {
    /// Creates a new set of DataLoaders over the given store.
    #[must_use]
    pub fn new(store: DynStore) -> Self {
        let document_loader = DocumentLoader::new(store);
        Self {
            document_loader: Arc::new(DataLoader::new(document_loader, tokio::spawn)),
        }
    }

    /// Creates DataLoaders with a custom batch delay. Shorter delays reduce
    /// latency but may produce smaller batches.
    #[must_use]
    pub fn with_delay(store: DynStore, delay: std::time::Duration) -> Self {
        let document_loader = DocumentLoader::new(store);
        Self {
            document_loader: Arc::new(
                DataLoader::new(document_loader, tokio::spawn).delay(delay),
            ),
        }
    }
}
