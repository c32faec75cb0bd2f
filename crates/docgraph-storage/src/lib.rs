//! # docgraph-storage
//!
//! Document store abstraction for docgraph.
//!
//! The [`DocumentStore`] trait is the narrow surface the GraphQL layer
//! consumes: find/count/insert/update/delete over `serde_json::Value`
//! documents addressed by Mongo-style query documents (`$gt`, `$in`,
//! `$and`/`$or`, dotted paths). [`MemoryStore`] is the bundled in-memory
//! backend used by tests and demos.
//!
//! ## Modules
//!
//! - [`traits`] - The `DocumentStore` trait
//! - [`types`] - Find options, sort specs, projections
//! - [`query`] - Pure query-document matching and sorting
//! - [`memory`] - In-memory backend
//! - [`error`] - Storage error taxonomy

pub mod error;
pub mod memory;
pub mod query;
pub mod traits;
pub mod types;

pub use error::{ErrorCategory, StorageError};
pub use memory::MemoryStore;
pub use traits::{DocumentStore, DynStore};
pub use types::{FindOptions, Projection, SortOrder, SortSpec};
