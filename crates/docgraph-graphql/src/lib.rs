//! # docgraph-graphql
//!
//! GraphQL type system and CRUD resolvers generated from document schemas.
//!
//! This crate turns [`docgraph_schema::Model`] definitions into an
//! executable GraphQL schema backed by any
//! [`docgraph_storage::DocumentStore`]. It provides:
//!
//! - Object, input, enum and interface types derived from schema fields,
//!   including nested documents, arrays, aliases and enum constraints
//! - The full CRUD operation set per model: find, count, pagination,
//!   cursor connection, create, update and remove
//! - Filter types with per-field comparison operators and `AND`/`OR`
//! - Sort enums derived from database indexes
//! - Discriminator families exposed as interfaces with per-subtype
//!   operations
//! - Typed error payloads with dual-path routing: inline when the client
//!   selects the payload `error` field, top-level otherwise
//! - DataLoader batching for the by-id operations
//!
//! ## Overview
//!
//! Composition is a two-step pipeline. [`SchemaComposer::add_model`]
//! converts a model into an inspectable intermediate type graph and plans
//! its operations; [`SchemaComposer::build`] lowers the graph into an
//! `async_graphql::dynamic::Schema` in one pass. Requests execute against a
//! [`GraphQLContext`] carrying the store and per-request dataloaders.
//!
//! ```ignore
//! let mut composer = SchemaComposer::new(ComposerConfig::default());
//! composer.add_model(&user_model, ComposeOptions::default())?;
//! let schema = composer.build()?;
//!
//! let ctx = GraphQLContext::builder().with_store(store).build()?;
//! let response = schema.execute(Request::new(query).data(ctx)).await;
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Composition options
//! - [`types`] - Intermediate representation of generated types
//! - [`convert`] - Schema-to-type conversion
//! - [`registry`] - Per-session type registry
//! - [`schema`] - Composition and lowering
//! - [`resolvers`] - CRUD resolve closures
//! - [`context`] - GraphQL execution context
//! - [`loaders`] - DataLoader batching
//! - [`error`] - Error types

pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod loaders;
pub mod registry;
pub mod resolvers;
pub mod schema;
pub mod types;

// Re-export main types
pub use config::{ComposeOptions, ComposerConfig, OperationConfig, OperationsConfig};
pub use context::{GraphQLContext, GraphQLContextBuilder};
pub use convert::DiscriminatorGroup;
pub use error::{ConvertError, OperationError};
pub use registry::TypeRegistry;
pub use schema::{OperationKind, SchemaComposer};

/// Result type for schema composition.
pub type Result<T> = std::result::Result<T, ConvertError>;
