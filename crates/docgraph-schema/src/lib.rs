//! # docgraph-schema
//!
//! Document schema model for docgraph.
//!
//! A [`DocumentSchema`] describes the shape of documents stored in one
//! collection: its fields (with kinds, nesting, enum values, aliases and
//! defaults), its declared indexes, and, for single-collection inheritance,
//! its discriminator key and subtype schemas.
//!
//! Schemas are built once at setup time through [`SchemaBuilder`] and shared
//! as `Arc<DocumentSchema>`; downstream consumers key caches on the `Arc`
//! pointer identity, so the same schema instance must be reused for the same
//! logical schema.
//!
//! ## Modules
//!
//! - [`field`] - Field descriptors and kinds
//! - [`schema`] - Schema, builder, indexes, discriminators
//! - [`validate`] - Document validation against a schema
//! - [`error`] - Schema definition errors

pub mod error;
pub mod field;
pub mod schema;
pub mod validate;

pub use error::SchemaError;
pub use field::{FieldDescriptor, FieldKind, Requiredness};
pub use schema::{DocumentSchema, IndexDefinition, IndexOrder, Model, SchemaBuilder};
pub use validate::{FieldFailure, ValidationFailure};
