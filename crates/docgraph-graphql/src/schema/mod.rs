//! Schema composition and lowering.
//!
//! [`SchemaComposer`] is the entry point of the crate: models go in through
//! [`SchemaComposer::add_model`], which converts their schemas into the
//! intermediate type graph and records an operation plan for every enabled
//! CRUD operation. [`SchemaComposer::build`] then lowers the whole graph
//! into an executable `async_graphql::dynamic::Schema` in one pass.
//!
//! The split keeps the type graph inspectable and mutable right up to the
//! build call: the dynamic builders are write-only, so every structural
//! operation has to happen on the intermediate form.

mod composer;
mod into_schema;

pub use composer::{ArgPlan, OperationKind, OperationPlan, SchemaComposer};
