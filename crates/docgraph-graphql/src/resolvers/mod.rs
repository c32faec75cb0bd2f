//! CRUD operation resolvers.
//!
//! Each operation module exposes a factory in the same shape: it takes an
//! [`OperationSeed`] (the model, the argument translator and the per-field
//! settings decided at compose time) and returns the resolve closure the
//! dynamic schema installs on the field.
//!
//! - [`find`]: `findOne`, `findMany`, `findById`, `findByIds`, `count`
//! - [`mutation`]: `createOne`, `createMany`, `updateById`, `updateOne`,
//!   `updateMany`, `removeById`, `removeOne`, `removeMany`
//! - [`pagination`]: page/perPage pagination
//! - [`connection`]: Relay-style cursor pagination

pub mod connection;
pub mod filter;
pub mod find;
pub mod mutation;
pub mod pagination;
pub mod projection;
pub mod record;
pub mod sort;

use std::sync::Arc;

use async_graphql::dynamic::{ResolverContext, ValueAccessor};
use async_graphql::{Error as GraphQLError, Value};
use docgraph_schema::Model;

use crate::context::GraphQLContext;
use crate::types::PolymorphicMeta;
use filter::FieldTranslator;
use sort::SortPlan;

/// Everything a resolve closure needs, fixed at compose time.
///
/// Cloned into each closure; the shared parts sit behind `Arc` so the clone
/// is cheap.
#[derive(Clone)]
pub struct OperationSeed {
    /// The model the operation targets.
    pub model: Model,
    /// Exposed-name to storage translation for arguments and records.
    pub translator: Arc<FieldTranslator>,
    /// Sort enum item resolution.
    pub sort_plan: Arc<SortPlan>,
    /// For subtype operations: the discriminator (key, value) injected into
    /// queries and created records.
    pub discriminator: Option<(String, String)>,
    /// For interface-typed results: how documents map to concrete types.
    pub polymorphic: Option<Arc<PolymorphicMeta>>,
    /// Default `limit` when the argument is omitted.
    pub limit_default: u64,
}

impl OperationSeed {
    /// The base query every storage call starts from: empty, or pinned to
    /// the subtype's discriminator value.
    #[must_use]
    pub fn base_query(&self) -> serde_json::Value {
        match &self.discriminator {
            Some((key, value)) => serde_json::json!({ key: value }),
            None => serde_json::json!({}),
        }
    }
}

/// Extracts the GraphQL context from a resolver context.
pub(crate) fn get_graphql_context<'a>(
    ctx: &'a ResolverContext<'_>,
) -> Result<&'a GraphQLContext, GraphQLError> {
    ctx.data::<GraphQLContext>()
        .map_err(|_| GraphQLError::new("GraphQL context not available"))
}

/// Converts a `serde_json::Value` to an `async_graphql::Value`.
pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f)
                        .unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<async_graphql::Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (async_graphql::Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}

/// Converts a `ValueAccessor` to a `serde_json::Value`. Enum items come
/// through as their item-name strings; the translator maps them back to raw
/// stored values.
pub(crate) fn value_accessor_to_json(
    value: &ValueAccessor<'_>,
) -> Result<serde_json::Value, GraphQLError> {
    if value.is_null() {
        return Ok(serde_json::Value::Null);
    }

    if let Ok(b) = value.boolean() {
        return Ok(serde_json::Value::Bool(b));
    }

    if let Ok(i) = value.i64() {
        return Ok(serde_json::Value::Number(i.into()));
    }

    if let Ok(f) = value.f64() {
        return Ok(serde_json::json!(f));
    }

    if let Ok(s) = value.string() {
        return Ok(serde_json::Value::String(s.to_string()));
    }

    if let Ok(name) = value.enum_name() {
        return Ok(serde_json::Value::String(name.to_string()));
    }

    if let Ok(list) = value.list() {
        let items: Result<Vec<serde_json::Value>, GraphQLError> =
            list.iter().map(|v| value_accessor_to_json(&v)).collect();
        return Ok(serde_json::Value::Array(items?));
    }

    if let Ok(obj) = value.object() {
        let mut map = serde_json::Map::new();
        for (k, v) in obj.iter() {
            map.insert(k.to_string(), value_accessor_to_json(&v)?);
        }
        return Ok(serde_json::Value::Object(map));
    }

    Ok(serde_json::Value::Null)
}

/// Reads an optional argument as JSON.
pub(crate) fn arg_as_json(
    ctx: &ResolverContext<'_>,
    name: &str,
) -> Result<Option<serde_json::Value>, GraphQLError> {
    match ctx.args.get(name) {
        Some(value) => Ok(Some(value_accessor_to_json(&value)?)),
        None => Ok(None),
    }
}
