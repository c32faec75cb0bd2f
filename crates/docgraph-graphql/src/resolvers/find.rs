//! Query resolvers: `findOne`, `findMany`, `findById`, `findByIds`, `count`.

use async_graphql::Value as GraphQLValue;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use docgraph_storage::{DocumentStore, FindOptions, Projection, query};
use serde_json::Value;
use tracing::{debug, warn};

use super::projection::projection_from_selection;
use super::{
    OperationSeed, arg_as_json, filter::filter_to_query, get_graphql_context,
    json_to_graphql_value, record,
};
use crate::error::OperationError;
use crate::loaders::DocumentKey;

/// Builds the storage query from the filter argument, pinned to the
/// subtype's discriminator for child operations.
pub(crate) fn build_query(
    ctx: &ResolverContext<'_>,
    seed: &OperationSeed,
) -> Result<Value, async_graphql::Error> {
    let base = seed.base_query();
    let Some(filter) = arg_as_json(ctx, "filter")? else {
        return Ok(base);
    };
    Ok(merge_into_base(base, filter_to_query(&filter, &seed.translator)))
}

/// Merges filter-derived conditions into the pinned base query. A condition
/// on a pinned key never replaces the pin; the two documents are combined
/// under `$and` so both must hold.
fn merge_into_base(mut base: Value, conditions: Value) -> Value {
    let (Value::Object(target), Value::Object(conditions)) = (&mut base, conditions) else {
        return base;
    };
    if target.is_empty() {
        *target = conditions;
        return base;
    }
    if conditions.keys().any(|key| target.contains_key(key)) {
        let pinned = std::mem::take(target);
        return serde_json::json!({ "$and": [pinned, conditions] });
    }
    target.extend(conditions);
    base
}

/// Builds find options from the sort/skip/limit arguments.
pub(crate) fn build_options(
    ctx: &ResolverContext<'_>,
    seed: &OperationSeed,
    default_limit: Option<u64>,
    projection: Projection,
) -> Result<FindOptions, async_graphql::Error> {
    let sort = match arg_as_json(ctx, "sort")? {
        Some(value) => seed.sort_plan.resolve(&value),
        None => None,
    };
    let skip = ctx.args.get("skip").and_then(|v| v.u64().ok());
    let limit = ctx
        .args
        .get("limit")
        .and_then(|v| v.u64().ok())
        .or(default_limit);
    Ok(FindOptions { sort, skip, limit, projection })
}

/// Keeps the polymorphic tag in a narrowed projection; concrete-type
/// dispatch needs it even when the client did not select it.
fn keep_tag(mut projection: Projection, seed: &OperationSeed) -> Projection {
    if let (Some(meta), Projection::Fields(fields)) = (&seed.polymorphic, &mut projection)
        && !fields.iter().any(|f| f == &meta.key)
    {
        fields.push(meta.key.clone());
    }
    projection
}

/// Wraps a stored document into a field value, resolving the concrete type
/// through the polymorphic tag when the operation is interface-typed.
pub(crate) fn doc_to_field_value(doc: &Value, seed: &OperationSeed) -> FieldValue<'static> {
    let exposed = record::expose_document(doc, seed);
    let value = json_to_graphql_value(exposed);
    if let Some(meta) = &seed.polymorphic {
        let tag = doc
            .get(&meta.key)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if let Some(concrete) = meta.type_for(tag) {
            return FieldValue::from(value).with_type(concrete.to_string());
        }
    }
    FieldValue::from(value)
}

/// Resolver for `findOne` operations.
pub struct FindOneResolver;

impl FindOneResolver {
    /// Creates the resolve closure for a `<model>FindOne` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let query = build_query(&ctx, &seed)?;
                let projection = keep_tag(projection_from_selection(&ctx, &seed.translator), &seed);
                let options = build_options(&ctx, &seed, Some(1), projection)?;

                debug!(collection = %seed.model.collection, query = %query, "Resolving findOne");
                let docs = gql_ctx
                    .store
                    .find_many(&seed.model.collection, &query, &options)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Storage error in findOne");
                        OperationError::from(e).to_graphql_error()
                    })?;

                Ok(docs.first().map(|doc| doc_to_field_value(doc, &seed)))
            })
        }
    }
}

/// Resolver for `findMany` operations.
pub struct FindManyResolver;

impl FindManyResolver {
    /// Creates the resolve closure for a `<model>FindMany` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let query = build_query(&ctx, &seed)?;
                let projection = keep_tag(projection_from_selection(&ctx, &seed.translator), &seed);
                let options =
                    build_options(&ctx, &seed, Some(seed.limit_default), projection)?;

                debug!(collection = %seed.model.collection, query = %query, "Resolving findMany");
                let docs = gql_ctx
                    .store
                    .find_many(&seed.model.collection, &query, &options)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Storage error in findMany");
                        OperationError::from(e).to_graphql_error()
                    })?;

                let items: Vec<FieldValue<'_>> =
                    docs.iter().map(|doc| doc_to_field_value(doc, &seed)).collect();
                Ok(Some(FieldValue::list(items)))
            })
        }
    }
}

/// Resolver for `findById` operations, batched through the DataLoader.
pub struct FindByIdResolver;

impl FindByIdResolver {
    /// Creates the resolve closure for a `<model>FindById` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let id = ctx
                    .args
                    .get("_id")
                    .and_then(|v| v.string().ok().map(str::to_string))
                    .ok_or_else(|| async_graphql::Error::new("Missing required argument '_id'"))?;

                let gql_ctx = get_graphql_context(&ctx)?;
                debug!(collection = %seed.model.collection, id = %id, "Resolving findById");
                let doc = gql_ctx.load_document(&seed.model.collection, &id).await;

                Ok(doc
                    .filter(|doc| matches_discriminator(doc, &seed))
                    .map(|doc| doc_to_field_value(&doc, &seed)))
            })
        }
    }
}

/// Resolver for `findByIds` operations. Results keep the argument order;
/// missing ids are skipped. A sort argument reorders in memory.
pub struct FindByIdsResolver;

impl FindByIdsResolver {
    /// Creates the resolve closure for a `<model>FindByIds` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let ids: Vec<String> = ctx
                    .args
                    .get("_ids")
                    .and_then(|v| v.list().ok())
                    .map(|list| {
                        list.iter()
                            .filter_map(|v| v.string().ok().map(str::to_string))
                            .collect()
                    })
                    .ok_or_else(|| {
                        async_graphql::Error::new("Missing required argument '_ids'")
                    })?;

                let gql_ctx = get_graphql_context(&ctx)?;
                debug!(collection = %seed.model.collection, count = ids.len(), "Resolving findByIds");

                let keys: Vec<DocumentKey> = ids
                    .iter()
                    .map(|id| DocumentKey::new(&seed.model.collection, id))
                    .collect();
                let loaded = gql_ctx
                    .loaders
                    .document_loader
                    .load_many(keys.clone())
                    .await
                    .map_err(|e| e.to_graphql_error())?;

                let mut docs: Vec<Value> = keys
                    .iter()
                    .filter_map(|key| loaded.get(key).cloned())
                    .filter(|doc| matches_discriminator(doc, &seed))
                    .collect();

                if let Some(sort) = arg_as_json(&ctx, "sort")?
                    && let Some(spec) = seed.sort_plan.resolve(&sort)
                {
                    query::sort_documents(&mut docs, &spec);
                }
                if let Some(limit) = ctx.args.get("limit").and_then(|v| v.u64().ok()) {
                    docs.truncate(limit as usize);
                }

                let items: Vec<FieldValue<'_>> =
                    docs.iter().map(|doc| doc_to_field_value(doc, &seed)).collect();
                Ok(Some(FieldValue::list(items)))
            })
        }
    }
}

/// Resolver for `count` operations.
pub struct CountResolver;

impl CountResolver {
    /// Creates the resolve closure for a `<model>Count` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let query = build_query(&ctx, &seed)?;

                debug!(collection = %seed.model.collection, query = %query, "Resolving count");
                let count = gql_ctx
                    .store
                    .count(&seed.model.collection, &query)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Storage error in count");
                        OperationError::from(e).to_graphql_error()
                    })?;

                Ok(Some(GraphQLValue::from(count)))
            })
        }
    }
}

/// Whether a loaded document belongs to the operation's subtype. Operations
/// without a discriminator accept everything.
fn matches_discriminator(doc: &Value, seed: &OperationSeed) -> bool {
    match &seed.discriminator {
        Some((key, value)) => doc.get(key).and_then(Value::as_str) == Some(value.as_str()),
        None => true,
    }
}
