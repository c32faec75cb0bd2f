//! Mutation resolvers: create, update and remove operations.
//!
//! Every mutation returns a payload object (`recordId`/`record`/`error`, or
//! `numAffected`/`error` for the many-variants). Failures follow the
//! dual-path policy: when the client selected the payload's `error` field
//! the typed error is returned inline and the mutation field itself
//! resolves; otherwise the error surfaces as a top-level GraphQL error with
//! structured extensions.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use docgraph_storage::{DocumentStore, FindOptions, Projection};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::find::{build_options, build_query};
use super::record::{decode_record, expose_document};
use super::{OperationSeed, arg_as_json, get_graphql_context, json_to_graphql_value};
use crate::error::OperationError;

/// Whether the client opted into the inline `error` field.
fn error_selected(ctx: &ResolverContext<'_>) -> bool {
    ctx.look_ahead().field("error").exists()
}

/// Routes a failed mutation: inline payload or top-level error.
fn fail(
    error: OperationError,
    inline: bool,
) -> Result<Option<FieldValue<'static>>, async_graphql::Error> {
    if inline {
        let payload = json!({ "error": error.to_payload_value() });
        Ok(Some(FieldValue::from(json_to_graphql_value(payload))))
    } else {
        Err(error.to_graphql_error())
    }
}

fn payload_value(payload: Value) -> Option<FieldValue<'static>> {
    Some(FieldValue::from(json_to_graphql_value(payload)))
}

/// Reads the required `record` argument in storage shape.
fn record_arg(
    ctx: &ResolverContext<'_>,
    seed: &OperationSeed,
) -> Result<Value, async_graphql::Error> {
    let record = arg_as_json(ctx, "record")?
        .ok_or_else(|| async_graphql::Error::new("Missing required argument 'record'"))?;
    Ok(decode_record(&record, seed))
}

/// Validates a document against the model schema, mapping failures into the
/// typed validation error.
fn validate_document(doc: &Value, seed: &OperationSeed) -> Result<(), OperationError> {
    seed.model.schema.validate(doc).map_err(OperationError::from)
}

/// Resolver for `createOne` operations.
pub struct CreateOneResolver;

impl CreateOneResolver {
    /// Creates the resolve closure for a `<model>CreateOne` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let inline = error_selected(&ctx);
                let gql_ctx = get_graphql_context(&ctx)?;
                let doc = record_arg(&ctx, &seed)?;

                if let Err(error) = validate_document(&doc, &seed) {
                    return fail(error, inline);
                }

                debug!(collection = %seed.model.collection, "Resolving createOne");
                match gql_ctx.store.insert_one(&seed.model.collection, &doc).await {
                    Ok(stored) => Ok(payload_value(json!({
                        "recordId": stored.get("_id").cloned(),
                        "record": expose_document(&stored, &seed),
                    }))),
                    Err(e) => {
                        warn!(error = %e, "Storage error in createOne");
                        fail(OperationError::from(e), inline)
                    }
                }
            })
        }
    }
}

/// Resolver for `createMany` operations. Validation covers the whole batch
/// before anything is written; the insert itself is all-or-nothing.
pub struct CreateManyResolver;

impl CreateManyResolver {
    /// Creates the resolve closure for a `<model>CreateMany` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let inline = error_selected(&ctx);
                let gql_ctx = get_graphql_context(&ctx)?;
                let records = arg_as_json(&ctx, "records")?
                    .and_then(|v| v.as_array().cloned())
                    .ok_or_else(|| {
                        async_graphql::Error::new("Missing required argument 'records'")
                    })?;

                let docs: Vec<Value> = records
                    .iter()
                    .map(|record| decode_record(record, &seed))
                    .collect();
                for (index, doc) in docs.iter().enumerate() {
                    if let Err(error) = validate_document(doc, &seed) {
                        return fail(prefix_error_paths(error, index), inline);
                    }
                }

                debug!(collection = %seed.model.collection, count = docs.len(), "Resolving createMany");
                match gql_ctx.store.insert_many(&seed.model.collection, &docs).await {
                    Ok(stored) => {
                        let ids: Vec<Value> =
                            stored.iter().filter_map(|d| d.get("_id").cloned()).collect();
                        let exposed: Vec<Value> =
                            stored.iter().map(|d| expose_document(d, &seed)).collect();
                        Ok(payload_value(json!({
                            "recordIds": ids,
                            "records": exposed,
                            "createdCount": stored.len(),
                        })))
                    }
                    Err(e) => {
                        warn!(error = %e, "Storage error in createMany");
                        fail(OperationError::from(e), inline)
                    }
                }
            })
        }
    }
}

/// Resolver for `updateById` operations.
pub struct UpdateByIdResolver;

impl UpdateByIdResolver {
    /// Creates the resolve closure for a `<model>UpdateById` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let inline = error_selected(&ctx);
                let gql_ctx = get_graphql_context(&ctx)?;
                let id = required_id(&ctx)?;
                let doc = record_arg(&ctx, &seed)?;

                let mut query = seed.base_query();
                query["_id"] = json!(id);

                debug!(collection = %seed.model.collection, id = %id, "Resolving updateById");
                let update = json!({ "$set": doc });
                match gql_ctx
                    .store
                    .update_one(&seed.model.collection, &query, &update)
                    .await
                {
                    Ok(Some(updated)) => Ok(payload_value(json!({
                        "recordId": updated.get("_id").cloned(),
                        "record": expose_document(&updated, &seed),
                    }))),
                    Ok(None) => fail(not_found(&seed), inline),
                    Err(e) => {
                        warn!(error = %e, "Storage error in updateById");
                        fail(OperationError::from(e), inline)
                    }
                }
            })
        }
    }
}

/// Resolver for `updateOne` operations: picks the first match by
/// filter/sort/skip, then applies the record as a `$set`.
pub struct UpdateOneResolver;

impl UpdateOneResolver {
    /// Creates the resolve closure for a `<model>UpdateOne` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let inline = error_selected(&ctx);
                let gql_ctx = get_graphql_context(&ctx)?;
                let doc = record_arg(&ctx, &seed)?;
                let query = build_query(&ctx, &seed)?;
                let options = build_options(&ctx, &seed, Some(1), Projection::All)?;

                debug!(collection = %seed.model.collection, query = %query, "Resolving updateOne");
                let target = match first_match(gql_ctx, &seed, &query, options).await {
                    Ok(Some(target)) => target,
                    Ok(None) => return fail(not_found(&seed), inline),
                    Err(e) => return fail(e, inline),
                };

                let id_query = json!({ "_id": target.get("_id").cloned() });
                let update = json!({ "$set": doc });
                match gql_ctx
                    .store
                    .update_one(&seed.model.collection, &id_query, &update)
                    .await
                {
                    Ok(Some(updated)) => Ok(payload_value(json!({
                        "recordId": updated.get("_id").cloned(),
                        "record": expose_document(&updated, &seed),
                    }))),
                    Ok(None) => fail(not_found(&seed), inline),
                    Err(e) => {
                        warn!(error = %e, "Storage error in updateOne");
                        fail(OperationError::from(e), inline)
                    }
                }
            })
        }
    }
}

/// Resolver for `updateMany` operations.
pub struct UpdateManyResolver;

impl UpdateManyResolver {
    /// Creates the resolve closure for a `<model>UpdateMany` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let inline = error_selected(&ctx);
                let gql_ctx = get_graphql_context(&ctx)?;
                let doc = record_arg(&ctx, &seed)?;
                let query = build_query(&ctx, &seed)?;

                debug!(collection = %seed.model.collection, query = %query, "Resolving updateMany");
                let update = json!({ "$set": doc });
                match gql_ctx
                    .store
                    .update_many(&seed.model.collection, &query, &update)
                    .await
                {
                    Ok(affected) => Ok(payload_value(json!({ "numAffected": affected }))),
                    Err(e) => {
                        warn!(error = %e, "Storage error in updateMany");
                        fail(OperationError::from(e), inline)
                    }
                }
            })
        }
    }
}

/// Resolver for `removeById` operations.
pub struct RemoveByIdResolver;

impl RemoveByIdResolver {
    /// Creates the resolve closure for a `<model>RemoveById` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let inline = error_selected(&ctx);
                let gql_ctx = get_graphql_context(&ctx)?;
                let id = required_id(&ctx)?;

                let mut query = seed.base_query();
                query["_id"] = json!(id);

                debug!(collection = %seed.model.collection, id = %id, "Resolving removeById");
                match gql_ctx.store.delete_one(&seed.model.collection, &query).await {
                    Ok(Some(removed)) => Ok(payload_value(json!({
                        "recordId": removed.get("_id").cloned(),
                        "record": expose_document(&removed, &seed),
                    }))),
                    Ok(None) => fail(not_found(&seed), inline),
                    Err(e) => {
                        warn!(error = %e, "Storage error in removeById");
                        fail(OperationError::from(e), inline)
                    }
                }
            })
        }
    }
}

/// Resolver for `removeOne` operations: picks the first match by
/// filter/sort, then deletes it.
pub struct RemoveOneResolver;

impl RemoveOneResolver {
    /// Creates the resolve closure for a `<model>RemoveOne` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let inline = error_selected(&ctx);
                let gql_ctx = get_graphql_context(&ctx)?;
                let query = build_query(&ctx, &seed)?;
                let options = build_options(&ctx, &seed, Some(1), Projection::All)?;

                debug!(collection = %seed.model.collection, query = %query, "Resolving removeOne");
                let target = match first_match(gql_ctx, &seed, &query, options).await {
                    Ok(Some(target)) => target,
                    Ok(None) => return fail(not_found(&seed), inline),
                    Err(e) => return fail(e, inline),
                };

                let id_query = json!({ "_id": target.get("_id").cloned() });
                match gql_ctx
                    .store
                    .delete_one(&seed.model.collection, &id_query)
                    .await
                {
                    Ok(Some(removed)) => Ok(payload_value(json!({
                        "recordId": removed.get("_id").cloned(),
                        "record": expose_document(&removed, &seed),
                    }))),
                    Ok(None) => fail(not_found(&seed), inline),
                    Err(e) => {
                        warn!(error = %e, "Storage error in removeOne");
                        fail(OperationError::from(e), inline)
                    }
                }
            })
        }
    }
}

/// Resolver for `removeMany` operations.
pub struct RemoveManyResolver;

impl RemoveManyResolver {
    /// Creates the resolve closure for a `<model>RemoveMany` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let inline = error_selected(&ctx);
                let gql_ctx = get_graphql_context(&ctx)?;
                let query = build_query(&ctx, &seed)?;

                debug!(collection = %seed.model.collection, query = %query, "Resolving removeMany");
                match gql_ctx.store.delete_many(&seed.model.collection, &query).await {
                    Ok(affected) => Ok(payload_value(json!({ "numAffected": affected }))),
                    Err(e) => {
                        warn!(error = %e, "Storage error in removeMany");
                        fail(OperationError::from(e), inline)
                    }
                }
            })
        }
    }
}

fn required_id(ctx: &ResolverContext<'_>) -> Result<String, async_graphql::Error> {
    ctx.args
        .get("_id")
        .and_then(|v| v.string().ok().map(str::to_string))
        .ok_or_else(|| async_graphql::Error::new("Missing required argument '_id'"))
}

fn not_found(seed: &OperationSeed) -> OperationError {
    OperationError::from(docgraph_storage::StorageError::not_found(
        &seed.model.collection,
    ))
}

/// Finds the document an updateOne/removeOne targets.
async fn first_match(
    gql_ctx: &crate::context::GraphQLContext,
    seed: &OperationSeed,
    query: &Value,
    options: FindOptions,
) -> Result<Option<Value>, OperationError> {
    let docs = gql_ctx
        .store
        .find_many(&seed.model.collection, query, &options)
        .await?;
    Ok(docs.into_iter().next())
}

/// Prefixes validation paths with the failing record's batch index.
fn prefix_error_paths(error: OperationError, index: usize) -> OperationError {
    match error {
        OperationError::Validation { message, errors } => OperationError::Validation {
            message,
            errors: errors
                .into_iter()
                .map(|(path, message, value)| (format!("{index}.{path}"), message, value))
                .collect(),
        },
        other => other,
    }
}
