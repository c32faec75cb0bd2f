//! Page-number pagination resolver.
//!
//! `<model>Pagination(page, perPage, filter, sort)` returns a payload of
//! `count`/`items`/`pageInfo`. Page numbers are 1-based; out-of-range pages
//! return empty items with accurate page info rather than an error.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use docgraph_storage::{DocumentStore, Projection};
use serde_json::json;
use tracing::{debug, warn};

use super::find::{build_options, build_query};
use super::record::expose_document;
use super::{OperationSeed, get_graphql_context, json_to_graphql_value};
use crate::error::OperationError;

/// Fallback `perPage` when the argument is omitted.
pub const DEFAULT_PER_PAGE: u64 = 20;

/// Resolver for `pagination` operations.
pub struct PaginationResolver;

impl PaginationResolver {
    /// Creates the resolve closure for a `<model>Pagination` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let query = build_query(&ctx, &seed)?;

                let page = ctx
                    .args
                    .get("page")
                    .and_then(|v| v.u64().ok())
                    .max(Some(1))
                    .unwrap_or(1);
                let per_page = ctx
                    .args
                    .get("perPage")
                    .and_then(|v| v.u64().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_PER_PAGE);

                let mut options = build_options(&ctx, &seed, None, Projection::All)?;
                options.skip = Some((page - 1) * per_page);
                options.limit = Some(per_page);

                debug!(
                    collection = %seed.model.collection,
                    page, per_page,
                    "Resolving pagination"
                );
                let count = gql_ctx
                    .store
                    .count(&seed.model.collection, &query)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Storage error counting pagination");
                        OperationError::from(e).to_graphql_error()
                    })?;
                let docs = gql_ctx
                    .store
                    .find_many(&seed.model.collection, &query, &options)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Storage error in pagination");
                        OperationError::from(e).to_graphql_error()
                    })?;

                let items: Vec<serde_json::Value> =
                    docs.iter().map(|doc| expose_document(doc, &seed)).collect();
                let page_count = count.div_ceil(per_page);
                let payload = json!({
                    "count": count,
                    "items": items,
                    "pageInfo": {
                        "currentPage": page,
                        "perPage": per_page,
                        "pageCount": page_count,
                        "itemCount": count,
                        "hasNextPage": page * per_page < count,
                        "hasPreviousPage": page > 1,
                    },
                });
                Ok(Some(FieldValue::from(json_to_graphql_value(payload))))
            })
        }
    }
}
