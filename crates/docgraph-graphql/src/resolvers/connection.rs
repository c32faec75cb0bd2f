//! Relay-style cursor pagination resolver.
//!
//! `<model>Connection(first, after, last, before, filter, sort)` returns
//! `count`/`edges`/`pageInfo`. Cursors are opaque base64-encoded offsets
//! into the sorted result set; they stay valid as long as the sort and
//! filter do.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use docgraph_storage::{DocumentStore, Projection};
use serde_json::json;
use tracing::{debug, warn};

use super::find::{build_options, build_query};
use super::record::expose_document;
use super::{OperationSeed, get_graphql_context, json_to_graphql_value};
use crate::error::OperationError;

/// Encodes an offset into an opaque cursor.
#[must_use]
pub fn encode_cursor(offset: u64) -> String {
    STANDARD.encode(format!("offset:{offset}"))
}

/// Decodes a cursor back into its offset. Malformed cursors decode to
/// `None` and the argument is ignored.
#[must_use]
pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let bytes = STANDARD.decode(cursor).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    text.strip_prefix("offset:")?.parse().ok()
}

/// Resolver for `connection` operations.
pub struct ConnectionResolver;

impl ConnectionResolver {
    /// Creates the resolve closure for a `<model>Connection` field.
    pub fn resolve(
        seed: OperationSeed,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let seed = seed.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let query = build_query(&ctx, &seed)?;

                let first = ctx.args.get("first").and_then(|v| v.u64().ok());
                let last = ctx.args.get("last").and_then(|v| v.u64().ok());
                let after = ctx
                    .args
                    .get("after")
                    .and_then(|v| v.string().ok().and_then(decode_cursor));
                let before = ctx
                    .args
                    .get("before")
                    .and_then(|v| v.string().ok().and_then(decode_cursor));

                debug!(collection = %seed.model.collection, "Resolving connection");
                let count = gql_ctx
                    .store
                    .count(&seed.model.collection, &query)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Storage error counting connection");
                        OperationError::from(e).to_graphql_error()
                    })?;

                // The window [start, end) within the sorted result set.
                let mut start = after.map_or(0, |offset| offset + 1);
                let mut end = before.unwrap_or(count).min(count);
                if let Some(first) = first {
                    end = end.min(start.saturating_add(first));
                }
                if let Some(last) = last {
                    start = start.max(end.saturating_sub(last));
                }
                let window = end.saturating_sub(start);

                let mut options = build_options(&ctx, &seed, None, Projection::All)?;
                options.skip = Some(start);
                options.limit = Some(window);

                let docs = gql_ctx
                    .store
                    .find_many(&seed.model.collection, &query, &options)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Storage error in connection");
                        OperationError::from(e).to_graphql_error()
                    })?;

                let edges: Vec<serde_json::Value> = docs
                    .iter()
                    .enumerate()
                    .map(|(i, doc)| {
                        json!({
                            "node": expose_document(doc, &seed),
                            "cursor": encode_cursor(start + i as u64),
                        })
                    })
                    .collect();
                let payload = json!({
                    "count": count,
                    "edges": edges,
                    "pageInfo": {
                        "hasNextPage": end < count,
                        "hasPreviousPage": start > 0,
                        "startCursor": edges.first().map(|e| e["cursor"].clone()),
                        "endCursor": edges.last().map(|e| e["cursor"].clone()),
                    },
                });
                Ok(Some(FieldValue::from(json_to_graphql_value(payload))))
            })
        }
    }
}
