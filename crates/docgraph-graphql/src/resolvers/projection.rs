//! Projection derivation from the GraphQL selection set.
//!
//! Find operations only fetch the top-level paths the query actually
//! selects. Any selection the translator cannot account for (fragments on
//! unexpected types, wildcard resolvers) falls back to whole documents
//! rather than risk under-fetching.

use async_graphql::dynamic::ResolverContext;
use docgraph_storage::Projection;

use super::filter::FieldTranslator;

/// Derives a storage projection from the current field's selection set.
#[must_use]
pub fn projection_from_selection(
    ctx: &ResolverContext<'_>,
    translator: &FieldTranslator,
) -> Projection {
    let mut fields: Vec<String> = Vec::new();
    for selection in ctx.look_ahead().selection_fields() {
        for child in selection.selection_set() {
            let name = child.name();
            if name == "__typename" {
                continue;
            }
            if name == "*" {
                return Projection::All;
            }
            match translator.rule(name) {
                Some(rule) => push_unique(&mut fields, &rule.storage_key),
                // A selection the translator does not know about: fetch
                // everything rather than under-fetch.
                None => return Projection::All,
            }
        }
    }
    if fields.is_empty() {
        return Projection::All;
    }
    push_unique(&mut fields, "_id");
    Projection::Fields(fields)
}

/// Appends a storage path unless it is already projected. Interface queries
/// repeat shared selections across inline fragments, in any order.
fn push_unique(fields: &mut Vec<String>, key: &str) {
    if !fields.iter().any(|f| f == key) {
        fields.push(key.to_string());
    }
}
