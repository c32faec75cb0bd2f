//! Sort argument resolution.
//!
//! Each model gets one sort enum derived from its indexed paths: every path
//! yields an `_ASC` and a `_DESC` item (`age` becomes `AGE_ASC`/`AGE_DESC`,
//! dotted paths join with `__`). [`SortPlan`] maps item names back to
//! native sort specs at resolve time.

use docgraph_schema::DocumentSchema;
use docgraph_storage::{SortOrder, SortSpec};
use indexmap::IndexMap;
use serde_json::Value;

use crate::types::EnumTypeDef;

/// Item-name to sort-spec resolution for one model.
#[derive(Debug, Clone, Default)]
pub struct SortPlan {
    items: IndexMap<String, (String, SortOrder)>,
}

impl SortPlan {
    /// Builds the plan from a schema's indexed paths.
    #[must_use]
    pub fn from_schema(schema: &DocumentSchema) -> Self {
        let mut items = IndexMap::new();
        for path in schema.indexed_paths() {
            let stem = item_stem(&path);
            items.insert(format!("{stem}_ASC"), (path.clone(), SortOrder::Ascending));
            items.insert(format!("{stem}_DESC"), (path, SortOrder::Descending));
        }
        Self { items }
    }

    /// Whether the plan offers any item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The enum type lowered into the schema. Raw values are the item names
    /// themselves; resolution happens through the plan, not the enum.
    #[must_use]
    pub fn enum_def(&self, name: impl Into<String>) -> EnumTypeDef {
        EnumTypeDef::from_values(name, self.items.keys())
    }

    /// Resolves a sort argument (one enum item, or an ordered list) into a
    /// native sort spec. In the list form the first occurrence of a path
    /// wins; later duplicates are ignored. Unknown items resolve to nothing.
    #[must_use]
    pub fn resolve(&self, value: &Value) -> Option<SortSpec> {
        let mut spec = SortSpec::new();
        match value {
            Value::String(item) => {
                if let Some((path, order)) = self.items.get(item) {
                    spec.insert(path.clone(), *order);
                }
            }
            Value::Array(list) => {
                for entry in list {
                    if let Value::String(item) = entry
                        && let Some((path, order)) = self.items.get(item)
                        && !spec.contains_key(path)
                    {
                        spec.insert(path.clone(), *order);
                    }
                }
            }
            _ => {}
        }
        if spec.is_empty() { None } else { Some(spec) }
    }
}

/// `age` → `AGE`, `a.b` → `A__B`, `_id` → `_ID`.
fn item_stem(path: &str) -> String {
    path.replace('.', "__").to_uppercase()
}
