//! Generated enum types.

use indexmap::IndexMap;

/// A generated enum type.
///
/// Item names satisfy GraphQL identifier rules; each maps back to the raw
/// string stored in documents. For sort enums the raw value is the item name
/// itself.
#[derive(Debug, Clone, Default)]
pub struct EnumTypeDef {
    /// Type name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Item name → raw stored value, in declaration order.
    pub items: IndexMap<String, String>,
}

impl EnumTypeDef {
    /// Creates an enum from raw allowed values, sanitizing each into a valid
    /// item name. Any character outside `[A-Za-z0-9_]` becomes `_`; a
    /// leading digit is prefixed with `_`.
    pub fn from_values<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items = IndexMap::new();
        for value in values {
            let raw = value.as_ref();
            items.insert(sanitize_item_name(raw), raw.to_string());
        }
        Self {
            name: name.into(),
            description: None,
            items,
        }
    }

    /// The raw stored value for an item name.
    #[must_use]
    pub fn raw_value(&self, item: &str) -> Option<&str> {
        self.items.get(item).map(String::as_str)
    }

    /// The item name for a raw stored value.
    #[must_use]
    pub fn item_for_raw(&self, raw: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(_, v)| v.as_str() == raw)
            .map(|(k, _)| k.as_str())
    }
}

/// Replaces identifier-invalid characters with `_`.
pub(crate) fn sanitize_item_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
