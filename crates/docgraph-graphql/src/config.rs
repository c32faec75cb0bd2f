//! Configuration for schema composition.
//!
//! One explicit struct per option group, with a single canonical name per
//! option. Every CRUD operation can be disabled individually or given its
//! own sub-options through [`OperationsConfig`].

use indexmap::IndexMap;

use crate::convert::filter::FilterOperator;

/// Limits and toggles applied when the composed schema is finished.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
        }
    }
}

/// Options for composing one model into the schema.
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Override for the generated type name (defaults to the model name).
    pub name: Option<String>,

    /// Description attached to the generated type.
    pub description: Option<String>,

    /// Whitelist of exposed field names; empty means all fields.
    pub only_fields: Vec<String>,

    /// Blacklist of exposed field names.
    pub remove_fields: Vec<String>,

    /// Options for the generated mutation input type.
    pub input: InputOptions,

    /// Make input fields carrying a default value NonNull.
    pub defaults_as_non_null: bool,

    /// Opt into discriminator-aware conversion when the model's schema
    /// declares subtypes.
    pub include_base_discriminators: bool,

    /// Opt into discriminator-aware conversion for nested embedded schemas.
    pub include_nested_discriminators: bool,

    /// Per-operation enablement and options.
    pub operations: OperationsConfig,
}

/// Options for the generated mutation input type.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    /// Override for the input type name.
    pub name: Option<String>,

    /// Description attached to the input type.
    pub description: Option<String>,

    /// Whitelist of input field names; empty means all fields.
    pub only_fields: Vec<String>,

    /// Blacklist of input field names.
    pub remove_fields: Vec<String>,

    /// Fields forced back to NonNull after the all-nullable cloning.
    pub required_fields: Vec<String>,
}

/// Enablement of one operation: on with options, or off entirely.
#[derive(Debug, Clone)]
pub enum OperationConfig<T> {
    /// The operation is exposed with the given options.
    Enabled(T),
    /// The operation is not exposed.
    Disabled,
}

impl<T: Default> Default for OperationConfig<T> {
    fn default() -> Self {
        Self::Enabled(T::default())
    }
}

impl<T> OperationConfig<T> {
    /// The options when enabled.
    #[must_use]
    pub fn options(&self) -> Option<&T> {
        match self {
            Self::Enabled(options) => Some(options),
            Self::Disabled => None,
        }
    }
}

/// Per-operation configuration for one model.
#[derive(Debug, Clone, Default)]
pub struct OperationsConfig {
    /// `<model>FindOne` query.
    pub find_one: OperationConfig<QueryOpOptions>,
    /// `<model>FindMany` query.
    pub find_many: OperationConfig<QueryOpOptions>,
    /// `<model>FindById` query.
    pub find_by_id: OperationConfig<QueryOpOptions>,
    /// `<model>FindByIds` query.
    pub find_by_ids: OperationConfig<QueryOpOptions>,
    /// `<model>Count` query.
    pub count: OperationConfig<QueryOpOptions>,
    /// `<model>Pagination` query.
    pub pagination: OperationConfig<QueryOpOptions>,
    /// `<model>Connection` query.
    pub connection: OperationConfig<QueryOpOptions>,
    /// `<model>CreateOne` mutation.
    pub create_one: OperationConfig<MutationOpOptions>,
    /// `<model>CreateMany` mutation.
    pub create_many: OperationConfig<MutationOpOptions>,
    /// `<model>UpdateOne` mutation.
    pub update_one: OperationConfig<MutationOpOptions>,
    /// `<model>UpdateById` mutation.
    pub update_by_id: OperationConfig<MutationOpOptions>,
    /// `<model>UpdateMany` mutation.
    pub update_many: OperationConfig<MutationOpOptions>,
    /// `<model>RemoveOne` mutation.
    pub remove_one: OperationConfig<MutationOpOptions>,
    /// `<model>RemoveById` mutation.
    pub remove_by_id: OperationConfig<MutationOpOptions>,
    /// `<model>RemoveMany` mutation.
    pub remove_many: OperationConfig<MutationOpOptions>,
}

/// Options shared by the read-side operations.
#[derive(Debug, Clone, Default)]
pub struct QueryOpOptions {
    /// Filter argument options.
    pub filter: FilterOptions,
    /// Sort argument options.
    pub sort: SortOptions,
    /// Limit argument options.
    pub limit: LimitOptions,
}

/// Options shared by the write-side operations.
#[derive(Debug, Clone, Default)]
pub struct MutationOpOptions {
    /// Record argument options.
    pub record: RecordOptions,
    /// Filter argument options (update/remove family).
    pub filter: FilterOptions,
    /// Sort argument options (update/remove family).
    pub sort: SortOptions,
}

/// Options for the generated filter argument.
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Make the filter argument itself NonNull.
    pub is_required: bool,

    /// Offer comparison operators only for indexed fields.
    pub only_indexed: bool,

    /// Explicit operator sets per field; `None` keeps the defaults.
    pub operators: Option<IndexMap<String, Vec<FilterOperator>>>,

    /// Fields removed from the filter type.
    pub remove_fields: Vec<String>,

    /// Fields forced back to NonNull in the filter type.
    pub required_fields: Vec<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            is_required: false,
            only_indexed: true,
            operators: None,
            remove_fields: Vec::new(),
            required_fields: Vec::new(),
        }
    }
}

/// Options for the generated sort argument.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// Accept an ordered list of sort values instead of a single one.
    /// The first occurrence of a conflicting key wins.
    pub multi: bool,
}

/// Options for the generated limit argument.
#[derive(Debug, Clone)]
pub struct LimitOptions {
    /// Limit applied when the argument is absent.
    pub default_value: u64,
}

impl Default for LimitOptions {
    fn default() -> Self {
        Self { default_value: 100 }
    }
}

/// Options for the generated record argument.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Fields removed from the record input type.
    pub remove_fields: Vec<String>,

    /// Fields forced to NonNull in the record input type.
    pub required_fields: Vec<String>,

    /// Apply the all-nullable cloning to the record input as well.
    /// Off by default: record inputs keep the output nullability.
    pub all_fields_nullable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_composer_config() {
        let config = ComposerConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection_enabled);
    }

    #[test]
    fn test_operations_default_enabled() {
        let ops = OperationsConfig::default();
        assert!(ops.find_many.options().is_some());
        assert!(ops.create_one.options().is_some());

        let ops = OperationsConfig {
            remove_many: OperationConfig::Disabled,
            ..Default::default()
        };
        assert!(ops.remove_many.options().is_none());
    }

    #[test]
    fn test_filter_defaults_to_indexed_only() {
        let filter = FilterOptions::default();
        assert!(filter.only_indexed);
        assert!(!filter.is_required);
    }
}
