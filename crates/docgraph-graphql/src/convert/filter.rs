//! Filter-type generation.
//!
//! The filter derived from a composite type is an all-nullable clone plus a
//! reserved `_operators` field holding per-field comparison-operator
//! sub-types, plus the `AND`/`OR` boolean combinators typed as non-null
//! lists of the filter type itself. References are by name, so the
//! self-reference needs no deferred construction.

use docgraph_schema::DocumentSchema;
use indexmap::IndexMap;

use super::capitalize_first;
use super::input::map_input_type;
use crate::config::FilterOptions;
use crate::error::ConvertError;
use crate::registry::TypeRegistry;
use crate::types::{FieldDef, InputTypeDef, TypeRef, scalars};

/// One comparison operator offered inside `_operators`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Not equal.
    Ne,
    /// Member of a list.
    In,
    /// Not a member of a list.
    Nin,
    /// Regular-expression match (string fields only).
    Regex,
    /// Field presence.
    Exists,
}

impl FilterOperator {
    /// The field name used inside the operator sub-type.
    #[must_use]
    pub fn graphql_name(self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Ne => "ne",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Regex => "regex",
            Self::Exists => "exists",
        }
    }

    /// The native query operator this rewrites to.
    #[must_use]
    pub fn query_operator(self) -> &'static str {
        match self {
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Ne => "$ne",
            Self::In => "$in",
            Self::Nin => "$nin",
            Self::Regex => "$regex",
            Self::Exists => "$exists",
        }
    }

    /// Parses an operator from its GraphQL field name.
    #[must_use]
    pub fn from_graphql(name: &str) -> Option<Self> {
        Some(match name {
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "ne" => Self::Ne,
            "in" => Self::In,
            "nin" => Self::Nin,
            "regex" => Self::Regex,
            "exists" => Self::Exists,
            _ => return None,
        })
    }

    /// The default operator set for a field of the given base type.
    #[must_use]
    pub fn defaults_for(base_type: &str) -> Vec<Self> {
        let mut ops = vec![
            Self::Gt,
            Self::Gte,
            Self::Lt,
            Self::Lte,
            Self::Ne,
            Self::In,
            Self::Nin,
            Self::Exists,
        ];
        if base_type == TypeRef::STRING {
            ops.push(Self::Regex);
        }
        ops
    }
}

/// Derives (or fetches) the filter type of a composite. Returns the filter
/// type name.
///
/// Filterable fields default to those participating in a database index;
/// `options.operators` overrides both the field set and the operator set.
///
/// # Errors
///
/// `ConvertError::UnknownType` when the composite is not registered.
pub fn build_filter_type(
    composite_name: &str,
    schema: &DocumentSchema,
    registry: &mut TypeRegistry,
    options: &FilterOptions,
) -> Result<String, ConvertError> {
    if let Some(existing) = registry.filter_for_composite(composite_name) {
        return Ok(existing.to_string());
    }

    let filter_name = format!("Filter{composite_name}Input");
    registry.declare_input(&filter_name)?;
    registry.memoize_filter(composite_name, &filter_name);

    let composite = registry
        .composite(composite_name)
        .ok_or_else(|| ConvertError::UnknownType {
            name: composite_name.to_string(),
        })?
        .clone();

    let mut filter = InputTypeDef::new(&filter_name);
    for (name, field) in &composite.fields {
        if options.remove_fields.contains(name) {
            continue;
        }
        let type_ref = map_input_type(&field.type_ref, registry)?;
        let type_ref = if options.required_fields.contains(name) {
            type_ref.non_null()
        } else {
            type_ref.nullable()
        };
        let mut def = FieldDef::new(type_ref);
        def.source_path = field.source_path.clone();
        filter.set_field(name.clone(), def);
    }

    // The reserved _operators sub-type.
    let operator_fields = operator_field_set(&composite, schema, options, registry);
    if !operator_fields.is_empty() {
        let operators_name = format!("Operators{composite_name}Input");
        registry.declare_input(&operators_name)?;
        let mut operators = InputTypeDef::new(&operators_name);

        for (field_name, ops) in operator_fields {
            let Some(field) = composite.field(&field_name) else {
                continue;
            };
            let base = field.type_ref.base_name().to_string();
            let sub_name = format!(
                "Operators{composite_name}{}Input",
                capitalize_first(&field_name)
            );
            registry.declare_input(&sub_name)?;

            let mut sub = InputTypeDef::new(&sub_name);
            for op in ops {
                let type_ref = match op {
                    FilterOperator::In | FilterOperator::Nin => {
                        TypeRef::named(base.clone()).list()
                    }
                    FilterOperator::Exists => TypeRef::named(TypeRef::BOOLEAN),
                    FilterOperator::Regex => TypeRef::named(TypeRef::STRING),
                    _ => TypeRef::named(base.clone()),
                };
                sub.set_field(op.graphql_name(), FieldDef::new(type_ref));
            }
            registry.insert_input(sub);

            let mut def = FieldDef::new(TypeRef::named(sub_name));
            def.source_path = field.source_path.clone();
            operators.set_field(field_name, def);
        }
        registry.insert_input(operators);

        filter.set_field(
            "_operators",
            FieldDef::new(TypeRef::named(format!("Operators{composite_name}Input"))),
        );
    }

    // Boolean combinators, self-referential by name.
    let self_list = TypeRef::named(&filter_name).non_null().list();
    filter.set_field("AND", FieldDef::new(self_list.clone()));
    filter.set_field("OR", FieldDef::new(self_list));

    registry.insert_input(filter);
    Ok(filter_name)
}

/// The exposed fields that get operator sub-types, with their operator sets.
fn operator_field_set(
    composite: &crate::types::CompositeType,
    schema: &DocumentSchema,
    options: &FilterOptions,
    registry: &TypeRegistry,
) -> IndexMap<String, Vec<FilterOperator>> {
    let mut result = IndexMap::new();

    if let Some(explicit) = &options.operators {
        for (name, ops) in explicit {
            if composite.has_field(name) && !options.remove_fields.contains(name) {
                result.insert(name.clone(), ops.clone());
            }
        }
        return result;
    }

    let indexed = schema.indexed_paths();
    for (name, field) in &composite.fields {
        if options.remove_fields.contains(name) {
            continue;
        }
        let base = field.type_ref.base_name();
        // Operators only make sense on leaf-typed fields.
        if !scalars::is_scalar(base) && registry.enum_type(base).is_none() {
            continue;
        }
        if options.only_indexed {
            let storage = field.storage_key(name);
            if !indexed.iter().any(|p| p == storage) {
                continue;
            }
        }
        result.insert(name.clone(), FilterOperator::defaults_for(base));
    }
    result
}

#[cfg(test)]
mod tests {
    use docgraph_schema::{FieldDescriptor, FieldKind, IndexDefinition, Model};

    use super::*;
    use crate::convert::model::convert_model;

    fn setup() -> (TypeRegistry, std::sync::Arc<DocumentSchema>) {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String))
            .unwrap()
            .field(FieldDescriptor::new("age", FieldKind::Number))
            .unwrap()
            .index(IndexDefinition::ascending("age"))
            .unwrap()
            .build();
        let model = Model::new("User", "users", schema.clone());
        let mut registry = TypeRegistry::new();
        convert_model(&model, &mut registry, false).unwrap();
        (registry, schema)
    }

    #[test]
    fn test_filter_has_combinators_and_operators() {
        let (mut registry, schema) = setup();
        let name =
            build_filter_type("User", &schema, &mut registry, &FilterOptions::default())
                .unwrap();
        assert_eq!(name, "FilterUserInput");

        let filter = registry.input("FilterUserInput").unwrap();
        assert!(filter.fields.contains_key("_operators"));
        assert_eq!(
            filter.fields["AND"].type_ref.to_string(),
            "[FilterUserInput!]"
        );
        assert_eq!(
            filter.fields["OR"].type_ref.to_string(),
            "[FilterUserInput!]"
        );
        // Plain fields are all nullable.
        assert_eq!(filter.fields["name"].type_ref.to_string(), "String");
    }

    #[test]
    fn test_operators_default_to_indexed_fields() {
        let (mut registry, schema) = setup();
        build_filter_type("User", &schema, &mut registry, &FilterOptions::default()).unwrap();

        let operators = registry.input("OperatorsUserInput").unwrap();
        // `age` is indexed and `_id` is always treated as indexed;
        // `name` is not.
        assert!(operators.fields.contains_key("age"));
        assert!(operators.fields.contains_key("_id"));
        assert!(!operators.fields.contains_key("name"));

        let age_ops = registry.input("OperatorsUserAgeInput").unwrap();
        assert_eq!(age_ops.fields["gt"].type_ref.to_string(), "Float");
        assert_eq!(age_ops.fields["in"].type_ref.to_string(), "[Float]");
        assert_eq!(age_ops.fields["exists"].type_ref.to_string(), "Boolean");
        // Regex only for string fields.
        assert!(!age_ops.fields.contains_key("regex"));
    }

    #[test]
    fn test_regex_offered_for_strings() {
        let (mut registry, schema) = setup();
        let options = FilterOptions {
            only_indexed: false,
            ..Default::default()
        };
        build_filter_type("User", &schema, &mut registry, &options).unwrap();

        let name_ops = registry.input("OperatorsUserNameInput").unwrap();
        assert!(name_ops.fields.contains_key("regex"));
    }

    #[test]
    fn test_filter_memoized() {
        let (mut registry, schema) = setup();
        let first =
            build_filter_type("User", &schema, &mut registry, &FilterOptions::default())
                .unwrap();
        let second =
            build_filter_type("User", &schema, &mut registry, &FilterOptions::default())
                .unwrap();
        assert_eq!(first, second);
    }
}
