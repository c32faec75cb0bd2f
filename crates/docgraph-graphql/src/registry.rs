//! Registry for one schema-build session.
//!
//! The registry owns every generated type until the lowering pass consumes
//! it. Conversion is memoized by schema identity: the same
//! `Arc<DocumentSchema>` instance always resolves to the same generated
//! type, which both prevents duplicate type names and lets cyclic schema
//! graphs (a field referencing its own parent type) terminate.
//!
//! Insertion is declare-then-populate: a name is reserved before the type's
//! fields are converted, so recursive conversions that reach the same schema
//! mid-flight get the reserved name back instead of recursing forever.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use docgraph_schema::DocumentSchema;

use crate::error::ConvertError;
use crate::types::{CompositeType, EnumTypeDef, InputTypeDef, InterfaceTypeDef};

/// All generated types for one schema-build session.
///
/// Created by the caller, passed by reference into every conversion call,
/// and discarded (or recreated) for test isolation.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    composites: IndexMap<String, CompositeType>,
    inputs: IndexMap<String, InputTypeDef>,
    enums: IndexMap<String, EnumTypeDef>,
    interfaces: IndexMap<String, InterfaceTypeDef>,

    /// Schema identity → composite type name. The `Arc` is kept alive so the
    /// pointer key cannot be reused by an unrelated allocation.
    schema_memo: HashMap<usize, (Arc<DocumentSchema>, String)>,

    /// Composite name → derived input name.
    input_memo: HashMap<String, String>,
    /// Composite name → derived filter name.
    filter_memo: HashMap<String, String>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn schema_key(schema: &Arc<DocumentSchema>) -> usize {
        Arc::as_ptr(schema) as usize
    }

    /// The composite type name already generated for this schema instance.
    #[must_use]
    pub fn composite_for_schema(&self, schema: &Arc<DocumentSchema>) -> Option<&str> {
        self.schema_memo
            .get(&Self::schema_key(schema))
            .map(|(_, name)| name.as_str())
    }

    /// Records the schema → type-name association.
    pub fn memoize_schema(&mut self, schema: &Arc<DocumentSchema>, type_name: &str) {
        self.schema_memo.insert(
            Self::schema_key(schema),
            (Arc::clone(schema), type_name.to_string()),
        );
    }

    /// Whether any type family already claims this name.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.composites.contains_key(name)
            || self.inputs.contains_key(name)
            || self.enums.contains_key(name)
            || self.interfaces.contains_key(name)
    }

    /// Reserves a composite name with an empty placeholder.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::DuplicateTypeName` if the name is taken.
    pub fn declare_composite(&mut self, name: &str) -> Result<(), ConvertError> {
        if self.contains_name(name) {
            return Err(ConvertError::DuplicateTypeName {
                name: name.to_string(),
            });
        }
        self.composites
            .insert(name.to_string(), CompositeType::new(name));
        Ok(())
    }

    /// Stores a fully populated composite, replacing any placeholder.
    pub fn insert_composite(&mut self, composite: CompositeType) {
        self.composites.insert(composite.name.clone(), composite);
    }

    /// Looks up a composite by name.
    #[must_use]
    pub fn composite(&self, name: &str) -> Option<&CompositeType> {
        self.composites.get(name)
    }

    /// Mutable lookup of a composite by name.
    pub fn composite_mut(&mut self, name: &str) -> Option<&mut CompositeType> {
        self.composites.get_mut(name)
    }

    /// Reserves an input name with an empty placeholder.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::DuplicateTypeName` if the name is taken.
    pub fn declare_input(&mut self, name: &str) -> Result<(), ConvertError> {
        if self.contains_name(name) {
            return Err(ConvertError::DuplicateTypeName {
                name: name.to_string(),
            });
        }
        self.inputs.insert(name.to_string(), InputTypeDef::new(name));
        Ok(())
    }

    /// Stores a fully populated input type.
    pub fn insert_input(&mut self, input: InputTypeDef) {
        self.inputs.insert(input.name.clone(), input);
    }

    /// Looks up an input type by name.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&InputTypeDef> {
        self.inputs.get(name)
    }

    /// Mutable lookup of an input type by name.
    pub fn input_mut(&mut self, name: &str) -> Option<&mut InputTypeDef> {
        self.inputs.get_mut(name)
    }

    /// The memoized plain input derived from a composite, if any.
    #[must_use]
    pub fn input_for_composite(&self, composite: &str) -> Option<&str> {
        self.input_memo.get(composite).map(String::as_str)
    }

    /// Records the composite → input association.
    pub fn memoize_input(&mut self, composite: &str, input: &str) {
        self.input_memo
            .insert(composite.to_string(), input.to_string());
    }

    /// The memoized filter derived from a composite, if any.
    #[must_use]
    pub fn filter_for_composite(&self, composite: &str) -> Option<&str> {
        self.filter_memo.get(composite).map(String::as_str)
    }

    /// Records the composite → filter association.
    pub fn memoize_filter(&mut self, composite: &str, filter: &str) {
        self.filter_memo
            .insert(composite.to_string(), filter.to_string());
    }

    /// Stores an enum, reusing an existing one with the same name.
    pub fn insert_enum(&mut self, def: EnumTypeDef) {
        self.enums.entry(def.name.clone()).or_insert(def);
    }

    /// Looks up an enum by name.
    #[must_use]
    pub fn enum_type(&self, name: &str) -> Option<&EnumTypeDef> {
        self.enums.get(name)
    }

    /// Stores an interface.
    pub fn insert_interface(&mut self, def: InterfaceTypeDef) {
        self.interfaces.insert(def.name.clone(), def);
    }

    /// Looks up an interface by name.
    #[must_use]
    pub fn interface(&self, name: &str) -> Option<&InterfaceTypeDef> {
        self.interfaces.get(name)
    }

    /// Mutable lookup of an interface by name.
    pub fn interface_mut(&mut self, name: &str) -> Option<&mut InterfaceTypeDef> {
        self.interfaces.get_mut(name)
    }

    /// All composites, for the lowering pass.
    #[must_use]
    pub fn composites(&self) -> &IndexMap<String, CompositeType> {
        &self.composites
    }

    /// All input types, for the lowering pass.
    #[must_use]
    pub fn inputs(&self) -> &IndexMap<String, InputTypeDef> {
        &self.inputs
    }

    /// All enums, for the lowering pass.
    #[must_use]
    pub fn enums(&self) -> &IndexMap<String, EnumTypeDef> {
        &self.enums
    }

    /// All interfaces, for the lowering pass.
    #[must_use]
    pub fn interfaces(&self) -> &IndexMap<String, InterfaceTypeDef> {
        &self.interfaces
    }

    /// Total number of generated types.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.composites.len() + self.inputs.len() + self.enums.len() + self.interfaces.len()
    }
}
