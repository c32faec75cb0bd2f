//! Lowering the intermediate type graph into an executable schema.
//!
//! Object fields carry one uniform resolve closure: the parent value is the
//! exposed-shape JSON the operation resolvers produce, so a field read is a
//! key lookup. Enum-typed fields re-tag their strings as enum values, and
//! interface-typed fields resolve the concrete object type through the
//! interface's polymorphic tag.

use std::borrow::Cow;
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, Scalar, Schema, TypeRef as DynTypeRef,
};
use async_graphql::{Name, Value};
use tracing::trace;

use crate::config::ComposerConfig;
use crate::error::ConvertError;
use crate::registry::TypeRegistry;
use crate::resolvers::connection::ConnectionResolver;
use crate::resolvers::find::{
    CountResolver, FindByIdResolver, FindByIdsResolver, FindManyResolver, FindOneResolver,
};
use crate::resolvers::json_to_graphql_value;
use crate::resolvers::mutation::{
    CreateManyResolver, CreateOneResolver, RemoveByIdResolver, RemoveManyResolver,
    RemoveOneResolver, UpdateByIdResolver, UpdateManyResolver, UpdateOneResolver,
};
use crate::resolvers::pagination::PaginationResolver;
use crate::types::{FieldDef, PolymorphicMeta, TypeRef, scalars};

use super::composer::{OperationKind, OperationPlan};

/// Lowers the registry and the operation plans into a finished schema.
pub(crate) fn lower(
    registry: TypeRegistry,
    plans: Vec<OperationPlan>,
    config: &ComposerConfig,
) -> Result<Schema, ConvertError> {
    let has_mutations = plans.iter().any(|plan| plan.kind.is_mutation());
    let mut builder = Schema::build("Query", has_mutations.then_some("Mutation"), None);

    for (name, description) in scalars::custom_scalars() {
        builder = builder.register(Scalar::new(name).description(description));
    }

    for def in registry.enums().values() {
        let mut lowered = Enum::new(&def.name);
        if let Some(description) = &def.description {
            lowered = lowered.description(description);
        }
        for item in def.items.keys() {
            lowered = lowered.item(EnumItem::new(item));
        }
        builder = builder.register(lowered);
    }

    for def in registry.interfaces().values() {
        let mut lowered = Interface::new(&def.name);
        if let Some(description) = &def.description {
            lowered = lowered.description(description);
        }
        for (name, field) in &def.fields {
            lowered = lowered.field(InterfaceField::new(name, lower_type_ref(&field.type_ref)));
        }
        builder = builder.register(lowered);
    }

    for def in registry.composites().values() {
        let mut lowered = Object::new(&def.name);
        if let Some(description) = &def.description {
            lowered = lowered.description(description);
        }
        for interface in &def.interfaces {
            lowered = lowered.implement(interface);
        }
        for (name, field) in &def.fields {
            lowered = lowered.field(value_field(name, field, &registry));
        }
        trace!(type_name = %def.name, fields = def.fields.len(), "Lowered object type");
        builder = builder.register(lowered);
    }

    for def in registry.inputs().values() {
        let mut lowered = InputObject::new(&def.name);
        if let Some(description) = &def.description {
            lowered = lowered.description(description);
        }
        for (name, field) in &def.fields {
            let mut value = InputValue::new(name, lower_type_ref(&field.type_ref));
            if let Some(description) = &field.description {
                value = value.description(description);
            }
            if let Some(default) = &field.default_value {
                value = value.default_value(json_to_graphql_value(default.clone()));
            }
            lowered = lowered.field(value);
        }
        builder = builder.register(lowered);
    }

    let mut query = Object::new("Query").description("Generated query root");
    query = query.field(
        Field::new("_health", DynTypeRef::named_nn(DynTypeRef::STRING), |_| {
            FieldFuture::new(async { Ok(Some(Value::String("ok".to_string()))) })
        })
        .description("Health check"),
    );
    let mut mutation = Object::new("Mutation").description("Generated mutation root");

    for plan in plans {
        let is_mutation = plan.kind.is_mutation();
        let field = operation_field(plan);
        if is_mutation {
            mutation = mutation.field(field);
        } else {
            query = query.field(field);
        }
    }

    builder = builder.register(query);
    if has_mutations {
        builder = builder.register(mutation);
    }

    let mut builder = builder
        .limit_depth(config.max_depth)
        .limit_complexity(config.max_complexity);
    if !config.introspection_enabled {
        builder = builder.disable_introspection();
    }

    builder
        .finish()
        .map_err(|e| ConvertError::SchemaBuildFailed(e.to_string()))
}

/// Installs one planned operation as a root field.
fn operation_field(plan: OperationPlan) -> Field {
    let OperationPlan {
        field_name,
        kind,
        seed,
        output,
        args,
        description,
    } = plan;

    let type_ref = lower_type_ref(&output);
    let mut field = match kind {
        OperationKind::FindOne => Field::new(field_name, type_ref, FindOneResolver::resolve(seed)),
        OperationKind::FindMany => {
            Field::new(field_name, type_ref, FindManyResolver::resolve(seed))
        }
        OperationKind::FindById => {
            Field::new(field_name, type_ref, FindByIdResolver::resolve(seed))
        }
        OperationKind::FindByIds => {
            Field::new(field_name, type_ref, FindByIdsResolver::resolve(seed))
        }
        OperationKind::Count => Field::new(field_name, type_ref, CountResolver::resolve(seed)),
        OperationKind::Pagination => {
            Field::new(field_name, type_ref, PaginationResolver::resolve(seed))
        }
        OperationKind::Connection => {
            Field::new(field_name, type_ref, ConnectionResolver::resolve(seed))
        }
        OperationKind::CreateOne => {
            Field::new(field_name, type_ref, CreateOneResolver::resolve(seed))
        }
        OperationKind::CreateMany => {
            Field::new(field_name, type_ref, CreateManyResolver::resolve(seed))
        }
        OperationKind::UpdateById => {
            Field::new(field_name, type_ref, UpdateByIdResolver::resolve(seed))
        }
        OperationKind::UpdateOne => {
            Field::new(field_name, type_ref, UpdateOneResolver::resolve(seed))
        }
        OperationKind::UpdateMany => {
            Field::new(field_name, type_ref, UpdateManyResolver::resolve(seed))
        }
        OperationKind::RemoveById => {
            Field::new(field_name, type_ref, RemoveByIdResolver::resolve(seed))
        }
        OperationKind::RemoveOne => {
            Field::new(field_name, type_ref, RemoveOneResolver::resolve(seed))
        }
        OperationKind::RemoveMany => {
            Field::new(field_name, type_ref, RemoveManyResolver::resolve(seed))
        }
    };

    for arg in args {
        let mut input = InputValue::new(arg.name, lower_type_ref(&arg.type_ref));
        if let Some(default) = arg.default_value {
            input = input.default_value(json_to_graphql_value(default));
        }
        field = field.argument(input);
    }
    if let Some(description) = description {
        field = field.description(description);
    }
    field
}

/// How a field's resolved JSON needs to be wrapped for the executor.
#[derive(Clone)]
enum FieldShape {
    /// Scalars, objects and lists pass through as plain values.
    Plain,
    /// Enum strings are re-tagged as enum values.
    Enum,
    /// Interface-typed values get a concrete type attached.
    Interface(Arc<PolymorphicMeta>),
}

impl FieldShape {
    fn of(type_ref: &TypeRef, registry: &TypeRegistry) -> Self {
        let base = type_ref.base_name();
        if registry.enum_type(base).is_some() {
            Self::Enum
        } else if let Some(interface) = registry.interface(base) {
            Self::Interface(Arc::new(interface.polymorphic.clone()))
        } else {
            Self::Plain
        }
    }

    fn wrap(&self, value: Value) -> FieldValue<'static> {
        match self {
            Self::Plain => FieldValue::value(value),
            Self::Enum => FieldValue::value(enumify(value)),
            Self::Interface(meta) => match value {
                Value::List(items) => {
                    FieldValue::list(items.into_iter().map(|item| concrete(meta, item)))
                }
                other => concrete(meta, other),
            },
        }
    }
}

fn enumify(value: Value) -> Value {
    match value {
        Value::String(s) => Value::Enum(Name::new(s)),
        Value::List(items) => Value::List(items.into_iter().map(enumify).collect()),
        other => other,
    }
}

/// Attaches the concrete object type resolved through the polymorphic tag.
fn concrete(meta: &PolymorphicMeta, value: Value) -> FieldValue<'static> {
    let tag = match &value {
        Value::Object(obj) => obj.get(meta.key.as_str()).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Enum(name) => Some(name.to_string()),
            _ => None,
        }),
        _ => None,
    };
    match tag.as_deref().and_then(|tag| meta.type_for(tag)) {
        Some(type_name) => FieldValue::value(value).with_type(type_name.to_string()),
        None => FieldValue::value(value),
    }
}

/// One object field: a key lookup in the exposed-shape parent value.
fn value_field(name: &str, def: &FieldDef, registry: &TypeRegistry) -> Field {
    let shape = FieldShape::of(&def.type_ref, registry);
    let exposed = name.to_string();

    let mut field = Field::new(name, lower_type_ref(&def.type_ref), move |ctx| {
        let exposed = exposed.clone();
        let shape = shape.clone();
        FieldFuture::new(async move {
            let Some(Value::Object(parent)) = ctx.parent_value.as_value() else {
                return Ok(None);
            };
            let Some(value) = parent.get(exposed.as_str()) else {
                return Ok(None);
            };
            if matches!(value, Value::Null) {
                return Ok(None);
            }
            Ok(Some(shape.wrap(value.clone())))
        })
    });

    if let Some(description) = &def.description {
        field = field.description(description);
    }
    if let Some(reason) = &def.deprecation {
        field = field.deprecation(Some(reason.as_str()));
    }
    field
}

fn lower_type_ref(type_ref: &TypeRef) -> DynTypeRef {
    match type_ref {
        TypeRef::Named(name) => DynTypeRef::Named(Cow::Owned(name.clone())),
        TypeRef::NonNull(inner) => DynTypeRef::NonNull(Box::new(lower_type_ref(inner))),
        TypeRef::List(inner) => DynTypeRef::List(Box::new(lower_type_ref(inner))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_graphql::Request;
    use docgraph_schema::{DocumentSchema, FieldDescriptor, FieldKind, Model};
    use docgraph_storage::{DocumentStore, DynStore, MemoryStore};
    use serde_json::json;

    use crate::config::{ComposeOptions, ComposerConfig};
    use crate::context::GraphQLContext;
    use crate::schema::SchemaComposer;

    use super::*;

    fn composed_schema() -> Schema {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String).required())
            .unwrap()
            .field(FieldDescriptor::new("age", FieldKind::Number))
            .unwrap()
            .build();
        let model = Model::new("User", "users", schema);
        let mut composer = SchemaComposer::new(ComposerConfig::default());
        composer.add_model(&model, ComposeOptions::default()).unwrap();
        composer.build().unwrap()
    }

    fn test_context() -> GraphQLContext {
        let store: DynStore = Arc::new(MemoryStore::new());
        GraphQLContext::builder().with_store(store).build().unwrap()
    }

    #[test]
    fn test_lower_type_ref_wrapping() {
        let list_nn = TypeRef::named("User").non_null().list().non_null();
        assert_eq!(lower_type_ref(&list_nn).to_string(), "[User!]!");
        assert_eq!(
            lower_type_ref(&TypeRef::named("User")).to_string(),
            "User"
        );
    }

    #[tokio::test]
    async fn test_health_field_resolves() {
        let schema = composed_schema();
        let response = schema
            .execute(Request::new("{ _health }").data(test_context()))
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "_health": "ok" })
        );
    }

    #[tokio::test]
    async fn test_find_many_resolves_against_store() {
        let store: DynStore = Arc::new(MemoryStore::new());
        store
            .insert_one("users", &json!({"name": "ada", "age": 36.0}))
            .await
            .unwrap();
        let ctx = GraphQLContext::builder()
            .with_store(store)
            .build()
            .unwrap();

        let schema = composed_schema();
        let response = schema
            .execute(Request::new("{ userFindMany { name age } }").data(ctx))
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "userFindMany": [{ "name": "ada", "age": 36.0 }] })
        );
    }

    #[test]
    fn test_introspection_can_be_disabled() {
        let schema = DocumentSchema::builder()
            .field(FieldDescriptor::new("name", FieldKind::String))
            .unwrap()
            .build();
        let model = Model::new("User", "users", schema);
        let config = ComposerConfig {
            introspection_enabled: false,
            ..Default::default()
        };
        let mut composer = SchemaComposer::new(config);
        composer.add_model(&model, ComposeOptions::default()).unwrap();
        assert!(composer.build().is_ok());
    }
}
