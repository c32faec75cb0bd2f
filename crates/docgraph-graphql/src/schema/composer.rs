//! Model-to-operation composition.
//!
//! `add_model` turns one model into its type family (document type, input
//! types, filter, sort enum, payloads) and records an [`OperationPlan`] for
//! every operation the caller left enabled. Plans carry everything the
//! lowering pass needs to install a root field: the name, the output type,
//! the argument list and the pre-built [`OperationSeed`] the resolve closure
//! captures.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use docgraph_schema::Model;
use serde_json::json;
use tracing::debug;

use crate::config::{
    ComposeOptions, ComposerConfig, FilterOptions, LimitOptions, OperationsConfig, QueryOpOptions,
    RecordOptions, SortOptions,
};
use crate::convert::discriminator::MergeConflictPolicy;
use crate::convert::filter::build_filter_type;
use crate::convert::input::{build_input_type, build_record_input};
use crate::convert::model::convert_model;
use crate::convert::{DiscriminatorGroup, lowercase_first};
use crate::error::ConvertError;
use crate::registry::TypeRegistry;
use crate::resolvers::filter::FieldTranslator;
use crate::resolvers::pagination::DEFAULT_PER_PAGE;
use crate::resolvers::sort::SortPlan;
use crate::resolvers::OperationSeed;
use crate::types::{CompositeType, FieldDef, InterfaceTypeDef, PolymorphicMeta, TypeRef, scalars};

use super::into_schema;

/// Name of the interface every payload `error` field is typed as.
pub(crate) const ERROR_INTERFACE: &str = "ErrorInterface";

/// The operation a plan's resolve closure implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// First document matching a filter.
    FindOne,
    /// All documents matching a filter, up to `limit`.
    FindMany,
    /// One document by id, batched through the dataloader.
    FindById,
    /// Several documents by id, batched through the dataloader.
    FindByIds,
    /// Count of documents matching a filter.
    Count,
    /// Page/perPage pagination.
    Pagination,
    /// Relay-style cursor pagination.
    Connection,
    /// Validate and insert one document.
    CreateOne,
    /// Validate and insert several documents.
    CreateMany,
    /// Patch one document by id.
    UpdateById,
    /// Patch the first document matching a filter.
    UpdateOne,
    /// Patch all documents matching a filter.
    UpdateMany,
    /// Delete one document by id.
    RemoveById,
    /// Delete the first document matching a filter.
    RemoveOne,
    /// Delete all documents matching a filter.
    RemoveMany,
}

impl OperationKind {
    /// Whether the operation belongs under the Mutation root.
    #[must_use]
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::CreateOne
                | Self::CreateMany
                | Self::UpdateById
                | Self::UpdateOne
                | Self::UpdateMany
                | Self::RemoveById
                | Self::RemoveOne
                | Self::RemoveMany
        )
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::FindOne => "FindOne",
            Self::FindMany => "FindMany",
            Self::FindById => "FindById",
            Self::FindByIds => "FindByIds",
            Self::Count => "Count",
            Self::Pagination => "Pagination",
            Self::Connection => "Connection",
            Self::CreateOne => "CreateOne",
            Self::CreateMany => "CreateMany",
            Self::UpdateById => "UpdateById",
            Self::UpdateOne => "UpdateOne",
            Self::UpdateMany => "UpdateMany",
            Self::RemoveById => "RemoveById",
            Self::RemoveOne => "RemoveOne",
            Self::RemoveMany => "RemoveMany",
        }
    }
}

/// One argument of a planned root field.
#[derive(Debug, Clone)]
pub struct ArgPlan {
    /// Argument name.
    pub name: String,
    /// Argument type.
    pub type_ref: TypeRef,
    /// Default value printed into the schema.
    pub default_value: Option<serde_json::Value>,
}

impl ArgPlan {
    fn new(name: &str, type_ref: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            type_ref,
            default_value: None,
        }
    }

    fn with_default(name: &str, type_ref: TypeRef, default: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            type_ref,
            default_value: Some(default),
        }
    }
}

/// A planned root field, ready for lowering.
#[derive(Clone)]
pub struct OperationPlan {
    /// Root field name, e.g. `userFindMany`.
    pub field_name: String,
    /// Which resolve closure to install.
    pub kind: OperationKind,
    /// Compile-time state the closure captures.
    pub seed: OperationSeed,
    /// Output type.
    pub output: TypeRef,
    /// Arguments in declaration order.
    pub args: Vec<ArgPlan>,
    /// Field description.
    pub description: Option<String>,
}

/// Where a record input type's fields come from.
enum RecordSource<'a> {
    /// A single composite type.
    Composite(&'a str),
    /// The field union of a discriminator family's subtypes.
    Merged(&'a DiscriminatorGroup),
}

/// Everything `add_operations` needs to plan one type's operation set.
struct OpTarget<'a> {
    model: &'a Model,
    /// Prefix for generated type and field names.
    name: &'a str,
    /// Output document type (composite, or interface for polymorphic ops).
    doc_type: &'a str,
    filter_name: &'a str,
    sort_enum: Option<&'a str>,
    translator: &'a Arc<FieldTranslator>,
    sort_plan: &'a Arc<SortPlan>,
    discriminator: Option<(String, String)>,
    polymorphic: Option<Arc<PolymorphicMeta>>,
    record_source: RecordSource<'a>,
    /// Discriminator key hidden from record inputs; the seed pins it.
    hidden_key: Option<&'a str>,
}

impl OpTarget<'_> {
    fn seed(&self, limit_default: u64) -> OperationSeed {
        OperationSeed {
            model: self.model.clone(),
            translator: Arc::clone(self.translator),
            sort_plan: Arc::clone(self.sort_plan),
            discriminator: self.discriminator.clone(),
            polymorphic: self.polymorphic.clone(),
            limit_default,
        }
    }
}

/// Composes models into an executable GraphQL schema.
///
/// # Example
///
/// ```ignore
/// let mut composer = SchemaComposer::new(ComposerConfig::default());
/// composer.add_model(&user_model, ComposeOptions::default())?;
/// let schema = composer.build()?;
/// ```
pub struct SchemaComposer {
    registry: TypeRegistry,
    config: ComposerConfig,
    plans: Vec<OperationPlan>,
}

impl SchemaComposer {
    /// Creates a composer with the shared error types pre-registered.
    #[must_use]
    pub fn new(config: ComposerConfig) -> Self {
        let mut registry = TypeRegistry::new();
        bootstrap_error_types(&mut registry);
        Self {
            registry,
            config,
            plans: Vec::new(),
        }
    }

    /// The intermediate type graph, for inspection and structural edits.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Mutable access to the intermediate type graph.
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// The operation plans recorded so far.
    #[must_use]
    pub fn plans(&self) -> &[OperationPlan] {
        &self.plans
    }

    /// Converts a model into its type family and plans its enabled
    /// operations. Returns the document type name (the shared interface
    /// name for a discriminated model).
    ///
    /// # Errors
    ///
    /// Anything the schema conversion raises, plus
    /// `ConvertError::DuplicateTypeName` when the model's name collides
    /// with an already-added model.
    pub fn add_model(
        &mut self,
        model: &Model,
        options: ComposeOptions,
    ) -> Result<String, ConvertError> {
        let model = match &options.name {
            Some(name) => Model::new(name.clone(), model.collection.clone(), Arc::clone(&model.schema)),
            None => model.clone(),
        };
        debug!(model = %model.name, collection = %model.collection, "Adding model to schema");

        if options.include_base_discriminators && model.schema.has_discriminators() {
            return self.add_discriminated_model(&model, &options);
        }

        let type_name = convert_model(
            &model,
            &mut self.registry,
            options.include_nested_discriminators,
        )?;

        if let Some(composite) = self.registry.composite_mut(&type_name) {
            if let Some(description) = &options.description {
                composite.description = Some(description.clone());
            }
            if !options.only_fields.is_empty() {
                let keep: Vec<&str> = options.only_fields.iter().map(String::as_str).collect();
                composite.remove_other_fields(&keep);
            }
            for name in &options.remove_fields {
                composite.remove_field(name);
            }
        }

        // The plain derived input backs nested object arguments; record
        // inputs for the mutation family are built per operation below.
        build_input_type(
            &type_name,
            &mut self.registry,
            &options.input,
            options.defaults_as_non_null,
        )?;

        let filter_options = options
            .operations
            .find_many
            .options()
            .map(|opts| opts.filter.clone())
            .unwrap_or_default();
        let filter_name =
            build_filter_type(&type_name, &model.schema, &mut self.registry, &filter_options)?;

        let sort_plan = Arc::new(SortPlan::from_schema(&model.schema));
        let sort_enum = self.register_sort_enum(&type_name, &sort_plan);

        let translator = Arc::new(FieldTranslator::from_schema(&model.schema)?);

        let target = OpTarget {
            model: &model,
            name: &type_name,
            doc_type: &type_name,
            filter_name: &filter_name,
            sort_enum: sort_enum.as_deref(),
            translator: &translator,
            sort_plan: &sort_plan,
            discriminator: None,
            polymorphic: None,
            record_source: RecordSource::Composite(&type_name),
            hidden_key: None,
        };
        self.add_operations(&target, &options.operations)?;

        Ok(type_name)
    }

    /// Discriminated variant of `add_model`: the base type becomes an
    /// interface family, operations on the base return the interface, and
    /// each subtype gets its own operation set pinned to its discriminator
    /// value.
    fn add_discriminated_model(
        &mut self,
        model: &Model,
        options: &ComposeOptions,
    ) -> Result<String, ConvertError> {
        let group = DiscriminatorGroup::from_model(model, &mut self.registry)?;

        if !options.only_fields.is_empty() {
            let mut keep: Vec<&str> = options.only_fields.iter().map(String::as_str).collect();
            // The tag and id always survive; the family is unusable without them.
            keep.push(group.key());
            keep.push("_id");
            group.remove_other_fields(&mut self.registry, &keep);
        }
        for name in &options.remove_fields {
            group.remove_field(&mut self.registry, name);
        }
        if let Some(description) = &options.description {
            if let Some(composite) = self.registry.composite_mut(group.base_name()) {
                composite.description = Some(description.clone());
            }
            if let Some(interface) = self.registry.interface_mut(group.interface_name()) {
                interface.description = Some(description.clone());
            }
        }

        let polymorphic = Arc::new(
            self.registry
                .interface(group.interface_name())
                .map(|interface| interface.polymorphic.clone())
                .unwrap_or_default(),
        );

        // One family-wide translator: documents of any subtype decode with it.
        let mut translator = FieldTranslator::from_schema(&model.schema)?;
        for child_schema in model.schema.discriminators().values() {
            translator.merge(&FieldTranslator::from_schema(child_schema)?);
        }
        let translator = Arc::new(translator);

        let filter_options = options
            .operations
            .find_many
            .options()
            .map(|opts| opts.filter.clone())
            .unwrap_or_default();
        let filter_name = build_filter_type(
            group.base_name(),
            &model.schema,
            &mut self.registry,
            &filter_options,
        )?;

        let sort_plan = Arc::new(SortPlan::from_schema(&model.schema));
        let sort_enum = self.register_sort_enum(group.base_name(), &sort_plan);

        let interface_name = group.interface_name().to_string();
        let base_name = group.base_name().to_string();

        let base_target = OpTarget {
            model,
            name: &base_name,
            doc_type: &interface_name,
            filter_name: &filter_name,
            sort_enum: sort_enum.as_deref(),
            translator: &translator,
            sort_plan: &sort_plan,
            discriminator: None,
            polymorphic: Some(Arc::clone(&polymorphic)),
            record_source: RecordSource::Merged(&group),
            hidden_key: None,
        };
        self.add_operations(&base_target, &options.operations)?;

        let key = group.key().to_string();
        // Subtype filters hide the tag field; each subtype operation pins
        // it server-side, so a client-supplied value must not be expressible.
        let mut child_filter_options = filter_options.clone();
        child_filter_options.remove_fields.push(key.clone());
        for (value, child_name) in group.children().clone() {
            let child_filter_name = build_filter_type(
                &child_name,
                &model.schema,
                &mut self.registry,
                &child_filter_options,
            )?;
            let child_target = OpTarget {
                model,
                name: &child_name,
                doc_type: &child_name,
                filter_name: &child_filter_name,
                sort_enum: sort_enum.as_deref(),
                translator: &translator,
                sort_plan: &sort_plan,
                discriminator: Some((key.clone(), value.clone())),
                polymorphic: None,
                record_source: RecordSource::Composite(&child_name),
                hidden_key: Some(&key),
            };
            self.add_operations(&child_target, &options.operations)?;
        }

        Ok(interface_name)
    }

    /// Lowers the type graph and the plans into an executable schema.
    ///
    /// # Errors
    ///
    /// `ConvertError::SchemaBuildFailed` when the dynamic schema rejects
    /// the lowered graph.
    pub fn build(self) -> Result<Schema, ConvertError> {
        debug!(
            types = self.registry.generated_count(),
            operations = self.plans.len(),
            "Lowering composed schema"
        );
        into_schema::lower(self.registry, self.plans, &self.config)
    }

    fn register_sort_enum(&mut self, type_name: &str, plan: &SortPlan) -> Option<String> {
        if plan.is_empty() {
            return None;
        }
        let name = format!("Sort{type_name}Input");
        self.registry.insert_enum(plan.enum_def(&name));
        Some(name)
    }

    fn add_operations(
        &mut self,
        target: &OpTarget<'_>,
        ops: &OperationsConfig,
    ) -> Result<(), ConvertError> {
        if let Some(opts) = ops.find_one.options() {
            self.plan_query(
                target,
                OperationKind::FindOne,
                TypeRef::named(target.doc_type),
                filter_sort_skip_args(target, opts),
                format!("First {} document matching the filter", target.name),
                opts,
            );
        }
        if let Some(opts) = ops.find_many.options() {
            let mut args = filter_sort_skip_args(target, opts);
            args.push(ArgPlan::with_default(
                "limit",
                TypeRef::named(TypeRef::INT),
                json!(opts.limit.default_value),
            ));
            self.plan_query(
                target,
                OperationKind::FindMany,
                TypeRef::named(target.doc_type).non_null().list().non_null(),
                args,
                format!("All {} documents matching the filter", target.name),
                opts,
            );
        }
        if let Some(opts) = ops.find_by_id.options() {
            self.plan_query(
                target,
                OperationKind::FindById,
                TypeRef::named(target.doc_type),
                vec![ArgPlan::new(
                    "_id",
                    TypeRef::named(scalars::MONGO_ID).non_null(),
                )],
                format!("One {} document by id", target.name),
                opts,
            );
        }
        if let Some(opts) = ops.find_by_ids.options() {
            let mut args = vec![ArgPlan::new(
                "_ids",
                TypeRef::named(scalars::MONGO_ID)
                    .non_null()
                    .list()
                    .non_null(),
            )];
            args.push(ArgPlan::new("limit", TypeRef::named(TypeRef::INT)));
            if let Some(sort_enum) = target.sort_enum {
                args.push(sort_arg(sort_enum, &opts.sort));
            }
            self.plan_query(
                target,
                OperationKind::FindByIds,
                TypeRef::named(target.doc_type).non_null().list().non_null(),
                args,
                format!("{} documents by a list of ids", target.name),
                opts,
            );
        }
        if let Some(opts) = ops.count.options() {
            self.plan_query(
                target,
                OperationKind::Count,
                TypeRef::named(TypeRef::INT).non_null(),
                vec![filter_arg(target.filter_name, &opts.filter, false)],
                format!("Count of {} documents matching the filter", target.name),
                opts,
            );
        }
        if let Some(opts) = ops.pagination.options() {
            let pagination_type = self.register_pagination_type(target)?;
            let mut args = vec![
                ArgPlan::with_default("page", TypeRef::named(TypeRef::INT), json!(1)),
                ArgPlan::with_default(
                    "perPage",
                    TypeRef::named(TypeRef::INT),
                    json!(DEFAULT_PER_PAGE),
                ),
            ];
            args.push(filter_arg(target.filter_name, &opts.filter, false));
            if let Some(sort_enum) = target.sort_enum {
                args.push(sort_arg(sort_enum, &opts.sort));
            }
            self.plan_query(
                target,
                OperationKind::Pagination,
                TypeRef::named(pagination_type).non_null(),
                args,
                format!("Paginated {} documents", target.name),
                opts,
            );
        }
        if let Some(opts) = ops.connection.options() {
            let connection_type = self.register_connection_type(target)?;
            let mut args = vec![
                ArgPlan::new("first", TypeRef::named(TypeRef::INT)),
                ArgPlan::new("after", TypeRef::named(TypeRef::STRING)),
                ArgPlan::new("last", TypeRef::named(TypeRef::INT)),
                ArgPlan::new("before", TypeRef::named(TypeRef::STRING)),
            ];
            args.push(filter_arg(target.filter_name, &opts.filter, false));
            if let Some(sort_enum) = target.sort_enum {
                args.push(sort_arg(sort_enum, &opts.sort));
            }
            self.plan_query(
                target,
                OperationKind::Connection,
                TypeRef::named(connection_type).non_null(),
                args,
                format!("Cursor pagination over {} documents", target.name),
                opts,
            );
        }

        if let Some(opts) = ops.create_one.options() {
            let input = self.record_input(target, "CreateOne", &opts.record, false)?;
            let payload = self.record_payload("CreateOne", target)?;
            self.plan_mutation(
                target,
                OperationKind::CreateOne,
                TypeRef::named(payload),
                vec![ArgPlan::new("record", TypeRef::named(input).non_null())],
                format!("Validate and insert one {} document", target.name),
            );
        }
        if let Some(opts) = ops.create_many.options() {
            let input = self.record_input(target, "CreateMany", &opts.record, false)?;
            let payload = self.records_payload(target)?;
            self.plan_mutation(
                target,
                OperationKind::CreateMany,
                TypeRef::named(payload),
                vec![ArgPlan::new(
                    "records",
                    TypeRef::named(input).non_null().list().non_null(),
                )],
                format!("Validate and insert several {} documents", target.name),
            );
        }
        if let Some(opts) = ops.update_by_id.options() {
            let input = self.record_input(target, "UpdateById", &opts.record, true)?;
            let payload = self.record_payload("UpdateById", target)?;
            self.plan_mutation(
                target,
                OperationKind::UpdateById,
                TypeRef::named(payload),
                vec![
                    ArgPlan::new("_id", TypeRef::named(scalars::MONGO_ID).non_null()),
                    ArgPlan::new("record", TypeRef::named(input).non_null()),
                ],
                format!("Patch one {} document by id", target.name),
            );
        }
        if let Some(opts) = ops.update_one.options() {
            let input = self.record_input(target, "UpdateOne", &opts.record, true)?;
            let payload = self.record_payload("UpdateOne", target)?;
            let mut args = vec![ArgPlan::new("record", TypeRef::named(input).non_null())];
            args.push(filter_arg(target.filter_name, &opts.filter, false));
            if let Some(sort_enum) = target.sort_enum {
                args.push(sort_arg(sort_enum, &opts.sort));
            }
            args.push(ArgPlan::new("skip", TypeRef::named(TypeRef::INT)));
            self.plan_mutation(
                target,
                OperationKind::UpdateOne,
                TypeRef::named(payload),
                args,
                format!(
                    "Patch the first {} document matching the filter",
                    target.name
                ),
            );
        }
        if let Some(opts) = ops.update_many.options() {
            let input = self.record_input(target, "UpdateMany", &opts.record, true)?;
            let payload = self.affected_payload("UpdateMany", target)?;
            // A missing filter here would patch the whole collection.
            let args = vec![
                ArgPlan::new("record", TypeRef::named(input).non_null()),
                filter_arg(target.filter_name, &opts.filter, true),
            ];
            self.plan_mutation(
                target,
                OperationKind::UpdateMany,
                TypeRef::named(payload),
                args,
                format!("Patch all {} documents matching the filter", target.name),
            );
        }
        if ops.remove_by_id.options().is_some() {
            let payload = self.record_payload("RemoveById", target)?;
            self.plan_mutation(
                target,
                OperationKind::RemoveById,
                TypeRef::named(payload),
                vec![ArgPlan::new(
                    "_id",
                    TypeRef::named(scalars::MONGO_ID).non_null(),
                )],
                format!("Delete one {} document by id", target.name),
            );
        }
        if let Some(opts) = ops.remove_one.options() {
            let payload = self.record_payload("RemoveOne", target)?;
            let mut args = vec![filter_arg(target.filter_name, &opts.filter, false)];
            if let Some(sort_enum) = target.sort_enum {
                args.push(sort_arg(sort_enum, &opts.sort));
            }
            self.plan_mutation(
                target,
                OperationKind::RemoveOne,
                TypeRef::named(payload),
                args,
                format!(
                    "Delete the first {} document matching the filter",
                    target.name
                ),
            );
        }
        if let Some(opts) = ops.remove_many.options() {
            let payload = self.affected_payload("RemoveMany", target)?;
            // A missing filter here would delete the whole collection.
            let args = vec![filter_arg(target.filter_name, &opts.filter, true)];
            self.plan_mutation(
                target,
                OperationKind::RemoveMany,
                TypeRef::named(payload),
                args,
                format!("Delete all {} documents matching the filter", target.name),
            );
        }

        Ok(())
    }

    fn plan_query(
        &mut self,
        target: &OpTarget<'_>,
        kind: OperationKind,
        output: TypeRef,
        args: Vec<ArgPlan>,
        description: String,
        opts: &QueryOpOptions,
    ) {
        self.plans.push(OperationPlan {
            field_name: format!("{}{}", lowercase_first(target.name), kind.suffix()),
            kind,
            seed: target.seed(opts.limit.default_value),
            output,
            args,
            description: Some(description),
        });
    }

    fn plan_mutation(
        &mut self,
        target: &OpTarget<'_>,
        kind: OperationKind,
        output: TypeRef,
        args: Vec<ArgPlan>,
        description: String,
    ) {
        self.plans.push(OperationPlan {
            field_name: format!("{}{}", lowercase_first(target.name), kind.suffix()),
            kind,
            seed: target.seed(LimitOptions::default().default_value),
            output,
            args,
            description: Some(description),
        });
    }

    /// Builds the record input for one mutation operation.
    ///
    /// `force_nullable` applies the update-family rule: every field becomes
    /// optional regardless of the output nullability, so partial patches
    /// validate.
    fn record_input(
        &mut self,
        target: &OpTarget<'_>,
        prefix: &str,
        opts: &RecordOptions,
        force_nullable: bool,
    ) -> Result<String, ConvertError> {
        let input_name = format!("{prefix}{}Input", target.name);

        let mut remove: Vec<String> = vec!["_id".to_string()];
        if let Some(key) = target.hidden_key {
            remove.push(key.to_string());
        }
        remove.extend(opts.remove_fields.iter().cloned());

        match &target.record_source {
            RecordSource::Composite(composite) => {
                let record_opts = RecordOptions {
                    remove_fields: remove,
                    required_fields: opts.required_fields.clone(),
                    all_fields_nullable: force_nullable || opts.all_fields_nullable,
                };
                build_record_input(composite, &input_name, &mut self.registry, &record_opts)?;
            }
            RecordSource::Merged(group) => {
                group.merged_input(
                    &mut self.registry,
                    &input_name,
                    MergeConflictPolicy::WidenToJson,
                )?;
                if let Some(input) = self.registry.input_mut(&input_name) {
                    for name in &remove {
                        input.remove_field(name);
                    }
                    if force_nullable {
                        for field in input.fields.values_mut() {
                            field.type_ref = field.type_ref.clone().nullable();
                        }
                    }
                    for name in &opts.required_fields {
                        if let Some(field) = input.fields.get_mut(name) {
                            field.type_ref = field.type_ref.clone().non_null();
                        }
                    }
                }
            }
        }
        Ok(input_name)
    }

    /// Payload carrying the affected record: `recordId`, `record`, `error`.
    fn record_payload(
        &mut self,
        prefix: &str,
        target: &OpTarget<'_>,
    ) -> Result<String, ConvertError> {
        let name = format!("{prefix}{}Payload", target.name);
        self.registry.declare_composite(&name)?;
        let mut payload = CompositeType::new(&name);
        payload.set_field("recordId", FieldDef::new(TypeRef::named(scalars::MONGO_ID)));
        payload.set_field("record", FieldDef::new(TypeRef::named(target.doc_type)));
        payload.set_field("error", FieldDef::new(TypeRef::named(ERROR_INTERFACE)));
        self.registry.insert_composite(payload);
        Ok(name)
    }

    /// Payload of `createMany`: ids, records and the created count.
    fn records_payload(&mut self, target: &OpTarget<'_>) -> Result<String, ConvertError> {
        let name = format!("CreateMany{}Payload", target.name);
        self.registry.declare_composite(&name)?;
        let mut payload = CompositeType::new(&name);
        payload.set_field(
            "recordIds",
            FieldDef::new(
                TypeRef::named(scalars::MONGO_ID)
                    .non_null()
                    .list()
                    .non_null(),
            ),
        );
        payload.set_field(
            "records",
            FieldDef::new(TypeRef::named(target.doc_type).non_null().list().non_null()),
        );
        payload.set_field(
            "createdCount",
            FieldDef::new(TypeRef::named(TypeRef::INT).non_null()),
        );
        payload.set_field("error", FieldDef::new(TypeRef::named(ERROR_INTERFACE)));
        self.registry.insert_composite(payload);
        Ok(name)
    }

    /// Payload of the bulk update/remove operations.
    fn affected_payload(
        &mut self,
        prefix: &str,
        target: &OpTarget<'_>,
    ) -> Result<String, ConvertError> {
        let name = format!("{prefix}{}Payload", target.name);
        self.registry.declare_composite(&name)?;
        let mut payload = CompositeType::new(&name);
        payload.set_field("numAffected", FieldDef::new(TypeRef::named(TypeRef::INT)));
        payload.set_field("error", FieldDef::new(TypeRef::named(ERROR_INTERFACE)));
        self.registry.insert_composite(payload);
        Ok(name)
    }

    fn register_pagination_type(&mut self, target: &OpTarget<'_>) -> Result<String, ConvertError> {
        self.ensure_pagination_info();
        let name = format!("{}Pagination", target.name);
        self.registry.declare_composite(&name)?;
        let mut pagination = CompositeType::new(&name);
        pagination.set_field(
            "count",
            FieldDef::new(TypeRef::named(TypeRef::INT).non_null()),
        );
        pagination.set_field(
            "items",
            FieldDef::new(TypeRef::named(target.doc_type).non_null().list().non_null()),
        );
        pagination.set_field(
            "pageInfo",
            FieldDef::new(TypeRef::named("PaginationInfo").non_null()),
        );
        self.registry.insert_composite(pagination);
        Ok(name)
    }

    fn register_connection_type(&mut self, target: &OpTarget<'_>) -> Result<String, ConvertError> {
        self.ensure_page_info();

        let edge_name = format!("{}Edge", target.name);
        self.registry.declare_composite(&edge_name)?;
        let mut edge = CompositeType::new(&edge_name);
        edge.set_field(
            "node",
            FieldDef::new(TypeRef::named(target.doc_type).non_null()),
        );
        edge.set_field(
            "cursor",
            FieldDef::new(TypeRef::named(TypeRef::STRING).non_null()),
        );
        self.registry.insert_composite(edge);

        let name = format!("{}Connection", target.name);
        self.registry.declare_composite(&name)?;
        let mut connection = CompositeType::new(&name);
        connection.set_field(
            "count",
            FieldDef::new(TypeRef::named(TypeRef::INT).non_null()),
        );
        connection.set_field(
            "edges",
            FieldDef::new(TypeRef::named(edge_name).non_null().list().non_null()),
        );
        connection.set_field(
            "pageInfo",
            FieldDef::new(TypeRef::named("PageInfo").non_null()),
        );
        self.registry.insert_composite(connection);
        Ok(name)
    }

    fn ensure_pagination_info(&mut self) {
        if self.registry.composite("PaginationInfo").is_some() {
            return;
        }
        let mut info = CompositeType::new("PaginationInfo");
        info.description = Some("Page/perPage pagination metadata".to_string());
        info.set_field(
            "currentPage",
            FieldDef::new(TypeRef::named(TypeRef::INT).non_null()),
        );
        info.set_field(
            "perPage",
            FieldDef::new(TypeRef::named(TypeRef::INT).non_null()),
        );
        info.set_field("pageCount", FieldDef::new(TypeRef::named(TypeRef::INT)));
        info.set_field("itemCount", FieldDef::new(TypeRef::named(TypeRef::INT)));
        info.set_field(
            "hasNextPage",
            FieldDef::new(TypeRef::named(TypeRef::BOOLEAN)),
        );
        info.set_field(
            "hasPreviousPage",
            FieldDef::new(TypeRef::named(TypeRef::BOOLEAN)),
        );
        self.registry.insert_composite(info);
    }

    fn ensure_page_info(&mut self) {
        if self.registry.composite("PageInfo").is_some() {
            return;
        }
        let mut info = CompositeType::new("PageInfo");
        info.description = Some("Cursor pagination metadata".to_string());
        info.set_field(
            "hasNextPage",
            FieldDef::new(TypeRef::named(TypeRef::BOOLEAN).non_null()),
        );
        info.set_field(
            "hasPreviousPage",
            FieldDef::new(TypeRef::named(TypeRef::BOOLEAN).non_null()),
        );
        info.set_field("startCursor", FieldDef::new(TypeRef::named(TypeRef::STRING)));
        info.set_field("endCursor", FieldDef::new(TypeRef::named(TypeRef::STRING)));
        self.registry.insert_composite(info);
    }
}

fn filter_arg(filter_name: &str, opts: &FilterOptions, always_required: bool) -> ArgPlan {
    let type_ref = if opts.is_required || always_required {
        TypeRef::named(filter_name).non_null()
    } else {
        TypeRef::named(filter_name)
    };
    ArgPlan::new("filter", type_ref)
}

fn sort_arg(sort_enum: &str, opts: &SortOptions) -> ArgPlan {
    let type_ref = if opts.multi {
        TypeRef::named(sort_enum).non_null().list()
    } else {
        TypeRef::named(sort_enum)
    };
    ArgPlan::new("sort", type_ref)
}

fn filter_sort_skip_args(target: &OpTarget<'_>, opts: &QueryOpOptions) -> Vec<ArgPlan> {
    let mut args = vec![filter_arg(target.filter_name, &opts.filter, false)];
    if let Some(sort_enum) = target.sort_enum {
        args.push(sort_arg(sort_enum, &opts.sort));
    }
    args.push(ArgPlan::new("skip", TypeRef::named(TypeRef::INT)));
    args
}

/// Registers the error interface and its three concrete shapes. Every
/// payload's `error` field is typed as the interface; the `kind` tag in the
/// error value picks the concrete type.
fn bootstrap_error_types(registry: &mut TypeRegistry) {
    let mut validator = CompositeType::new("ValidatorError");
    validator.description = Some("One failed validator".to_string());
    validator.set_field(
        "message",
        FieldDef::new(TypeRef::named(TypeRef::STRING).non_null()),
    );
    validator.set_field("path", FieldDef::new(TypeRef::named(TypeRef::STRING)));
    validator.set_field("value", FieldDef::new(TypeRef::named(scalars::JSON)));
    registry.insert_composite(validator);

    let mut interface = InterfaceTypeDef::new(ERROR_INTERFACE, "kind");
    interface.description = Some("An operation failure, typed by its origin".to_string());
    interface.fields.insert(
        "message".to_string(),
        FieldDef::new(TypeRef::named(TypeRef::STRING).non_null()),
    );

    let mut validation = CompositeType::new("ValidationError");
    validation.description = Some("Schema validation rejected the record".to_string());
    validation.set_field(
        "message",
        FieldDef::new(TypeRef::named(TypeRef::STRING).non_null()),
    );
    validation.set_field(
        "errors",
        FieldDef::new(TypeRef::named("ValidatorError").non_null().list()),
    );
    validation.add_interface(ERROR_INTERFACE);
    registry.insert_composite(validation);

    let mut database = CompositeType::new("DatabaseError");
    database.description = Some("The storage backend rejected the operation".to_string());
    database.set_field(
        "message",
        FieldDef::new(TypeRef::named(TypeRef::STRING).non_null()),
    );
    database.set_field("code", FieldDef::new(TypeRef::named(TypeRef::INT)));
    database.add_interface(ERROR_INTERFACE);
    registry.insert_composite(database);

    let mut runtime = CompositeType::new("RuntimeError");
    runtime.description = Some("The operation failed outside validation and storage".to_string());
    runtime.set_field(
        "message",
        FieldDef::new(TypeRef::named(TypeRef::STRING).non_null()),
    );
    runtime.add_interface(ERROR_INTERFACE);
    registry.insert_composite(runtime);

    interface.add_implementer("validation", "ValidationError");
    interface.add_implementer("database", "DatabaseError");
    interface.add_implementer("runtime", "RuntimeError");
    interface.polymorphic.fallback = Some("RuntimeError".to_string());
    registry.insert_interface(interface);
}
