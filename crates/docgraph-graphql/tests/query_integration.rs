//! Integration tests for the generated CRUD schema.
//!
//! These tests compose real models, execute GraphQL operations against the
//! in-memory store and verify the complete round trip: argument translation,
//! storage queries, document exposure and error routing.

use std::sync::Arc;

use async_graphql::Request;
use async_graphql::dynamic::Schema;
use docgraph_graphql::{ComposeOptions, ComposerConfig, GraphQLContext, SchemaComposer};
use docgraph_schema::{DocumentSchema, FieldDescriptor, FieldKind, IndexDefinition, Model};
use docgraph_storage::{DocumentStore, DynStore, MemoryStore};
use serde_json::{Value, json};

fn user_model() -> Model {
    let schema = DocumentSchema::builder()
        .field(FieldDescriptor::new("name", FieldKind::String).required())
        .unwrap()
        .field(FieldDescriptor::new("age", FieldKind::Number))
        .unwrap()
        .field(
            FieldDescriptor::new("gender", FieldKind::String)
                .with_enum(["male", "female", "non-binary"]),
        )
        .unwrap()
        .field(FieldDescriptor::new("address.city", FieldKind::String))
        .unwrap()
        .field(FieldDescriptor::new("full_name", FieldKind::String).with_alias("fullName"))
        .unwrap()
        .index(IndexDefinition::ascending("age"))
        .unwrap()
        .index(IndexDefinition::ascending("name"))
        .unwrap()
        .build();
    Model::new("User", "users", schema)
}

fn character_model() -> Model {
    let person = DocumentSchema::builder()
        .field(FieldDescriptor::new("dob", FieldKind::Date))
        .unwrap()
        .build();
    let droid = DocumentSchema::builder()
        .field(FieldDescriptor::new("modelNumber", FieldKind::String))
        .unwrap()
        .build();
    let schema = DocumentSchema::builder()
        .field(FieldDescriptor::new("name", FieldKind::String).required())
        .unwrap()
        .discriminator_key("type")
        .discriminator("person", person)
        .unwrap()
        .discriminator("droid", droid)
        .unwrap()
        .build();
    Model::new("Character", "characters", schema)
}

fn user_schema() -> Schema {
    let mut composer = SchemaComposer::new(ComposerConfig::default());
    composer
        .add_model(&user_model(), ComposeOptions::default())
        .unwrap();
    composer.build().unwrap()
}

fn character_schema() -> Schema {
    let mut composer = SchemaComposer::new(ComposerConfig::default());
    let options = ComposeOptions {
        include_base_discriminators: true,
        ..Default::default()
    };
    composer.add_model(&character_model(), options).unwrap();
    composer.build().unwrap()
}

fn context(store: &DynStore) -> GraphQLContext {
    GraphQLContext::builder()
        .with_store(Arc::clone(store))
        .build()
        .unwrap()
}

/// Executes a query, asserting it produced no errors.
async fn execute(schema: &Schema, store: &DynStore, query: &str) -> Value {
    let response = schema
        .execute(Request::new(query).data(context(store)))
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

async fn seed_users(store: &DynStore) -> Vec<String> {
    let docs = [
        json!({"name": "ada", "age": 36.0, "gender": "female"}),
        json!({"name": "brendan", "age": 28.0, "gender": "male"}),
        json!({"name": "casey", "age": 41.0, "gender": "non-binary"}),
        json!({"name": "dana", "age": 33.0}),
        json!({"name": "evan", "age": 52.0}),
    ];
    let mut ids = Vec::new();
    for doc in docs {
        let stored = store.insert_one("users", &doc).await.unwrap();
        ids.push(stored["_id"].as_str().unwrap().to_string());
    }
    ids
}

#[tokio::test]
async fn test_create_then_find_round_trip() {
    let store: DynStore = Arc::new(MemoryStore::new());
    let schema = user_schema();

    let data = execute(
        &schema,
        &store,
        r#"mutation {
            userCreateOne(record: { name: "ada", age: 36.0 }) {
                recordId
                record { name age }
            }
        }"#,
    )
    .await;
    let record_id = data["userCreateOne"]["recordId"].as_str().unwrap();
    assert_eq!(record_id.len(), 24);
    assert_eq!(data["userCreateOne"]["record"]["name"], json!("ada"));

    let data = execute(
        &schema,
        &store,
        r#"{ userFindMany { _id name age } }"#,
    )
    .await;
    assert_eq!(data["userFindMany"][0]["name"], json!("ada"));
    assert_eq!(data["userFindMany"][0]["_id"], json!(record_id));
}

#[tokio::test]
async fn test_alias_translates_both_ways() {
    let store: DynStore = Arc::new(MemoryStore::new());
    let schema = user_schema();

    execute(
        &schema,
        &store,
        r#"mutation {
            userCreateOne(record: { name: "ada", fullName: "Ada Lovelace" }) { recordId }
        }"#,
    )
    .await;

    // Stored under the schema path, not the exposed name.
    let raw = store
        .find_one("users", &json!({"full_name": "Ada Lovelace"}))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw["full_name"], json!("Ada Lovelace"));
    assert!(raw.get("fullName").is_none());

    // Exposed under the alias, filterable by the alias.
    let data = execute(
        &schema,
        &store,
        r#"{ userFindOne(filter: { fullName: "Ada Lovelace" }) { name fullName } }"#,
    )
    .await;
    assert_eq!(data["userFindOne"]["fullName"], json!("Ada Lovelace"));
}

#[tokio::test]
async fn test_filter_operators_and_sort() {
    let store: DynStore = Arc::new(MemoryStore::new());
    seed_users(&store).await;
    let schema = user_schema();

    let data = execute(
        &schema,
        &store,
        r#"{
            userFindMany(
                filter: { _operators: { age: { gt: 33.0 } } }
                sort: AGE_DESC
            ) { name age }
        }"#,
    )
    .await;
    let names: Vec<&str> = data["userFindMany"]
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["evan", "casey", "ada"]);
}

#[tokio::test]
async fn test_nested_dotted_path_round_trip() {
    let store: DynStore = Arc::new(MemoryStore::new());
    let schema = user_schema();

    execute(
        &schema,
        &store,
        r#"mutation {
            userCreateOne(record: { name: "ada", address: { city: "London" } }) { recordId }
        }"#,
    )
    .await;

    // The dotted path is stored as a nested document.
    let raw = store
        .find_one("users", &json!({"address.city": "London"}))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw["address"]["city"], json!("London"));

    // Nested selection and nested filter both work on the folded field.
    let data = execute(
        &schema,
        &store,
        r#"{ userFindOne(filter: { address: { city: "London" } }) { name address { city } } }"#,
    )
    .await;
    assert_eq!(data["userFindOne"]["address"]["city"], json!("London"));
}

#[tokio::test]
async fn test_enum_round_trip() {
    let store: DynStore = Arc::new(MemoryStore::new());
    let schema = user_schema();

    execute(
        &schema,
        &store,
        r#"mutation {
            userCreateOne(record: { name: "casey", gender: non_binary }) { recordId }
        }"#,
    )
    .await;

    // Stored as the raw allowed value, exposed as the enum item.
    let raw = store
        .find_one("users", &json!({"name": "casey"}))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw["gender"], json!("non-binary"));

    let data = execute(
        &schema,
        &store,
        r#"{ userFindOne(filter: { gender: non_binary }) { name gender } }"#,
    )
    .await;
    assert_eq!(data["userFindOne"]["gender"], json!("non_binary"));
}

#[tokio::test]
async fn test_find_by_id_and_by_ids() {
    let store: DynStore = Arc::new(MemoryStore::new());
    let ids = seed_users(&store).await;
    let schema = user_schema();

    let data = execute(
        &schema,
        &store,
        &format!(r#"{{ userFindById(_id: "{}") {{ name }} }}"#, ids[1]),
    )
    .await;
    assert_eq!(data["userFindById"]["name"], json!("brendan"));

    let data = execute(
        &schema,
        &store,
        &format!(
            r#"{{ userFindByIds(_ids: ["{}", "{}", "ffffffffffffffffffffffff"]) {{ name }} }}"#,
            ids[2], ids[0]
        ),
    )
    .await;
    let names: Vec<&str> = data["userFindByIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["name"].as_str().unwrap())
        .collect();
    // Requested order is preserved; the missing id is dropped.
    assert_eq!(names, vec!["casey", "ada"]);
}

#[tokio::test]
async fn test_count_with_filter() {
    let store: DynStore = Arc::new(MemoryStore::new());
    seed_users(&store).await;
    let schema = user_schema();

    let data = execute(
        &schema,
        &store,
        r#"{ userCount(filter: { _operators: { age: { lte: 36.0 } } }) }"#,
    )
    .await;
    assert_eq!(data["userCount"], json!(3));
}

#[tokio::test]
async fn test_pagination_page_info() {
    let store: DynStore = Arc::new(MemoryStore::new());
    seed_users(&store).await;
    let schema = user_schema();

    let data = execute(
        &schema,
        &store,
        r#"{
            userPagination(page: 2, perPage: 2, sort: AGE_ASC) {
                count
                items { name }
                pageInfo {
                    currentPage perPage pageCount itemCount
                    hasNextPage hasPreviousPage
                }
            }
        }"#,
    )
    .await;
    let pagination = &data["userPagination"];
    assert_eq!(pagination["count"], json!(5));
    assert_eq!(pagination["pageInfo"]["currentPage"], json!(2));
    assert_eq!(pagination["pageInfo"]["pageCount"], json!(3));
    assert_eq!(pagination["pageInfo"]["itemCount"], json!(5));
    assert_eq!(pagination["pageInfo"]["hasNextPage"], json!(true));
    assert_eq!(pagination["pageInfo"]["hasPreviousPage"], json!(true));
    // ages sorted ascending: 28, 33 | 36, 41 | 52
    assert_eq!(pagination["items"][0]["name"], json!("ada"));
    assert_eq!(pagination["items"][1]["name"], json!("casey"));
}

#[tokio::test]
async fn test_connection_cursor_window() {
    let store: DynStore = Arc::new(MemoryStore::new());
    seed_users(&store).await;
    let schema = user_schema();

    let data = execute(
        &schema,
        &store,
        r#"{
            userConnection(first: 2, sort: AGE_ASC) {
                count
                edges { node { name } cursor }
                pageInfo { hasNextPage hasPreviousPage endCursor }
            }
        }"#,
    )
    .await;
    let connection = &data["userConnection"];
    assert_eq!(connection["count"], json!(5));
    assert_eq!(connection["edges"][0]["node"]["name"], json!("brendan"));
    assert_eq!(connection["edges"][1]["node"]["name"], json!("dana"));
    assert_eq!(connection["pageInfo"]["hasNextPage"], json!(true));
    assert_eq!(connection["pageInfo"]["hasPreviousPage"], json!(false));

    // The end cursor opens the next window.
    let end_cursor = connection["pageInfo"]["endCursor"].as_str().unwrap();
    let data = execute(
        &schema,
        &store,
        &format!(
            r#"{{
                userConnection(first: 2, after: "{end_cursor}", sort: AGE_ASC) {{
                    edges {{ node {{ name }} }}
                    pageInfo {{ hasPreviousPage }}
                }}
            }}"#
        ),
    )
    .await;
    let connection = &data["userConnection"];
    assert_eq!(connection["edges"][0]["node"]["name"], json!("ada"));
    assert_eq!(connection["edges"][1]["node"]["name"], json!("casey"));
    assert_eq!(connection["pageInfo"]["hasPreviousPage"], json!(true));
}

#[tokio::test]
async fn test_update_operations() {
    let store: DynStore = Arc::new(MemoryStore::new());
    let ids = seed_users(&store).await;
    let schema = user_schema();

    let data = execute(
        &schema,
        &store,
        &format!(
            r#"mutation {{
                userUpdateById(_id: "{}", record: {{ age: 37.0 }}) {{
                    recordId
                    record {{ name age }}
                }}
            }}"#,
            ids[0]
        ),
    )
    .await;
    assert_eq!(data["userUpdateById"]["recordId"], json!(ids[0]));
    assert_eq!(data["userUpdateById"]["record"]["age"], json!(37.0));
    // Untouched fields survive the patch.
    assert_eq!(data["userUpdateById"]["record"]["name"], json!("ada"));

    let data = execute(
        &schema,
        &store,
        r#"mutation {
            userUpdateMany(
                record: { gender: male }
                filter: { _operators: { age: { gte: 40.0 } } }
            ) { numAffected }
        }"#,
    )
    .await;
    assert_eq!(data["userUpdateMany"]["numAffected"], json!(2));
}

#[tokio::test]
async fn test_remove_operations() {
    let store: DynStore = Arc::new(MemoryStore::new());
    seed_users(&store).await;
    let schema = user_schema();

    // removeOne targets the first match and returns the removed document.
    let data = execute(
        &schema,
        &store,
        r#"mutation {
            userRemoveOne(filter: { name: "dana" }) { record { name } }
        }"#,
    )
    .await;
    assert_eq!(data["userRemoveOne"]["record"]["name"], json!("dana"));

    let data = execute(
        &schema,
        &store,
        r#"mutation {
            userRemoveMany(filter: { _operators: { age: { gt: 30.0 } } }) { numAffected }
        }"#,
    )
    .await;
    assert_eq!(data["userRemoveMany"]["numAffected"], json!(3));

    let data = execute(&schema, &store, r#"{ userCount }"#).await;
    assert_eq!(data["userCount"], json!(1));
}

#[tokio::test]
async fn test_duplicate_key_error_inline_when_selected() {
    let memory = Arc::new(MemoryStore::new());
    memory.ensure_unique_index("users", "name");
    let store: DynStore = memory;
    let schema = user_schema();

    execute(
        &schema,
        &store,
        r#"mutation { userCreateOne(record: { name: "ada" }) { recordId } }"#,
    )
    .await;

    // With `error` selected, the failure lands inline in the payload.
    let data = execute(
        &schema,
        &store,
        r#"mutation {
            userCreateOne(record: { name: "ada" }) {
                recordId
                error {
                    __typename
                    message
                    ... on DatabaseError { code }
                }
            }
        }"#,
    )
    .await;
    let payload = &data["userCreateOne"];
    assert_eq!(payload["recordId"], Value::Null);
    assert_eq!(payload["error"]["__typename"], json!("DatabaseError"));
    assert_eq!(payload["error"]["code"], json!(11000));
    assert!(
        payload["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Duplicate key")
    );
}

#[tokio::test]
async fn test_duplicate_key_error_top_level_when_not_selected() {
    let memory = Arc::new(MemoryStore::new());
    memory.ensure_unique_index("users", "name");
    let store: DynStore = memory;
    let schema = user_schema();

    execute(
        &schema,
        &store,
        r#"mutation { userCreateOne(record: { name: "ada" }) { recordId } }"#,
    )
    .await;

    let response = schema
        .execute(
            Request::new(r#"mutation { userCreateOne(record: { name: "ada" }) { recordId } }"#)
                .data(context(&store)),
        )
        .await;
    assert_eq!(response.errors.len(), 1);
    let error = &response.errors[0];
    assert!(error.message.contains("Duplicate key"));
    let extensions = error.extensions.as_ref().unwrap();
    assert_eq!(
        extensions.get("kind"),
        Some(&async_graphql::Value::String("database".to_string()))
    );
}

#[tokio::test]
async fn test_discriminator_family_round_trip() {
    let store: DynStore = Arc::new(MemoryStore::new());
    let schema = character_schema();

    // Base create takes the merged input and dispatches on the key.
    execute(
        &schema,
        &store,
        r#"mutation {
            characterCreateOne(record: { type: "person", name: "Leia", dob: "19BBY" }) {
                recordId
            }
        }"#,
    )
    .await;
    // Subtype create hides the key; the operation pins it.
    execute(
        &schema,
        &store,
        r#"mutation {
            droidCreateOne(record: { name: "R2-D2", modelNumber: "R2" }) { recordId }
        }"#,
    )
    .await;

    let raw = store
        .find_one("characters", &json!({"name": "R2-D2"}))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw["type"], json!("droid"));

    // Base query is interface-typed; fragments reach subtype fields.
    let data = execute(
        &schema,
        &store,
        r#"{
            characterFindMany {
                __typename
                name
                ... on Person { dob }
                ... on Droid { modelNumber }
            }
        }"#,
    )
    .await;
    let characters = data["characterFindMany"].as_array().unwrap();
    assert_eq!(characters.len(), 2);
    assert_eq!(characters[0]["__typename"], json!("Person"));
    assert_eq!(characters[0]["dob"], json!("19BBY"));
    assert_eq!(characters[1]["__typename"], json!("Droid"));
    assert_eq!(characters[1]["modelNumber"], json!("R2"));

    // Subtype queries see only their own discriminator value.
    let data = execute(&schema, &store, r#"{ personFindMany { name } }"#).await;
    let people = data["personFindMany"].as_array().unwrap();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0]["name"], json!("Leia"));

    let data = execute(&schema, &store, r#"{ droidCount }"#).await;
    assert_eq!(data["droidCount"], json!(1));
}

#[tokio::test]
async fn test_subtype_filter_cannot_reach_siblings() {
    let store: DynStore = Arc::new(MemoryStore::new());
    let schema = character_schema();

    execute(
        &schema,
        &store,
        r#"mutation {
            characterCreateOne(record: { type: "person", name: "Leia", dob: "19BBY" }) {
                recordId
            }
        }"#,
    )
    .await;
    execute(
        &schema,
        &store,
        r#"mutation {
            droidCreateOne(record: { name: "R2-D2", modelNumber: "R2" }) { recordId }
        }"#,
    )
    .await;

    // The subtype filter does not offer the tag field, so re-targeting the
    // family through it is a validation error.
    let response = schema
        .execute(
            Request::new(r#"{ droidFindMany(filter: { type: "person" }) { name } }"#)
                .data(context(&store)),
        )
        .await;
    assert!(!response.errors.is_empty());

    // Filtering on a shared field stays pinned to the subtype.
    let data = execute(
        &schema,
        &store,
        r#"{ droidFindMany(filter: { name: "Leia" }) { name } }"#,
    )
    .await;
    assert_eq!(data["droidFindMany"], json!([]));

    let data = execute(
        &schema,
        &store,
        r#"{ personFindMany(filter: { name: "Leia" }) { name } }"#,
    )
    .await;
    assert_eq!(data["personFindMany"], json!([{"name": "Leia"}]));
}

#[tokio::test]
async fn test_skip_and_limit() {
    let store: DynStore = Arc::new(MemoryStore::new());
    seed_users(&store).await;
    let schema = user_schema();

    let data = execute(
        &schema,
        &store,
        r#"{ userFindMany(sort: AGE_ASC, skip: 1, limit: 2) { name } }"#,
    )
    .await;
    let names: Vec<&str> = data["userFindMany"]
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["dana", "ada"]);
}
