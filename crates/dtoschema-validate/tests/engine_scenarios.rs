//! # Validation and Serialization over Registered DTOs
//!
//! End-to-end checks that combine the registry, derived DTOs, the
//! validator, and the serializer the way a request/response cycle does.

use dtoschema_core::derivation::{partial, pick};
use dtoschema_core::node::{self, reference};
use dtoschema_core::{DerivationOptions, DtoBuilder, DtoId, DtoRegistry, Timestamp, Value};
use dtoschema_validate::{codes, serialize_response, validate, Validator};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use proptest::prelude::*;
use serde_json::json;

fn article(registry: &DtoRegistry) -> DtoId {
    let author = DtoBuilder::new("Author")
        .field("name", node::string().min_length(1))
        .field("email", node::email())
        .register(registry);
    DtoBuilder::new("Article")
        .field("id", node::uuid())
        .field("title", node::string().max_length(80))
        .field("publishedOn", node::date())
        .field("cover", node::bytes().optional())
        .field("author", reference(author))
        .field("tags", node::array(node::string()).max_items(5))
        .additional_properties(false)
        .register(registry)
}

#[test]
fn request_body_reports_every_issue_in_walk_order() {
    let registry = DtoRegistry::new();
    let id = article(&registry);
    let body = Value::from(json!({
        "id": "nope",
        "title": "Hello",
        "publishedOn": "2024-13-01",
        "author": {"name": ""},
        "tags": ["a", 1],
        "views": 3
    }));

    let issues = validate(&registry, &body, &reference(id));
    let found: Vec<(&str, &str)> = issues
        .iter()
        .map(|i| (i.field.as_str(), i.code.as_str()))
        .collect();
    assert_eq!(
        found,
        [
            ("id", codes::FORMAT),
            ("publishedOn", codes::FORMAT),
            ("author.name", codes::MIN_LENGTH),
            ("author.email", codes::REQUIRED),
            ("tags[1]", codes::TYPE),
            ("views", codes::ADDITIONAL_PROPERTY),
        ]
    );
}

#[test]
fn partial_dto_accepts_an_empty_patch() {
    let registry = DtoRegistry::new();
    let id = article(&registry);
    let patch = partial(&registry, id, DerivationOptions::named("ArticlePatch")).unwrap();

    let validator = Validator::new(&registry);
    assert!(validator.is_valid(&Value::from(json!({})), &reference(patch)));
    let issues = validator.validate(&Value::from(json!({"title": 5})), &reference(patch));
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "title");
}

#[test]
fn picked_dto_still_rejects_undeclared_keys() {
    let registry = DtoRegistry::new();
    let id = article(&registry);
    let summary = pick(&registry, id, ["id", "title"], DerivationOptions::default()).unwrap();
    let body = Value::from(json!({
        "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
        "title": "t",
        "tags": []
    }));
    let issues = validate(&registry, &body, &reference(summary));
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "tags");
    assert_eq!(issues[0].message, "is not allowed");
}

#[test]
fn response_is_encoded_for_the_wire() {
    let registry = DtoRegistry::new();
    let id = article(&registry);
    let value = Value::object([
        ("id", Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8")),
        ("title", Value::from("Hello")),
        ("publishedOn", Value::from(Timestamp::parse("2024-02-29T22:00:00-05:00"))),
        ("cover", Value::bytes(b"Hello".to_vec())),
        (
            "author",
            Value::object([("name", Value::from("Ada")), ("email", Value::from("ada@x.io"))]),
        ),
        ("tags", Value::Array(vec![])),
    ]);

    let out = serialize_response(&registry, &value, &reference(id));
    assert_eq!(
        out.to_json(),
        json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "title": "Hello",
            "publishedOn": "2024-03-01",
            "cover": "SGVsbG8=",
            "author": {"name": "Ada", "email": "ada@x.io"},
            "tags": []
        })
    );
    assert!(validate(&registry, &out, &reference(id)).is_empty());
}

fn json_leaf() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z@.]{0,12}".prop_map(serde_json::Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = serde_json::Value> {
    json_leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Validation is pure: the same input always yields the same issues,
    /// and arbitrary input never panics.
    #[test]
    fn validation_is_deterministic_on_arbitrary_input(raw in json_value()) {
        let registry = DtoRegistry::new();
        let id = article(&registry);
        let value = Value::from(raw);
        let validator = Validator::new(&registry);
        let first = validator.validate(&value, &reference(id));
        let second = validator.validate(&value, &reference(id));
        prop_assert_eq!(first, second);
    }

    /// Binary fields leave as base64 that decodes back to the same bytes.
    #[test]
    fn binary_fields_decode_to_the_original_bytes(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let registry = DtoRegistry::new();
        let schema = node::object([("payload", node::bytes())]);
        let value = Value::object([("payload", Value::bytes(data.clone()))]);
        let wire = serialize_response(&registry, &value, &schema).to_json();
        let encoded = wire["payload"].as_str().unwrap_or_default().to_string();
        prop_assert_eq!(STANDARD.decode(encoded).ok(), Some(data));
    }
}
