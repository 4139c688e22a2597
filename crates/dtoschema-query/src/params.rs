//! # Schema-driven Query Coercion
//!
//! Turns a decoded [`QueryMap`] into an object [`Value`] using the declared
//! query schema to decide which keys become numbers or booleans. Coercion is
//! best-effort: when a value cannot be converted the raw string is kept so
//! the validation engine can report the type error with the right path.

use dtoschema_core::{DtoRegistry, SchemaKind, SchemaNode, Value};
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::coerce::{
    parse_boolean, parse_integer, parse_list, parse_number, BooleanOptions, NormalizeOptions,
    NumberPolicy,
};
use crate::raw::{QueryMap, RawParam};

/// Coerce every key of `query` against the properties of `schema`.
///
/// `schema` is an `object` node or a `ref` to a DTO. Keys the schema does
/// not declare are kept as strings (or arrays of strings when repeated).
pub fn coerce_params(query: &QueryMap, schema: &SchemaNode, registry: &DtoRegistry) -> Value {
    let properties = object_properties(schema, registry);
    let coerced: IndexMap<String, Value> = query
        .iter()
        .map(|(key, raw)| {
            let value = match properties.as_ref().and_then(|props| props.get(key)) {
                Some(property) => coerce_value(raw, property, registry),
                None => passthrough(raw),
            };
            (key.clone(), value)
        })
        .collect();
    Value::Object(coerced)
}

/// Coerce one raw parameter against one schema node.
pub fn coerce_value(raw: &RawParam, schema: &SchemaNode, registry: &DtoRegistry) -> Value {
    match &schema.kind {
        SchemaKind::Array(array) => {
            let items = parse_list(Some(raw), &NormalizeOptions::default()).unwrap_or_default();
            Value::Array(
                items
                    .into_iter()
                    .map(|item| coerce_value(&RawParam::Single(item), &array.items, registry))
                    .collect(),
            )
        }
        SchemaKind::Ref(id) => match registry.object_schema(id) {
            Some(object) => coerce_value(raw, &object, registry),
            None => first_string(raw),
        },
        SchemaKind::Union(union) => union
            .members
            .iter()
            .map(|member| coerce_value(raw, member, registry))
            .find(|value| !matches!(value, Value::String(_)))
            .unwrap_or_else(|| first_string(raw)),
        _ => coerce_scalar(raw, schema).unwrap_or_else(|| first_string(raw)),
    }
}

fn coerce_scalar(raw: &RawParam, schema: &SchemaNode) -> Option<Value> {
    let raw = Some(raw);
    match &schema.kind {
        SchemaKind::Integer(_) => {
            parse_integer(raw, &NumberPolicy::default()).map(|n| Value::Number(n as f64))
        }
        SchemaKind::Number(_) => parse_number(raw, &NumberPolicy::default()).map(Value::Number),
        SchemaKind::Boolean => parse_boolean(raw, &BooleanOptions::default()).map(Value::Bool),
        SchemaKind::Null => {
            let text = raw?.first()?;
            (text == "null").then_some(Value::Null)
        }
        SchemaKind::Literal(expected) => coerce_to_json(raw, std::slice::from_ref(expected)),
        SchemaKind::Enum(allowed) => coerce_to_json(raw, allowed),
        _ => None,
    }
}

/// Match the raw text against the non-string members of a value set.
fn coerce_to_json(raw: Option<&RawParam>, allowed: &[Json]) -> Option<Value> {
    let text = raw?.first()?.trim();
    allowed.iter().find_map(|candidate| match candidate {
        Json::Number(n) => {
            let parsed: f64 = text.parse().ok()?;
            (n.as_f64() == Some(parsed)).then_some(Value::Number(parsed))
        }
        Json::Bool(b) => (text == b.to_string()).then_some(Value::Bool(*b)),
        _ => None,
    })
}

fn object_properties(
    schema: &SchemaNode,
    registry: &DtoRegistry,
) -> Option<IndexMap<String, SchemaNode>> {
    match &schema.kind {
        SchemaKind::Object(object) => Some(object.properties.clone()),
        SchemaKind::Ref(id) => {
            let object = registry.object_schema(id)?;
            object_properties(&object, registry)
        }
        _ => None,
    }
}

fn first_string(raw: &RawParam) -> Value {
    raw.first().map(Value::from).unwrap_or(Value::Null)
}

fn passthrough(raw: &RawParam) -> Value {
    match raw {
        RawParam::Single(s) => Value::from(s.as_str()),
        RawParam::Many(values) => Value::Array(values.iter().map(|v| Value::from(v.as_str())).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtoschema_core::node::*;
    use dtoschema_core::DtoBuilder;
    use serde_json::json;

    #[test]
    fn typed_fields_are_coerced() {
        let registry = DtoRegistry::new();
        let schema = object([
            ("page", integer()),
            ("ratio", number()),
            ("archived", boolean()),
            ("q", string()),
        ]);
        let query = QueryMap::parse("page=2&ratio=0.5&archived=true&q=42&extra=x").unwrap();
        let value = coerce_params(&query, &schema, &registry);
        assert_eq!(
            value.to_json(),
            json!({"page": 2, "ratio": 0.5, "archived": true, "q": "42", "extra": "x"})
        );
    }

    #[test]
    fn failed_coercion_keeps_the_raw_string() {
        let registry = DtoRegistry::new();
        let schema = object([("page", integer()), ("flag", boolean())]);
        let query = QueryMap::parse("page=abc&flag=maybe").unwrap();
        let value = coerce_params(&query, &schema, &registry);
        assert_eq!(value.to_json(), json!({"page": "abc", "flag": "maybe"}));
    }

    #[test]
    fn arrays_collect_repeated_values() {
        let registry = DtoRegistry::new();
        let schema = object([("ids", array(integer())), ("tags", array(string()))]);
        let query = QueryMap::parse("ids=1&ids=2&ids=x&tags=a,b").unwrap();
        let value = coerce_params(&query, &schema, &registry);
        assert_eq!(value.to_json(), json!({"ids": [1, 2, "x"], "tags": ["a", "b"]}));
    }

    #[test]
    fn ref_schemas_resolve_through_the_registry() {
        let registry = DtoRegistry::new();
        let paging = DtoBuilder::new("Paging")
            .optional_field("limit", integer())
            .register(&registry);
        let query = QueryMap::parse("limit=10").unwrap();
        let value = coerce_params(&query, &reference(paging), &registry);
        assert_eq!(value.to_json(), json!({"limit": 10}));
    }

    #[test]
    fn enums_and_unions_pick_typed_values() {
        let registry = DtoRegistry::new();
        let schema = object([
            ("size", enumeration([10, 20])),
            ("id", union([integer(), uuid()])),
            ("order", enumeration(["asc", "desc"])),
        ]);
        let query = QueryMap::parse("size=20&id=7&order=asc").unwrap();
        let value = coerce_params(&query, &schema, &registry);
        assert_eq!(value.to_json(), json!({"size": 20, "id": 7, "order": "asc"}));
    }

    #[test]
    fn repeated_scalar_keeps_first_value() {
        let registry = DtoRegistry::new();
        let schema = object([("page", integer())]);
        let query = QueryMap::parse("page=3&page=4").unwrap();
        let value = coerce_params(&query, &schema, &registry);
        assert_eq!(value.to_json(), json!({"page": 3}));
    }
}
