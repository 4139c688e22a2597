//! # Serialization Engine
//!
//! Rewrites a handler's return value into its wire shape, guided by the
//! response schema:
//!
//! - `byte` strings: binary buffers become standard, padded base64.
//! - `date` strings: valid timestamps become `YYYY-MM-DD` (UTC).
//! - `date-time` strings: valid timestamps become ISO 8601 with
//!   milliseconds and a `Z` suffix.
//!
//! Containers are rewritten structurally. Properties the schema does not
//! declare are carried over untouched, as are values whose shape does not
//! fit the schema. Invalid timestamps are passed through unchanged, which
//! renders them as `null` in JSON. Serialization never fails.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dtoschema_core::{DtoId, DtoRegistry, SchemaKind, SchemaNode, StringFormat, Value};

use crate::validate::{ValidationConfig, Validator};

/// Schema-driven response encoder.
#[derive(Debug)]
pub struct Serializer<'r> {
    validator: Validator<'r>,
}

impl<'r> Serializer<'r> {
    pub fn new(registry: &'r DtoRegistry) -> Self {
        Self::with_config(registry, ValidationConfig::default())
    }

    /// The config's depth limit also bounds serialization; deeper values
    /// pass through as-is.
    pub fn with_config(registry: &'r DtoRegistry, config: ValidationConfig) -> Self {
        Self {
            validator: Validator::with_config(registry, config),
        }
    }

    /// Rewrite `value` for transmission according to `schema`.
    pub fn serialize(&self, value: &Value, schema: &SchemaNode) -> Value {
        let mut expanding = Vec::new();
        self.rewrite(value, schema, 0, &mut expanding)
    }

    fn rewrite<'v>(
        &self,
        value: &'v Value,
        node: &SchemaNode,
        depth: usize,
        expanding: &mut Vec<(DtoId, &'v Value)>,
    ) -> Value {
        if depth > self.validator.config().max_depth {
            return value.clone();
        }
        match (&node.kind, value) {
            (SchemaKind::String(c), _) => encode_string(value, c.format),
            (SchemaKind::Array(array), Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| self.rewrite(item, &array.items, depth + 1, expanding))
                    .collect(),
            ),
            (SchemaKind::Object(object), Value::Object(map)) => Value::Object(
                map.iter()
                    .map(|(key, item)| {
                        let rewritten = match object.properties.get(key) {
                            Some(property) => self.rewrite(item, property, depth + 1, expanding),
                            None => item.clone(),
                        };
                        (key.clone(), rewritten)
                    })
                    .collect(),
            ),
            (SchemaKind::Record(values), Value::Object(map)) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.rewrite(item, values, depth + 1, expanding)))
                    .collect(),
            ),
            (SchemaKind::Union(union), _) => {
                match union
                    .members
                    .iter()
                    .find(|member| self.validator.is_valid(value, member))
                {
                    Some(member) => self.rewrite(value, member, depth + 1, expanding),
                    None => value.clone(),
                }
            }
            (SchemaKind::Ref(id), _) => self.rewrite_ref(*id, value, depth, expanding),
            _ => value.clone(),
        }
    }

    fn rewrite_ref<'v>(
        &self,
        id: DtoId,
        value: &'v Value,
        depth: usize,
        expanding: &mut Vec<(DtoId, &'v Value)>,
    ) -> Value {
        let Some(meta) = self.validator.registry().get(&id) else {
            tracing::debug!(%id, "serializing against an unregistered DTO; passing value through");
            return value.clone();
        };
        if expanding
            .iter()
            .any(|(seen, v)| *seen == id && std::ptr::eq(*v, value))
        {
            return value.clone();
        }
        expanding.push((id, value));
        let out = self.rewrite(value, &meta.to_object_schema(), depth + 1, expanding);
        expanding.pop();
        out
    }
}

fn encode_string(value: &Value, format: Option<StringFormat>) -> Value {
    match (format, value) {
        (Some(StringFormat::Byte), Value::Bytes(data)) => Value::String(STANDARD.encode(data)),
        (Some(StringFormat::Date), Value::Timestamp(ts)) => ts
            .to_date_string()
            .map(Value::String)
            .unwrap_or_else(|| value.clone()),
        (Some(StringFormat::DateTime), Value::Timestamp(ts)) => ts
            .to_iso8601()
            .map(Value::String)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// Serialize with a default-configured [`Serializer`].
pub fn serialize_response(registry: &DtoRegistry, value: &Value, schema: &SchemaNode) -> Value {
    Serializer::new(registry).serialize(value, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtoschema_core::node::*;
    use dtoschema_core::{DtoBuilder, Timestamp};
    use serde_json::json;

    #[test]
    fn bytes_become_base64() {
        let registry = DtoRegistry::new();
        let out = serialize_response(&registry, &Value::bytes(b"Hello".to_vec()), &bytes());
        assert_eq!(out, Value::from("SGVsbG8="));
        let decoded = out.as_str().map(|text| STANDARD.decode(text));
        assert_eq!(decoded.unwrap().unwrap(), b"Hello");
    }

    #[test]
    fn byte_strings_pass_through() {
        let registry = DtoRegistry::new();
        let out = serialize_response(&registry, &Value::from("SGVsbG8="), &bytes());
        assert_eq!(out, Value::from("SGVsbG8="));
    }

    #[test]
    fn timestamps_follow_the_declared_format() {
        let registry = DtoRegistry::new();
        let ts = Value::from(Timestamp::parse("2024-07-04T23:15:00.250+02:00"));
        assert_eq!(
            serialize_response(&registry, &ts, &date()),
            Value::from("2024-07-04")
        );
        assert_eq!(
            serialize_response(&registry, &ts, &date_time()),
            Value::from("2024-07-04T21:15:00.250Z")
        );
    }

    #[test]
    fn invalid_timestamps_pass_through() {
        let registry = DtoRegistry::new();
        let invalid = Value::from(Timestamp::invalid());
        let out = serialize_response(&registry, &invalid, &date());
        assert_eq!(out, invalid);
        assert_eq!(out.to_json(), serde_json::Value::Null);
    }

    #[test]
    fn objects_keep_undeclared_properties() {
        let registry = DtoRegistry::new();
        let schema = object([("avatar", bytes())]);
        let value = Value::object([
            ("avatar", Value::bytes(vec![0xff])),
            ("extra", Value::from(1)),
        ]);
        let out = serialize_response(&registry, &value, &schema);
        assert_eq!(out.to_json(), json!({"avatar": "/w==", "extra": 1}));
    }

    #[test]
    fn arrays_and_records_recurse() {
        let registry = DtoRegistry::new();
        let ts = Value::from(Timestamp::parse("2020-01-01"));
        let list = serialize_response(&registry, &Value::Array(vec![ts.clone()]), &array(date()));
        assert_eq!(list.to_json(), json!(["2020-01-01"]));
        let map = serialize_response(&registry, &Value::object([("k", ts)]), &record(date()));
        assert_eq!(map.to_json(), json!({"k": "2020-01-01"}));
    }

    #[test]
    fn union_uses_the_first_matching_member() {
        let registry = DtoRegistry::new();
        let schema = union([integer(), bytes()]);
        let out = serialize_response(&registry, &Value::bytes(b"Hi".to_vec()), &schema);
        assert_eq!(out, Value::from("SGk="));
        assert_eq!(
            serialize_response(&registry, &Value::from(true), &schema),
            Value::from(true)
        );
    }

    #[test]
    fn refs_resolve_recursively() {
        let registry = DtoRegistry::new();
        let node_id = DtoId::new();
        registry
            .register(
                node_id,
                DtoBuilder::new("Event")
                    .field("at", date_time())
                    .field("next", reference(node_id).optional())
                    .build(),
            )
            .unwrap();
        let value = Value::object([
            ("at", Value::from(Timestamp::from_epoch_millis(0))),
            (
                "next",
                Value::object([("at", Value::from(Timestamp::from_epoch_millis(1)))]),
            ),
        ]);
        let out = serialize_response(&registry, &value, &reference(node_id));
        assert_eq!(
            out.to_json(),
            json!({
                "at": "1970-01-01T00:00:00.000Z",
                "next": {"at": "1970-01-01T00:00:00.001Z"}
            })
        );
    }

    #[test]
    fn unknown_refs_and_mismatched_shapes_pass_through() {
        let registry = DtoRegistry::new();
        let value = Value::from(json!({"a": 1}));
        assert_eq!(
            serialize_response(&registry, &value, &reference(DtoId::new())),
            value
        );
        assert_eq!(
            serialize_response(&registry, &Value::from(3), &object([("a", bytes())])),
            Value::from(3)
        );
    }
}
