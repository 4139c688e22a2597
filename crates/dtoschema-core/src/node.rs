//! # Schema Node Algebra
//!
//! Pure constructors for [`SchemaNode`], the immutable description of a
//! value's shape. One free function per kind (`string()`, `integer()`,
//! `array(..)`, `object(..)`, `reference(..)`, ...) plus chainable
//! modifiers for the shared vocabulary (`optional`, `nullable`,
//! `describe`, `with_default`) and the kind-specific constraints.
//!
//! Nothing is checked at construction time. Contradictory options such as
//! `minimum > maximum` are accepted here and only surface later as a
//! schema that no value can satisfy. Modifiers that do not apply to a
//! node's kind are no-ops.
//!
//! A [`reference`] node stores a [`DtoId`] and nothing else. It is resolved
//! lazily against a [`crate::DtoRegistry`], which is what allows
//! self-referential and mutually recursive DTOs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::identity::DtoId;

/// Recognized string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    /// `YYYY-MM-DD`.
    Date,
    /// RFC 3339 date-time with zone.
    DateTime,
    /// `local@domain.tld`.
    Email,
    /// Hyphenated UUID.
    Uuid,
    /// Base64 of a binary buffer.
    Byte,
}

impl StringFormat {
    /// The OpenAPI format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Email => "email",
            Self::Uuid => "uuid",
            Self::Byte => "byte",
        }
    }
}

impl std::fmt::Display for StringFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes shared by every kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttrs {
    /// The value may be absent.
    pub optional: bool,
    /// The value may be `null`.
    pub nullable: bool,
    /// Human-readable description, carried into OpenAPI.
    pub description: Option<String>,
    /// Documented default value.
    pub default: Option<Json>,
}

/// Constraints of a `string` node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringConstraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<StringFormat>,
}

/// Inclusive bounds of a `number` or `integer` node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberConstraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

/// Element schema and size bounds of an `array` node.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    pub items: Box<SchemaNode>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

/// Declared properties of an `object` node, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode {
    pub properties: IndexMap<String, SchemaNode>,
    /// `Some(false)` rejects undeclared keys; anything else ignores them.
    pub additional_properties: Option<bool>,
}

/// Alternatives of a `union` node.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionNode {
    pub members: Vec<SchemaNode>,
    /// Display name used when reporting a failed match.
    pub name: Option<String>,
}

/// The kind-specific part of a [`SchemaNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String(StringConstraints),
    Number(NumberConstraints),
    Integer(NumberConstraints),
    Boolean,
    Null,
    Literal(Json),
    Array(ArrayNode),
    Object(ObjectNode),
    /// One value schema applied to every key.
    Record(Box<SchemaNode>),
    Union(UnionNode),
    Enum(Vec<Json>),
    Ref(DtoId),
}

/// Runtime description of a value's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub attrs: NodeAttrs,
}

/// Options-object form of the `string` constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StringOptions {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<StringFormat>,
    pub description: Option<String>,
}

/// Options-object form of the `number` and `integer` constructors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberOptions {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub description: Option<String>,
}

impl SchemaNode {
    /// A node of the given kind with default attributes.
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            attrs: NodeAttrs::default(),
        }
    }

    /// Short name of the node's kind (`"string"`, `"ref"`, ...).
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            SchemaKind::String(_) => "string",
            SchemaKind::Number(_) => "number",
            SchemaKind::Integer(_) => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Null => "null",
            SchemaKind::Literal(_) => "literal",
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
            SchemaKind::Record(_) => "record",
            SchemaKind::Union(_) => "union",
            SchemaKind::Enum(_) => "enum",
            SchemaKind::Ref(_) => "ref",
        }
    }

    pub fn attrs(&self) -> &NodeAttrs {
        &self.attrs
    }

    pub fn is_optional(&self) -> bool {
        self.attrs.optional
    }

    pub fn is_nullable(&self) -> bool {
        self.attrs.nullable
    }

    /// The string format, if this is a `string` node that declares one.
    pub fn string_format(&self) -> Option<StringFormat> {
        match &self.kind {
            SchemaKind::String(c) => c.format,
            _ => None,
        }
    }

    /// The referenced DTO, if this is a `ref` node.
    pub fn ref_target(&self) -> Option<DtoId> {
        match &self.kind {
            SchemaKind::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.attrs.optional = true;
        self
    }

    /// Clear the optional flag.
    pub fn required(mut self) -> Self {
        self.attrs.optional = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.attrs.nullable = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.attrs.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Json>) -> Self {
        self.attrs.default = Some(default.into());
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        if let SchemaKind::String(c) = &mut self.kind {
            c.min_length = Some(n);
        }
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        if let SchemaKind::String(c) = &mut self.kind {
            c.max_length = Some(n);
        }
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        if let SchemaKind::String(c) = &mut self.kind {
            c.pattern = Some(pattern.into());
        }
        self
    }

    pub fn with_format(mut self, format: StringFormat) -> Self {
        if let SchemaKind::String(c) = &mut self.kind {
            c.format = Some(format);
        }
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        if let SchemaKind::Number(c) | SchemaKind::Integer(c) = &mut self.kind {
            c.minimum = Some(minimum);
        }
        self
    }

    pub fn maximum(mut self, maximum: f64) -> Self {
        if let SchemaKind::Number(c) | SchemaKind::Integer(c) = &mut self.kind {
            c.maximum = Some(maximum);
        }
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        if let SchemaKind::Array(a) = &mut self.kind {
            a.min_items = Some(n);
        }
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        if let SchemaKind::Array(a) = &mut self.kind {
            a.max_items = Some(n);
        }
        self
    }

    pub fn additional_properties(mut self, allowed: bool) -> Self {
        if let SchemaKind::Object(o) = &mut self.kind {
            o.additional_properties = Some(allowed);
        }
        self
    }

    /// Name a union for error reporting.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let SchemaKind::Union(u) = &mut self.kind {
            u.name = Some(name.into());
        }
        self
    }
}

pub fn string() -> SchemaNode {
    SchemaNode::new(SchemaKind::String(StringConstraints::default()))
}

/// `string` built from an options object.
pub fn string_with(options: StringOptions) -> SchemaNode {
    let mut node = SchemaNode::new(SchemaKind::String(StringConstraints {
        min_length: options.min_length,
        max_length: options.max_length,
        pattern: options.pattern,
        format: options.format,
    }));
    node.attrs.description = options.description;
    node
}

pub fn number() -> SchemaNode {
    SchemaNode::new(SchemaKind::Number(NumberConstraints::default()))
}

/// `number` built from an options object.
pub fn number_with(options: NumberOptions) -> SchemaNode {
    let mut node = SchemaNode::new(SchemaKind::Number(NumberConstraints {
        minimum: options.minimum,
        maximum: options.maximum,
    }));
    node.attrs.description = options.description;
    node
}

pub fn integer() -> SchemaNode {
    SchemaNode::new(SchemaKind::Integer(NumberConstraints::default()))
}

/// `integer` built from an options object.
pub fn integer_with(options: NumberOptions) -> SchemaNode {
    let mut node = SchemaNode::new(SchemaKind::Integer(NumberConstraints {
        minimum: options.minimum,
        maximum: options.maximum,
    }));
    node.attrs.description = options.description;
    node
}

pub fn boolean() -> SchemaNode {
    SchemaNode::new(SchemaKind::Boolean)
}

pub fn null() -> SchemaNode {
    SchemaNode::new(SchemaKind::Null)
}

/// Exactly one JSON value.
pub fn literal(value: impl Into<Json>) -> SchemaNode {
    SchemaNode::new(SchemaKind::Literal(value.into()))
}

pub fn array(items: SchemaNode) -> SchemaNode {
    SchemaNode::new(SchemaKind::Array(ArrayNode {
        items: Box::new(items),
        min_items: None,
        max_items: None,
    }))
}

/// An object with the given properties, in iteration order.
pub fn object<I, K>(properties: I) -> SchemaNode
where
    I: IntoIterator<Item = (K, SchemaNode)>,
    K: Into<String>,
{
    SchemaNode::new(SchemaKind::Object(ObjectNode {
        properties: properties
            .into_iter()
            .map(|(name, node)| (name.into(), node))
            .collect(),
        additional_properties: None,
    }))
}

/// A map from arbitrary keys to values matching `values`.
pub fn record(values: SchemaNode) -> SchemaNode {
    SchemaNode::new(SchemaKind::Record(Box::new(values)))
}

pub fn union(members: impl IntoIterator<Item = SchemaNode>) -> SchemaNode {
    SchemaNode::new(SchemaKind::Union(UnionNode {
        members: members.into_iter().collect(),
        name: None,
    }))
}

/// One of a fixed set of JSON values.
pub fn enumeration<I, V>(values: I) -> SchemaNode
where
    I: IntoIterator<Item = V>,
    V: Into<Json>,
{
    SchemaNode::new(SchemaKind::Enum(values.into_iter().map(Into::into).collect()))
}

/// A lazy pointer to a registered DTO.
pub fn reference(id: DtoId) -> SchemaNode {
    SchemaNode::new(SchemaKind::Ref(id))
}

/// Binary payload, base64 on the wire.
pub fn bytes() -> SchemaNode {
    string().with_format(StringFormat::Byte)
}

pub fn date() -> SchemaNode {
    string().with_format(StringFormat::Date)
}

pub fn date_time() -> SchemaNode {
    string().with_format(StringFormat::DateTime)
}

pub fn email() -> SchemaNode {
    string().with_format(StringFormat::Email)
}

pub fn uuid() -> SchemaNode {
    string().with_format(StringFormat::Uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn modifiers_set_shared_attributes() {
        let node = string()
            .optional()
            .nullable()
            .describe("display name")
            .with_default("anon");
        assert!(node.is_optional());
        assert!(node.is_nullable());
        assert_eq!(node.attrs.description.as_deref(), Some("display name"));
        assert_eq!(node.attrs.default, Some(json!("anon")));
    }

    #[test]
    fn kind_specific_modifiers_ignore_other_kinds() {
        let node = boolean().min_length(3).minimum(1.0).min_items(2);
        assert_eq!(node, boolean());
    }

    #[test]
    fn contradictory_bounds_are_accepted() {
        let node = integer().minimum(10.0).maximum(1.0);
        match node.kind {
            SchemaKind::Integer(c) => {
                assert_eq!(c.minimum, Some(10.0));
                assert_eq!(c.maximum, Some(1.0));
            }
            other => panic!("expected integer, got {other:?}"),
        }
    }

    #[test]
    fn options_object_matches_modifier_chain() {
        let via_options = string_with(StringOptions {
            min_length: Some(1),
            max_length: Some(64),
            format: Some(StringFormat::Email),
            ..StringOptions::default()
        });
        let via_chain = string()
            .min_length(1)
            .max_length(64)
            .with_format(StringFormat::Email);
        assert_eq!(via_options, via_chain);
    }

    #[test]
    fn string_options_deserialize_from_camel_case() {
        let options: StringOptions =
            serde_json::from_value(json!({"minLength": 2, "format": "date-time"})).unwrap();
        assert_eq!(options.min_length, Some(2));
        assert_eq!(options.format, Some(StringFormat::DateTime));
    }

    #[test]
    fn object_preserves_declaration_order() {
        let node = object([("b", string()), ("a", integer()), ("c", boolean())]);
        match node.kind {
            SchemaKind::Object(o) => {
                let keys: Vec<&str> = o.properties.keys().map(String::as_str).collect();
                assert_eq!(keys, ["b", "a", "c"]);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn reference_stores_identity_only() {
        let id = DtoId::new();
        let node = reference(id);
        assert_eq!(node.ref_target(), Some(id));
        assert_eq!(node.kind_name(), "ref");
    }

    #[test]
    fn format_shorthands() {
        assert_eq!(bytes().string_format(), Some(StringFormat::Byte));
        assert_eq!(date().string_format(), Some(StringFormat::Date));
        assert_eq!(date_time().string_format(), Some(StringFormat::DateTime));
        assert_eq!(email().string_format(), Some(StringFormat::Email));
        assert_eq!(uuid().string_format(), Some(StringFormat::Uuid));
        assert_eq!(StringFormat::DateTime.to_string(), "date-time");
    }

    #[test]
    fn enumeration_collects_json_values() {
        let node = enumeration(["draft", "published"]);
        assert_eq!(
            node.kind,
            SchemaKind::Enum(vec![json!("draft"), json!("published")])
        );
    }
}
