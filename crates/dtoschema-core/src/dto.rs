//! # DTO Metadata
//!
//! [`DtoMeta`] is the field map of one DTO; [`FieldMeta`] describes a single
//! field. DTOs are declared with [`DtoBuilder`], an explicit builder that
//! takes the field list and produces (and optionally registers) the
//! metadata.
//!
//! A field's optionality lives on [`FieldMeta::optional`], separately from
//! the schema's own `optional` attribute. This is what lets `partial` mark
//! every field optional while leaving each field schema byte-for-byte
//! identical to its source.

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::identity::DtoId;
use crate::node::{ObjectNode, SchemaKind, SchemaNode};
use crate::registry::DtoRegistry;

/// One declared field of a DTO.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta {
    pub schema: SchemaNode,
    pub optional: bool,
    pub description: Option<String>,
    pub default: Option<Json>,
}

impl FieldMeta {
    /// A field whose optionality follows the schema's `optional` attribute.
    pub fn new(schema: SchemaNode) -> Self {
        let optional = schema.is_optional();
        Self {
            schema,
            optional,
            description: None,
            default: None,
        }
    }

    /// A required field; clears any `optional` attribute on `schema`.
    pub fn required(mut schema: SchemaNode) -> Self {
        schema.attrs.optional = false;
        Self {
            optional: false,
            ..Self::new(schema)
        }
    }

    pub fn optional(schema: SchemaNode) -> Self {
        Self {
            optional: true,
            ..Self::new(schema)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Json>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Effective optionality: the field flag or the schema's own flag.
    pub fn is_optional(&self) -> bool {
        self.optional || self.schema.is_optional()
    }

    /// The schema this field contributes as an object property.
    ///
    /// The field's description and default fill in when the schema has
    /// none.
    pub fn property_schema(&self) -> SchemaNode {
        let mut node = self.schema.clone();
        node.attrs.optional = self.is_optional();
        if node.attrs.description.is_none() {
            node.attrs.description = self.description.clone();
        }
        if node.attrs.default.is_none() {
            node.attrs.default = self.default.clone();
        }
        node
    }
}

/// Field map of one DTO.
#[derive(Debug, Clone, PartialEq)]
pub struct DtoMeta {
    /// Declared name. Not unique; identity lives in [`DtoId`].
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldMeta>,
    /// `Some(false)` rejects undeclared keys during validation.
    pub additional_properties: Option<bool>,
}

impl DtoMeta {
    /// An empty DTO with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            additional_properties: None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// The `object` node equivalent to this DTO.
    pub fn to_object_schema(&self) -> SchemaNode {
        let properties = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.property_schema()))
            .collect();
        let mut node = SchemaNode::new(SchemaKind::Object(ObjectNode {
            properties,
            additional_properties: self.additional_properties,
        }));
        node.attrs.description = self.description.clone();
        node
    }
}

/// Declares a DTO field by field.
///
/// ```
/// use dtoschema_core::{node, DtoBuilder, DtoRegistry};
///
/// let registry = DtoRegistry::new();
/// let user = DtoBuilder::new("User")
///     .field("id", node::integer())
///     .field("email", node::email())
///     .optional_field("nickname", node::string().max_length(32))
///     .register(&registry);
///
/// let meta = registry.get(&user).unwrap();
/// assert_eq!(meta.field_names(), ["id", "email", "nickname"]);
/// assert!(meta.fields["nickname"].is_optional());
/// ```
#[derive(Debug, Clone)]
pub struct DtoBuilder {
    meta: DtoMeta,
}

impl DtoBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DtoMeta::new(name),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    /// Add a field; it is optional only if the node is.
    pub fn field(mut self, name: impl Into<String>, schema: SchemaNode) -> Self {
        self.meta.fields.insert(name.into(), FieldMeta::new(schema));
        self
    }

    pub fn optional_field(mut self, name: impl Into<String>, schema: SchemaNode) -> Self {
        self.meta
            .fields
            .insert(name.into(), FieldMeta::optional(schema));
        self
    }

    /// Add a fully specified field.
    pub fn field_meta(mut self, name: impl Into<String>, field: FieldMeta) -> Self {
        self.meta.fields.insert(name.into(), field);
        self
    }

    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.meta.additional_properties = Some(allowed);
        self
    }

    pub fn build(self) -> DtoMeta {
        self.meta
    }

    /// Build and register under a fresh identity.
    pub fn register(self, registry: &DtoRegistry) -> DtoId {
        registry.declare(self.meta)
    }
}
