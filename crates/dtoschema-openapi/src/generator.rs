//! # OpenAPI Generator
//!
//! Walks the schema graph reachable from the documented routes and DTOs and
//! produces an [`OpenApiDocument`].
//!
//! ## Component Emission
//!
//! Every `ref` node becomes `$ref: "#/components/schemas/<Name>"`. The
//! first time an identity is reached its name is claimed and its slot in
//! `components.schemas` is reserved before its fields are converted, so a
//! cycle back to the same identity resolves to the reserved `$ref` and the
//! walk terminates. Each DTO is stored exactly once.
//!
//! Deduplication is by identity. Two distinct identities that share a name
//! are rejected with [`OpenApiError::DuplicateSchemaName`] rather than one
//! silently replacing the other.

use std::collections::HashMap;

use dtoschema_core::{DtoId, DtoRegistry, SchemaKind, SchemaNode};
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::config::OpenApiConfig;
use crate::error::OpenApiError;
use crate::model::{
    AdditionalProperties, Components, Info, MediaType, OpenApiDocument, Operation, Parameter,
    ParameterLocation, RequestBody, Response, SchemaObject, SchemaType,
};
use crate::route::RouteDoc;

pub const OPENAPI_VERSION: &str = "3.1.0";

/// Component name of the built-in validation error envelope.
pub const VALIDATION_ERROR_COMPONENT: &str = "ValidationErrorResponse";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Collects routes and DTOs, then builds the document.
#[derive(Debug)]
pub struct OpenApiGenerator<'r> {
    registry: &'r DtoRegistry,
    config: OpenApiConfig,
    routes: Vec<RouteDoc>,
    dtos: Vec<DtoId>,
}

impl<'r> OpenApiGenerator<'r> {
    pub fn new(registry: &'r DtoRegistry, config: OpenApiConfig) -> Self {
        Self {
            registry,
            config,
            routes: Vec::new(),
            dtos: Vec::new(),
        }
    }

    pub fn route(mut self, route: RouteDoc) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteDoc>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Emit a DTO as a component even if no route references it.
    pub fn dto(mut self, id: DtoId) -> Self {
        self.dtos.push(id);
        self
    }

    /// Build the document.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiError::DuplicateSchemaName`] when two distinct DTOs
    /// reachable from the document share a name.
    pub fn build(&self) -> Result<OpenApiDocument, OpenApiError> {
        let mut emitter = Emitter::new(self.registry);
        let mut paths: IndexMap<String, IndexMap<String, Operation>> = IndexMap::new();

        for route in &self.routes {
            let operation = emitter.operation(route)?;
            let path = route.openapi_path();
            let method = route.method.as_str();
            let item = paths.entry(path.clone()).or_default();
            if item.insert(method.to_string(), operation).is_some() {
                tracing::warn!(%path, method, "route documented twice; keeping the later one");
            }
        }
        for id in &self.dtos {
            emitter.component(*id)?;
        }

        if emitter.uses_validation_error {
            if emitter.by_name.contains_key(VALIDATION_ERROR_COMPONENT) {
                return Err(OpenApiError::DuplicateSchemaName {
                    name: VALIDATION_ERROR_COMPONENT.to_string(),
                });
            }
            emitter
                .schemas
                .insert(VALIDATION_ERROR_COMPONENT.to_string(), validation_error_schema());
        }

        tracing::debug!(
            paths = paths.len(),
            components = emitter.schemas.len(),
            "generated OpenAPI document"
        );
        Ok(OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: self.config.title.clone(),
                version: self.config.version.clone(),
                description: self.config.description.clone(),
            },
            servers: self.config.servers.clone(),
            paths,
            components: Components {
                schemas: emitter.schemas,
            },
        })
    }
}

/// Per-build conversion state.
struct Emitter<'r> {
    registry: &'r DtoRegistry,
    /// Identities already claimed, including those still being converted.
    names: HashMap<DtoId, String>,
    by_name: HashMap<String, DtoId>,
    schemas: IndexMap<String, SchemaObject>,
    uses_validation_error: bool,
}

impl<'r> Emitter<'r> {
    fn new(registry: &'r DtoRegistry) -> Self {
        Self {
            registry,
            names: HashMap::new(),
            by_name: HashMap::new(),
            schemas: IndexMap::new(),
            uses_validation_error: false,
        }
    }

    fn operation(&mut self, route: &RouteDoc) -> Result<Operation, OpenApiError> {
        let mut parameters = Vec::new();
        if let Some(params) = &route.params {
            parameters.extend(self.parameters(params, ParameterLocation::Path)?);
        }
        if let Some(query) = &route.query {
            parameters.extend(self.parameters(query, ParameterLocation::Query)?);
        }

        let request_body = match &route.body {
            Some(body) => Some(RequestBody {
                description: body.attrs.description.clone(),
                required: !body.is_optional(),
                content: json_content(self.convert(body)?),
            }),
            None => None,
        };

        let mut responses = IndexMap::new();
        for response in &route.responses {
            let content = match &response.schema {
                Some(schema) => Some(json_content(self.convert(schema)?)),
                None => None,
            };
            responses.insert(
                response.status.to_string(),
                Response {
                    description: response.description.clone(),
                    content,
                },
            );
        }
        if responses.is_empty() {
            responses.insert(
                "200".to_string(),
                Response {
                    description: "Successful response".to_string(),
                    content: None,
                },
            );
        }
        if route.has_inputs() && !responses.contains_key("400") {
            self.uses_validation_error = true;
            responses.insert(
                "400".to_string(),
                Response {
                    description: "Validation failed".to_string(),
                    content: Some(json_content(SchemaObject::component_ref(
                        VALIDATION_ERROR_COMPONENT,
                    ))),
                },
            );
        }

        Ok(Operation {
            operation_id: route.operation_id.clone(),
            summary: route.summary.clone(),
            description: route.description.clone(),
            tags: route.tags.clone(),
            parameters,
            request_body,
            responses,
        })
    }

    /// Expand an object (or ref) schema into one parameter per property.
    fn parameters(
        &mut self,
        schema: &SchemaNode,
        location: ParameterLocation,
    ) -> Result<Vec<Parameter>, OpenApiError> {
        let properties = match &schema.kind {
            SchemaKind::Object(object) => object.properties.clone(),
            SchemaKind::Ref(id) => match self.registry.object_schema(id) {
                Some(SchemaNode {
                    kind: SchemaKind::Object(object),
                    ..
                }) => object.properties,
                _ => {
                    tracing::warn!(%id, "parameter schema references an unregistered DTO");
                    return Ok(Vec::new());
                }
            },
            _ => {
                tracing::warn!(kind = schema.kind_name(), "parameter schema is not an object");
                return Ok(Vec::new());
            }
        };

        let mut parameters = Vec::with_capacity(properties.len());
        for (name, property) in &properties {
            let mut converted = self.convert(property)?;
            let description = converted.description.take();
            parameters.push(Parameter {
                name: name.clone(),
                location,
                required: match location {
                    ParameterLocation::Path => true,
                    ParameterLocation::Query => !property.is_optional(),
                },
                description,
                schema: converted,
            });
        }
        Ok(parameters)
    }

    /// `$ref` to the component of `id`, emitting it on first encounter.
    fn component(&mut self, id: DtoId) -> Result<SchemaObject, OpenApiError> {
        if let Some(name) = self.names.get(&id) {
            return Ok(SchemaObject::component_ref(name));
        }
        let Some(meta) = self.registry.get(&id) else {
            tracing::warn!(%id, "schema references an unregistered DTO; emitting an empty schema");
            return Ok(SchemaObject::default());
        };
        let name = meta.name.clone();
        if self.by_name.contains_key(&name) {
            return Err(OpenApiError::DuplicateSchemaName { name });
        }

        self.names.insert(id, name.clone());
        self.by_name.insert(name.clone(), id);
        self.schemas.insert(name.clone(), SchemaObject::default());

        let converted = self.convert(&meta.to_object_schema())?;
        self.schemas.insert(name.clone(), converted);
        tracing::debug!(%id, %name, "emitted component schema");
        Ok(SchemaObject::component_ref(&name))
    }

    fn convert(&mut self, node: &SchemaNode) -> Result<SchemaObject, OpenApiError> {
        let mut schema = match &node.kind {
            SchemaKind::String(c) => SchemaObject {
                format: c.format.map(|f| f.as_str().to_string()),
                min_length: c.min_length,
                max_length: c.max_length,
                pattern: c.pattern.clone(),
                ..SchemaObject::typed("string")
            },
            SchemaKind::Number(c) => SchemaObject {
                minimum: c.minimum,
                maximum: c.maximum,
                ..SchemaObject::typed("number")
            },
            SchemaKind::Integer(c) => SchemaObject {
                minimum: c.minimum,
                maximum: c.maximum,
                ..SchemaObject::typed("integer")
            },
            SchemaKind::Boolean => SchemaObject::typed("boolean"),
            SchemaKind::Null => SchemaObject::typed("null"),
            SchemaKind::Literal(value) => SchemaObject {
                const_value: Some(value.clone()),
                ..SchemaObject::default()
            },
            SchemaKind::Enum(values) => SchemaObject {
                enum_values: Some(values.clone()),
                ..SchemaObject::default()
            },
            SchemaKind::Array(array) => SchemaObject {
                items: Some(Box::new(self.convert(&array.items)?)),
                min_items: array.min_items,
                max_items: array.max_items,
                ..SchemaObject::typed("array")
            },
            SchemaKind::Object(object) => {
                let mut properties = IndexMap::new();
                let mut required = Vec::new();
                for (name, property) in &object.properties {
                    properties.insert(name.clone(), self.convert(property)?);
                    if !property.is_optional() {
                        required.push(name.clone());
                    }
                }
                SchemaObject {
                    properties: Some(properties),
                    required: (!required.is_empty()).then_some(required),
                    additional_properties: (object.additional_properties == Some(false))
                        .then_some(AdditionalProperties::Allowed(false)),
                    ..SchemaObject::typed("object")
                }
            }
            SchemaKind::Record(values) => SchemaObject {
                additional_properties: Some(AdditionalProperties::Schema(Box::new(
                    self.convert(values)?,
                ))),
                ..SchemaObject::typed("object")
            },
            SchemaKind::Union(union) => SchemaObject {
                any_of: Some(
                    union
                        .members
                        .iter()
                        .map(|member| self.convert(member))
                        .collect::<Result<_, _>>()?,
                ),
                ..SchemaObject::default()
            },
            SchemaKind::Ref(id) => self.component(*id)?,
        };

        if node.attrs.nullable {
            schema = make_nullable(schema);
        }
        if node.attrs.description.is_some() {
            schema.description = node.attrs.description.clone();
        }
        if node.attrs.default.is_some() {
            schema.default = node.attrs.default.clone();
        }
        Ok(schema)
    }
}

fn make_nullable(schema: SchemaObject) -> SchemaObject {
    match schema.schema_type {
        Some(SchemaType::Single(name)) => SchemaObject {
            schema_type: Some(SchemaType::Multiple(vec![name, "null".to_string()])),
            ..schema
        },
        _ => SchemaObject {
            any_of: Some(vec![schema, SchemaObject::typed("null")]),
            ..SchemaObject::default()
        },
    }
}

fn json_content(schema: SchemaObject) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(JSON_CONTENT_TYPE.to_string(), MediaType { schema });
    content
}

/// Mirrors the HTTP adapter's error envelope.
fn validation_error_schema() -> SchemaObject {
    let string = || SchemaObject::typed("string");
    let issue = SchemaObject {
        properties: Some(IndexMap::from([
            ("field".to_string(), string()),
            ("message".to_string(), string()),
        ])),
        required: Some(vec!["field".to_string(), "message".to_string()]),
        ..SchemaObject::typed("object")
    };
    SchemaObject {
        properties: Some(IndexMap::from([
            ("message".to_string(), string()),
            (
                "code".to_string(),
                SchemaObject {
                    default: Some(Json::String("VALIDATION_ERROR".to_string())),
                    ..string()
                },
            ),
            (
                "errors".to_string(),
                SchemaObject {
                    items: Some(Box::new(issue)),
                    ..SchemaObject::typed("array")
                },
            ),
            ("traceId".to_string(), string()),
        ])),
        required: Some(vec!["message".to_string()]),
        ..SchemaObject::typed("object")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::ResponseDoc;
    use dtoschema_core::node::*;
    use dtoschema_core::DtoBuilder;
    use serde_json::json;

    fn generate(registry: &DtoRegistry, node: &SchemaNode) -> Json {
        let mut emitter = Emitter::new(registry);
        let schema = emitter.convert(node).unwrap();
        serde_json::to_value(schema).unwrap()
    }

    #[test]
    fn primitives_map_to_types() {
        let registry = DtoRegistry::new();
        assert_eq!(
            generate(&registry, &string().min_length(1).with_format(dtoschema_core::StringFormat::Email)),
            json!({"type": "string", "format": "email", "minLength": 1})
        );
        assert_eq!(
            generate(&registry, &integer().minimum(0.0).describe("count")),
            json!({"type": "integer", "minimum": 0.0, "description": "count"})
        );
        assert_eq!(generate(&registry, &boolean()), json!({"type": "boolean"}));
        assert_eq!(generate(&registry, &literal("v1")), json!({"const": "v1"}));
        assert_eq!(
            generate(&registry, &enumeration(["a", "b"])),
            json!({"enum": ["a", "b"]})
        );
    }

    #[test]
    fn nullable_uses_type_lists_or_any_of() {
        let registry = DtoRegistry::new();
        assert_eq!(
            generate(&registry, &string().nullable()),
            json!({"type": ["string", "null"]})
        );
        assert_eq!(
            generate(&registry, &literal(1).nullable()),
            json!({"anyOf": [{"const": 1}, {"type": "null"}]})
        );
    }

    #[test]
    fn objects_list_required_and_closedness() {
        let registry = DtoRegistry::new();
        let node = object([("a", string()), ("b", integer().optional())])
            .additional_properties(false);
        assert_eq!(
            generate(&registry, &node),
            json!({
                "type": "object",
                "properties": {"a": {"type": "string"}, "b": {"type": "integer"}},
                "required": ["a"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn records_and_unions() {
        let registry = DtoRegistry::new();
        assert_eq!(
            generate(&registry, &record(number())),
            json!({"type": "object", "additionalProperties": {"type": "number"}})
        );
        assert_eq!(
            generate(&registry, &union([string(), integer()])),
            json!({"anyOf": [{"type": "string"}, {"type": "integer"}]})
        );
    }

    #[test]
    fn unknown_refs_render_empty() {
        let registry = DtoRegistry::new();
        assert_eq!(generate(&registry, &reference(DtoId::new())), json!({}));
    }

    #[test]
    fn shared_dto_is_emitted_once() {
        let registry = DtoRegistry::new();
        let money = DtoBuilder::new("Money")
            .field("amount", integer())
            .register(&registry);
        let order = DtoBuilder::new("Order")
            .field("total", reference(money))
            .field("tax", reference(money).nullable())
            .register(&registry);

        let doc = OpenApiGenerator::new(&registry, OpenApiConfig::default())
            .dto(order)
            .dto(money)
            .build()
            .unwrap();
        let keys: Vec<&str> = doc.components.schemas.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Order", "Money"]);
        let order_json = serde_json::to_value(doc.schema("Order").unwrap()).unwrap();
        assert_eq!(
            order_json["properties"]["tax"],
            json!({"anyOf": [{"$ref": "#/components/schemas/Money"}, {"type": "null"}]})
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = DtoRegistry::new();
        let a = DtoBuilder::new("Item").register(&registry);
        let b = DtoBuilder::new("Item").register(&registry);
        let err = OpenApiGenerator::new(&registry, OpenApiConfig::default())
            .dto(a)
            .dto(b)
            .build()
            .unwrap_err();
        assert!(matches!(err, OpenApiError::DuplicateSchemaName { name } if name == "Item"));
    }

    #[test]
    fn routes_expand_parameters_and_error_response() {
        let registry = DtoRegistry::new();
        let user = DtoBuilder::new("User")
            .field("id", integer())
            .register(&registry);
        let route = RouteDoc::get("/users/:id")
            .operation_id("getUser")
            .tag("users")
            .params(object([("id", integer().describe("user id"))]))
            .query(object([("expand", boolean().optional())]))
            .response(ResponseDoc::new(200, "The user").schema(reference(user)));

        let doc = OpenApiGenerator::new(&registry, OpenApiConfig::new("Users", "1.2.0"))
            .route(route)
            .build()
            .unwrap();
        let json = doc.to_json().unwrap();
        let op = &json["paths"]["/users/{id}"]["get"];
        assert_eq!(op["operationId"], "getUser");
        assert_eq!(
            op["parameters"],
            json!([
                {"name": "id", "in": "path", "required": true, "description": "user id", "schema": {"type": "integer"}},
                {"name": "expand", "in": "query", "required": false, "schema": {"type": "boolean"}}
            ])
        );
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"],
            json!({"$ref": "#/components/schemas/User"})
        );
        assert_eq!(
            op["responses"]["400"]["content"]["application/json"]["schema"],
            json!({"$ref": "#/components/schemas/ValidationErrorResponse"})
        );
        assert!(doc.schema(VALIDATION_ERROR_COMPONENT).is_some());
        assert_eq!(json["info"], json!({"title": "Users", "version": "1.2.0"}));
        assert_eq!(json["openapi"], "3.1.0");
    }

    #[test]
    fn routes_without_inputs_have_no_error_component() {
        let registry = DtoRegistry::new();
        let doc = OpenApiGenerator::new(&registry, OpenApiConfig::default())
            .route(RouteDoc::get("/health"))
            .build()
            .unwrap();
        assert!(doc.components.schemas.is_empty());
        let json = doc.to_json().unwrap();
        assert_eq!(
            json["paths"]["/health"]["get"]["responses"],
            json!({"200": {"description": "Successful response"}})
        );
    }

    #[test]
    fn request_body_is_json() {
        let registry = DtoRegistry::new();
        let create = DtoBuilder::new("CreateUser")
            .field("name", string())
            .register(&registry);
        let doc = OpenApiGenerator::new(&registry, OpenApiConfig::default())
            .route(RouteDoc::post("/users").body(reference(create)))
            .build()
            .unwrap();
        let json = doc.to_json().unwrap();
        assert_eq!(
            json["paths"]["/users"]["post"]["requestBody"],
            json!({
                "required": true,
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/CreateUser"}}}
            })
        );
    }
}
