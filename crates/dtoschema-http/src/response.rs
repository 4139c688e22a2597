//! # Schema-Driven JSON Responses
//!
//! Handlers return domain [`Value`]s; [`SchemaJson`] runs them through the
//! serializer before they hit the wire, so binary fields leave as base64
//! and timestamps as ISO strings.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dtoschema_core::{DtoRegistry, SchemaNode, Value};
use dtoschema_validate::serialize_response;

/// A response body rendered through its schema.
#[derive(Debug, Clone)]
pub struct SchemaJson {
    registry: Arc<DtoRegistry>,
    schema: SchemaNode,
    value: Value,
    status: StatusCode,
}

impl SchemaJson {
    pub fn new(registry: Arc<DtoRegistry>, schema: SchemaNode, value: impl Into<Value>) -> Self {
        Self {
            registry,
            schema,
            value: value.into(),
            status: StatusCode::OK,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The wire JSON this response carries.
    pub fn render(&self) -> serde_json::Value {
        render(&self.registry, &self.value, &self.schema)
    }
}

impl IntoResponse for SchemaJson {
    fn into_response(self) -> Response {
        (self.status, Json(self.render())).into_response()
    }
}

/// Serialize `value` per `schema` and convert it to JSON.
pub fn render(registry: &DtoRegistry, value: &Value, schema: &SchemaNode) -> serde_json::Value {
    serialize_response(registry, value, schema).to_json()
}
