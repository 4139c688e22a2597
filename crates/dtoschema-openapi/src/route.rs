//! # Route Documentation
//!
//! What the generator needs to know about one endpoint: method, path,
//! descriptive text, the schemas of its inputs, and its responses.

use dtoschema_core::SchemaNode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Lowercase name, as used for path item keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
        }
    }
}

/// One documented response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDoc {
    pub status: u16,
    pub description: String,
    pub schema: Option<SchemaNode>,
}

impl ResponseDoc {
    pub fn new(status: u16, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
            schema: None,
        }
    }

    pub fn schema(mut self, schema: SchemaNode) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// One documented endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDoc {
    pub method: Method,
    /// `/users/{id}`; `:id` segments are accepted and rewritten.
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub params: Option<SchemaNode>,
    pub query: Option<SchemaNode>,
    pub body: Option<SchemaNode>,
    pub responses: Vec<ResponseDoc>,
}

impl RouteDoc {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            params: None,
            query: None,
            body: None,
            responses: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn params(mut self, schema: SchemaNode) -> Self {
        self.params = Some(schema);
        self
    }

    pub fn query(mut self, schema: SchemaNode) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn body(mut self, schema: SchemaNode) -> Self {
        self.body = Some(schema);
        self
    }

    pub fn response(mut self, response: ResponseDoc) -> Self {
        self.responses.push(response);
        self
    }

    /// Whether the route takes any validated input.
    pub fn has_inputs(&self) -> bool {
        self.params.is_some() || self.query.is_some() || self.body.is_some()
    }

    /// The path in OpenAPI template form.
    pub fn openapi_path(&self) -> String {
        self.path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => format!("{{{name}}}"),
                _ => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
