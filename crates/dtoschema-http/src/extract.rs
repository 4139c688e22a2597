//! # Schema-Checked Request Extraction
//!
//! A route declares a [`RequestSchema`] (path parameters, query, body, and
//! optional filter bindings). [`check_request`] coerces the raw strings
//! against it, validates all three inputs, and either returns the typed
//! values or one [`HttpError::Validation`] carrying every issue.
//!
//! Issues are re-rooted under the input they came from, so the envelope
//! reads `params.id`, `query.limit`, `body.author.name`.
//!
//! Filter parameters are bound by their [`FilterDef`]s and are removed from
//! the query before it is checked against the query schema.
//!
//! ## Axum Integration
//!
//! [`Validated`] is a `FromRequest` extractor. The route's schema travels
//! as a request extension (see [`RequestSchema::layer`]) and the registry
//! comes from application state via `FromRef`:
//!
//! ```ignore
//! let schema = RequestSchema::new().body(reference(create_article));
//! let app = Router::new()
//!     .route("/articles", post(create).layer(schema.layer()))
//!     .with_state(registry);
//! ```

use std::sync::Arc;

use axum::extract::{FromRef, FromRequest, FromRequestParts, Path, Request};
use axum::http::HeaderMap;
use axum::Extension;
use dtoschema_core::{DtoRegistry, SchemaNode, Value};
use dtoschema_query::{coerce_params, parse_filters, FilterDef, QueryMap};
use dtoschema_validate::{ValidationIssue, ValidationIssues, Validator};

use crate::error::HttpError;

/// Header echoed as `traceId` in error envelopes.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Largest JSON body read by [`Validated`].
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Schemas of one route's inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSchema {
    pub params: Option<SchemaNode>,
    pub query: Option<SchemaNode>,
    pub body: Option<SchemaNode>,
    pub filters: Vec<FilterDef>,
}

impl RequestSchema {
    pub fn new() -> Self {
        Self::default()
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

    pub fn filter(mut self, def: FilterDef) -> Self {
        self.filters.push(def);
        self
    }

    /// Attach this schema to a route.
    pub fn layer(self) -> Extension<Arc<Self>> {
        Extension(Arc::new(self))
    }
}

/// Undecoded inputs of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    pub params: QueryMap,
    pub query: QueryMap,
    /// `None` when the request had no body.
    pub body: Option<serde_json::Value>,
    pub trace_id: Option<String>,
}

/// Inputs that passed their schemas.
///
/// A member is `None` when the route declares no schema for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckedRequest {
    pub params: Option<Value>,
    pub query: Option<Value>,
    pub body: Option<Value>,
    /// Nested filter built from the route's filter bindings.
    pub filter: Option<Value>,
    pub trace_id: Option<String>,
}

/// Coerce and validate every declared input of a request.
///
/// # Errors
///
/// Returns [`HttpError::Validation`] with the issues of all inputs if any
/// input fails its schema.
pub fn check_request(
    registry: &DtoRegistry,
    schema: &RequestSchema,
    raw: RawRequest,
) -> Result<CheckedRequest, HttpError> {
    let validator = Validator::new(registry);
    let mut issues = ValidationIssues::new();

    let params = schema.params.as_ref().map(|node| {
        let value = coerce_params(&raw.params, node, registry);
        issues.extend(rooted(validator.validate(&value, node), "params"));
        value
    });
    let query = schema.query.as_ref().map(|node| {
        let plain = raw
            .query
            .without(schema.filters.iter().map(|def| def.param.as_str()));
        let value = coerce_params(&plain, node, registry);
        issues.extend(rooted(validator.validate(&value, node), "query"));
        value
    });
    let filter = if schema.filters.is_empty() {
        None
    } else {
        match parse_filters(&schema.filters, &raw.query, registry) {
            Ok(filter) => filter,
            Err(filter_issues) => {
                issues.extend(rooted(filter_issues, "query"));
                None
            }
        }
    };
    let body = match &schema.body {
        Some(node) => {
            let value = raw.body.map(Value::from);
            issues.extend(rooted(validator.validate_slot(value.as_ref(), node), "body"));
            value
        }
        None => None,
    };

    if !issues.is_empty() {
        return Err(HttpError::Validation {
            issues,
            trace_id: raw.trace_id,
        });
    }
    Ok(CheckedRequest {
        params,
        query,
        body,
        filter,
        trace_id: raw.trace_id,
    })
}

fn rooted(
    issues: impl IntoIterator<Item = ValidationIssue>,
    input: &'static str,
) -> impl Iterator<Item = ValidationIssue> {
    issues.into_iter().map(move |issue| issue.under(input))
}

/// The `x-request-id` header, if present and printable.
pub fn trace_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Extractor running [`check_request`] against the route's [`RequestSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Validated(pub CheckedRequest);

impl<S> FromRequest<S> for Validated
where
    S: Send + Sync,
    Arc<DtoRegistry>: FromRef<S>,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let registry = Arc::<DtoRegistry>::from_ref(state);
        let (mut parts, body) = req.into_parts();
        let Some(schema) = parts.extensions.get::<Arc<RequestSchema>>().cloned() else {
            return Err(HttpError::Internal(format!(
                "no request schema attached to {} {}",
                parts.method, parts.uri
            )));
        };

        let params = if schema.params.is_some() {
            let Path(pairs) = Path::<Vec<(String, String)>>::from_request_parts(&mut parts, state)
                .await
                .map_err(|rejection| HttpError::BadRequest(rejection.body_text()))?;
            pairs.into_iter().collect()
        } else {
            QueryMap::new()
        };
        let query = match parts.uri.query() {
            Some(query) => QueryMap::parse(query)?,
            None => QueryMap::new(),
        };
        let body = if schema.body.is_some() {
            read_json(body).await?
        } else {
            None
        };

        let raw = RawRequest {
            params,
            query,
            body,
            trace_id: trace_id(&parts.headers),
        };
        check_request(&registry, &schema, raw).map(Self)
    }
}

async fn read_json(body: axum::body::Body) -> Result<Option<serde_json::Value>, HttpError> {
    let bytes = axum::body::to_bytes(body, DEFAULT_BODY_LIMIT)
        .await
        .map_err(|err| HttpError::BadRequest(format!("unreadable body: {err}")))?;
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| HttpError::BadRequest(format!("malformed JSON body: {err}")))
}
