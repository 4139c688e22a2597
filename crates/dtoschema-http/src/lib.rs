//! # dtoschema-http — Axum Adapter
//!
//! Wires the schema engines into an Axum application.
//!
//! ## Pieces
//!
//! - [`Validated`] — extractor that coerces and validates path parameters,
//!   query and JSON body against the route's [`RequestSchema`].
//! - [`HttpError`] — every failure rendered as the JSON error envelope;
//!   validation failures are `400 VALIDATION_ERROR` listing every field.
//! - [`SchemaJson`] — response body serialized through its schema.
//! - [`openapi_router`] — `/openapi.json` and `/openapi.yaml`.
//!
//! ## Middleware
//!
//! `TraceLayer` on the documentation routes. Applications add their own
//! layers to the routers they build.
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG.
//! - No schema logic in handlers; everything delegates to the engine crates.
//! - All errors map to structured HTTP responses via [`HttpError`].

pub mod error;
pub mod extract;
pub mod openapi;
pub mod response;

pub use error::{ErrorEnvelope, FieldError, HttpError, VALIDATION_ERROR_CODE};
pub use extract::{
    check_request, trace_id, CheckedRequest, RawRequest, RequestSchema, Validated,
    REQUEST_ID_HEADER,
};
pub use openapi::{openapi_router, OPENAPI_JSON_PATH, OPENAPI_YAML_PATH};
pub use response::{render, SchemaJson};
