//! # dtoschema-openapi — OpenAPI 3.1 Document Generation
//!
//! Turns documented routes and the DTOs reachable from them into an
//! OpenAPI 3.1 document with reusable components.
//!
//! ## Key Design Principles
//!
//! 1. **One component per identity.** Each DTO reachable from the document
//!    appears once under `components.schemas`, referenced everywhere else
//!    with `$ref`. Recursive DTOs terminate.
//!
//! 2. **Names must be unique.** Two distinct DTOs with the same name are an
//!    error ([`OpenApiError::DuplicateSchemaName`]), never a silent overwrite.
//!
//! 3. **Serde model, no codegen.** The document is a plain serde model
//!    ([`model`]) rendered to JSON or YAML.
//!
//! ## Crate Policy
//!
//! - Depends only on `dtoschema-core`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod route;

pub use config::{OpenApiConfig, Server};
pub use error::OpenApiError;
pub use generator::{OpenApiGenerator, OPENAPI_VERSION, VALIDATION_ERROR_COMPONENT};
pub use model::{OpenApiDocument, SchemaObject};
pub use route::{Method, ResponseDoc, RouteDoc};
