//! # OpenAPI Routes
//!
//! Serves a generated document at `/openapi.json` (and `/openapi.yaml`).
//! The document is rendered once when the router is built.

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use axum::Router;
use dtoschema_openapi::{OpenApiDocument, OpenApiError};
use tower_http::trace::TraceLayer;

pub const OPENAPI_JSON_PATH: &str = "/openapi.json";
pub const OPENAPI_YAML_PATH: &str = "/openapi.yaml";

/// Router serving `document`.
///
/// # Errors
///
/// Returns [`OpenApiError`] if the document cannot be rendered.
pub fn openapi_router<S>(document: &OpenApiDocument) -> Result<Router<S>, OpenApiError>
where
    S: Clone + Send + Sync + 'static,
{
    let json = Bytes::from(document.to_json_pretty()?);
    let yaml = Bytes::from(document.to_yaml()?);
    tracing::info!(
        paths = document.paths.len(),
        components = document.components.schemas.len(),
        "serving OpenAPI document"
    );

    Ok(Router::new()
        .route(
            OPENAPI_JSON_PATH,
            get(move || {
                let body = json.clone();
                async move { ([(CONTENT_TYPE, "application/json")], body) }
            }),
        )
        .route(
            OPENAPI_YAML_PATH,
            get(move || {
                let body = yaml.clone();
                async move { ([(CONTENT_TYPE, "application/yaml")], body) }
            }),
        )
        .layer(TraceLayer::new_for_http()))
}
