//! # Request/Response Cycle through Axum
//!
//! A small articles API assembled from registered DTOs: requests are
//! checked by the `Validated` extractor, responses rendered through their
//! schemas, and the same DTOs documented at `/openapi.json`.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRef, State};
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use dtoschema_core::derivation::omit;
use dtoschema_core::node::{self, reference};
use dtoschema_core::{DerivationOptions, DtoBuilder, DtoId, DtoRegistry, Value};
use dtoschema_http::{openapi_router, HttpError, RequestSchema, SchemaJson, Validated};
use dtoschema_openapi::{OpenApiConfig, OpenApiGenerator, ResponseDoc, RouteDoc};
use dtoschema_query::{FilterDef, FilterOperator};
use http_body_util::BodyExt;
use serde_json::{json, Value as Json};
use tower::ServiceExt;

#[derive(Clone)]
struct Api {
    registry: Arc<DtoRegistry>,
    article: DtoId,
    create_article: DtoId,
}

impl FromRef<Api> for Arc<DtoRegistry> {
    fn from_ref(api: &Api) -> Self {
        Arc::clone(&api.registry)
    }
}

fn api() -> Api {
    let registry = DtoRegistry::new();
    let author = DtoBuilder::new("Author")
        .field("name", node::string().min_length(1))
        .register(&registry);
    let article = DtoBuilder::new("Article")
        .field("id", node::uuid())
        .field("title", node::string().max_length(40))
        .field("cover", node::bytes().optional())
        .field("author", reference(author))
        .register(&registry);
    let create_article = omit(
        &registry,
        article,
        ["id", "cover"],
        None,
        DerivationOptions::named("CreateArticle"),
    )
    .unwrap();
    Api {
        registry: Arc::new(registry),
        article,
        create_article,
    }
}

async fn create_article(
    State(api): State<Api>,
    Validated(request): Validated,
) -> Result<SchemaJson, HttpError> {
    let body = request
        .body
        .ok_or_else(|| HttpError::Internal("body missing after validation".into()))?;
    let author_id = request
        .params
        .as_ref()
        .and_then(|params| params.get("authorId"))
        .cloned()
        .unwrap_or(Value::Null);
    let draft = request
        .query
        .as_ref()
        .and_then(|query| query.get("draft"))
        .cloned()
        .unwrap_or(Value::Bool(false));

    let article = Value::object([
        ("id", Value::from("3f2504e0-4f89-41d3-9a0c-0305e82c3301")),
        ("title", body.get("title").cloned().unwrap_or(Value::Null)),
        ("cover", Value::bytes(b"Hello".to_vec())),
        ("author", body.get("author").cloned().unwrap_or(Value::Null)),
        ("authorId", author_id),
        ("draft", draft),
    ]);
    Ok(SchemaJson::new(api.registry, reference(api.article), article).status(StatusCode::CREATED))
}

async fn search_articles(Validated(request): Validated) -> axum::Json<Json> {
    axum::Json(request.filter.map(|filter| filter.to_json()).unwrap_or(Json::Null))
}

fn app(api: &Api) -> Router {
    let create = RequestSchema::new()
        .params(node::object([("authorId", node::integer().minimum(1.0))]))
        .query(node::object([("draft", node::boolean().optional())]))
        .body(reference(api.create_article));
    let search = RequestSchema::new().filter(
        FilterDef::new(
            "title",
            "posts.some.title",
            FilterOperator::Contains,
            node::string(),
        )
        .unwrap(),
    );

    let document = OpenApiGenerator::new(&api.registry, OpenApiConfig::new("Articles", "1.0.0"))
        .route(
            RouteDoc::post("/authors/:authorId/articles")
                .params(create.params.clone().unwrap())
                .query(create.query.clone().unwrap())
                .body(reference(api.create_article))
                .response(ResponseDoc::new(201, "Created").schema(reference(api.article))),
        )
        .build()
        .unwrap();

    Router::new()
        .route(
            "/authors/{authorId}/articles",
            post(create_article).layer(create.layer()),
        )
        .route("/articles/search", get(search_articles).layer(search.layer()))
        .merge(openapi_router(&document).unwrap())
        .with_state(api.clone())
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn valid_request_is_coerced_and_response_serialized() {
    let api = api();
    let (status, body) = send(
        app(&api),
        post_json(
            "/authors/42/articles?draft=1",
            r#"{"title":"Hello","author":{"name":"Ada"}}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({
            "id": "3f2504e0-4f89-41d3-9a0c-0305e82c3301",
            "title": "Hello",
            "cover": "SGVsbG8=",
            "author": {"name": "Ada"},
            "authorId": 42,
            "draft": true
        })
    );
}

#[tokio::test]
async fn every_invalid_input_is_reported_in_one_envelope() {
    let api = api();
    let req = Request::builder()
        .method("POST")
        .uri("/authors/0/articles?draft=maybe")
        .header("content-type", "application/json")
        .header("x-request-id", "trace-77")
        .body(Body::from(r#"{"author":{"name":""},"id":"x"}"#))
        .unwrap();
    let (status, body) = send(app(&api), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["traceId"], "trace-77");
    assert_eq!(
        body["errors"],
        json!([
            {"field": "params.authorId", "message": "must be >= 1"},
            {"field": "query.draft", "message": "must be a boolean"},
            {"field": "body.title", "message": "is required"},
            {"field": "body.author.name", "message": "must be at least 1 characters"}
        ])
    );
}

#[tokio::test]
async fn missing_body_is_a_validation_error() {
    let api = api();
    let req = Request::builder()
        .method("POST")
        .uri("/authors/1/articles")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&api), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"],
        json!([{"field": "body", "message": "is required"}])
    );
    assert!(body.get("traceId").is_none());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let api = api();
    let (status, body) = send(app(&api), post_json("/authors/1/articles", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn filters_are_built_from_query_parameters() {
    let api = api();
    let req = Request::builder()
        .uri("/articles/search?title=Hello")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&api), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"posts": {"some": {"title": {"contains": "Hello"}}}})
    );
}

#[tokio::test]
async fn blank_filter_parameters_are_skipped() {
    let api = api();
    let req = Request::builder()
        .uri("/articles/search?title=")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&api), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Json::Null);
}

#[tokio::test]
async fn openapi_document_is_served_next_to_the_api() {
    let api = api();
    let req = Request::builder()
        .uri("/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&api), req).await;
    assert_eq!(status, StatusCode::OK);
    let op = &body["paths"]["/authors/{authorId}/articles"]["post"];
    assert_eq!(
        op["requestBody"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/CreateArticle"})
    );
    assert_eq!(
        op["responses"]["400"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/ValidationErrorResponse"})
    );
    assert!(body["components"]["schemas"]["Author"].is_object());
}
