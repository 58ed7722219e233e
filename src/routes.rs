use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::http::header::HeaderValue;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use tower_http::cors::CorsLayer;

use crate::{SharedData, api};

/// Assembles the application router: the task API, the OpenAPI document, a root
/// greeting, and a plain-text 404 fallback. CORS is restricted to the configured
/// frontend origin with credentials enabled so the identity cookie travels
/// cross-site.
pub fn build_router(
    shared_data: Arc<SharedData>,
    frontend_origin: &str,
) -> Result<Router, anyhow::Error> {
    let cors = CorsLayer::new()
        .allow_origin(
            frontend_origin
                .parse::<HeaderValue>()
                .context("parsing the CORS frontend origin")?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]);

    let router = Router::new()
        .route("/", get(hello))
        .merge(api::tasks::task_routes())
        .route("/api-docs/openapi.json", get(openapi_document))
        .fallback(not_found)
        .layer(cors)
        .with_state(shared_data);

    Ok(router)
}

async fn hello() -> &'static str {
    "hello from task-server"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "requested resource not found")
}

async fn openapi_document() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(api::docs::api_docs())
}
