use crate::dto;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "Task Server API",
    description = "A task-tracking API scoping every operation to an anonymous cookie identity"
))]
struct TaskServerApi;

/// Assembles the OpenAPI document served at /api-docs/openapi.json, merging in
/// definitions from the [dto] package and the task API
pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut docs = TaskServerApi::openapi();
    docs.merge(dto::OpenApiSchemas::openapi());
    docs.merge(super::tasks::TasksApi::openapi());

    docs
}
