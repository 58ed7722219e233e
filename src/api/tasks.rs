use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::ErrorResponse;
use axum::routing::get;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

use crate::domain::identity::driven_ports::UserStore;
use crate::domain::identity::driving_ports::{AuthenticateError, IdentityPort};
use crate::domain::identity::{Identity, IdentityService};
use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::task::TaskService;
use crate::external_connections::ExternalConnectivity;
use crate::persistence::db_task_store::{DbTaskReader, DbTaskWriter};
use crate::persistence::db_user_store::DbUserStore;
use crate::routing_utils::{
    GenericErrorResponse, IdentityErrorResponse, InvalidInputResponse, Json, TaskErrorResponse,
    ValidationErrorResponse,
};
use crate::{AppState, SharedData, dto};

/// Name of the cookie carrying a client's identity token
pub const IDENTITY_COOKIE: &str = "access_code";

/// Cookie attributes that depend on how the deployment is reached. Cross-site
/// frontends over TLS need Secure + SameSite=None for the browser to send the
/// cookie at all; plain HTTP development setups get SameSite=Lax instead.
#[derive(Clone)]
pub struct CookieSettings {
    pub secure: bool,
}

/// Defines the OpenAPI documentation for the task API
#[derive(OpenApi)]
#[openapi(paths(list_tasks, create_task, update_task, delete_task))]
pub struct TasksApi;

/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Adds routes for the task API to the application router
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/tasks",
        get(list_tasks)
            .post(create_task)
            .put(update_task)
            .delete(delete_task),
    )
}

fn presented_access_code(jar: &CookieJar) -> Option<String> {
    jar.get(IDENTITY_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

/// Builds the cookie directive mirroring a freshly minted identity token back to
/// the client.
fn identity_cookie(token: String, settings: &CookieSettings) -> Cookie<'static> {
    let mut cookie = Cookie::new(IDENTITY_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::days(365));
    if settings.secure {
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::None);
    } else {
        cookie.set_same_site(SameSite::Lax);
    }

    cookie
}

/// Lists the caller's tasks, bootstrapping a fresh identity when none is presented.
#[utoipa::path(
    get,
    path = "/tasks",
    tag = TASK_API_GROUP,
    responses(
        (
            status = 200,
            description = "The caller's task list. A first visit also registers the caller and sets the identity cookie.",
            body = dto::TaskListResponse,
        ),
        (status = 500, description = "Storage failure", body = crate::routing_utils::ErrorBody),
    )
)]
async fn list_tasks(
    State(app_state): AppState,
    jar: CookieJar,
) -> Result<(CookieJar, Json<dto::TaskListResponse>), ErrorResponse> {
    let mut ext_cxn = app_state.ext_cxn.clone();
    let presented = presented_access_code(&jar);

    let (issued_cookie, task_list) = fetch_tasks(
        presented.as_deref(),
        &app_state.cookies,
        &mut ext_cxn,
        &IdentityService {},
        &TaskService {},
        &DbUserStore,
        &DbTaskReader,
    )
    .await?;

    let jar = match issued_cookie {
        Some(cookie) => jar.add(cookie),
        None => jar,
    };

    Ok((jar, task_list))
}

/// Creates a task owned by the caller.
#[utoipa::path(
    post,
    path = "/tasks",
    tag = TASK_API_GROUP,
    request_body = dto::NewTaskRequest,
    responses(
        (status = 200, description = "The created task", body = dto::TaskCreatedResponse),
        (status = 400, description = "Blank description or malformed body", body = crate::routing_utils::ErrorBody),
        (status = 401, description = "No recognized identity was presented", body = crate::routing_utils::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::routing_utils::ErrorBody),
    )
)]
async fn create_task(
    State(app_state): AppState,
    jar: CookieJar,
    Json(new_task): Json<dto::NewTaskRequest>,
) -> Result<Json<dto::TaskCreatedResponse>, ErrorResponse> {
    let mut ext_cxn = app_state.ext_cxn.clone();
    let presented = presented_access_code(&jar);

    add_task(
        presented.as_deref(),
        new_task,
        &mut ext_cxn,
        &IdentityService {},
        &TaskService {},
        &DbUserStore,
        &DbTaskWriter,
    )
    .await
}

/// Sets the done/not-done status of one of the caller's tasks.
#[utoipa::path(
    put,
    path = "/tasks",
    tag = TASK_API_GROUP,
    request_body = dto::UpdateTaskRequest,
    responses(
        (status = 200, description = "The task's status was updated", body = dto::MessageResponse),
        (status = 400, description = "Non-positive task id or malformed body", body = crate::routing_utils::ErrorBody),
        (status = 401, description = "No recognized identity was presented", body = crate::routing_utils::ErrorBody),
        (status = 404, description = "The task does not exist for the caller", body = crate::routing_utils::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::routing_utils::ErrorBody),
    )
)]
async fn update_task(
    State(app_state): AppState,
    jar: CookieJar,
    Json(update): Json<dto::UpdateTaskRequest>,
) -> Result<Json<dto::MessageResponse>, ErrorResponse> {
    let mut ext_cxn = app_state.ext_cxn.clone();
    let presented = presented_access_code(&jar);

    change_task_status(
        presented.as_deref(),
        update,
        &mut ext_cxn,
        &IdentityService {},
        &TaskService {},
        &DbUserStore,
        &DbTaskWriter,
    )
    .await
}

#[derive(Deserialize)]
struct DeleteTaskParams {
    id: Option<i64>,
}

/// Deletes one of the caller's tasks.
#[utoipa::path(
    delete,
    path = "/tasks",
    tag = TASK_API_GROUP,
    params(
        ("id" = i64, Query, description = "ID of the task to delete"),
    ),
    responses(
        (status = 200, description = "The task was deleted", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing or non-positive task id", body = crate::routing_utils::ErrorBody),
        (status = 401, description = "No recognized identity was presented", body = crate::routing_utils::ErrorBody),
        (status = 404, description = "The task does not exist for the caller", body = crate::routing_utils::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::routing_utils::ErrorBody),
    )
)]
async fn delete_task(
    State(app_state): AppState,
    jar: CookieJar,
    Query(params): Query<DeleteTaskParams>,
) -> Result<&'static str, ErrorResponse> {
    let mut ext_cxn = app_state.ext_cxn.clone();
    let presented = presented_access_code(&jar);

    remove_task(
        presented.as_deref(),
        params.id,
        &mut ext_cxn,
        &IdentityService {},
        &TaskService {},
        &DbUserStore,
        &DbTaskWriter,
    )
    .await
}

/// Resolves the caller's identity (minting one on a first visit), then fetches
/// their tasks. Returns the cookie directive to apply when an identity was minted.
async fn fetch_tasks(
    presented_token: Option<&str>,
    cookie_settings: &CookieSettings,
    ext_cxn: &mut impl ExternalConnectivity,
    identity_service: &impl IdentityPort,
    task_service: &impl crate::domain::task::driving_ports::TaskPort,
    user_store: &impl UserStore,
    task_read: &impl TaskReader,
) -> Result<(Option<Cookie<'static>>, Json<dto::TaskListResponse>), ErrorResponse> {
    info!("Requested task list");
    let identity = identity_service
        .resolve(presented_token, &mut *ext_cxn, user_store)
        .await
        .map_err(|err| {
            error!("identity resolution failure: {err:#}");
            GenericErrorResponse(err)
        })?;

    let tasks = task_service
        .tasks_for_user(identity.user_id(), &mut *ext_cxn, task_read)
        .await
        .map_err(|err| {
            error!("task list failure: {err:#}");
            GenericErrorResponse(err)
        })?;

    let (message, issued_cookie) = match identity {
        Identity::New { user_id, token } => {
            info!("Registered new user {user_id}");
            (
                "new user registered",
                Some(identity_cookie(token, cookie_settings)),
            )
        }
        Identity::Returning { .. } => ("tasks retrieved", None),
    };

    Ok((
        issued_cookie,
        Json(dto::TaskListResponse {
            message: message.to_owned(),
            status: "success".to_owned(),
            data: tasks.into_iter().map(dto::TaskData::from).collect(),
        }),
    ))
}

/// Validates and persists a new task for an authenticated caller. Write paths
/// fail closed: an unattributable request never mints an identity.
async fn add_task(
    presented_token: Option<&str>,
    new_task: dto::NewTaskRequest,
    ext_cxn: &mut impl ExternalConnectivity,
    identity_service: &impl IdentityPort,
    task_service: &impl crate::domain::task::driving_ports::TaskPort,
    user_store: &impl UserStore,
    task_write: &impl TaskWriter,
) -> Result<Json<dto::TaskCreatedResponse>, ErrorResponse> {
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let user_id = authenticated_user(presented_token, ext_cxn, identity_service, user_store).await?;

    info!("Creating task for user {user_id}: {new_task}");
    let created_task = task_service
        .create_task(
            user_id,
            &crate::domain::task::NewTask::from(new_task),
            &mut *ext_cxn,
            task_write,
        )
        .await
        .map_err(|err| {
            error!("task creation failure: {err:#}");
            GenericErrorResponse(err)
        })?;

    Ok(Json(dto::TaskCreatedResponse {
        message: "task created successfully".to_owned(),
        task: dto::TaskData::from(created_task),
    }))
}

/// Flips a task's status for an authenticated caller. A task that does not exist
/// under the caller's identity reports not-found rather than touching anything.
async fn change_task_status(
    presented_token: Option<&str>,
    update: dto::UpdateTaskRequest,
    ext_cxn: &mut impl ExternalConnectivity,
    identity_service: &impl IdentityPort,
    task_service: &impl crate::domain::task::driving_ports::TaskPort,
    user_store: &impl UserStore,
    task_write: &impl TaskWriter,
) -> Result<Json<dto::MessageResponse>, ErrorResponse> {
    update.validate().map_err(ValidationErrorResponse::from)?;

    let user_id = authenticated_user(presented_token, ext_cxn, identity_service, user_store).await?;

    info!("Updating task {} for user {user_id}", update.id);
    task_service
        .set_task_status(user_id, update.id, update.status, &mut *ext_cxn, task_write)
        .await
        .map_err(|err| {
            if let crate::domain::task::driving_ports::TaskError::PortError(ref port_err) = err {
                error!("task update failure: {port_err:#}");
            }
            TaskErrorResponse::from(err)
        })?;

    Ok(Json(dto::MessageResponse {
        message: "task updated successfully".to_owned(),
    }))
}

/// Deletes a task for an authenticated caller. Deleting an id that is gone or
/// foreign reports not-found on every attempt.
async fn remove_task(
    presented_token: Option<&str>,
    task_id: Option<i64>,
    ext_cxn: &mut impl ExternalConnectivity,
    identity_service: &impl IdentityPort,
    task_service: &impl crate::domain::task::driving_ports::TaskPort,
    user_store: &impl UserStore,
    task_write: &impl TaskWriter,
) -> Result<&'static str, ErrorResponse> {
    let task_id = match task_id {
        Some(id) if id > 0 => id,
        _ => return Err(InvalidInputResponse("a positive task id is required").into()),
    };

    let user_id = authenticated_user(presented_token, ext_cxn, identity_service, user_store).await?;

    info!("Deleting task {task_id} for user {user_id}");
    task_service
        .delete_task(user_id, task_id, &mut *ext_cxn, task_write)
        .await
        .map_err(|err| {
            if let crate::domain::task::driving_ports::TaskError::PortError(ref port_err) = err {
                error!("task delete failure: {port_err:#}");
            }
            TaskErrorResponse::from(err)
        })?;

    Ok("task deleted successfully")
}

/// Shared write-path identity check mapping authentication failures onto the
/// API error taxonomy.
async fn authenticated_user(
    presented_token: Option<&str>,
    ext_cxn: &mut impl ExternalConnectivity,
    identity_service: &impl IdentityPort,
    user_store: &impl UserStore,
) -> Result<i64, IdentityErrorResponse> {
    identity_service
        .authenticate(presented_token, &mut *ext_cxn, user_store)
        .await
        .map_err(|err| {
            if let AuthenticateError::PortError(ref port_err) = err {
                error!("identity check failure: {port_err:#}");
            }
            IdentityErrorResponse::from(err)
        })
}
