use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::domain::identity::driving_ports::AuthenticateError;
use crate::domain::task::driving_ports::TaskError;

/// Generic message returned whenever the persistence layer fails. Raw driver
/// errors stay in the server log and never reach the client.
pub const GENERIC_STORAGE_ERROR: &str = "could not access data to complete your request";

/// Body returned for every failed request
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorBody {
    #[schema(example = "description is required")]
    pub error: String,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Response type that wraps validation failures and reports them as a 400
pub struct ValidationErrorResponse(ValidationErrors);

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        error_json(StatusCode::BAD_REQUEST, self.0.to_string())
    }
}

/// Response type for requests rejected before a validator struct is in play,
/// such as a missing query parameter
pub struct InvalidInputResponse(pub &'static str);

impl IntoResponse for InvalidInputResponse {
    fn into_response(self) -> Response {
        error_json(StatusCode::BAD_REQUEST, self.0)
    }
}

/// Response type for write requests that could not be attributed to a user
pub enum IdentityErrorResponse {
    Unauthenticated,
    Internal,
}

impl From<AuthenticateError> for IdentityErrorResponse {
    fn from(value: AuthenticateError) -> Self {
        match value {
            AuthenticateError::Unauthenticated => Self::Unauthenticated,
            AuthenticateError::PortError(_) => Self::Internal,
        }
    }
}

impl IntoResponse for IdentityErrorResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => error_json(
                StatusCode::UNAUTHORIZED,
                "a recognized access code is required for this operation",
            ),
            Self::Internal => error_json(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_STORAGE_ERROR),
        }
    }
}

/// Response type for task operations that reference a specific task
pub enum TaskErrorResponse {
    NotFound,
    Internal,
}

impl From<TaskError> for TaskErrorResponse {
    fn from(value: TaskError) -> Self {
        match value {
            TaskError::NotFound => Self::NotFound,
            TaskError::PortError(_) => Self::Internal,
        }
    }
}

impl IntoResponse for TaskErrorResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => error_json(
                StatusCode::NOT_FOUND,
                "the requested task could not be found",
            ),
            Self::Internal => error_json(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_STORAGE_ERROR),
        }
    }
}

/// Response type that swallows infrastructure failure detail and reports a
/// generic 500. The cause should be logged at the call site before wrapping.
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        error_json(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_STORAGE_ERROR)
    }
}

/// Wrapper for [axum::Json] which customizes the rejection so malformed request
/// bodies produce our error shape
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        error_json(StatusCode::BAD_REQUEST, self.parse_problem)
    }
}
