use crate::domain;
use crate::routing_utils::ErrorBody;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use validator::{Validate, ValidationError};

/// DTO for a task returned on the API. This shape is stable, clients depend on
/// the field names staying exactly as they are.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct TaskData {
    #[schema(example = 10)]
    pub id: i64,
    #[schema(example = "Water the plants")]
    pub description: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
}

impl From<domain::task::Task> for TaskData {
    fn from(value: domain::task::Task) -> Self {
        TaskData {
            id: value.id,
            description: value.description,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

/// DTO for creating a new task via the API
#[derive(Debug, Deserialize, Validate, ToSchema, Display)]
#[display("{description}")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTaskRequest {
    #[validate(custom = "not_blank")]
    #[schema(example = "Water the plants")]
    pub description: String,
}

impl From<NewTaskRequest> for domain::task::NewTask {
    fn from(value: NewTaskRequest) -> Self {
        domain::task::NewTask {
            description: value.description,
        }
    }
}

/// DTO for flipping a task's done/not-done status via the API
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTaskRequest {
    #[validate(range(min = 1))]
    #[schema(example = 10)]
    pub id: i64,
    pub status: bool,
}

/// Envelope for the task list returned by GET /tasks
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct TaskListResponse {
    #[schema(example = "tasks retrieved")]
    pub message: String,
    #[schema(example = "success")]
    pub status: String,
    pub data: Vec<TaskData>,
}

/// Envelope for a task created via POST /tasks
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct TaskCreatedResponse {
    #[schema(example = "task created successfully")]
    pub message: String,
    pub task: TaskData,
}

/// Envelope for responses that only carry a confirmation message
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize))]
pub struct MessageResponse {
    #[schema(example = "task updated successfully")]
    pub message: String,
}

/// Rejects descriptions that are empty or whitespace-only.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }

    Ok(())
}

/// Registers schemas shared across the API for OpenAPI documentation
#[derive(OpenApi)]
#[openapi(components(schemas(
    TaskData,
    NewTaskRequest,
    UpdateTaskRequest,
    TaskListResponse,
    TaskCreatedResponse,
    MessageResponse,
    ErrorBody,
)))]
pub struct OpenApiSchemas;

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn empty_description_gets_rejected() {
        let bad_task = NewTaskRequest {
            description: String::new(),
        };

        let validation_result = bad_task.validate();
        assert!(validation_result.is_err());
        let field_validations = validation_result.unwrap_err();
        assert!(field_validations.field_errors().contains_key("description"));
    }

    #[test]
    fn whitespace_only_description_gets_rejected() {
        let bad_task = NewTaskRequest {
            description: "  \t \n ".to_owned(),
        };

        assert!(bad_task.validate().is_err());
    }

    #[test]
    fn real_description_is_accepted() {
        let task = NewTaskRequest {
            description: "Water the plants".to_owned(),
        };

        assert!(task.validate().is_ok());
    }

    #[test]
    fn nonpositive_task_id_gets_rejected() {
        let bad_update = UpdateTaskRequest {
            id: 0,
            status: true,
        };

        let validation_result = bad_update.validate();
        assert!(validation_result.is_err());
        let field_validations = validation_result.unwrap_err();
        assert!(field_validations.field_errors().contains_key("id"));
    }

    #[test]
    fn positive_task_id_is_accepted() {
        let update = UpdateTaskRequest {
            id: 3,
            status: false,
        };

        assert!(update.validate().is_ok());
    }
}
