use crate::domain;
use crate::domain::task::{NewTask, Task};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub struct DbTaskReader;

#[derive(FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    description: String,
    status: bool,
    created_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: value.id,
            user_id: value.user_id,
            description: value.description,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_user(
        &self,
        user_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let tasks: Vec<Task> = sqlx::query_as::<_, TaskRow>(
            "SELECT t.* FROM task t WHERE t.user_id = $1 ORDER BY t.id ASC",
        )
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("fetching a user's tasks")?
        .into_iter()
        .map(Task::from)
        .collect();

        Ok(tasks)
    }
}

pub struct DbTaskWriter;

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i64,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let created = sqlx::query_as::<_, TaskRow>(
            "INSERT INTO task(user_id, description) VALUES ($1, $2) \
             RETURNING task.id, task.user_id, task.description, task.status, task.created_at",
        )
        .bind(user_id)
        .bind(&new_task.description)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("inserting a new task")?;

        Ok(Task::from(created))
    }

    async fn set_task_status(
        &self,
        user_id: i64,
        task_id: i64,
        status: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<u64, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let update_result =
            sqlx::query("UPDATE task SET status = $1 WHERE id = $2 AND user_id = $3")
                .bind(status)
                .bind(task_id)
                .bind(user_id)
                .execute(cxn.borrow_connection())
                .await
                .context("updating a task's status")?;

        Ok(update_result.rows_affected())
    }

    async fn delete_task(
        &self,
        user_id: i64,
        task_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<u64, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let delete_result = sqlx::query("DELETE FROM task WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("removing a task")?;

        Ok(delete_result.rows_affected())
    }
}
