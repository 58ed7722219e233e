use crate::domain;
use crate::domain::identity::driven_ports::SaveUserError;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::Context;
use sqlx::FromRow;

pub struct DbUserStore;

#[derive(FromRow)]
struct UserIdRow {
    id: i64,
}

impl domain::identity::driven_ports::UserStore for DbUserStore {
    async fn create_user(
        &self,
        access_code: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, SaveUserError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let insert_result = sqlx::query_as::<_, UserIdRow>(
            "INSERT INTO app_user(access_code) VALUES ($1) RETURNING app_user.id",
        )
        .bind(access_code)
        .fetch_one(cxn.borrow_connection())
        .await;

        match insert_result {
            Ok(new_user) => Ok(new_user.id),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(SaveUserError::CodeTaken)
            }
            Err(other) => Err(SaveUserError::PortError(
                anyhow::Error::new(other).context("inserting a new user"),
            )),
        }
    }

    async fn user_id_by_access_code(
        &self,
        access_code: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<i64>, anyhow::Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let user = sqlx::query_as::<_, UserIdRow>(
            "SELECT au.id FROM app_user au WHERE au.access_code = $1",
        )
        .bind(access_code)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("fetching a user by access code")?;

        Ok(user.map(|row| row.id))
    }
}
