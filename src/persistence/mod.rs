use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

pub mod db_task_store;
pub mod db_user_store;

const SCHEMA_DDL: &str = include_str!("../../schema.sql");

/// Builds the connection pool every request handler shares. Built once at startup,
/// the pool itself handles concurrent checkout.
pub async fn connect_pool(db_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(2))
        .connect(db_url)
        .await
}

/// Applies the embedded schema. Every statement is create-if-not-exists, so this
/// runs on every startup without touching existing data.
pub async fn bootstrap_schema(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::raw_sql(SCHEMA_DDL)
        .execute(pool)
        .await
        .context("applying the database schema")?;

    Ok(())
}
