// app/src/db/mod.rs

pub mod pg_store;
pub mod rows;

pub use pg_store::PgOrderStore;

use crate::errors::Result;
use sqlx::PgPool;

const SCHEMA: &str = include_str!("../../schema.sql");

/// Creates the tables if they do not exist yet.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
  sqlx::raw_sql(SCHEMA).execute(pool).await?;
  Ok(())
}
