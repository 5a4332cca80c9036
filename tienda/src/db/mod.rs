//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL,
//! following the repository pattern: one repository per table, constructed over
//! a `&mut PgConnection` so callers decide transaction boundaries.
//!
//! - [`handlers`]: repositories (queries and constraint handling)
//! - [`models`]: database-side request/response structs
//! - [`errors`]: the [`DbError`](errors::DbError) taxonomy handlers recover from

pub mod errors;
pub mod handlers;
pub mod models;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a PostgreSQL connection pool with sensible defaults.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}
