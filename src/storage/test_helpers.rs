//! Shared test helpers for storage module tests.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
///
/// Uses a single-connection in-memory database: every SQLite `:memory:`
/// connection is its own database, so the pool must not open a second one.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}
