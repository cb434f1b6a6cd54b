//! Database connection management and migrations for the huddle backend.
//!
//! Domain repositories live with their services in `huddle-teams`; this
//! crate only owns pool construction and schema migrations.

use anyhow::Result;
use huddle_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod migrations;

pub use connection::prepare_database;
pub use migrations::run_migrations;

/// Connect to the configured database and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = prepare_database(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// In-memory database for tests.
pub async fn initialize_test_database() -> Result<SqlitePool> {
    let config = DatabaseConfig {
        url: "sqlite://:memory:".to_string(),
        max_connections: 1,
    };
    initialize_database(&config).await
}
