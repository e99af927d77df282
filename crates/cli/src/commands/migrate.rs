//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tm-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `TASTEMAP_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! App tables: `crates/web/migrations/`. The session table is created by
//! `tower-sessions-sqlx-store` in its own `tower_sessions` schema.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use tastemap_web::config::{ConfigError, database_url_from_env};
use tastemap_web::db;

/// Errors from the migrate command.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run app and session-store migrations.
///
/// # Errors
///
/// Returns error if the database URL is missing or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Creating session store tables...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
