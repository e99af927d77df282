//! Database operations for the Tastemap `PostgreSQL` database.
//!
//! ## Tables (schema `tastemap`)
//!
//! - `users` - Accounts, password hashes and reset tokens
//! - `stores` - Stores with location, tags and a generated full-text column
//! - `reviews` - Star ratings and text per store
//! - `user_hearts` - Stores a user has hearted
//!
//! Sessions live in the `tower_sessions` schema managed by the session store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p tastemap-cli -- migrate
//! ```

pub mod reviews;
pub mod stores;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use reviews::ReviewRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;

/// Name of the unique index guarding store slugs.
pub(crate) const STORE_SLUG_CONSTRAINT: &str = "stores_slug_key";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Another store already holds this slug.
    #[error("slug already taken: {0}")]
    SlugConflict(String),
}

impl RepositoryError {
    /// Map a unique-violation on `constraint` to a conflict built by `conflict`.
    ///
    /// Anything else becomes [`RepositoryError::Database`].
    pub(crate) fn from_unique_violation(
        err: sqlx::Error,
        constraint: &str,
        conflict: impl FnOnce() -> Self,
    ) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
            && db_err.constraint() == Some(constraint)
        {
            return conflict();
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
