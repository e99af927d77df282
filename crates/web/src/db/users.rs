//! User repository for database operations.
//!
//! Users are read through the `tastemap.user_profiles` view, which folds the
//! user's hearted store ids into an array column.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tastemap_core::{Email, StoreId, UserId};

use super::RepositoryError;
use crate::models::User;

const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";
const HEARTS_STORE_FK: &str = "user_hearts_store_id_fkey";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    hearts: Vec<i32>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            hearts: row.hearts.into_iter().map(StoreId::new).collect(),
            created_at: row.created_at,
        })
    }
}

fn email_conflict(err: sqlx::Error) -> RepositoryError {
    RepositoryError::from_unique_violation(err, USERS_EMAIL_CONSTRAINT, || {
        RepositoryError::Conflict("email already exists".to_owned())
    })
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, hearts, created_at
            FROM tastemap.user_profiles
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, hearts, created_at
            FROM tastemap.user_profiles
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO tastemap.users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, '{}'::int4[] AS hearts, created_at
            ",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(email_conflict)?;

        let user = User::try_from(row)?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT p.id, p.email, p.name, p.hearts, p.created_at, u.password_hash
            FROM tastemap.user_profiles p
            JOIN tastemap.users u ON u.id = p.id
            WHERE p.email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Update a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another account uses the email.
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE tastemap.users
            SET name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(self.pool)
        .await
        .map_err(email_conflict)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Store a password reset token and its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_reset_token(
        &self,
        id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE tastemap.users
            SET reset_token = $2, reset_token_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Find the user holding `token`, if it has not expired by `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT p.id, p.email, p.name, p.hearts, p.created_at
            FROM tastemap.user_profiles p
            JOIN tastemap.users u ON u.id = p.id
            WHERE u.reset_token = $1 AND u.reset_token_expires_at > $2
            ",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Replace the password hash and clear any reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn reset_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE tastemap.users
            SET password_hash = $2,
                reset_token = NULL,
                reset_token_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Heart `store` if the user hasn't yet, otherwise un-heart it.
    ///
    /// Returns the user with the updated heart list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or user doesn't exist.
    pub async fn toggle_heart(
        &self,
        user_id: UserId,
        store: StoreId,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            r"
            DELETE FROM tastemap.user_hearts
            WHERE user_id = $1 AND store_id = $2
            ",
        )
        .bind(user_id)
        .bind(store)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            sqlx::query(
                r"
                INSERT INTO tastemap.user_hearts (user_id, store_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(user_id)
            .bind(store)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                    && db_err.constraint() == Some(HEARTS_STORE_FK)
                {
                    return RepositoryError::NotFound;
                }
                RepositoryError::Database(e)
            })?;
        }

        tx.commit().await?;

        tracing::debug!(%user_id, store_id = %store, hearted = removed == 0, "Heart toggled");

        self.get_by_id(user_id).await?.ok_or(RepositoryError::NotFound)
    }
}
