//! Review repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tastemap_core::{Email, Rating, ReviewId, StoreId, UserId};

use super::RepositoryError;
use crate::models::{Review, ReviewWithAuthor, gravatar_url};

const REVIEWS_STORE_FK: &str = "reviews_store_id_fkey";

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    store_id: i32,
    author_id: i32,
    text: String,
    rating: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(row.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("review {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ReviewId::new(row.id),
            store_id: StoreId::new(row.store_id),
            author_id: UserId::new(row.author_id),
            text: row.text,
            rating,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewWithAuthorRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    author_name: String,
    author_email: String,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        store: StoreId,
        author: UserId,
        text: &str,
        rating: Rating,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO tastemap.reviews (store_id, author_id, text, rating)
            VALUES ($1, $2, $3, $4)
            RETURNING id, store_id, author_id, text, rating, created_at
            ",
        )
        .bind(store)
        .bind(author)
        .bind(text)
        .bind(rating.get())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
                && db_err.constraint() == Some(REVIEWS_STORE_FK)
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        let review = Review::try_from(row)?;
        tracing::info!(review_id = %review.id, store_id = %store, "Review created");
        Ok(review)
    }

    /// Reviews of a store with their authors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a row holds invalid data.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewWithAuthorRow>(
            r"
            SELECT r.id, r.store_id, r.author_id, r.text, r.rating, r.created_at,
                   u.name AS author_name, u.email AS author_email
            FROM tastemap.reviews r
            JOIN tastemap.users u ON u.id = r.author_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(store)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let email = Email::parse(&row.author_email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?;
                Ok(ReviewWithAuthor {
                    review: Review::try_from(row.review)?,
                    author_name: row.author_name,
                    author_gravatar: gravatar_url(&email),
                })
            })
            .collect()
    }
}
