//! Store repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tastemap_core::ranking::{self, RankedStore, ReviewedStore, TagCount};
use tastemap_core::{Email, GeoPoint, Location, Rating, Slug, StoreId, StoreName, UserId};

use super::{RepositoryError, ReviewRepository, STORE_SLUG_CONSTRAINT};
use crate::models::{Author, MapStore, Store, StoreDetail, StoreDraft, StoreSummary, gravatar_url};

/// Maximum number of full-text search hits.
pub const SEARCH_LIMIT: i64 = 5;

/// Radius searched by [`StoreRepository::near`].
pub const NEAR_RADIUS_METRES: f64 = 10_000.0;

/// Maximum number of stores returned by [`StoreRepository::near`].
pub const NEAR_LIMIT: i64 = 10;

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
    author_id: i32,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let name = StoreName::parse(&row.name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid name for store {}: {e}", row.id))
        })?;
        let location = location(row.longitude, row.latitude, &row.address)
            .map_err(|e| RepositoryError::DataCorruption(format!("store {}: {e}", row.id)))?;

        Ok(Self {
            id: StoreId::new(row.id),
            name,
            slug: Slug::from_persisted(row.slug),
            description: row.description,
            tags: row.tags,
            created_at: row.created_at,
            location,
            photo: row.photo,
            author_id: UserId::new(row.author_id),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuthorRow {
    id: i32,
    name: String,
    email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct RatedStoreRow {
    id: i32,
    name: String,
    slug: String,
    photo: Option<String>,
    ratings: Vec<i16>,
}

#[derive(Debug, sqlx::FromRow)]
struct NearbyRow {
    slug: String,
    name: String,
    description: String,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
    distance_metres: f64,
}

fn location(
    longitude: f64,
    latitude: f64,
    address: &str,
) -> Result<Location, tastemap_core::LocationError> {
    Location::new(GeoPoint::new(longitude, latitude)?, address)
}

fn slug_conflict(slug: &Slug) -> impl FnOnce(sqlx::Error) -> RepositoryError + '_ {
    move |err| {
        RepositoryError::from_unique_violation(err, STORE_SLUG_CONSTRAINT, || {
            RepositoryError::SlugConflict(slug.to_string())
        })
    }
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count stores whose slug is `base` or a numbered variant of it,
    /// ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_slug_matches(&self, base: &Slug) -> Result<usize, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM tastemap.stores
            WHERE slug ~* $1
            ",
        )
        .bind(base.conflict_pattern())
        .fetch_one(self.pool)
        .await?;

        usize::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative slug count {count}")))
    }

    /// Insert a new store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::SlugConflict` if another store already holds `slug`.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        draft: &StoreDraft,
        slug: &Slug,
        photo: Option<&str>,
        author: UserId,
    ) -> Result<Store, RepositoryError> {
        let point = draft.location.point();
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            INSERT INTO tastemap.stores
                (name, slug, description, tags, longitude, latitude, address, photo, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, slug, description, tags, created_at,
                      longitude, latitude, address, photo, author_id
            ",
        )
        .bind(draft.name.as_str())
        .bind(slug)
        .bind(&draft.description)
        .bind(&draft.tags)
        .bind(point.longitude())
        .bind(point.latitude())
        .bind(&draft.location.address)
        .bind(photo)
        .bind(author)
        .fetch_one(self.pool)
        .await
        .map_err(slug_conflict(slug))?;

        let store = Store::try_from(row)?;
        tracing::info!(store_id = %store.id, slug = %store.slug, "Store created");
        Ok(store)
    }

    /// Update a store's fields.
    ///
    /// `slug` and `photo` are only written when `Some`; otherwise the stored
    /// values are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    /// Returns `RepositoryError::SlugConflict` if another store already holds `slug`.
    pub async fn update(
        &self,
        id: StoreId,
        draft: &StoreDraft,
        slug: Option<&Slug>,
        photo: Option<&str>,
    ) -> Result<Store, RepositoryError> {
        let point = draft.location.point();
        let query = sqlx::query_as::<_, StoreRow>(
            r"
            UPDATE tastemap.stores
            SET name = $2,
                slug = COALESCE($3, slug),
                description = $4,
                tags = $5,
                longitude = $6,
                latitude = $7,
                address = $8,
                photo = COALESCE($9, photo),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, slug, description, tags, created_at,
                      longitude, latitude, address, photo, author_id
            ",
        )
        .bind(id)
        .bind(draft.name.as_str())
        .bind(slug)
        .bind(&draft.description)
        .bind(&draft.tags)
        .bind(point.longitude())
        .bind(point.latitude())
        .bind(&draft.location.address)
        .bind(photo)
        .fetch_optional(self.pool)
        .await;

        let row = match (query, slug) {
            (Ok(row), _) => row,
            (Err(e), Some(slug)) => return Err(slug_conflict(slug)(e)),
            (Err(e), None) => return Err(RepositoryError::Database(e)),
        };

        let store = Store::try_from(row.ok_or(RepositoryError::NotFound)?)?;
        tracing::info!(store_id = %store.id, slug = %store.slug, "Store updated");
        Ok(store)
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, slug, description, tags, created_at,
                   longitude, latitude, address, photo, author_id
            FROM tastemap.stores
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    /// Get a store by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, slug, description, tags, created_at,
                   longitude, latitude, address, photo, author_id
            FROM tastemap.stores
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    /// Load a store with its author and reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the author row is missing.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail(&self, slug: &str) -> Result<Option<StoreDetail>, RepositoryError> {
        let Some(store) = self.get_by_slug(slug).await? else {
            return Ok(None);
        };

        let author = sqlx::query_as::<_, AuthorRow>(
            r"
            SELECT id, name, email
            FROM tastemap.users
            WHERE id = $1
            ",
        )
        .bind(store.author_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("store {} has no author", store.id))
        })?;

        let email = Email::parse(&author.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let reviews = ReviewRepository::new(self.pool)
            .list_for_store(store.id)
            .await?;

        Ok(Some(StoreDetail {
            store,
            author: Author {
                id: UserId::new(author.id),
                name: author.name,
                gravatar: gravatar_url(&email),
            },
            reviews,
        }))
    }

    /// Total number of stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM tastemap.stores")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// One page of stores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_page(&self, offset: i64, limit: i64) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, slug, description, tags, created_at,
                   longitude, latitude, address, photo, author_id
            FROM tastemap.stores
            ORDER BY created_at DESC, id DESC
            OFFSET $1
            LIMIT $2
            ",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Store::try_from).collect()
    }

    /// Stores carrying `tag`, or every store when `tag` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, slug, description, tags, created_at,
                   longitude, latitude, address, photo, author_id
            FROM tastemap.stores
            WHERE $1::text IS NULL OR $1 = ANY(tags)
            ORDER BY created_at, id
            ",
        )
        .bind(tag)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Store::try_from).collect()
    }

    /// Stores a user has hearted, in the order they were hearted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearted_by(&self, user: UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT s.id, s.name, s.slug, s.description, s.tags, s.created_at,
                   s.longitude, s.latitude, s.address, s.photo, s.author_id
            FROM tastemap.user_hearts h
            JOIN tastemap.stores s ON s.id = h.store_id
            WHERE h.user_id = $1
            ORDER BY h.created_at, s.id
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Store::try_from).collect()
    }

    /// Tag frequency table over every store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let tag_lists: Vec<Vec<String>> = sqlx::query_scalar(
            r"
            SELECT tags
            FROM tastemap.stores
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ranking::tally_tags(tag_lists))
    }

    /// Highest rated stores with enough reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored rating is out of range.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_stores(&self) -> Result<Vec<RankedStore<StoreSummary>>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatedStoreRow>(
            r"
            SELECT s.id, s.name, s.slug, s.photo,
                   COALESCE(
                       array_agg(r.rating ORDER BY r.id) FILTER (WHERE r.id IS NOT NULL),
                       '{}'
                   ) AS ratings
            FROM tastemap.stores s
            LEFT JOIN tastemap.reviews r ON r.store_id = s.id
            GROUP BY s.id
            ORDER BY s.created_at, s.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let reviewed = rows
            .into_iter()
            .map(|row| {
                let ratings = row
                    .ratings
                    .iter()
                    .map(|&r| Rating::new(i64::from(r)))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| {
                        RepositoryError::DataCorruption(format!("store {}: {e}", row.id))
                    })?;
                Ok(ReviewedStore {
                    store: StoreSummary {
                        id: StoreId::new(row.id),
                        name: row.name,
                        slug: Slug::from_persisted(row.slug),
                        photo: row.photo,
                    },
                    ratings,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(ranking::top_stores(reviewed))
    }

    /// Full-text search over name and description, best match first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, slug, description, tags, created_at,
                   longitude, latitude, address, photo, author_id
            FROM tastemap.stores, websearch_to_tsquery('english', $1) AS q
            WHERE search @@ q
            ORDER BY ts_rank(search, q) DESC, created_at, id
            LIMIT $2
            ",
        )
        .bind(query)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Store::try_from).collect()
    }

    /// Stores within [`NEAR_RADIUS_METRES`] of `point`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn near(&self, point: GeoPoint) -> Result<Vec<MapStore>, RepositoryError> {
        let rows = sqlx::query_as::<_, NearbyRow>(
            r"
            SELECT slug, name, description, longitude, latitude, address, photo, distance_metres
            FROM (
                SELECT *,
                       2 * $3::float8 * asin(LEAST(1.0, sqrt(
                           power(sin(radians(latitude - $2::float8) / 2), 2)
                           + cos(radians($2::float8)) * cos(radians(latitude))
                             * power(sin(radians(longitude - $1::float8) / 2), 2)
                       ))) AS distance_metres
                FROM tastemap.stores
            ) AS d
            WHERE distance_metres <= $4
            ORDER BY distance_metres, id
            LIMIT $5
            ",
        )
        .bind(point.longitude())
        .bind(point.latitude())
        .bind(GeoPoint::EARTH_RADIUS_METRES)
        .bind(NEAR_RADIUS_METRES)
        .bind(NEAR_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let location = location(row.longitude, row.latitude, &row.address)
                    .map_err(|e| RepositoryError::DataCorruption(format!("{}: {e}", row.slug)))?;
                Ok(MapStore {
                    slug: Slug::from_persisted(row.slug),
                    name: row.name,
                    description: row.description,
                    location,
                    photo: row.photo,
                    distance_metres: row.distance_metres,
                })
            })
            .collect()
    }
}
