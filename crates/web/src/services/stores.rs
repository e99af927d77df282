//! Store writes with slug assignment.

use sqlx::PgPool;

use tastemap_core::UserId;

use super::slug::{assign_slug, fresh_slug, with_slug_retry};
use crate::db::{RepositoryError, StoreRepository};
use crate::models::{Store, StoreDraft};

/// Creates and updates stores, keeping their slugs unique.
pub struct StoreService<'a> {
    stores: StoreRepository<'a>,
}

impl<'a> StoreService<'a> {
    /// Create a new store service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stores: StoreRepository::new(pool),
        }
    }

    /// Insert a store owned by `author`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::SlugConflict` if the slug was taken twice in a row.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        draft: &StoreDraft,
        photo: Option<&str>,
        author: UserId,
    ) -> Result<Store, RepositoryError> {
        let slug = fresh_slug(&self.stores, &draft.name).await?;
        let stores = &self.stores;
        with_slug_retry(stores, &draft.name, slug, |slug| async move {
            stores.create(draft, &slug, photo, author).await
        })
        .await
    }

    /// Save new field values for `existing`.
    ///
    /// The slug is only recomputed when the name changed; the photo is only
    /// replaced when `photo` is `Some`. The recount includes the store's own
    /// current slug, so renaming "Cafe" to "Cafe!" moves it to `cafe-2`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store disappeared.
    /// Returns `RepositoryError::SlugConflict` if the slug was taken twice in a row.
    pub async fn update(
        &self,
        existing: &Store,
        draft: &StoreDraft,
        photo: Option<&str>,
    ) -> Result<Store, RepositoryError> {
        let stores = &self.stores;
        let id = existing.id;

        match assign_slug(stores, &draft.name, Some(&existing.name)).await? {
            None => stores.update(id, draft, None, photo).await,
            Some(slug) => {
                with_slug_retry(stores, &draft.name, slug, |slug| async move {
                    stores.update(id, draft, Some(&slug), photo).await
                })
                .await
            }
        }
    }
}
