//! Slug assignment for stores.
//!
//! A slug is derived from the store name and numbered by how many existing
//! slugs already share its base: `bobs-burgers`, `bobs-burgers-2`, ... The
//! count and the write are separate statements, so two concurrent writers
//! can pick the same slug. The unique index on `stores.slug` turns the loser
//! into a [`RepositoryError::SlugConflict`], which [`with_slug_retry`]
//! answers with exactly one recount.

use std::future::Future;

use tastemap_core::{Slug, StoreName};

use crate::db::{RepositoryError, StoreRepository};

/// Anything that can count slugs sharing a base.
pub trait SlugLookup {
    /// Number of slugs equal to `base` or `base-<digits>`, ignoring case.
    fn count_slug_matches(
        &self,
        base: &Slug,
    ) -> impl Future<Output = Result<usize, RepositoryError>> + Send;
}

impl SlugLookup for StoreRepository<'_> {
    fn count_slug_matches(
        &self,
        base: &Slug,
    ) -> impl Future<Output = Result<usize, RepositoryError>> + Send {
        StoreRepository::count_slug_matches(self, base)
    }
}

/// Slug for `name` given the slugs currently stored.
///
/// # Errors
///
/// Propagates lookup failures.
pub async fn fresh_slug<L: SlugLookup>(
    lookup: &L,
    name: &StoreName,
) -> Result<Slug, RepositoryError> {
    let base = Slug::from_name(name.as_str());
    let conflicts = lookup.count_slug_matches(&base).await?;
    Ok(base.numbered(conflicts))
}

/// Slug to persist for a store named `name` that was previously saved as
/// `previous` (`None` for a new store).
///
/// Returns `Ok(None)` when the name is unchanged and the stored slug must be
/// kept; no lookup is made in that case.
///
/// # Errors
///
/// Propagates lookup failures.
pub async fn assign_slug<L: SlugLookup>(
    lookup: &L,
    name: &StoreName,
    previous: Option<&StoreName>,
) -> Result<Option<Slug>, RepositoryError> {
    if previous == Some(name) {
        return Ok(None);
    }
    fresh_slug(lookup, name).await.map(Some)
}

/// Recount after `conflicted` lost a race and pick the next free suffix.
async fn retry_slug<L: SlugLookup>(
    lookup: &L,
    name: &StoreName,
    conflicted: &Slug,
) -> Result<Slug, RepositoryError> {
    let base = Slug::from_name(name.as_str());
    let conflicts = lookup.count_slug_matches(&base).await?;
    let candidate = base.numbered(conflicts);
    if &candidate == conflicted {
        Ok(base.numbered(conflicts + 1))
    } else {
        Ok(candidate)
    }
}

/// Run `write` with `slug`; on a slug conflict recompute once and write again.
///
/// A second conflict is returned to the caller.
///
/// # Errors
///
/// Returns whatever `write` or the lookup returns.
pub async fn with_slug_retry<L, F, Fut, T>(
    lookup: &L,
    name: &StoreName,
    slug: Slug,
    mut write: F,
) -> Result<T, RepositoryError>
where
    L: SlugLookup,
    F: FnMut(Slug) -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    match write(slug.clone()).await {
        Err(RepositoryError::SlugConflict(_)) => {
            let retry = retry_slug(lookup, name, &slug).await?;
            tracing::warn!(conflicted = %slug, retry = %retry, "Slug taken concurrently, retrying");
            write(retry).await
        }
        other => other,
    }
}
