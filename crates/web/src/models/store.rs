//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tastemap_core::{Location, Slug, StoreId, StoreName, UserId};

use super::ReviewWithAuthor;

/// Photo shown for stores that never had one uploaded.
pub const PLACEHOLDER_PHOTO: &str = "/static/store.svg";

/// A store as persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub name: StoreName,
    pub slug: Slug,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub location: Location,
    /// Stored photo filename under the upload directory.
    pub photo: Option<String>,
    pub author_id: UserId,
}

impl Store {
    /// Public URL of the store photo, or the placeholder.
    #[must_use]
    pub fn photo_url(&self) -> String {
        photo_url(self.photo.as_deref())
    }

    /// First `words` words of the description.
    #[must_use]
    pub fn excerpt(&self, words: usize) -> String {
        self.description
            .split_whitespace()
            .take(words)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether `user` may edit this store.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.author_id == user
    }
}

/// Validated store fields coming from the add/edit form.
#[derive(Debug, Clone)]
pub struct StoreDraft {
    pub name: StoreName,
    pub description: String,
    pub tags: Vec<String>,
    pub location: Location,
}

/// Author block on the store page.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub gravatar: String,
}

/// A store with its author and reviews joined at read time.
#[derive(Debug, Clone, Serialize)]
pub struct StoreDetail {
    pub store: Store,
    pub author: Author,
    pub reviews: Vec<ReviewWithAuthor>,
}

/// The columns the top-stores page needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub photo: Option<String>,
}

impl StoreSummary {
    /// Public URL of the store photo, or the placeholder.
    #[must_use]
    pub fn photo_url(&self) -> String {
        photo_url(self.photo.as_deref())
    }
}

/// Projection returned by the map endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MapStore {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub photo: Option<String>,
    /// Great-circle distance from the query point.
    pub distance_metres: f64,
}

fn photo_url(photo: Option<&str>) -> String {
    photo.map_or_else(|| PLACEHOLDER_PHOTO.to_owned(), |p| format!("/uploads/{p}"))
}
