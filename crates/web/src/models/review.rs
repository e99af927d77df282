//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tastemap_core::{Rating, ReviewId, StoreId, UserId};

/// A single review of a store.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub store_id: StoreId,
    pub author_id: UserId,
    pub text: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
}

/// A review joined with the bits of its author shown on the store page.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    pub review: Review,
    pub author_name: String,
    pub author_gravatar: String,
}

impl ReviewWithAuthor {
    /// Filled and empty stars, e.g. `★★★☆☆`.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::try_from(self.review.rating.get()).unwrap_or(0);
        let empty = usize::try_from(Rating::MAX).unwrap_or(5) - filled;
        format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
    }
}
