//! Integration tests for Tastemap.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tastemap-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `slug_assignment` - slug numbering, renames and the conflict retry
//! - `ranking` - tag tallies and top-store ranking
//!
//! Everything here runs without a database: [`MemoryStores`] stands in for
//! the store table wherever the code under test only needs slug lookups.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::future::Future;
use std::sync::Mutex;

use regex::Regex;

use tastemap_core::Slug;
use tastemap_web::db::RepositoryError;
use tastemap_web::services::SlugLookup;

/// In-memory slug column with a unique constraint.
#[derive(Debug, Default)]
pub struct MemoryStores {
    slugs: Mutex<Vec<String>>,
}

impl MemoryStores {
    /// Start with `slugs` already taken.
    #[must_use]
    pub fn with(slugs: &[&str]) -> Self {
        Self {
            slugs: Mutex::new(slugs.iter().map(ToString::to_string).collect()),
        }
    }

    /// Insert `slug`, failing like the unique index would.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::SlugConflict` if the slug is taken.
    pub fn insert(&self, slug: &Slug) -> Result<Slug, RepositoryError> {
        let mut slugs = self.slugs.lock().map_err(|_| poisoned())?;
        if slugs.iter().any(|s| s == slug.as_str()) {
            return Err(RepositoryError::SlugConflict(slug.to_string()));
        }
        slugs.push(slug.to_string());
        Ok(slug.clone())
    }

    /// Swap `old` for `new`, as a rename would.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::SlugConflict` if `new` is taken by another row.
    pub fn rename(&self, old: &Slug, new: &Slug) -> Result<Slug, RepositoryError> {
        let mut slugs = self.slugs.lock().map_err(|_| poisoned())?;
        if slugs.iter().any(|s| s == new.as_str() && s != old.as_str()) {
            return Err(RepositoryError::SlugConflict(new.to_string()));
        }
        slugs.retain(|s| s != old.as_str());
        slugs.push(new.to_string());
        Ok(new.clone())
    }

    /// Every slug currently stored, in insertion order.
    #[must_use]
    pub fn slugs(&self) -> Vec<String> {
        self.slugs.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SlugLookup for MemoryStores {
    fn count_slug_matches(
        &self,
        base: &Slug,
    ) -> impl Future<Output = Result<usize, RepositoryError>> + Send {
        let count = Regex::new(&format!("(?i){}", base.conflict_pattern())).map(|re| {
            self.slugs()
                .iter()
                .filter(|s| re.is_match(s))
                .count()
        });
        async move { count.map_err(|e| RepositoryError::DataCorruption(e.to_string())) }
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::DataCorruption("slug table lock poisoned".to_owned())
}
