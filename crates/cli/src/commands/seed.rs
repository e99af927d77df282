//! Seed the database with users, stores and reviews from YAML.
//!
//! Rows go through the same services the site uses, so passwords are hashed
//! and slugs are assigned exactly as they would be for a real submission.
//!
//! # File Format
//!
//! ```yaml
//! users:
//!   - name: Wes
//!     email: wes@example.com
//!     password: wes
//! stores:
//!   - name: Bob's Burgers
//!     description: Burger of the day.
//!     tags: [Family Friendly]
//!     address: 1 Ocean Ave
//!     lng: -79.38
//!     lat: 43.65
//!     author: wes@example.com
//! reviews:
//!   - store: Bob's Burgers
//!     author: wes@example.com
//!     rating: 5
//!     text: Great fries.
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use tastemap_core::{
    Email, GeoPoint, Location, Rating, StoreName, UserId, normalize_tags,
};
use tastemap_web::config::database_url_from_env;
use tastemap_web::db::{self, ReviewRepository};
use tastemap_web::models::{Store, StoreDraft};
use tastemap_web::services::{AuthService, StoreService};

/// Whole seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub stores: Vec<SeedStore>,
    #[serde(default)]
    pub reviews: Vec<SeedReview>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedStore {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
    /// Email of a user in the same file.
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedReview {
    /// Name of a store in the same file.
    pub store: String,
    /// Email of a user in the same file.
    pub author: String,
    pub rating: i64,
    #[serde(default)]
    pub text: String,
}

impl SeedStore {
    fn draft(&self) -> Result<StoreDraft, String> {
        let name = StoreName::parse(&self.name).map_err(|e| e.to_string())?;
        let point = GeoPoint::new(self.lng, self.lat).map_err(|e| e.to_string())?;
        let location = Location::new(point, &self.address).map_err(|e| e.to_string())?;
        Ok(StoreDraft {
            name,
            description: self.description.trim().to_owned(),
            tags: normalize_tags(&self.tags),
            location,
        })
    }
}

/// Check a seed file before touching the database.
///
/// Returns one message per problem; empty means the file is usable.
#[must_use]
pub fn validate_seed(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut emails = HashSet::new();

    for (i, user) in seed.users.iter().enumerate() {
        match Email::parse(&user.email) {
            Ok(email) => {
                if !emails.insert(email.into_inner()) {
                    errors.push(format!("users[{i}]: duplicate email {}", user.email));
                }
            }
            Err(e) => errors.push(format!("users[{i}]: {e}")),
        }
        if user.name.trim().is_empty() {
            errors.push(format!("users[{i}]: name is blank"));
        }
        if user.password.trim().is_empty() {
            errors.push(format!("users[{i}]: password is blank"));
        }
    }

    let known_author = |email: &str| {
        Email::parse(email).is_ok_and(|e| emails.contains(e.as_str()))
    };

    let mut store_names = HashSet::new();
    for (i, store) in seed.stores.iter().enumerate() {
        if let Err(e) = store.draft() {
            errors.push(format!("stores[{i}]: {e}"));
        }
        if !known_author(&store.author) {
            errors.push(format!("stores[{i}]: unknown author {}", store.author));
        }
        if !store_names.insert(store.name.trim()) {
            errors.push(format!("stores[{i}]: duplicate store name {}", store.name));
        }
    }

    for (i, review) in seed.reviews.iter().enumerate() {
        if !store_names.contains(review.store.trim()) {
            errors.push(format!("reviews[{i}]: unknown store {}", review.store));
        }
        if !known_author(&review.author) {
            errors.push(format!("reviews[{i}]: unknown author {}", review.author));
        }
        if let Err(e) = Rating::new(review.rating) {
            errors.push(format!("reviews[{i}]: {e}"));
        }
    }

    errors
}

/// Seed users, stores and reviews from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML file
/// * `clear_existing` - If true, delete all users, stores, reviews and hearts first
///
/// # Errors
///
/// Returns an error if the file is invalid or database operations fail.
pub async fn run(file_path: &str, clear_existing: bool) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url_from_env()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed data from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    if clear_existing {
        sqlx::query(
            "TRUNCATE tastemap.user_hearts, tastemap.reviews, tastemap.stores, tastemap.users \
             RESTART IDENTITY",
        )
        .execute(&pool)
        .await?;
        info!("Cleared existing data");
    }

    let auth = AuthService::new(&pool);
    let mut users: HashMap<String, UserId> = HashMap::new();
    for user in &seed.users {
        let created = auth.register(&user.email, &user.name, &user.password).await?;
        users.insert(created.email.into_inner(), created.id);
    }
    info!(count = users.len(), "Users created");

    let author_id = |email: &str| -> Result<UserId, String> {
        Email::parse(email)
            .ok()
            .and_then(|e| users.get(e.as_str()).copied())
            .ok_or_else(|| format!("unknown author {email}"))
    };

    let store_service = StoreService::new(&pool);
    let mut stores: HashMap<String, Store> = HashMap::new();
    for store in &seed.stores {
        let draft = store.draft()?;
        let created = store_service
            .create(&draft, None, author_id(&store.author)?)
            .await?;
        info!(slug = %created.slug, "Store created");
        stores.insert(store.name.trim().to_owned(), created);
    }

    let reviews = ReviewRepository::new(&pool);
    for review in &seed.reviews {
        let store = stores
            .get(review.store.trim())
            .ok_or_else(|| format!("unknown store {}", review.store))?;
        reviews
            .create(
                store.id,
                author_id(&review.author)?,
                review.text.trim(),
                Rating::new(review.rating)?,
            )
            .await?;
    }
    info!(count = seed.reviews.len(), "Reviews created");

    info!(
        users = users.len(),
        stores = stores.len(),
        reviews = seed.reviews.len(),
        "Seeding complete"
    );

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
users:
  - name: Wes
    email: Wes@Example.com
    password: wes
stores:
  - name: Bob's Burgers
    description: Burger of the day.
    tags: [Family Friendly, Licensed]
    address: 1 Ocean Ave
    lng: -79.38
    lat: 43.65
    author: wes@example.com
reviews:
  - store: Bob's Burgers
    author: wes@example.com
    rating: 5
    text: Great fries.
";

    #[test]
    fn test_sample_file_is_valid() {
        let seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(validate_seed(&seed).is_empty());
        assert_eq!(seed.stores[0].draft().unwrap().tags.len(), 2);
    }

    #[test]
    fn test_unknown_references_are_reported() {
        let mut seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        seed.stores[0].author = "nobody@example.com".to_string();
        seed.reviews[0].store = "Linda's".to_string();
        seed.reviews[0].rating = 9;

        let errors = validate_seed(&seed);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("unknown author"));
        assert!(errors[1].contains("unknown store"));
        assert!(errors[2].starts_with("reviews[0]: rating"));
    }

    #[test]
    fn test_bad_store_fields_are_reported() {
        let mut seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        seed.stores[0].lat = 120.0;
        let errors = validate_seed(&seed);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("stores[0]:"));
    }

    #[test]
    fn test_duplicate_emails_are_reported() {
        let mut seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        seed.users.push(SeedUser {
            name: "Wes again".to_string(),
            email: "wes@example.com".to_string(),
            password: "x".to_string(),
        });
        let errors = validate_seed(&seed);
        assert_eq!(errors, vec!["users[1]: duplicate email wes@example.com".to_string()]);
    }
}
