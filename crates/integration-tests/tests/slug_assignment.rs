//! Integration tests for store slug assignment.
//!
//! These run the slug assigner against an in-memory slug column, so they
//! cover numbering, renames and the conflict retry without a database.

#![allow(clippy::unwrap_used)]

use tastemap_core::{Slug, StoreName};
use tastemap_integration_tests::MemoryStores;
use tastemap_web::db::RepositoryError;
use tastemap_web::services::{assign_slug, fresh_slug, with_slug_retry};

fn name(s: &str) -> StoreName {
    StoreName::parse(s).unwrap()
}

async fn create(stores: &MemoryStores, store_name: &str) -> Slug {
    let store_name = name(store_name);
    let slug = fresh_slug(stores, &store_name).await.unwrap();
    with_slug_retry(stores, &store_name, slug, |slug| async move {
        stores.insert(&slug)
    })
    .await
    .unwrap()
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn test_slugify_strips_punctuation() {
    assert_eq!(Slug::from_name("Bob's Burgers!").as_str(), "bobs-burgers");
}

#[tokio::test]
async fn test_sequential_creations_are_numbered_in_order() {
    let stores = MemoryStores::default();
    let mut created = Vec::new();
    for _ in 0..5 {
        created.push(create(&stores, "Bob's Burgers").await.into_inner());
    }
    assert_eq!(
        created,
        vec![
            "bobs-burgers",
            "bobs-burgers-2",
            "bobs-burgers-3",
            "bobs-burgers-4",
            "bobs-burgers-5",
        ]
    );
}

#[tokio::test]
async fn test_names_with_the_same_base_share_a_sequence() {
    let stores = MemoryStores::default();
    assert_eq!(create(&stores, "Bob's Burgers").await.as_str(), "bobs-burgers");
    assert_eq!(create(&stores, "BOBS BURGERS").await.as_str(), "bobs-burgers-2");
    assert_eq!(create(&stores, "bobs -- burgers").await.as_str(), "bobs-burgers-3");
}

#[tokio::test]
async fn test_longer_names_do_not_count_as_conflicts() {
    let stores = MemoryStores::with(&["bobs-burgers-express", "bobs-burgers-2b"]);
    assert_eq!(create(&stores, "Bob's Burgers").await.as_str(), "bobs-burgers");
}

#[tokio::test]
async fn test_symbol_only_names_fall_back() {
    let stores = MemoryStores::default();
    assert_eq!(create(&stores, "!!!").await.as_str(), Slug::FALLBACK);
    assert_eq!(create(&stores, "???").await.as_str(), "store-2");
}

// =============================================================================
// Renames
// =============================================================================

#[tokio::test]
async fn test_rename_to_same_name_keeps_slug() {
    let stores = MemoryStores::default();
    create(&stores, "Bob's Burgers").await;
    create(&stores, "Bob's Burgers").await;

    let current = name("Bob's Burgers");
    let assigned = assign_slug(&stores, &current, Some(&current)).await.unwrap();
    assert_eq!(assigned, None);
}

#[tokio::test]
async fn test_rename_recounts_like_creation() {
    let stores = MemoryStores::default();
    create(&stores, "Linda's").await;
    let old = create(&stores, "Bob's Burgers").await;

    let assigned = assign_slug(&stores, &name("Linda's"), Some(&name("Bob's Burgers")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assigned.as_str(), "lindas-2");

    stores.rename(&old, &assigned).unwrap();
    assert_eq!(stores.slugs(), vec!["lindas", "lindas-2"]);
}

#[tokio::test]
async fn test_rename_counts_own_slug() {
    let stores = MemoryStores::default();
    let old = create(&stores, "Cafe").await;

    let assigned = assign_slug(&stores, &name("Cafe!"), Some(&name("Cafe")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assigned.as_str(), "cafe-2");

    stores.rename(&old, &assigned).unwrap();
    assert_eq!(stores.slugs(), vec!["cafe-2"]);
}

// =============================================================================
// Conflict Retry
// =============================================================================

#[tokio::test]
async fn test_racing_writer_is_bumped_once() {
    let stores = MemoryStores::default();
    let store_name = name("Bob's Burgers");

    // both writers counted before either saved
    let first = fresh_slug(&stores, &store_name).await.unwrap();
    let second = fresh_slug(&stores, &store_name).await.unwrap();
    assert_eq!(first, second);

    stores.insert(&first).unwrap();
    let table = &stores;
    let saved = with_slug_retry(table, &store_name, second, |slug| async move {
        table.insert(&slug)
    })
    .await
    .unwrap();

    assert_eq!(saved.as_str(), "bobs-burgers-2");
    assert_eq!(stores.slugs(), vec!["bobs-burgers", "bobs-burgers-2"]);
}

#[tokio::test]
async fn test_second_conflict_is_returned() {
    let stores = MemoryStores::default();
    let store_name = name("Cafe");

    let result = with_slug_retry(&stores, &store_name, Slug::from_name("Cafe"), |slug| async move {
        Err::<Slug, _>(RepositoryError::SlugConflict(slug.into_inner()))
    })
    .await;

    assert!(matches!(result, Err(RepositoryError::SlugConflict(s)) if s == "cafe-2"));
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let stores = MemoryStores::default();
    let mut attempts = 0;

    let result = with_slug_retry(&stores, &name("Cafe"), Slug::from_name("Cafe"), |_| {
        attempts += 1;
        async { Err::<Slug, _>(RepositoryError::NotFound) }
    })
    .await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
    assert_eq!(attempts, 1);
}
