//! Integration tests for tag tallies and top-store ranking.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use tastemap_core::Rating;
use tastemap_core::ranking::{
    MIN_REVIEWS_TO_RANK, ReviewedStore, TOP_STORES_LIMIT, TagCount, tally_tags, top_stores,
};

fn reviewed(store: &'static str, ratings: &[i64]) -> ReviewedStore<&'static str> {
    ReviewedStore {
        store,
        ratings: ratings.iter().map(|&r| Rating::new(r).unwrap()).collect(),
    }
}

// =============================================================================
// Tags
// =============================================================================

#[test]
fn test_tags_counted_per_store() {
    let counts = tally_tags([vec!["a", "b"], vec!["a"]]);
    assert_eq!(
        counts,
        vec![
            TagCount { tag: "a".to_string(), count: 2 },
            TagCount { tag: "b".to_string(), count: 1 },
        ]
    );
}

#[test]
fn test_tag_counts_sum_to_total_tags() {
    let stores = [
        vec!["Wifi", "Licensed"],
        vec!["Wifi"],
        vec![],
        vec!["Open Late", "Licensed", "Wifi"],
    ];
    let counts = tally_tags(stores.clone());
    let total: usize = counts.iter().map(|c| c.count).sum();
    assert_eq!(total, stores.iter().map(Vec::len).sum::<usize>());
    assert!(counts.windows(2).all(|w| w[0].count >= w[1].count));
}

#[test]
fn test_no_stores_no_tags() {
    assert!(tally_tags(Vec::<Vec<String>>::new()).is_empty());
}

// =============================================================================
// Top Stores
// =============================================================================

#[test]
fn test_single_review_stores_are_excluded() {
    let ranked = top_stores([reviewed("one-review", &[5]), reviewed("two", &[3, 5])]);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].store, "two");
    assert!(ranked.iter().all(|r| r.review_count >= MIN_REVIEWS_TO_RANK));
}

#[test]
fn test_equal_averages_are_both_ranked() {
    let ranked = top_stores([reviewed("mixed", &[3, 5]), reviewed("steady", &[4, 4])]);
    assert_eq!(ranked.len(), 2);
    assert!(ranked.iter().all(|r| (r.average_rating - 4.0).abs() < f64::EPSILON));
}

#[test]
fn test_ranking_is_sorted_and_capped() {
    let stores: Vec<_> = (0..15)
        .map(|i| reviewed("store", &[1 + i % 5, 5]))
        .collect();
    let ranked = top_stores(stores);
    assert_eq!(ranked.len(), TOP_STORES_LIMIT);
    assert!(ranked
        .windows(2)
        .all(|w| w[0].average_rating >= w[1].average_rating));
}

#[test]
fn test_ranking_is_idempotent() {
    let input = || {
        vec![
            reviewed("a", &[5, 4, 3]),
            reviewed("b", &[2, 2]),
            reviewed("c", &[5]),
            reviewed("d", &[4, 5]),
        ]
    };
    assert_eq!(top_stores(input()), top_stores(input()));
}
