//! Tag frequency table and top-store ranking.
//!
//! Both functions take a full snapshot of the relevant rows and recompute
//! from scratch; there is no incremental state. Repositories read the raw
//! rows (tag arrays, per-store rating lists) and hand them to these
//! functions, so the grouping rules live in one place.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::Rating;

/// Maximum number of stores returned by [`top_stores`].
pub const TOP_STORES_LIMIT: usize = 10;

/// Stores need at least this many reviews to be ranked.
pub const MIN_REVIEWS_TO_RANK: usize = 2;

/// How many stores carry a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    /// The tag text.
    pub tag: String,
    /// Number of stores with this tag.
    pub count: usize,
}

/// Count stores per tag, most used first.
///
/// A store with `k` tags contributes to `k` groups. Ties keep the order in
/// which tags were first seen.
///
/// ```
/// use tastemap_core::ranking::{TagCount, tally_tags};
///
/// let counts = tally_tags([vec!["a", "b"], vec!["a"]]);
/// assert_eq!(counts[0], TagCount { tag: "a".into(), count: 2 });
/// assert_eq!(counts[1], TagCount { tag: "b".into(), count: 1 });
/// ```
pub fn tally_tags<I, T, S>(stores: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = T>,
    T: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: Vec<TagCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tags in stores {
        for tag in tags {
            let tag = tag.as_ref();
            if let Some(&slot) = index.get(tag) {
                if let Some(entry) = counts.get_mut(slot) {
                    entry.count += 1;
                }
            } else {
                index.insert(tag.to_owned(), counts.len());
                counts.push(TagCount {
                    tag: tag.to_owned(),
                    count: 1,
                });
            }
        }
    }

    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// A store together with the ratings of all its reviews.
#[derive(Debug, Clone)]
pub struct ReviewedStore<S> {
    /// Whatever summary of the store the caller wants carried through.
    pub store: S,
    /// Ratings of every review of this store, in any order.
    pub ratings: Vec<Rating>,
}

/// A store that made it into the ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStore<S> {
    /// The caller's store summary.
    pub store: S,
    /// Number of reviews the average is taken over.
    pub review_count: usize,
    /// Mean of all review ratings.
    pub average_rating: f64,
}

/// Rank stores by average review rating.
///
/// Stores with fewer than [`MIN_REVIEWS_TO_RANK`] reviews are left out
/// entirely. The rest are sorted by average rating, highest first, with ties
/// kept in input order, and cut to [`TOP_STORES_LIMIT`].
pub fn top_stores<S, I>(stores: I) -> Vec<RankedStore<S>>
where
    I: IntoIterator<Item = ReviewedStore<S>>,
{
    let mut ranked: Vec<RankedStore<S>> = stores
        .into_iter()
        .filter(|s| s.ratings.len() >= MIN_REVIEWS_TO_RANK)
        .map(|s| {
            let review_count = s.ratings.len();
            let total: f64 = s.ratings.iter().map(|r| f64::from(r.get())).sum();
            #[allow(clippy::cast_precision_loss)] // review counts are far below 2^52
            let average_rating = total / review_count as f64;
            RankedStore {
                store: s.store,
                review_count,
                average_rating,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    ranked.truncate(TOP_STORES_LIMIT);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reviewed(name: &'static str, ratings: &[i64]) -> ReviewedStore<&'static str> {
        ReviewedStore {
            store: name,
            ratings: ratings.iter().map(|r| Rating::new(*r).unwrap()).collect(),
        }
    }

    #[test]
    fn test_tally_tags_counts_each_tag_once_per_store() {
        let counts = tally_tags([vec!["Wifi", "Open Late"], vec!["Wifi"], vec![]]);
        assert_eq!(
            counts,
            vec![
                TagCount {
                    tag: "Wifi".into(),
                    count: 2
                },
                TagCount {
                    tag: "Open Late".into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_tally_tags_ties_keep_first_seen_order() {
        let counts = tally_tags([vec!["b", "a"], vec!["c"]]);
        let tags: Vec<&str> = counts.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, ["b", "a", "c"]);
    }

    #[test]
    fn test_tally_tags_empty() {
        assert!(tally_tags(Vec::<Vec<String>>::new()).is_empty());
    }

    #[test]
    fn test_top_stores_excludes_under_two_reviews() {
        let ranked = top_stores([
            reviewed("single", &[5]),
            reviewed("none", &[]),
            reviewed("pair", &[3, 4]),
        ]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].store, "pair");
        assert_eq!(ranked[0].review_count, 2);
        assert!((ranked[0].average_rating - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_top_stores_sorts_descending_with_stable_ties() {
        let ranked = top_stores([
            reviewed("mixed", &[3, 5]),
            reviewed("best", &[5, 5, 4]),
            reviewed("even", &[4, 4]),
        ]);
        let names: Vec<&str> = ranked.iter().map(|r| r.store).collect();
        assert_eq!(names, ["best", "mixed", "even"]);
    }

    #[test]
    fn test_top_stores_caps_result() {
        let stores = (0..15).map(|_| reviewed("s", &[4, 5]));
        assert_eq!(top_stores(stores).len(), TOP_STORES_LIMIT);
    }
}
