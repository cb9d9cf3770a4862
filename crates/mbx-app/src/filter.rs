// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::fmt;

/// Fuzzy ranking of list labels against a typed query.
pub struct QuickFilter {
    matcher: SkimMatcherV2,
}

impl Default for QuickFilter {
    fn default() -> Self {
        Self {
            matcher: SkimMatcherV2::default(),
        }
    }
}

impl fmt::Debug for QuickFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickFilter").finish_non_exhaustive()
    }
}

impl QuickFilter {
    /// Returns indices into `candidates` that match `query`, best score first.
    /// Equal scores keep their input order. An empty query yields an empty
    /// vector, which callers treat as "not filtering".
    pub fn rank<S: AsRef<str>>(&self, query: &str, candidates: &[S]) -> Vec<usize> {
        if query.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(usize, i64)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                self.matcher
                    .fuzzy_match(candidate.as_ref(), query)
                    .map(|score| (index, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(index, _)| index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::QuickFilter;

    #[test]
    fn empty_query_means_no_filter() {
        let filter = QuickFilter::default();
        assert!(filter.rank("", &["orders", "people"]).is_empty());
    }

    #[test]
    fn non_matching_candidates_are_dropped() {
        let filter = QuickFilter::default();
        assert_eq!(filter.rank("ord", &["people", "orders", "products"]), vec![1]);
    }

    #[test]
    fn contiguous_match_outranks_scattered_match() {
        let filter = QuickFilter::default();
        let ranked = filter.rank("orders", &["customer_order_details", "orders"]);
        assert_eq!(ranked, vec![1, 0]);
    }

    #[test]
    fn ties_keep_input_order() {
        let filter = QuickFilter::default();
        let ranked = filter.rank("sales", &["sales", "other", "sales"]);
        assert_eq!(ranked, vec![0, 2]);
    }

    #[test]
    fn ranking_is_deterministic() {
        let filter = QuickFilter::default();
        let names = ["Revenue by month", "Monthly users", "Refunds", "Reviews"];
        let first = filter.rank("re", &names);
        assert_eq!(first, filter.rank("re", &names));
        assert!(!first.is_empty());
    }
}
