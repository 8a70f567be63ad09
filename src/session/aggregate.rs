//! Batch-response aggregation: merge sub-query facet counts, zero-fill.
//!
//! Takes the main hits result plus the disjunctive sub-query results of
//! one batch and produces a single [`SearchOutcome`]. The zero-fill pass
//! keeps every actively refined value visible with count 0 when the
//! backend stopped returning counts for it, so a selected filter option
//! that now yields no results does not vanish from the UI.

use std::collections::BTreeMap;

use crate::types::{QueryResult, SearchOutcome, ValueCounts};

use super::DisjunctiveRefinements;

/// Aggregate one batch response.
///
/// `sub_results` are the per-disjunctive-facet results in batch order
/// (batch index 1..N). `refined` is the disjunctive refinement state the
/// batch was issued with; its active values drive the zero-fill pass.
pub(crate) fn aggregate(
    main: QueryResult,
    sub_results: Vec<QueryResult>,
    refined: &DisjunctiveRefinements,
) -> SearchOutcome {
    let mut disjunctive_facets: BTreeMap<String, ValueCounts> = BTreeMap::new();

    for result in sub_results {
        let Some(facets) = result.facets else { continue };
        for (facet, counts) in facets {
            disjunctive_facets.insert(facet, counts);
        }
    }

    for (facet, values) in refined {
        let active: Vec<&String> = values
            .iter()
            .filter(|(_, active)| **active)
            .map(|(value, _)| value)
            .collect();
        if active.is_empty() {
            continue;
        }
        let counts = disjunctive_facets.entry(facet.clone()).or_default();
        for value in active {
            counts.entry(value.clone()).or_insert(0);
        }
    }

    SearchOutcome {
        result: main,
        disjunctive_facets,
    }
}
