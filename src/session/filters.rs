//! Filter-expression construction from refinement state.
//!
//! The expression is a two-level structure: an implicit AND at the top,
//! where each active conjunctive refinement contributes a flat term and
//! each disjunctive facet with active values contributes one OR-group.
//! The facet a sub-query is counting is excluded from its own expression;
//! that exclusion is what keeps sibling value counts unsuppressed.

use crate::types::{FilterClause, FilterExpression};

use super::{ConjunctiveRefinements, DisjunctiveRefinements};

/// The `"facet:value"` key under which a conjunctive refinement is stored.
/// The key doubles as the filter term sent to the backend.
pub(crate) fn refinement_key(facet: &str, value: &str) -> String {
    format!("{facet}:{value}")
}

/// Build the filter expression for one query descriptor.
///
/// `excluded_facet` is the disjunctive facet the descriptor is counting,
/// or `None` for the main hits query. Inactive (tombstoned) refinements
/// contribute nothing. Clauses follow the refinement maps' sorted order.
pub(crate) fn build_filter_expression(
    conjunctive: &ConjunctiveRefinements,
    disjunctive: &DisjunctiveRefinements,
    excluded_facet: Option<&str>,
) -> FilterExpression {
    let mut expression = FilterExpression::new();

    for (key, active) in conjunctive {
        if *active {
            expression.push(FilterClause::Term(key.clone()));
        }
    }

    for (facet, values) in disjunctive {
        if excluded_facet == Some(facet.as_str()) {
            continue;
        }
        let terms: Vec<String> = values
            .iter()
            .filter(|(_, active)| **active)
            .map(|(value, _)| refinement_key(facet, value))
            .collect();
        if !terms.is_empty() {
            expression.push(FilterClause::AnyOf(terms));
        }
    }

    expression
}
