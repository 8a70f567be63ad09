//! Core types for query parameters, backend results, and aggregated answers.
//!
//! Backend-facing types serialize with the hosted service's key spelling
//! (`hitsPerPage`, `filterExpression`, `disjunctiveFacets`). Hit records
//! are carried as opaque [`serde_json::Value`]s — their shape belongs to
//! the backend, not to this crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Facet value → result count, as reported by the backend for one facet.
pub type ValueCounts = BTreeMap<String, u64>;

/// One entry of a filter expression.
///
/// The expression as a whole is an implicit AND over its clauses. A flat
/// [`Term`](FilterClause::Term) holds a single `"facet:value"` filter; an
/// [`AnyOf`](FilterClause::AnyOf) group ORs several `"facet:value"` terms
/// of one disjunctive facet together.
///
/// Serializes untagged, so `[Term("brand:nike"), AnyOf(["color:red"])]`
/// becomes `["brand:nike", ["color:red"]]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterClause {
    /// A single `"facet:value"` term, ANDed with its siblings.
    Term(String),
    /// An OR-group of `"facet:value"` terms for one disjunctive facet.
    AnyOf(Vec<String>),
}

/// A complete filter expression: implicit AND over clauses.
pub type FilterExpression = Vec<FilterClause>;

/// Parameters for a single query descriptor within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Number of hits to return per page.
    pub hits_per_page: u32,
    /// Zero-based page index.
    pub page: u32,
    /// Facets to count in this query's response.
    pub facets: Vec<String>,
    /// Filter expression to apply; empty means unfiltered.
    #[serde(rename = "filterExpression")]
    pub filters: FilterExpression,
}

/// One per-descriptor result returned by the backend.
///
/// The main hits query fills `hits`; disjunctive sub-queries are only
/// read for their `facets` map. Unknown fields from the backend are
/// ignored, missing fields default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResult {
    /// Matching records, in backend-defined shape.
    pub hits: Vec<serde_json::Value>,
    /// Total number of matching records across all pages.
    pub total_hits: u64,
    /// Zero-based page index this result covers.
    pub page: u32,
    /// Page size the backend applied.
    pub hits_per_page: u32,
    /// Facet name → (value → count), if facet counts were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<BTreeMap<String, ValueCounts>>,
}

/// The aggregated answer of one query batch.
///
/// The main hits result, augmented with the merged disjunctive facet
/// counts from the sub-queries. Every value with an active disjunctive
/// refinement is present in `disjunctive_facets` with a count ≥ 0, even
/// when the backend omitted it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// The main hits result (batch index 0).
    #[serde(flatten)]
    pub result: QueryResult,
    /// Facet name → (value → count), union of all sub-query facet maps
    /// plus zero-filled entries for actively refined values.
    #[serde(rename = "disjunctiveFacets")]
    pub disjunctive_facets: BTreeMap<String, ValueCounts>,
}
