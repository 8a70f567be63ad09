//! Session configuration with sensible defaults.
//!
//! [`SessionConfig`] declares which facets the session treats as
//! conjunctive (AND semantics) and which as disjunctive (OR semantics
//! among their own values), plus the page size for the main hits query.
//! The value is immutable once the session is constructed.

use crate::error::SearchError;

/// Configuration for a faceted search session.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides. The two facet lists are expected to be disjoint;
/// this is a convention, not enforced — a name present in both is
/// treated as conjunctive.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Facets refined with AND semantics. Requested as facet counts on
    /// the main hits query.
    pub facets: Vec<String>,
    /// Facets refined with OR semantics among their own values. Each one
    /// gets its own sub-query per batch so sibling value counts are not
    /// suppressed by self-selection.
    pub disjunctive_facets: Vec<String>,
    /// Number of hits per page on the main query. Sub-queries always use
    /// a page size of 1 since only facet counts are needed.
    pub hits_per_page: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            facets: Vec::new(),
            disjunctive_facets: Vec::new(),
            hits_per_page: 20,
        }
    }
}

impl SessionConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `hits_per_page` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.hits_per_page == 0 {
            return Err(SearchError::Config(
                "hits_per_page must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Returns `true` if `facet` is configured as a conjunctive facet.
    pub fn is_conjunctive(&self, facet: &str) -> bool {
        self.facets.iter().any(|f| f == facet)
    }

    /// Returns `true` if `facet` is configured as a disjunctive facet.
    pub fn is_disjunctive(&self, facet: &str) -> bool {
        self.disjunctive_facets.iter().any(|f| f == facet)
    }
}
