//! # facet-search
//!
//! Client-side faceted and disjunctive-faceted search over a hosted
//! search service.
//!
//! The crate owns exactly one piece of design: the refinement-state
//! model and the query-composition/aggregation algorithm that turns a
//! set of active filters into a batch of parallel queries and merges
//! the responses into one coherent facet view. Transport, retries,
//! authentication, and wire parsing belong to the [`SearchBackend`]
//! collaborator.
//!
//! ## Design
//!
//! - One [`FacetedSearchSession`] per search widget, holding the query
//!   string, page index, and two refinement sets (conjunctive AND
//!   facets, disjunctive OR facets)
//! - Each triggering action emits 1 main hits query plus 1 sub-query
//!   per disjunctive facet, submitted as a single atomic batch
//! - Each disjunctive sub-query excludes its own facet from its filter
//!   expression, so selecting one value never suppresses the sibling
//!   options' counts
//! - Sub-query facet counts are merged into the main result and
//!   zero-filled, so an actively refined value that no longer matches
//!   anything still renders with count 0
//! - Stale in-flight batches are discarded by sequence number when a
//!   newer one was issued on the same session
//!
//! ## Example
//!
//! ```no_run
//! use facet_search::{
//!     FacetedSearchSession, QueryBatch, QueryResult, SearchBackend, SearchError, SessionConfig,
//! };
//!
//! /// A backend wired to some hosted search service.
//! struct HostedBackend;
//!
//! impl SearchBackend for HostedBackend {
//!     async fn send_batch(&self, batch: &QueryBatch) -> Result<Vec<QueryResult>, SearchError> {
//!         // Execute the batch against the service here.
//!         Ok(batch.queries().iter().map(|_| QueryResult::default()).collect())
//!     }
//! }
//!
//! # async fn example() -> facet_search::Result<()> {
//! let config = SessionConfig {
//!     facets: vec!["brand".into()],
//!     disjunctive_facets: vec!["color".into()],
//!     hits_per_page: 20,
//! };
//! let session = FacetedSearchSession::new(HostedBackend, "products", config)?;
//!
//! let outcome = session.search("shoe").await?;
//! println!("{} hits", outcome.result.total_hits);
//!
//! if session.toggle_refinement("color", "red").await?.is_some() {
//!     assert!(session.is_refined("color", "red"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use backend::{BatchQuery, QueryBatch, SearchBackend};
pub use config::SessionConfig;
pub use error::{Result, SearchError};
pub use session::FacetedSearchSession;
pub use types::{FilterClause, FilterExpression, QueryParams, QueryResult, SearchOutcome, ValueCounts};
