//! Faceted search session: refinement state, batch composition, aggregation.
//!
//! [`FacetedSearchSession`] owns the refinement state for one search
//! widget. Every triggering operation (new query, refinement toggle,
//! page move) rebuilds the filter expressions, emits one main hits
//! descriptor plus one descriptor per configured disjunctive facet,
//! submits them as a single atomic batch, and merges the sub-query
//! facet counts into the main result.
//!
//! Batches are tagged with a per-session sequence number at issue time.
//! When a response arrives after a newer batch was issued, it is
//! discarded as [`SearchError::Superseded`] instead of overwriting
//! fresher results.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::backend::{QueryBatch, SearchBackend};
use crate::config::SessionConfig;
use crate::error::SearchError;
use crate::types::{QueryParams, SearchOutcome};

mod aggregate;
mod filters;

use filters::refinement_key;

/// Conjunctive refinement state: `"facet:value"` key → active flag.
/// Toggling off keeps the key with `false` (tombstone).
pub(crate) type ConjunctiveRefinements = BTreeMap<String, bool>;

/// Disjunctive refinement state: facet → (value → active flag), with the
/// same tombstone behaviour per value.
pub(crate) type DisjunctiveRefinements = BTreeMap<String, BTreeMap<String, bool>>;

/// Mutable per-session state, guarded by the session's mutex.
#[derive(Debug, Clone, Default)]
struct SessionState {
    query: String,
    page: u32,
    conjunctive: ConjunctiveRefinements,
    disjunctive: DisjunctiveRefinements,
}

/// Everything captured at batch-issue time: the batch itself, its
/// sequence tag, the pre-mutation state for failure rollback, and the
/// disjunctive refinements the aggregation's zero-fill pass needs.
struct IssuedBatch {
    batch: QueryBatch,
    seq: u64,
    prior: SessionState,
    refined: DisjunctiveRefinements,
}

/// A faceted search session over one index of a hosted search service.
///
/// Created once per search widget. Methods take `&self`; state lives
/// behind a mutex, so a session can be shared via `Arc` across tasks.
/// The lock is never held across the backend await.
pub struct FacetedSearchSession<B: SearchBackend> {
    backend: B,
    index: String,
    config: SessionConfig,
    state: Mutex<SessionState>,
    batch_seq: AtomicU64,
}

impl<B: SearchBackend> FacetedSearchSession<B> {
    /// Create a session over `index` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the index identifier is empty
    /// or the configuration fails validation.
    pub fn new(backend: B, index: impl Into<String>, config: SessionConfig) -> Result<Self, SearchError> {
        let index = index.into();
        if index.trim().is_empty() {
            return Err(SearchError::Config(
                "index identifier must not be empty".into(),
            ));
        }
        config.validate()?;
        Ok(Self {
            backend,
            index,
            config,
            state: Mutex::new(SessionState::default()),
            batch_seq: AtomicU64::new(0),
        })
    }

    /// Start a fresh top-level search.
    ///
    /// Resets the page to 0 and clears both refinement sets — a new
    /// query discards prior filter selections — then runs the batch
    /// protocol and returns the aggregated answer.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Batch`] (backend failure, state restored)
    /// or [`SearchError::Superseded`] (a newer batch was issued first).
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let issued = {
            let mut state = self.lock_state();
            let prior = state.clone();
            state.query = query.to_string();
            state.page = 0;
            state.conjunctive.clear();
            state.disjunctive.clear();
            self.issue(&state, prior)
        };
        tracing::trace!(query, "new top-level search");
        self.run_batch(issued).await
    }

    /// Toggle the refinement `(facet, value)` and re-run the search.
    ///
    /// Flips the conjunctive key or the disjunctive entry depending on
    /// which facet set `facet` belongs to (conjunctive wins if it is in
    /// both), creating the entry with prior value `false` if absent, and
    /// resets the page to 0. Returns `Ok(None)` without any side effect
    /// when `facet` is in neither configured set.
    ///
    /// # Errors
    ///
    /// Same as [`search`](Self::search).
    pub async fn toggle_refinement(
        &self,
        facet: &str,
        value: &str,
    ) -> Result<Option<SearchOutcome>, SearchError> {
        let is_conjunctive = self.config.is_conjunctive(facet);
        if !is_conjunctive && !self.config.is_disjunctive(facet) {
            return Ok(None);
        }

        let issued = {
            let mut state = self.lock_state();
            let prior = state.clone();
            if is_conjunctive {
                let flag = state
                    .conjunctive
                    .entry(refinement_key(facet, value))
                    .or_insert(false);
                *flag = !*flag;
            } else {
                let flag = state
                    .disjunctive
                    .entry(facet.to_string())
                    .or_default()
                    .entry(value.to_string())
                    .or_insert(false);
                *flag = !*flag;
            }
            state.page = 0;
            self.issue(&state, prior)
        };
        tracing::trace!(facet, value, "refinement toggled");
        self.run_batch(issued).await.map(Some)
    }

    /// Returns `true` iff `(facet, value)` is an active refinement, in
    /// either refinement set. Pure query; no batch is issued.
    pub fn is_refined(&self, facet: &str, value: &str) -> bool {
        let state = self.lock_state();
        if state
            .conjunctive
            .get(&refinement_key(facet, value))
            .copied()
            .unwrap_or(false)
        {
            return true;
        }
        state
            .disjunctive
            .get(facet)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(false)
    }

    /// Advance to the next page and re-run the search. Refinements are
    /// kept.
    ///
    /// # Errors
    ///
    /// Same as [`search`](Self::search).
    pub async fn next_page(&self) -> Result<SearchOutcome, SearchError> {
        let issued = {
            let mut state = self.lock_state();
            let prior = state.clone();
            state.page += 1;
            self.issue(&state, prior)
        };
        self.run_batch(issued).await
    }

    /// Move back one page and re-run the search, or return `Ok(None)` at
    /// page 0 (no batch is issued). Refinements are kept.
    ///
    /// # Errors
    ///
    /// Same as [`search`](Self::search).
    pub async fn previous_page(&self) -> Result<Option<SearchOutcome>, SearchError> {
        let issued = {
            let mut state = self.lock_state();
            if state.page == 0 {
                None
            } else {
                let prior = state.clone();
                state.page -= 1;
                Some(self.issue(&state, prior))
            }
        };
        match issued {
            Some(issued) => self.run_batch(issued).await.map(Some),
            None => Ok(None),
        }
    }

    /// The current zero-based page index.
    pub fn page(&self) -> u32 {
        self.lock_state().page
    }

    /// The most recently submitted query string.
    pub fn query(&self) -> String {
        self.lock_state().query.clone()
    }

    /// The index identifier this session searches.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Build the batch for `state` and tag it with the next sequence
    /// number. Called with the state lock held.
    fn issue(&self, state: &SessionState, prior: SessionState) -> IssuedBatch {
        let mut batch = QueryBatch::new();
        batch.add(
            &self.index,
            &state.query,
            QueryParams {
                hits_per_page: self.config.hits_per_page,
                page: state.page,
                facets: self.config.facets.clone(),
                filters: filters::build_filter_expression(&state.conjunctive, &state.disjunctive, None),
            },
        );
        for facet in &self.config.disjunctive_facets {
            batch.add(
                &self.index,
                &state.query,
                QueryParams {
                    hits_per_page: 1,
                    page: 0,
                    facets: vec![facet.clone()],
                    filters: filters::build_filter_expression(
                        &state.conjunctive,
                        &state.disjunctive,
                        Some(facet),
                    ),
                },
            );
        }
        IssuedBatch {
            batch,
            seq: self.batch_seq.fetch_add(1, Ordering::SeqCst) + 1,
            prior,
            refined: state.disjunctive.clone(),
        }
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.batch_seq.load(Ordering::SeqCst) == seq
    }

    /// Submit an issued batch and aggregate its response.
    ///
    /// On backend failure the pre-mutation state is restored (unless a
    /// newer batch was issued meanwhile, in which case the newer call
    /// owns the state) and the backend's error is forwarded verbatim.
    async fn run_batch(&self, issued: IssuedBatch) -> Result<SearchOutcome, SearchError> {
        let IssuedBatch {
            batch,
            seq,
            prior,
            refined,
        } = issued;
        let expected = batch.len();
        tracing::debug!(queries = expected, seq, "dispatching query batch");

        match self.backend.send_batch(&batch).await {
            Ok(mut results) => {
                if !self.is_latest(seq) {
                    tracing::debug!(seq, "discarding stale batch results");
                    return Err(SearchError::Superseded);
                }
                if results.len() != expected {
                    let err = SearchError::Batch(format!(
                        "backend returned {} results for {expected} queries",
                        results.len()
                    ));
                    tracing::warn!(error = %err, seq, "query batch failed");
                    // Still the latest batch (checked above), so the
                    // triggering mutation is ours to roll back.
                    *self.lock_state() = prior;
                    return Err(err);
                }
                let main = results.remove(0);
                Ok(aggregate::aggregate(main, results, &refined))
            }
            Err(err) => {
                tracing::warn!(error = %err, seq, "query batch failed");
                if self.is_latest(seq) {
                    *self.lock_state() = prior;
                }
                Err(err)
            }
        }
    }
}

impl<B: SearchBackend> fmt::Debug for FacetedSearchSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetedSearchSession")
            .field("index", &self.index)
            .field("config", &self.config)
            .field("state", &*self.lock_state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryResult;

    /// A backend that answers every descriptor with an empty result.
    struct EmptyBackend;

    impl SearchBackend for EmptyBackend {
        async fn send_batch(&self, batch: &QueryBatch) -> Result<Vec<QueryResult>, SearchError> {
            Ok(batch
                .queries()
                .iter()
                .map(|_| QueryResult::default())
                .collect())
        }
    }

    /// A backend that fails every batch.
    struct FailingBackend;

    impl SearchBackend for FailingBackend {
        async fn send_batch(&self, _batch: &QueryBatch) -> Result<Vec<QueryResult>, SearchError> {
            Err(SearchError::Batch("backend unavailable".into()))
        }
    }

    fn shoe_config() -> SessionConfig {
        SessionConfig {
            facets: vec!["brand".into()],
            disjunctive_facets: vec!["color".into()],
            hits_per_page: 20,
        }
    }

    fn session() -> FacetedSearchSession<EmptyBackend> {
        FacetedSearchSession::new(EmptyBackend, "products", shoe_config()).expect("valid session")
    }

    #[test]
    fn construction_rejects_empty_index() {
        let err = FacetedSearchSession::new(EmptyBackend, "  ", shoe_config()).unwrap_err();
        assert!(err.to_string().contains("index"));
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let config = SessionConfig {
            hits_per_page: 0,
            ..shoe_config()
        };
        let err = FacetedSearchSession::new(EmptyBackend, "products", config).unwrap_err();
        assert!(err.to_string().contains("hits_per_page"));
    }

    #[test]
    fn new_session_starts_at_page_zero_unrefined() {
        let session = session();
        assert_eq!(session.page(), 0);
        assert_eq!(session.query(), "");
        assert!(!session.is_refined("color", "red"));
        assert_eq!(session.index(), "products");
    }

    #[tokio::test]
    async fn toggle_flips_and_double_toggle_restores() {
        let session = session();
        session.toggle_refinement("color", "red").await.unwrap();
        assert!(session.is_refined("color", "red"));
        session.toggle_refinement("color", "red").await.unwrap();
        assert!(!session.is_refined("color", "red"));
    }

    #[tokio::test]
    async fn conjunctive_toggle_tracked_per_pair() {
        let session = session();
        session.toggle_refinement("brand", "nike").await.unwrap();
        assert!(session.is_refined("brand", "nike"));
        assert!(!session.is_refined("brand", "adidas"));
        session.toggle_refinement("brand", "nike").await.unwrap();
        assert!(!session.is_refined("brand", "nike"));
    }

    #[tokio::test]
    async fn disjunctive_values_are_independent() {
        let session = FacetedSearchSession::new(
            EmptyBackend,
            "products",
            SessionConfig {
                facets: vec![],
                disjunctive_facets: vec!["color".into(), "size".into()],
                hits_per_page: 20,
            },
        )
        .unwrap();
        session.toggle_refinement("color", "red").await.unwrap();
        session.toggle_refinement("size", "42").await.unwrap();
        session.toggle_refinement("color", "red").await.unwrap();
        assert!(!session.is_refined("color", "red"));
        assert!(session.is_refined("size", "42"));
    }

    #[tokio::test]
    async fn unknown_facet_toggle_is_a_no_op() {
        let session = session();
        let outcome = session.toggle_refinement("material", "leather").await.unwrap();
        assert!(outcome.is_none());
        assert!(!session.is_refined("material", "leather"));
        assert_eq!(session.page(), 0);
    }

    #[tokio::test]
    async fn search_resets_page_and_clears_refinements() {
        let session = session();
        session.toggle_refinement("color", "red").await.unwrap();
        session.toggle_refinement("brand", "nike").await.unwrap();
        session.next_page().await.unwrap();
        assert_eq!(session.page(), 1);

        session.search("boot").await.unwrap();
        assert_eq!(session.page(), 0);
        assert_eq!(session.query(), "boot");
        assert!(!session.is_refined("color", "red"));
        assert!(!session.is_refined("brand", "nike"));
    }

    #[tokio::test]
    async fn toggle_resets_page() {
        let session = session();
        session.next_page().await.unwrap();
        session.next_page().await.unwrap();
        assert_eq!(session.page(), 2);
        session.toggle_refinement("color", "red").await.unwrap();
        assert_eq!(session.page(), 0);
    }

    #[tokio::test]
    async fn page_bookkeeping() {
        let session = session();
        session.next_page().await.unwrap();
        assert_eq!(session.page(), 1);
        let moved = session.previous_page().await.unwrap();
        assert!(moved.is_some());
        assert_eq!(session.page(), 0);
    }

    #[tokio::test]
    async fn previous_page_at_zero_is_a_no_op() {
        let session = session();
        let moved = session.previous_page().await.unwrap();
        assert!(moved.is_none());
        assert_eq!(session.page(), 0);
    }

    #[tokio::test]
    async fn batch_failure_restores_prior_state() {
        let session =
            FacetedSearchSession::new(FailingBackend, "products", shoe_config()).unwrap();
        let err = session.toggle_refinement("color", "red").await.unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
        assert!(!session.is_refined("color", "red"));
        assert_eq!(session.page(), 0);
        assert_eq!(session.query(), "");
    }

    #[tokio::test]
    async fn failed_search_keeps_previous_query() {
        let session =
            FacetedSearchSession::new(FailingBackend, "products", shoe_config()).unwrap();
        assert!(session.search("shoe").await.is_err());
        assert_eq!(session.query(), "");
    }

    #[tokio::test]
    async fn short_batch_response_is_an_error_and_restores_state() {
        struct ShortBackend;
        impl SearchBackend for ShortBackend {
            async fn send_batch(
                &self,
                _batch: &QueryBatch,
            ) -> Result<Vec<QueryResult>, SearchError> {
                Ok(vec![])
            }
        }
        let session =
            FacetedSearchSession::new(ShortBackend, "products", shoe_config()).unwrap();
        let err = session.search("shoe").await.unwrap_err();
        assert!(err.to_string().contains("0 results for 2 queries"));
        assert_eq!(session.query(), "");

        let err = session.toggle_refinement("color", "red").await.unwrap_err();
        assert!(err.to_string().contains("0 results for 2 queries"));
        assert!(!session.is_refined("color", "red"));
        assert_eq!(session.page(), 0);
    }

    #[tokio::test]
    async fn debug_output_reports_index_and_state() {
        let session = session();
        session.toggle_refinement("color", "red").await.unwrap();
        let rendered = format!("{session:?}");
        assert!(rendered.contains("products"));
        assert!(rendered.contains("color"));
    }

    #[test]
    fn session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FacetedSearchSession<EmptyBackend>>();
    }
}
