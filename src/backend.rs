//! Trait definition for pluggable search backends, plus the batch builder.
//!
//! The backend is an external collaborator that executes a batch of query
//! descriptors atomically against a hosted search service and returns the
//! per-descriptor results in submission order. Transport, retries, and
//! authentication all live behind this seam.

use std::sync::Arc;

use serde::Serialize;

use crate::error::SearchError;
use crate::types::{QueryParams, QueryResult};

/// One query descriptor within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchQuery {
    /// Identifier of the index to search.
    pub index: String,
    /// Full-text query string.
    pub query: String,
    /// Paging, facet, and filter parameters for this descriptor.
    pub params: QueryParams,
}

/// An ordered set of query descriptors submitted as one atomic unit.
///
/// Build with [`QueryBatch::new`] and [`QueryBatch::add`], then hand the
/// whole batch to [`SearchBackend::send_batch`]. The aggregation step
/// depends on the backend preserving this order in its response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryBatch {
    queries: Vec<BatchQuery>,
}

impl QueryBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query descriptor to the batch.
    pub fn add(&mut self, index: impl Into<String>, query: impl Into<String>, params: QueryParams) {
        self.queries.push(BatchQuery {
            index: index.into(),
            query: query.into(),
            params,
        });
    }

    /// The descriptors in submission order.
    pub fn queries(&self) -> &[BatchQuery] {
        &self.queries
    }

    /// Number of descriptors in the batch.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Returns `true` if the batch holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// A pluggable search backend.
///
/// Implementors execute the batch as one atomic operation: either every
/// descriptor produces a result (returned in submission order) or the
/// whole batch fails with a single error. Partial responses are not part
/// of the contract.
///
/// All implementations must be `Send + Sync` so a session can be shared
/// across tasks.
pub trait SearchBackend: Send + Sync {
    /// Execute `batch` and return one [`QueryResult`] per descriptor, in
    /// the order the descriptors were added.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Batch`] with the backend's own failure
    /// description when the batch cannot be executed.
    fn send_batch(
        &self,
        batch: &QueryBatch,
    ) -> impl std::future::Future<Output = Result<Vec<QueryResult>, SearchError>> + Send;
}

/// A shared backend handle is itself a backend, so one transport can
/// serve several sessions.
impl<B: SearchBackend> SearchBackend for Arc<B> {
    fn send_batch(
        &self,
        batch: &QueryBatch,
    ) -> impl std::future::Future<Output = Result<Vec<QueryResult>, SearchError>> + Send {
        (**self).send_batch(batch)
    }
}
