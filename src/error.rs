//! Error types for the facet-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Backend failure descriptions are forwarded
//! verbatim; the core does not classify them further.

/// Errors that can occur while running a faceted search session.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The backend reported a batch-level failure. The message is the
    /// backend's own description, forwarded without interpretation.
    #[error("batch failed: {0}")]
    Batch(String),

    /// Invalid session configuration or construction input.
    #[error("config error: {0}")]
    Config(String),

    /// The batch was superseded by a newer one issued on the same session
    /// before its response arrived. Its results were discarded.
    #[error("batch superseded by a newer request")]
    Superseded,
}

/// Convenience type alias for facet-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
