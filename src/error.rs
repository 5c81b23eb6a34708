//! Error types for clustering operations.

use thiserror::Error;

/// Errors surfaced by the clustering engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// Malformed region, clustering parameters or input points. The operation
    /// that raised it is aborted and the previous engine state is kept.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A cluster id that is not present in the index it was looked up in,
    /// typically a handle that outlived a rebuild.
    #[error("Stale cluster reference: {cluster_id} is not present in this index")]
    StaleReference { cluster_id: u64 },
}

impl ClusterError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ClusterError::Configuration(msg.into())
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, ClusterError::StaleReference { .. })
    }
}

/// Result type for clustering operations.
pub type Result<T> = std::result::Result<T, ClusterError>;
