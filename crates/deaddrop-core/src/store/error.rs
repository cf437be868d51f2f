//! Store error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from a drop store backend.
///
/// All variants are transient from the protocol's point of view: the caller
/// may retry the same step. Messages never include record contents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend is unreachable or its internal state is unusable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend I/O or transaction failure
    #[error("store I/O error: {0}")]
    Io(String),

    /// Stored record could not be encoded or decoded
    #[error("store serialization error: {0}")]
    Serialization(String),

    /// Operation did not complete within the configured bound
    #[error("store {operation} timed out after {after:?}")]
    Timeout {
        /// Store operation that timed out
        operation: &'static str,
        /// Configured bound
        after: Duration,
    },
}
