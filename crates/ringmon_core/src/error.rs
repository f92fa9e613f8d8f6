//! # Ring Error Types
//!
//! All errors that can occur when building or timing out on a ring.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the ring monitor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    /// Requested slot count is below one.
    #[error("ring size {requested} too small")]
    CapacityTooSmall {
        /// The size that was asked for.
        requested: i64,
    },

    /// A timed `put`/`get` gave up before its predicate cleared.
    #[error("ring operation timed out after {waited:?}")]
    TimedOut {
        /// How long the caller was willing to wait.
        waited: Duration,
    },

    /// Invalid configuration text.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ring operations.
pub type RingResult<T> = Result<T, RingError>;
