//! # Driver Error Types

use ringmon_core::RingError;
use thiserror::Error;

/// Which side of the ring a worker was on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Puts slots.
    Producer,
    /// Gets slots.
    Consumer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Producer => f.write_str("producer"),
            Self::Consumer => f.write_str("consumer"),
        }
    }
}

/// Errors that can occur while running a workload.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The ring could not be built.
    #[error("{0}")]
    Ring(#[from] RingError),

    /// Workload config is malformed or out of range.
    #[error("invalid workload config: {0}")]
    Config(String),

    /// Config file could not be read.
    #[error("config file: {0}")]
    Io(#[from] std::io::Error),

    /// A worker thread panicked.
    #[error("{role} {id} panicked")]
    WorkerPanicked {
        /// Producer or consumer.
        role: Role,
        /// Worker index.
        id: usize,
    },

    /// The consumed output does not match what was produced.
    #[error("verification failed: {0}")]
    Verification(String),
}

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
