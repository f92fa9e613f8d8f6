//! # RINGMON Driver
//!
//! Runs producer/consumer workloads against a [`ringmon_core::Ring`] and
//! checks that nothing was lost, duplicated or reordered.
//!
//! ## Example
//!
//! ```rust
//! use ringmon::{driver, WorkloadConfig};
//!
//! let config = WorkloadConfig::smoke();
//! let report = driver::run(&config).unwrap();
//! report.verify(&config).unwrap();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod driver;
pub mod error;

pub use config::WorkloadConfig;
pub use driver::WorkloadReport;
pub use error::{DriverError, DriverResult};
