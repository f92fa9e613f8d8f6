//! # RINGMON Core
//!
//! Bounded circular buffer coordinating producer and consumer threads through
//! a classic monitor: one mutex, two condition variables (`not_full`,
//! `not_empty`).
//!
//! ## Guarantees
//!
//! 1. **No overwrite** - a slot is never written before its item is consumed
//! 2. **No garbage reads** - every slot is initialized at construction
//! 3. **No spinning** - a full or empty ring parks the caller on a condvar
//!
//! ## Example
//!
//! ```rust
//! use ringmon_core::{Ring, Slot};
//!
//! let ring: Ring = Ring::new(3).unwrap();
//! ring.put(Slot::new(1, 10));
//! ring.put(Slot::new(1, 20));
//!
//! assert_eq!(ring.get(), Slot::new(1, 10));
//! assert_eq!(ring.get(), Slot::new(1, 20));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod slot;
pub mod sync;

pub use config::RingConfig;
pub use error::{RingError, RingResult};
pub use slot::Slot;
pub use sync::{Ring, RingStats};
