//! # Monitor Synchronization
//!
//! Producers and consumers meet in a bounded ring. Nobody spins.
//!
//! ## The Monitor
//!
//! ```text
//! Producer:  lock ─> while full  { wait(not_full)  } ─> write ─> notify(not_empty) ─> unlock
//! Consumer:  lock ─> while empty { wait(not_empty) } ─> read  ─> notify(not_full)  ─> unlock
//! ```
//!
//! The predicate check and the wait happen under the same lock that every
//! state change holds, so a notification can never slip in between them
//! (no lost wakeups). A notification only means "state changed", so the
//! predicate is re-checked after every wake.

mod ring;

pub use ring::{Ring, RingStats};
