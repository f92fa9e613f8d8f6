//! # Bounded Ring Buffer Monitor
//!
//! ## Layout
//!
//! ```text
//!            out                 in
//!             │                   │
//!   ┌────┬────▼───┬────────┬──────▼─┬────────┐
//!   │    │ item 0 │ item 1 │ (free) │        │
//!   └────┴────────┴────────┴────────┴────────┘
//!
//!   empty: in == out
//!   full:  (in + 1) % slots == out      (one slot is always left free)
//! ```
//!
//! The free sentinel slot is what lets the two cursors tell "empty" from
//! "full" on their own. A ring of `n` slots therefore holds at most `n - 1`
//! items. A ring asked for a single slot gets two, so it still hands off one
//! item at a time.
//!
//! ## Thread Safety
//!
//! Buffer, cursors and statistics all live inside one `parking_lot::Mutex`.
//! The emptiness/fullness predicates are methods on the locked state, so
//! they cannot be evaluated without holding the guard.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::config::RingConfig;
use crate::error::{RingError, RingResult};
use crate::slot::Slot;

/// Counters maintained under the ring's lock.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RingStats {
    /// Completed `put` calls.
    pub total_puts: u64,
    /// Completed `get` calls.
    pub total_gets: u64,
    /// Times a producer parked on `not_full`.
    pub producer_waits: u64,
    /// Times a consumer parked on `not_empty`.
    pub consumer_waits: u64,
    /// Timed operations that gave up.
    pub timeouts: u64,
    /// Highest occupancy ever observed.
    pub high_water_mark: usize,
}

/// Lock-protected part of the ring.
struct RingState<T> {
    /// Slot storage, allocated once.
    buffer: Box<[T]>,
    /// Next write position ("in").
    write_cursor: usize,
    /// Next read position ("out").
    read_cursor: usize,
    stats: RingStats,
}

impl<T: Copy> RingState<T> {
    #[inline]
    fn slots(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.write_cursor == self.read_cursor
    }

    #[inline]
    fn is_full(&self) -> bool {
        (self.write_cursor + 1) % self.slots() == self.read_cursor
    }

    #[inline]
    fn occupancy(&self) -> usize {
        (self.write_cursor + self.slots() - self.read_cursor) % self.slots()
    }

    /// Writes at the write cursor. Caller has checked `!is_full()`.
    fn store(&mut self, message: T) {
        debug_assert!(!self.is_full());
        self.buffer[self.write_cursor] = message;
        self.write_cursor = (self.write_cursor + 1) % self.slots();

        let occupancy = self.occupancy();
        self.stats.total_puts += 1;
        self.stats.high_water_mark = self.stats.high_water_mark.max(occupancy);
    }

    /// Reads at the read cursor. Caller has checked `!is_empty()`.
    fn take(&mut self) -> T {
        debug_assert!(!self.is_empty());
        let message = self.buffer[self.read_cursor];
        self.read_cursor = (self.read_cursor + 1) % self.slots();
        self.stats.total_gets += 1;
        message
    }
}

/// Bounded circular buffer shared by producer and consumer threads.
///
/// `put` blocks while the ring is full, `get` blocks while it is empty.
/// Values come out in the order they went in.
///
/// Share it with `Arc<Ring>`: a thread blocked inside `put`/`get` holds its
/// own clone, so the ring cannot be dropped out from under it.
///
/// ## Usage
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use ringmon_core::{Ring, Slot};
///
/// let ring: Arc<Ring> = Arc::new(Ring::new(4).unwrap());
///
/// let producer = {
///     let ring = Arc::clone(&ring);
///     thread::spawn(move || {
///         for value in 0..100 {
///             ring.put(Slot::new(1, value));
///         }
///     })
/// };
///
/// for value in 0..100 {
///     assert_eq!(ring.get().value, value);
/// }
/// producer.join().unwrap();
/// ```
pub struct Ring<T = Slot> {
    state: Mutex<RingState<T>>,
    /// Signalled after every `get`.
    not_full: Condvar,
    /// Signalled after every `put`.
    not_empty: Condvar,
    /// Size asked for at construction.
    size: usize,
    /// Slot count; immutable, so readable without the lock.
    slots: usize,
}

impl<T: Copy + Default> Ring<T> {
    /// Creates a ring with `size` slots.
    ///
    /// A size of one allocates two slots so that a single item fits.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::CapacityTooSmall`] if `size` is zero.
    pub fn new(size: usize) -> RingResult<Self> {
        if size < 1 {
            return Err(RingError::CapacityTooSmall { requested: 0 });
        }

        let slots = size.max(2);
        let buffer: Vec<T> = vec![T::default(); slots];
        debug!(size, slots, "ring created");

        Ok(Self {
            state: Mutex::new(RingState {
                buffer: buffer.into_boxed_slice(),
                write_cursor: 0,
                read_cursor: 0,
                stats: RingStats::default(),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            size,
            slots,
        })
    }

    /// Creates a ring from a config.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::CapacityTooSmall`] if the configured size is
    /// zero or negative.
    pub fn from_config(config: &RingConfig) -> RingResult<Self> {
        Self::new(config.validated_size()?)
    }
}

impl<T: Copy> Ring<T> {
    /// Puts a message into the next free slot, blocking while the ring is full.
    pub fn put(&self, message: T) {
        let mut state = self.state.lock();
        while state.is_full() {
            state.stats.producer_waits += 1;
            trace!(occupancy = state.occupancy(), "producer blocked on full ring");
            self.not_full.wait(&mut state);
        }

        state.store(message);
        self.not_empty.notify_one();
    }

    /// Takes the oldest message, blocking while the ring is empty.
    #[must_use]
    pub fn get(&self) -> T {
        let mut state = self.state.lock();
        while state.is_empty() {
            state.stats.consumer_waits += 1;
            trace!("consumer blocked on empty ring");
            self.not_empty.wait(&mut state);
        }

        let message = state.take();
        self.not_full.notify_one();
        message
    }

    /// Like [`put`](Self::put), but gives up after `timeout`.
    ///
    /// A zero timeout never parks: it succeeds only if a slot is free right
    /// now.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::TimedOut`] if the ring stayed full for the whole
    /// timeout. The ring is left untouched in that case.
    pub fn put_timeout(&self, message: T, timeout: Duration) -> RingResult<()> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.put(message);
            return Ok(());
        };

        let mut state = self.state.lock();
        while state.is_full() {
            if Instant::now() >= deadline {
                state.stats.timeouts += 1;
                warn!(?timeout, "put timed out on full ring");
                return Err(RingError::TimedOut { waited: timeout });
            }
            state.stats.producer_waits += 1;
            trace!(occupancy = state.occupancy(), "producer blocked on full ring");
            self.not_full.wait_until(&mut state, deadline);
        }

        state.store(message);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Like [`get`](Self::get), but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::TimedOut`] if the ring stayed empty for the whole
    /// timeout.
    pub fn get_timeout(&self, timeout: Duration) -> RingResult<T> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Ok(self.get());
        };

        let mut state = self.state.lock();
        while state.is_empty() {
            if Instant::now() >= deadline {
                state.stats.timeouts += 1;
                warn!(?timeout, "get timed out on empty ring");
                return Err(RingError::TimedOut { waited: timeout });
            }
            state.stats.consumer_waits += 1;
            trace!("consumer blocked on empty ring");
            self.not_empty.wait_until(&mut state, deadline);
        }

        let message = state.take();
        self.not_full.notify_one();
        Ok(message)
    }

    /// Size the ring was created with.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of slots allocated. Equals [`size`](Self::size) except for a
    /// size-one ring, which gets a second slot as the sentinel.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Maximum number of items held at once (one slot is the sentinel).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots - 1
    }

    /// Number of items currently held. A snapshot; may be stale on return.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().occupancy()
    }

    /// Whether the ring held no items at the moment of the call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    /// Whether the ring was full at the moment of the call.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.state.lock().is_full()
    }

    /// Returns a copy of the current statistics.
    #[must_use]
    pub fn stats(&self) -> RingStats {
        self.state.lock().stats.clone()
    }
}

impl<T: Copy> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Ring")
            .field("size", &self.size)
            .field("slots", &self.slots)
            .field("in", &state.write_cursor)
            .field("out", &state.read_cursor)
            .field("len", &state.occupancy())
            .finish_non_exhaustive()
    }
}
