//! # Slot
//!
//! The message carried through the ring: who sent it, and what it says.

use std::fmt;

/// A single ring message.
///
/// Plain data. Copied into the ring on `put` and back out on `get`; the ring
/// never hands out references to its storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    /// Identifier of the thread that produced the message.
    pub thread_id: u32,
    /// Payload.
    pub value: i32,
}

impl Slot {
    /// Creates a new slot.
    #[inline]
    #[must_use]
    pub const fn new(thread_id: u32, value: i32) -> Self {
        Self { thread_id, value }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{thread {}: {}}}", self.thread_id, self.value)
    }
}
