//! # Ring Configuration
//!
//! A ring takes exactly one construction parameter: how many slots it has.
//! The size is kept signed here so that a negative value in a config file is
//! reported as a size error instead of a parse error.

use serde::{Deserialize, Serialize};

use crate::error::{RingError, RingResult};

/// Default slot count when a config file leaves it out.
pub const DEFAULT_RING_SIZE: i64 = 8;

/// Construction config for a [`Ring`](crate::Ring).
///
/// ```toml
/// size = 16
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Number of slots the buffer holds before producers block.
    pub size: i64,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_RING_SIZE,
        }
    }
}

impl RingConfig {
    /// Creates a config for the given size. Not validated until the ring is built.
    #[must_use]
    pub const fn with_size(size: i64) -> Self {
        Self { size }
    }

    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::InvalidConfig`] if the text is not valid TOML or
    /// has the wrong shape.
    pub fn from_toml_str(text: &str) -> RingResult<Self> {
        toml::from_str(text).map_err(|e| RingError::InvalidConfig(e.to_string()))
    }

    /// Checks the size and converts it to a slot count.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::CapacityTooSmall`] if the size is below one.
    pub fn validated_size(&self) -> RingResult<usize> {
        if self.size < 1 {
            return Err(RingError::CapacityTooSmall {
                requested: self.size,
            });
        }
        usize::try_from(self.size)
            .map_err(|_| RingError::InvalidConfig(format!("ring size {} overflows", self.size)))
    }
}
