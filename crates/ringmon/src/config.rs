//! # Workload Configuration
//!
//! Loaded once at startup, from TOML or from one of the presets.
//!
//! ```toml
//! producers = 4
//! consumers = 2
//! messages_per_producer = 1000
//! seed = 7
//! max_jitter_us = 50
//!
//! [ring]
//! size = 8
//! ```

use std::path::Path;

use ringmon_core::RingConfig;
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, DriverResult};

/// Shape of a producer/consumer run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of producer threads.
    pub producers: usize,
    /// Number of consumer threads.
    pub consumers: usize,
    /// Slots each producer puts.
    pub messages_per_producer: u32,
    /// Seed for the per-worker jitter generators.
    pub seed: u64,
    /// Upper bound on the random pause between operations (0 = none).
    pub max_jitter_us: u64,
    /// The shared ring.
    pub ring: RingConfig,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            producers: 2,
            consumers: 2,
            messages_per_producer: 100,
            seed: 0,
            max_jitter_us: 0,
            ring: RingConfig::default(),
        }
    }
}

impl WorkloadConfig {
    /// Small, fast run with jitter so interleavings vary.
    #[must_use]
    pub const fn smoke() -> Self {
        Self {
            producers: 2,
            consumers: 2,
            messages_per_producer: 50,
            seed: 1,
            max_jitter_us: 20,
            ring: RingConfig::with_size(3),
        }
    }

    /// Many workers hammering a tiny ring, no jitter.
    ///
    /// The ring is deliberately smaller than the worker count so both
    /// condition variables see constant traffic.
    #[must_use]
    pub const fn stress() -> Self {
        Self {
            producers: 8,
            consumers: 8,
            messages_per_producer: 5_000,
            seed: 0,
            max_jitter_us: 0,
            ring: RingConfig::with_size(4),
        }
    }

    /// Parses a config from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Config`] on malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> DriverResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> DriverResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks worker counts and value ranges.
    ///
    /// The ring size is checked separately, when the ring is built.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Config`] describing the first bad field.
    pub fn validate(&self) -> DriverResult<()> {
        if self.producers == 0 {
            return Err(DriverError::Config("need at least one producer".into()));
        }
        if self.consumers == 0 {
            return Err(DriverError::Config("need at least one consumer".into()));
        }
        if u32::try_from(self.producers).is_err() {
            return Err(DriverError::Config(format!(
                "{} producers do not fit a thread id",
                self.producers
            )));
        }
        if i32::try_from(self.messages_per_producer).is_err() {
            return Err(DriverError::Config(format!(
                "{} messages per producer do not fit a slot value",
                self.messages_per_producer
            )));
        }
        Ok(())
    }

    /// Total slots the run moves through the ring.
    #[must_use]
    pub fn total_messages(&self) -> usize {
        self.producers * self.messages_per_producer as usize
    }

    /// How many slots consumer `index` takes. The remainder goes to the
    /// lowest-numbered consumers.
    #[must_use]
    pub fn consumer_share(&self, index: usize) -> usize {
        let total = self.total_messages();
        total / self.consumers + usize::from(index < total % self.consumers)
    }
}
