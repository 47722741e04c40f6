//! Retry policy for image downloads
//!
//! The policy itself is immutable and shared by a whole run; every download
//! asks it for a brand new backoff sequence so concurrent downloads never
//! advance each other's delays.

use crate::config::RetryConfig;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Duration,
    max_elapsed: Option<Duration>,
    randomization_factor: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.initial_interval),
            multiplier: config.multiplier,
            max_interval: Duration::from_millis(config.max_interval),
            max_elapsed: Some(Duration::from_secs(config.max_elapsed)),
            randomization_factor: config.randomization_factor,
        }
    }

    /// Fresh backoff sequence for one download
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_multiplier(self.multiplier)
            .with_max_interval(self.max_interval)
            .with_randomization_factor(self.randomization_factor)
            .with_max_elapsed_time(self.max_elapsed)
            .build()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
