//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound backend connect time
//! - Bound each backend exchange (request sent, full response read)
//! - Bound the whole client request, redirect hops included
//!
//! # Design Decisions
//! - Every backend call has a deadline; nothing is retried
//! - Timed-out relays return 504 Gateway Timeout
//! - A timed-out login leaves the proxy anonymous

use std::time::Duration;

use crate::config::TimeoutConfig;

/// Deadlines applied to backend traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub connect: Duration,
    pub backend: Duration,
    pub request: Duration,
}

impl TimeoutPolicy {
    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            backend: Duration::from_secs(config.backend_secs),
            request: Duration::from_secs(config.request_secs),
        }
    }

    /// Apply the per-connection and per-exchange deadlines to a client builder.
    pub fn apply(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        builder.connect_timeout(self.connect).timeout(self.backend)
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::from_config(&TimeoutConfig::default())
    }
}
