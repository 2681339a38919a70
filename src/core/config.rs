//! # Worker configuration.
//!
//! Provides [`WorkerConfig`]: timeouts, frame limit, reconnect policy and
//! event bus size for one worker.
//!
//! ## Sentinel values
//! - `connect_timeout = 0s` → wait on the OS connect timeout
//! - `write_timeout = 0s` → writes may block indefinitely
//!
//! `read_timeout` and `heartbeat_timeout` have no sentinel and are independent:
//! nothing requires one to be a multiple of the other.

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Configuration for one worker.
///
/// ## Field semantics
/// - `read_timeout`: bound on one frame read; an idle read returns to the staleness check
/// - `heartbeat_timeout`: maximum silence from the proxy before the connection is dropped
/// - `connect_timeout`: bound on opening the socket (`0s` = none)
/// - `write_timeout`: bound on writing one frame (`0s` = none)
/// - `max_frame_length`: frames announcing a larger length are connection-fatal
/// - `backoff`: reconnect delay policy
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub read_timeout: Duration,
    pub heartbeat_timeout: Duration,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub max_frame_length: usize,
    pub backoff: BackoffPolicy,
    pub bus_capacity: usize,
}

impl WorkerConfig {
    /// Connect timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn connect_timeout_opt(&self) -> Option<Duration> {
        if self.connect_timeout == Duration::ZERO {
            None
        } else {
            Some(self.connect_timeout)
        }
    }

    /// Write timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn write_timeout_opt(&self) -> Option<Duration> {
        if self.write_timeout == Duration::ZERO {
            None
        } else {
            Some(self.write_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for WorkerConfig {
    /// Default configuration:
    ///
    /// - `read_timeout = 5s`
    /// - `heartbeat_timeout = 10s`
    /// - `connect_timeout = 100ms`
    /// - `write_timeout = 100ms`
    /// - `max_frame_length = 16 MiB`
    /// - `backoff = BackoffPolicy::default()` (1s, ×2 while ≤ 4s)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            heartbeat_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_millis(100),
            write_timeout: Duration::from_millis(100),
            max_frame_length: 16 * 1024 * 1024,
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeouts_mean_none() {
        let cfg = WorkerConfig {
            connect_timeout: Duration::ZERO,
            write_timeout: Duration::ZERO,
            bus_capacity: 0,
            ..WorkerConfig::default()
        };
        assert_eq!(cfg.connect_timeout_opt(), None);
        assert_eq!(cfg.write_timeout_opt(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn defaults_match_proxy_expectations() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.read_timeout, Duration::from_secs(5));
        assert_eq!(cfg.heartbeat_timeout, Duration::from_secs(10));
        assert_eq!(cfg.connect_timeout_opt(), Some(Duration::from_millis(100)));
        assert_eq!(cfg.backoff.first, Duration::from_secs(1));
    }
}
