//! # Reconnect backoff.
//!
//! [`BackoffPolicy`] describes how the wait between reconnect attempts grows;
//! [`Backoff`] is the per-worker state that walks through those delays.
//!
//! The growth rule is "sleep, then double if still at or below the
//! threshold". With the defaults (`first = 1s`, `factor = 2`, `threshold = 4s`)
//! consecutive failures wait:
//!
//! ```text
//! attempt:  1    2    3    4    5    6 ...
//! delay:    1s   2s   4s   8s   8s   8s
//! ```
//!
//! The sequence settles at `8s` because growth is checked *before* doubling:
//! `4s <= threshold` still doubles once. A successful connection calls
//! [`Backoff::reset`], so the next failure waits `first` again.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use rpc_worker::BackoffPolicy;
//!
//! let mut backoff = BackoffPolicy::default().start();
//! assert_eq!(backoff.next_delay(), Duration::from_secs(1));
//! assert_eq!(backoff.next_delay(), Duration::from_secs(2));
//! assert_eq!(backoff.next_delay(), Duration::from_secs(4));
//! assert_eq!(backoff.next_delay(), Duration::from_secs(8));
//! assert_eq!(backoff.next_delay(), Duration::from_secs(8));
//!
//! backoff.reset();
//! assert_eq!(backoff.next_delay(), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Reconnect backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Multiplicative growth factor applied while the delay is at or below `threshold`.
    pub factor: f64,
    /// Largest delay that is still allowed to grow.
    pub threshold: Duration,
    /// Randomization applied to each returned delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns `first = 1s`, `factor = 2.0`, `threshold = 4s`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            factor: 2.0,
            threshold: Duration::from_secs(4),
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Starts a fresh delay sequence.
    pub fn start(self) -> Backoff {
        Backoff {
            current: self.first,
            policy: self,
        }
    }

    fn grow(&self, current: Duration) -> Duration {
        if current > self.threshold {
            return current;
        }
        let next = current.as_secs_f64() * self.factor;
        if !next.is_finite() || next < 0.0 {
            return current;
        }
        Duration::try_from_secs_f64(next).unwrap_or(current)
    }
}

/// Mutable delay state for one worker.
#[derive(Clone, Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    /// Returns the delay to sleep now and advances the sequence.
    ///
    /// Jitter is applied to the returned value only; it never feeds back
    /// into the base sequence.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.current;
        self.current = self.policy.grow(base);
        self.policy.jitter.apply(base)
    }

    /// Base delay the next call to [`next_delay`](Self::next_delay) will use.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Restarts the sequence at `first`. Called after a successful connect.
    pub fn reset(&mut self) {
        self.current = self.policy.first;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence_settles_at_eight_seconds() {
        let mut b = BackoffPolicy::default().start();
        let got: Vec<u64> = (0..6).map(|_| b.next_delay().as_secs()).collect();
        assert_eq!(got, vec![1, 2, 4, 8, 8, 8]);
    }

    #[test]
    fn test_reset_returns_to_first() {
        let mut b = BackoffPolicy::default().start();
        b.next_delay();
        b.next_delay();
        assert_eq!(b.current(), Duration::from_secs(4));

        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_constant_factor() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(500),
            factor: 1.0,
            threshold: Duration::from_secs(30),
            jitter: JitterPolicy::None,
        };
        let mut b = policy.start();
        for attempt in 0..10 {
            assert_eq!(
                b.next_delay(),
                Duration::from_millis(500),
                "attempt {} should be constant at 500ms",
                attempt
            );
        }
    }

    #[test]
    fn test_first_above_threshold_never_grows() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            factor: 2.0,
            threshold: Duration::from_secs(4),
            jitter: JitterPolicy::None,
        };
        let mut b = policy.start();
        assert_eq!(b.next_delay(), Duration::from_secs(10));
        assert_eq!(b.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_does_not_feed_back() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Full,
            ..BackoffPolicy::default()
        };
        let mut b = policy.start();
        for expected in [1u64, 2, 4, 8, 8] {
            let delay = b.next_delay();
            assert!(delay <= Duration::from_secs(expected));
        }
        assert_eq!(b.current(), Duration::from_secs(8));
    }

    #[test]
    fn test_overflowing_factor_keeps_current() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(1),
            factor: f64::INFINITY,
            threshold: Duration::from_secs(4),
            jitter: JitterPolicy::None,
        };
        let mut b = policy.start();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }
}
