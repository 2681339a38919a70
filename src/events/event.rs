//! # Runtime events emitted by the worker.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Connection events**: connect attempts, failures, backoff, teardown
//! - **Heartbeat events**: received, staleness
//! - **Request events**: requests served or failed
//! - **Shutdown events**: stop requested, stop confirmed, worker terminated
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! endpoint, method name, sequence id, reasons and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use rpc_worker::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RequestFailed)
//!     .with_method("sayHello")
//!     .with_seq_id(7)
//!     .with_reason("handler failed: boom")
//!     .with_elapsed(Duration::from_millis(3));
//!
//! assert_eq!(ev.kind, EventKind::RequestFailed);
//! assert_eq!(ev.method.as_deref(), Some("sayHello"));
//! assert_eq!(ev.seq_id, Some(7));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: `"full"` or `"closed"`
    SubscriberOverflow,

    // === Connection events ===
    /// A connect attempt is starting.
    ///
    /// Sets:
    /// - `endpoint`
    /// - `attempt`: consecutive attempt number since the last success (1-based)
    Connecting,

    /// The connection is open; backoff was reset.
    ///
    /// Sets:
    /// - `endpoint`
    /// - `attempt`: attempt that succeeded
    Connected,

    /// The connect attempt failed.
    ///
    /// Sets:
    /// - `endpoint`
    /// - `attempt`
    /// - `reason`: error message
    ConnectFailed,

    /// The worker is about to sleep before reconnecting.
    ///
    /// Sets:
    /// - `endpoint`
    /// - `attempt`: attempt that just failed (or the connection that was lost)
    /// - `delay_ms`: sleep duration
    /// - `reason`: why the previous attempt/session ended
    BackoffScheduled,

    /// An open connection was torn down after a transport or decode failure.
    ///
    /// Sets:
    /// - `endpoint`
    /// - `reason`: error message
    /// - `elapsed_ms`: how long the session lasted
    ConnectionLost,

    // === Heartbeat events ===
    /// A heartbeat was received and echoed.
    ///
    /// Sets:
    /// - `endpoint`
    /// - `method`: heartbeat name
    /// - `seq_id`
    HeartbeatReceived,

    /// No heartbeat arrived within the staleness threshold.
    ///
    /// Sets:
    /// - `endpoint`
    /// - `elapsed_ms`: time since the last heartbeat
    HeartbeatStale,

    // === Request events ===
    /// A request was processed and its reply (if any) flushed.
    ///
    /// Sets:
    /// - `method`, `seq_id`
    /// - `elapsed_ms`: processing plus flush time
    RequestServed,

    /// The processor failed; an exception reply was sent.
    ///
    /// Sets:
    /// - `method`, `seq_id`
    /// - `reason`: processor error
    /// - `elapsed_ms`
    RequestFailed,

    // === Shutdown events ===
    /// The stop predicate returned true and STOP was sent to the proxy.
    ///
    /// Sets:
    /// - `endpoint`
    StopRequested,

    /// The proxy confirmed the stop.
    ///
    /// Sets:
    /// - `endpoint`
    StopConfirmed,

    /// `Worker::run` is returning.
    WorkerTerminated,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Service label of the emitting worker.
    pub service: Option<Arc<str>>,
    /// Proxy endpoint, rendered.
    pub endpoint: Option<Arc<str>>,
    /// Message name (method or control message).
    pub method: Option<Arc<str>>,
    /// Message sequence id.
    pub seq_id: Option<i32>,
    /// Connect attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Elapsed time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Subscriber name, for subscriber events.
    pub subscriber: Option<&'static str>,
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            endpoint: None,
            method: None,
            seq_id: None,
            attempt: None,
            delay_ms: None,
            elapsed_ms: None,
            reason: None,
            subscriber: None,
        }
    }

    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    #[inline]
    pub fn with_endpoint(mut self, endpoint: impl Into<Arc<str>>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[inline]
    pub fn with_method(mut self, method: impl Into<Arc<str>>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[inline]
    pub fn with_seq_id(mut self, seq_id: i32) -> Self {
        self.seq_id = Some(seq_id);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an elapsed time (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Backoff delay, if set.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(|ms| Duration::from_millis(u64::from(ms)))
    }

    /// Elapsed time, if set.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed_ms.map(|ms| Duration::from_millis(u64::from(ms)))
    }

    /// True for events that report a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ConnectFailed
                | EventKind::ConnectionLost
                | EventKind::HeartbeatStale
                | EventKind::RequestFailed
                | EventKind::SubscriberPanicked
                | EventKind::SubscriberOverflow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::Connecting);
        let b = Event::new(EventKind::Connected);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_compacted_to_millis() {
        let ev = Event::new(EventKind::BackoffScheduled)
            .with_delay(Duration::from_secs(4))
            .with_elapsed(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay(), Some(Duration::from_secs(4)));
        assert_eq!(ev.elapsed_ms, Some(u32::MAX));
    }

    #[test]
    fn subscriber_events_carry_name() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert_eq!(ev.subscriber, Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
        assert!(ev.is_failure());
    }
}
