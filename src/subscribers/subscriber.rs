//! # Hook for observing a worker from inside the process.
//!
//! Implement [`Subscribe`] to receive every [`Event`] a worker produces:
//! connects, heartbeats, served and failed requests, the stop handshake.
//! Pass implementations to `WorkerBuilder::with_subscribers`.
//!
//! Delivery goes through a bounded queue owned by `SubscriberSet`, so
//! `on_event` may await (write to a socket, update a metric) without
//! delaying heartbeat echoes. If it falls more than `queue_capacity` events
//! behind, later events are dropped for it and `SubscriberOverflow` is
//! published on the bus.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use rpc_worker::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::RequestFailed) {
//!             // export a metric, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//!     fn queue_capacity(&self) -> usize { 2048 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of worker events.
///
/// A panic in `on_event` is caught and reported as `SubscriberPanicked`;
/// the subscriber keeps receiving later events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event, on the subscriber's own task.
    async fn on_event(&self, event: &Event);

    /// Name reported in overflow and panic events. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Events that may wait for this subscriber before drops start (minimum 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
