//! # Per-subscriber delivery queues for worker events.
//!
//! The session emits an event on every heartbeat and every request, so
//! delivery to subscribers must never hold up the connection. [`SubscriberSet`]
//! gives each subscriber its own bounded queue and task; `emit` only enqueues.
//!
//! ```text
//! Session / Worker::run
//!     │ emit_arc(Arc<Event>)            try_send, never awaits
//!     ├──► [queue: log] ─────► LogWriter::on_event ──► tracing
//!     └──► [queue: metrics] ─► custom on_event
//!                                   │ panic
//!                                   └──► Bus: SubscriberPanicked{subscriber, reason}
//! ```
//!
//! ## Rules
//! - A full or closed queue loses the event for that subscriber alone and a
//!   `SubscriberOverflow` naming it goes to the bus (never to the queues, so
//!   a stuck subscriber cannot feed itself overflow reports).
//! - Each subscriber sees its events in emission order; there is no ordering
//!   between subscribers.
//! - A panic inside `on_event` is caught, reported, and the task moves on to
//!   the next queued event.
//! - [`SubscriberSet::shutdown`] closes the queues and waits until every
//!   subscriber has drained them; `Worker::run` calls it before returning.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Queues and delivery tasks for the subscribers of one `Worker::run` call.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    tasks: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one delivery task per subscriber; overflow and panic reports go to `bus`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut tasks = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let reports = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());

                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(&*panic_err);
                        reports.publish(Event::subscriber_panicked(name, info));
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            tasks.push(handle);
        }
        Self {
            channels,
            tasks,
            bus,
        }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Enqueues a shared event for every subscriber without waiting.
    ///
    /// An overflow report that itself overflows is dropped silently.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// True if there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Closes the queues and waits for every subscriber to drain its backlog.
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.tasks {
            let _ = h.await;
        }
    }
}
