//! # Broadcast side of the worker's event stream.
//!
//! Every event a worker emits is also published on its [`Bus`], together
//! with subscriber overflow and panic reports. `Worker::subscribe` hands out
//! receivers, which is how tests and embedding code watch a running worker
//! without installing a [`Subscribe`](crate::Subscribe).
//!
//! The channel holds `WorkerConfig::bus_capacity` events. A receiver that
//! falls behind gets `RecvError::Lagged` and resumes from the oldest kept
//! event; events published while nobody listens are gone.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to a worker's event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Sends `ev` to current receivers; never blocks.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
