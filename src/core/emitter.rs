//! Event emission shared by the worker loop and its sessions.
//!
//! Every event goes to both the broadcast [`Bus`] (for `Worker::subscribe`
//! receivers) and the worker's [`SubscriberSet`]. Neither path can block.

use std::sync::Arc;

use crate::events::{Bus, Event};
use crate::subscribers::SubscriberSet;

pub(crate) struct Emitter<'a> {
    bus: &'a Bus,
    subscribers: &'a SubscriberSet,
    service: Option<Arc<str>>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(bus: &'a Bus, subscribers: &'a SubscriberSet, service: Option<Arc<str>>) -> Self {
        Self {
            bus,
            subscribers,
            service,
        }
    }

    /// Stamps the service label and publishes.
    pub(crate) fn emit(&self, mut ev: Event) {
        if let Some(service) = &self.service {
            ev.service = Some(Arc::clone(service));
        }
        let ev = Arc::new(ev);
        if !self.subscribers.is_empty() {
            self.subscribers.emit_arc(Arc::clone(&ev));
        }
        self.bus.publish(Arc::unwrap_or_clone(ev));
    }
}
