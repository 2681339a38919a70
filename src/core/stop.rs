//! # Stop predicate side channel.
//!
//! The worker asks "should I stop?" right after echoing each heartbeat. The
//! answer comes from a predicate installed through a [`StopHandle`]; any
//! number of clones may exist (signal handlers, admin endpoints, tests).
//!
//! ## Rules
//! - No predicate installed → never stop.
//! - The predicate is polled on the session task; keep it cheap and non-blocking.
//! - Installing a new predicate replaces the previous one.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Shared, replaceable stop predicate.
#[derive(Clone, Default)]
pub struct StopHandle {
    slot: Arc<RwLock<Option<Predicate>>>,
}

impl StopHandle {
    /// Creates a handle with no predicate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `predicate`, replacing any previous one.
    pub fn set<F>(&self, predicate: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        *self.slot.write() = Some(Arc::new(predicate));
    }

    /// Removes the predicate.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// Installs an always-true predicate.
    pub fn request(&self) {
        self.set(|| true);
    }

    /// Evaluates the predicate. The lock is not held during the call.
    pub fn poll(&self) -> bool {
        let predicate = self.slot.read().clone();
        predicate.is_some_and(|f| f())
    }

    /// True if a predicate is installed.
    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopHandle")
            .field("installed", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn absent_predicate_never_stops() {
        let h = StopHandle::new();
        assert!(!h.poll());
        assert!(!h.is_set());
    }

    #[test]
    fn clones_share_the_slot() {
        let h = StopHandle::new();
        let flag = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&flag);
        h.clone().set(move || f.load(Ordering::SeqCst));

        assert!(!h.poll());
        flag.store(true, Ordering::SeqCst);
        assert!(h.poll());

        h.clear();
        assert!(!h.poll());
    }

    #[test]
    fn request_installs_always_true() {
        let h = StopHandle::new();
        h.request();
        assert!(h.poll());
    }
}
