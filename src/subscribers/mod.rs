//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out and (with the `logging` feature) the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Worker / Session ── emit(Event) ──► SubscriberSet ──► per-subscriber queues
//!        │                                                 │
//!        └── publish(Event) ──► Bus ──► Worker::subscribe() receivers
//!                                                          ▼
//!                                      LogWriter   Metrics   Custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
