//! Runtime core: the worker loop and its sessions.
//!
//! The public API from this module is [`Worker`] (with [`WorkerBuilder`]
//! and [`WorkerConfig`]), the [`StopHandle`] side channel and
//! [`stop_on_signal`].
//!
//! Internal modules:
//! - [`worker`]: connect / serve / back off until stop confirmation;
//! - [`session`]: one connection: staleness, heartbeats, stop handshake, dispatch;
//! - [`emitter`]: publishes events to the bus and the subscriber set;
//! - [`stop`]: replaceable stop predicate;
//! - [`shutdown`]: cross-platform OS signal handling.

mod builder;
mod config;
mod emitter;
mod session;
mod shutdown;
mod stop;
mod worker;

pub use builder::WorkerBuilder;
pub use config::WorkerConfig;
pub use session::SessionEnd;
pub use shutdown::stop_on_signal;
pub use stop::StopHandle;
pub use worker::Worker;
