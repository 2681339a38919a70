//! Reconnect policies.
//!
//! ## Contents
//! - [`BackoffPolicy`] how reconnect delays evolve (first / factor / threshold + jitter)
//! - [`Backoff`]       per-worker delay state (`next_delay`, `reset`)
//! - [`JitterPolicy`]  randomization strategy to avoid reconnect storms
//!
//! ## Quick wiring
//! ```text
//! WorkerConfig { backoff: BackoffPolicy, .. }
//!      └─► core::worker::Worker::run uses:
//!           - backoff.next_delay() after every failed connect or lost session
//!           - backoff.reset() after every successful connect
//! ```

mod backoff;
mod jitter;

pub use backoff::{Backoff, BackoffPolicy};
pub use jitter::JitterPolicy;
