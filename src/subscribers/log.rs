//! # Logging subscriber backed by `tracing`.
//!
//! [`LogWriter`] turns worker events into `tracing` records with structured
//! fields. The binary decides where records go (e.g. `tracing_subscriber::fmt`).
//!
//! | Level   | Events                                                              |
//! |---------|---------------------------------------------------------------------|
//! | `debug` | heartbeat received, request served, connecting                      |
//! | `info`  | connected, stop requested/confirmed, worker terminated, backoff     |
//! | `warn`  | connect failed, connection lost, heartbeat stale, request failed,   |
//! |         | subscriber overflow/panic                                           |
//!
//! ## Example
//! ```no_run
//! # use rpc_worker::{Endpoint, LogWriter, ProcessorFn, Subscribe, Worker};
//! # use std::sync::Arc;
//! # let processor = ProcessorFn::arc(|_, _, _| Ok(()));
//! let worker = Worker::builder(Endpoint::unix("/run/proxy.sock"), processor)
//!     .with_subscribers(vec![Arc::new(LogWriter::default()) as Arc<dyn Subscribe>])
//!     .build();
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Forwards events to `tracing` under the `rpc_worker` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref();
        let endpoint = e.endpoint.as_deref();
        let method = e.method.as_deref();
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::Connecting => {
                debug!(target: "rpc_worker", service, endpoint, attempt = e.attempt, "connecting");
            }
            EventKind::Connected => {
                info!(target: "rpc_worker", service, endpoint, attempt = e.attempt, "connected");
            }
            EventKind::ConnectFailed => {
                warn!(target: "rpc_worker", service, endpoint, attempt = e.attempt, error = reason, "connect failed");
            }
            EventKind::BackoffScheduled => {
                info!(
                    target: "rpc_worker",
                    service, endpoint,
                    attempt = e.attempt,
                    delay_ms = e.delay_ms,
                    error = reason,
                    "reconnect scheduled"
                );
            }
            EventKind::ConnectionLost => {
                warn!(target: "rpc_worker", service, endpoint, error = reason, elapsed_ms = e.elapsed_ms, "connection lost");
            }
            EventKind::HeartbeatReceived => {
                debug!(target: "rpc_worker", service, endpoint, name = method, seq_id = e.seq_id, "heartbeat");
            }
            EventKind::HeartbeatStale => {
                warn!(target: "rpc_worker", service, endpoint, elapsed_ms = e.elapsed_ms, "heartbeat stale");
            }
            EventKind::RequestServed => {
                debug!(target: "rpc_worker", service, endpoint, method, seq_id = e.seq_id, elapsed_ms = e.elapsed_ms, "request served");
            }
            EventKind::RequestFailed => {
                warn!(
                    target: "rpc_worker",
                    service, endpoint, method,
                    seq_id = e.seq_id,
                    elapsed_ms = e.elapsed_ms,
                    error = reason,
                    "request failed"
                );
            }
            EventKind::StopRequested => {
                info!(target: "rpc_worker", service, endpoint, "stop requested");
            }
            EventKind::StopConfirmed => {
                info!(target: "rpc_worker", service, endpoint, "stop confirmed");
            }
            EventKind::WorkerTerminated => {
                info!(target: "rpc_worker", service, "worker terminated");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "rpc_worker", subscriber = e.subscriber, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: "rpc_worker", subscriber = e.subscriber, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
