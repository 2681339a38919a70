//! # Worker: keeps one registration with the proxy alive.
//!
//! The [`Worker`] owns the endpoint, the processor, the reconnect policy and
//! the `alive` flag. [`Worker::run`] connects, serves a [`Session`] until it
//! ends, backs off, and repeats until the proxy confirms a stop.
//!
//! ## Lifecycle
//! ```text
//!            ┌──────────── connect failed: sleep backoff, grow ───────────┐
//!            ▼                                                            │
//!   ┌──────────────┐  connected: reset backoff   ┌──────────────┐         │
//!   │  CONNECTING  │ ──────────────────────────► │   SERVING    │         │
//!   └──────────────┘                             └──────┬───────┘         │
//!            ▲                                          │                 │
//!            └──── session error: close, sleep, grow ───┤                 │
//!                                                       │ STOP_CONFIRM    │
//!                                                       ▼                 │
//!                                                ┌──────────────┐         │
//!                                                │  TERMINATED  │ ◄───────┘ (never)
//!                                                └──────────────┘
//! ```
//!
//! ## Rules
//! - `run()` surfaces no errors; every failure becomes an event and a reconnect.
//! - `alive` goes from true to false exactly once, on stop confirmation.
//! - There is no forced kill: stopping goes through the STOP / STOP_CONFIRM handshake.
//!
//! ## Example
//! ```no_run
//! use rpc_worker::{Endpoint, MessageType, ProcessError, ProcessorFn, Worker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor = ProcessorFn::arc(|header, _input, output| {
//!         if header.name != "ping" {
//!             return Err(ProcessError::UnknownMethod(header.name.clone()));
//!         }
//!         output.write_message_begin(&header.with_kind(MessageType::Reply));
//!         output.write_field_stop();
//!         Ok(())
//!     });
//!
//!     let worker = Worker::builder(Endpoint::parse("/run/proxy/backend.sock", 0)?, processor)
//!         .service("ping")
//!         .build();
//!
//!     rpc_worker::stop_on_signal(worker.stop_handle());
//!     worker.run().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use super::builder::WorkerBuilder;
use super::config::WorkerConfig;
use super::emitter::Emitter;
use super::session::{Session, SessionEnd};
use super::stop::StopHandle;
use crate::events::{Bus, Event, EventKind};
use crate::policies::Backoff;
use crate::processor::ProcessorRef;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::transport::{Connect, Connection, Endpoint};

/// Long-running RPC worker bound to one proxy endpoint.
pub struct Worker {
    pub(super) endpoint: Endpoint,
    pub(super) processor: ProcessorRef,
    pub(super) connector: Arc<dyn Connect>,
    pub(super) cfg: WorkerConfig,
    pub(super) alive: AtomicBool,
    pub(super) stop: StopHandle,
    pub(super) bus: Bus,
    pub(super) subscribers: Vec<Arc<dyn Subscribe>>,
    pub(super) service: Option<Arc<str>>,
}

impl Worker {
    /// Starts building a worker for `endpoint` that dispatches to `processor`.
    pub fn builder(endpoint: Endpoint, processor: ProcessorRef) -> WorkerBuilder {
        WorkerBuilder::new(endpoint, processor)
    }

    /// Runs until the proxy confirms a stop.
    ///
    /// Subscriber workers are spawned on entry and drained before returning.
    pub async fn run(&self) {
        let subscribers = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        let emitter = Emitter::new(&self.bus, &subscribers, self.service.clone());
        let endpoint: Arc<str> = self.endpoint.to_string().into();

        let mut backoff = self.cfg.backoff.start();
        let mut attempt: u32 = 0;

        while self.alive.load(Ordering::Acquire) {
            attempt = attempt.saturating_add(1);
            emitter.emit(
                Event::new(EventKind::Connecting)
                    .with_endpoint(Arc::clone(&endpoint))
                    .with_attempt(attempt),
            );

            let stream = match self.connector.connect(&self.endpoint).await {
                Ok(stream) => stream,
                Err(e) => {
                    let reason = e.to_string();
                    emitter.emit(
                        Event::new(EventKind::ConnectFailed)
                            .with_endpoint(Arc::clone(&endpoint))
                            .with_attempt(attempt)
                            .with_reason(reason.as_str()),
                    );
                    Self::sleep_backoff(&emitter, &mut backoff, &endpoint, Some(attempt), &reason)
                        .await;
                    continue;
                }
            };

            backoff.reset();
            emitter.emit(
                Event::new(EventKind::Connected)
                    .with_endpoint(Arc::clone(&endpoint))
                    .with_attempt(attempt),
            );
            attempt = 0;

            let conn = Connection::new(stream, self.endpoint.clone(), self.cfg.max_frame_length);
            let started = Instant::now();
            let session = Session::new(conn, &*self.processor, &self.cfg, &self.stop, &emitter);

            match session.run().await {
                Ok(SessionEnd::StopConfirmed) => {
                    self.alive.store(false, Ordering::Release);
                }
                Err(e) => {
                    let reason = e.to_string();
                    emitter.emit(
                        Event::new(EventKind::ConnectionLost)
                            .with_endpoint(Arc::clone(&endpoint))
                            .with_reason(reason.as_str())
                            .with_elapsed(started.elapsed()),
                    );
                    Self::sleep_backoff(&emitter, &mut backoff, &endpoint, None, &reason).await;
                }
            }
        }

        emitter.emit(Event::new(EventKind::WorkerTerminated).with_endpoint(endpoint));
        drop(emitter);
        subscribers.shutdown().await;
    }

    async fn sleep_backoff(
        emitter: &Emitter<'_>,
        backoff: &mut Backoff,
        endpoint: &Arc<str>,
        attempt: Option<u32>,
        reason: &str,
    ) {
        let delay: Duration = backoff.next_delay();
        let mut ev = Event::new(EventKind::BackoffScheduled)
            .with_endpoint(Arc::clone(endpoint))
            .with_delay(delay)
            .with_reason(reason);
        if let Some(n) = attempt {
            ev = ev.with_attempt(n);
        }
        emitter.emit(ev);
        tokio::time::sleep(delay).await;
    }

    /// False once the proxy has confirmed a stop.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Handle for installing the stop predicate.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Receiver for all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Endpoint this worker connects to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Active configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.cfg
    }
}
