//! # One serving session over one connection.
//!
//! A [`Session`] owns the [`Connection`] from the moment it opens until it is
//! torn down. Requests are handled strictly one at a time, in arrival order.
//!
//! ## Serving loop
//! ```text
//! loop {
//!   ├─► now - last_heartbeat > heartbeat_timeout ─► HeartbeatStale, teardown
//!   ├─► read_frame(read_timeout)
//!   │     ├─ Idle         ─► continue (back to the staleness check)
//!   │     └─ Frame(bytes) ─► read_message_begin
//!   │
//!   ├─ HEARTBEAT    ─► echo {name, type, seq} ─► refresh last_heartbeat
//!   │                  └─► poll stop predicate ─► true (first of a run) ─► send STOP
//!   ├─ STOP_CONFIRM ─► return StopConfirmed
//!   └─ anything else ─► processor.process(header, body, fresh writer)
//!                        ├─ Ok  ─► flush writer (nothing if empty)
//!                        └─ Err / panic ─► discard writer, EXCEPTION reply for the same seq id
//! }
//! ```
//!
//! ## Rules
//! - Any transport or decode error ends the session (the worker reconnects).
//! - A processor error or panic never ends the session.
//! - STOP is sent at most once per run of positive polls; a negative poll re-arms it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use tokio::time::Instant;

use super::config::WorkerConfig;
use super::emitter::Emitter;
use super::stop::StopHandle;
use crate::error::{ProcessError, SessionError, panic_message};
use crate::events::{Event, EventKind};
use crate::processor::Processor;
use crate::protocol::{ApplicationException, BinaryReader, BinaryWriter, MessageHeader, MessageType};
use crate::transport::{Connection, ReadOutcome};

/// How a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The proxy acknowledged the stop request; the worker must terminate.
    StopConfirmed,
}

pub(crate) struct Session<'a> {
    conn: Connection,
    processor: &'a dyn Processor,
    cfg: &'a WorkerConfig,
    stop: &'a StopHandle,
    emitter: &'a Emitter<'a>,
    endpoint: Arc<str>,
    last_heartbeat_at: Instant,
    stop_sent: bool,
}

impl<'a> Session<'a> {
    /// Starts a session on a freshly opened connection.
    ///
    /// The heartbeat clock starts now, and the stop latch starts re-armed so
    /// a new proxy connection learns about a pending drain.
    pub(crate) fn new(
        conn: Connection,
        processor: &'a dyn Processor,
        cfg: &'a WorkerConfig,
        stop: &'a StopHandle,
        emitter: &'a Emitter<'a>,
    ) -> Self {
        let endpoint: Arc<str> = conn.endpoint().to_string().into();
        Self {
            conn,
            processor,
            cfg,
            stop,
            emitter,
            endpoint,
            last_heartbeat_at: Instant::now(),
            stop_sent: false,
        }
    }

    /// Serves until the connection fails or the proxy confirms a stop.
    /// The connection is closed on return either way.
    pub(crate) async fn run(mut self) -> Result<SessionEnd, SessionError> {
        let result = self.serve().await;
        self.conn.close();
        result
    }

    async fn serve(&mut self) -> Result<SessionEnd, SessionError> {
        loop {
            let silent = self.last_heartbeat_at.elapsed();
            if silent > self.cfg.heartbeat_timeout {
                self.emitter.emit(
                    Event::new(EventKind::HeartbeatStale)
                        .with_endpoint(Arc::clone(&self.endpoint))
                        .with_elapsed(silent),
                );
                return Err(SessionError::HeartbeatStale {
                    elapsed: silent,
                    limit: self.cfg.heartbeat_timeout,
                });
            }

            let frame = match self.conn.read_frame(self.cfg.read_timeout).await? {
                ReadOutcome::Idle => continue,
                ReadOutcome::Frame(frame) => frame,
            };

            let mut input = BinaryReader::new(frame.freeze());
            let header = input.read_message_begin()?;

            match header.kind {
                MessageType::Heartbeat => self.on_heartbeat(&header).await?,
                MessageType::StopConfirm => {
                    self.emitter.emit(
                        Event::new(EventKind::StopConfirmed)
                            .with_endpoint(Arc::clone(&self.endpoint)),
                    );
                    return Ok(SessionEnd::StopConfirmed);
                }
                _ => self.dispatch(&header, &mut input).await?,
            }
        }
    }

    async fn on_heartbeat(&mut self, header: &MessageHeader) -> Result<(), SessionError> {
        self.write(header.encode()).await?;
        self.last_heartbeat_at = Instant::now();
        self.emitter.emit(
            Event::new(EventKind::HeartbeatReceived)
                .with_endpoint(Arc::clone(&self.endpoint))
                .with_method(header.name.as_str())
                .with_seq_id(header.seq_id),
        );

        if !self.stop.poll() {
            self.stop_sent = false;
            return Ok(());
        }
        if !self.stop_sent {
            self.write(MessageHeader::stop().encode()).await?;
            self.stop_sent = true;
            self.emitter.emit(
                Event::new(EventKind::StopRequested).with_endpoint(Arc::clone(&self.endpoint)),
            );
        }
        Ok(())
    }

    async fn dispatch(
        &mut self,
        header: &MessageHeader,
        input: &mut BinaryReader,
    ) -> Result<(), SessionError> {
        let started = Instant::now();
        let mut output = BinaryWriter::new();

        let outcome = AssertUnwindSafe(self.processor.process(header, input, &mut output))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ProcessError::Panicked(panic_message(&*payload))));

        match outcome {
            Ok(()) => {
                if !output.is_empty() {
                    self.write(output.freeze()).await?;
                }
                self.emitter.emit(
                    Event::new(EventKind::RequestServed)
                        .with_endpoint(Arc::clone(&self.endpoint))
                        .with_method(header.name.as_str())
                        .with_seq_id(header.seq_id)
                        .with_elapsed(started.elapsed()),
                );
            }
            Err(err) => {
                let reply = ApplicationException::new(err.exception_kind(), err.to_string())
                    .encode_reply(&header.name, header.seq_id);
                self.write(reply).await?;
                self.emitter.emit(
                    Event::new(EventKind::RequestFailed)
                        .with_endpoint(Arc::clone(&self.endpoint))
                        .with_method(header.name.as_str())
                        .with_seq_id(header.seq_id)
                        .with_reason(err.to_string())
                        .with_elapsed(started.elapsed()),
                );
            }
        }
        Ok(())
    }

    async fn write(&mut self, frame: Bytes) -> Result<(), SessionError> {
        self.conn
            .write_frame(frame, self.cfg.write_timeout_opt())
            .await
            .map_err(SessionError::from)
    }
}
