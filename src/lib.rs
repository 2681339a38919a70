//! # rpc-worker
//!
//! **rpc-worker** keeps a long-running RPC service registered with a
//! load-balancing proxy over a framed Thrift binary connection.
//!
//! The worker dials the proxy (it is the client on the socket, the server on
//! the RPC), answers the proxy's heartbeats, serves calls one at a time, and
//! reconnects with backoff whenever the connection goes bad. Shutdown is a
//! handshake: the worker asks to be drained with `STOP` and exits only after
//! the proxy answers `STOP_CONFIRM`, so no in-flight call is ever cut off.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                      ┌────────────────────────────────────┐
//!                      │   Proxy / load balancer (peer)     │
//!                      └──────────────────▲─────────────────┘
//!                                         │ u32 length ‖ thrift message
//!   ┌─────────────────────────────────────┴───────────────────────────────┐
//!   │  Worker::run()                                                      │
//!   │   ├─ Connect (SocketConnector: TCP_NODELAY / Unix socket)           │
//!   │   ├─ Backoff (1s, 2s, 4s, 8s, 8s … reset on connect)                │
//!   │   └─ Session (one per connection)                                   │
//!   │        ├─ staleness check (heartbeat_timeout)                       │
//!   │        ├─ HEARTBEAT    → echo, poll StopHandle → STOP (once)        │
//!   │        ├─ STOP_CONFIRM → alive = false, return                      │
//!   │        └─ other        → Processor::process(header, body, writer)   │
//!   │                            └─ Err → EXCEPTION reply, keep serving   │
//!   └──────┬──────────────────────────────────────────────────────────────┘
//!          │ Event (Connecting, Connected, HeartbeatReceived, RequestFailed …)
//!          ├──────────────► Bus (broadcast) ──► Worker::subscribe() receivers
//!          └──────────────► SubscriberSet ──► [queue] ──► LogWriter / custom
//! ```
//!
//! ### Control messages
//! ```text
//! proxy                                   worker
//!   │ ── HEARTBEAT{name, seq} ───────────► │
//!   │ ◄─────────── HEARTBEAT{name, seq} ── │  echo, same name and seq
//!   │ ◄───────────────── STOP{"stop", 0} ── │  only if the stop predicate is true
//!   │        (proxy stops routing calls)   │
//!   │ ── STOP_CONFIRM ───────────────────► │  run() returns
//! ```
//!
//! ## Features
//! | Area              | Description                                            | Key types / traits                       |
//! |-------------------|--------------------------------------------------------|------------------------------------------|
//! | **Worker**        | Connect, serve, reconnect, graceful drain.             | [`Worker`], [`WorkerBuilder`]            |
//! | **Processors**    | Plug in the generated service dispatcher.              | [`Processor`], [`ProcessorFn`]           |
//! | **Protocol**      | Thrift binary headers, buffers, exceptions.            | [`BinaryReader`], [`BinaryWriter`]       |
//! | **Transport**     | Endpoints, connectors, framed connections.             | [`Endpoint`], [`Connect`], [`Connection`]|
//! | **Policies**      | Reconnect backoff and jitter.                          | [`BackoffPolicy`], [`JitterPolicy`]      |
//! | **Subscriber API**| Observe worker events.                                 | [`Subscribe`], [`Event`]                 |
//! | **Errors**        | Typed errors per failure class.                        | [`TransportError`], [`ProcessError`]     |
//! | **Configuration** | Timeouts, frame limit, bus size.                       | [`WorkerConfig`]                         |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], which forwards events to `tracing`,
//!   and installs it on every worker unless subscribers are set explicitly.
//!
//! ## Example
//! ```no_run
//! use rpc_worker::{Endpoint, MessageType, ProcessError, ProcessorFn, ProcessorRef, Worker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor: ProcessorRef = ProcessorFn::arc(|header, input, output| {
//!         match header.name.as_str() {
//!             "echo" => {
//!                 let body = input.read_binary()?;
//!                 output.write_message_begin(&header.with_kind(MessageType::Reply));
//!                 output.write_binary(&body);
//!                 Ok(())
//!             }
//!             other => Err(ProcessError::UnknownMethod(other.to_string())),
//!         }
//!     });
//!
//!     let worker = Worker::builder(Endpoint::parse("tcp://localhost", 5556)?, processor)
//!         .service("echo")
//!         .build();
//!
//!     rpc_worker::stop_on_signal(worker.stop_handle());
//!     worker.run().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod processor;
mod protocol;
mod subscribers;
mod transport;

// ---- Public re-exports ----

pub use crate::core::{SessionEnd, StopHandle, Worker, WorkerBuilder, WorkerConfig, stop_on_signal};
pub use error::{ProcessError, ProtocolError, SessionError, TransportError};
pub use events::{Bus, Event, EventKind};
pub use policies::{Backoff, BackoffPolicy, JitterPolicy};
pub use processor::{Processor, ProcessorFn, ProcessorRef};
pub use protocol::{
    ApplicationException, ApplicationExceptionKind, BinaryReader, BinaryWriter, MessageHeader,
    MessageType, TType,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use transport::{BoxedStream, Connect, Connection, Endpoint, IoStream, ReadOutcome, SocketConnector};

// Optional: built-in `tracing` subscriber.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
