//! Error types used by the worker runtime.
//!
//! Errors are split by **failure class**, because the worker reacts to each
//! class differently:
//!
//! - [`TransportError`] — socket and framing failures (connect, read, write).
//! - [`ProtocolError`] — the bytes of a frame do not decode as a message.
//! - [`ProcessError`] — a [`Processor`](crate::Processor) failed on one request.
//! - [`SessionError`] — why a serving session gave up its connection.
//!
//! | Class              | Reaction                                                  |
//! |--------------------|-----------------------------------------------------------|
//! | `TransportError`   | connection-fatal: close, back off, reconnect              |
//! | `ProtocolError`    | connection-fatal: close, back off, reconnect              |
//! | `ProcessError`     | request-local: exception reply, connection stays up       |
//!
//! All types provide `as_label()` for logs/metrics.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::ApplicationExceptionKind;

/// # Errors produced by the socket and framing layer.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The endpoint could not be opened (refused, unreachable, missing socket file).
    #[error("could not connect to {endpoint}: {source}")]
    Connect {
        /// Endpoint that was dialed.
        endpoint: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Connecting did not complete within the configured timeout.
    #[error("timed out connecting to {endpoint} after {timeout:?}")]
    ConnectTimeout {
        /// Endpoint that was dialed.
        endpoint: String,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The endpoint description itself is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A read or write did not complete in time.
    #[error("timed out {op} after {timeout:?}")]
    Timeout {
        /// `"reading frame"` or `"writing frame"`.
        op: &'static str,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,

    /// A frame announced a length above the configured limit.
    #[error("frame exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Configured maximum frame length.
        max: usize,
    },

    /// Any other I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Connect { .. } => "transport_connect",
            TransportError::ConnectTimeout { .. } => "transport_connect_timeout",
            TransportError::InvalidEndpoint(_) => "transport_invalid_endpoint",
            TransportError::Timeout { .. } => "transport_timeout",
            TransportError::Closed => "transport_closed",
            TransportError::FrameTooLarge { .. } => "transport_frame_too_large",
            TransportError::Io(_) => "transport_io",
        }
    }

    /// True for the "could not open" family of errors.
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            TransportError::Connect { .. }
                | TransportError::ConnectTimeout { .. }
                | TransportError::InvalidEndpoint(_)
        )
    }

    /// True if the error is a timeout (connect, read or write).
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. } | TransportError::ConnectTimeout { .. }
        )
    }
}

/// # Errors produced while decoding Thrift binary data.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fewer bytes remained than the value being decoded requires.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes required by the current read.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A strict message header carried an unknown version.
    #[error("bad protocol version {0:#010x}")]
    BadVersion(u32),

    /// A length prefix was negative.
    #[error("negative length {0}")]
    NegativeLength(i32),

    /// A string field was not valid UTF-8.
    #[error("string is not valid utf-8")]
    InvalidUtf8,

    /// A field header named an unknown wire type.
    #[error("unknown field type {0}")]
    UnknownType(u8),

    /// Nested containers exceeded the skip depth limit.
    #[error("nesting depth limit exceeded")]
    DepthLimit,
}

impl ProtocolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProtocolError::Truncated { .. } => "protocol_truncated",
            ProtocolError::BadVersion(_) => "protocol_bad_version",
            ProtocolError::NegativeLength(_) => "protocol_negative_length",
            ProtocolError::InvalidUtf8 => "protocol_invalid_utf8",
            ProtocolError::UnknownType(_) => "protocol_unknown_type",
            ProtocolError::DepthLimit => "protocol_depth_limit",
        }
    }
}

/// # Errors returned by a [`Processor`](crate::Processor) for a single request.
///
/// These never tear down the connection. The worker answers them with an
/// exception reply whose kind comes from [`ProcessError::exception_kind`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The processor has no handler for the requested method.
    #[error("unknown method {0:?}")]
    UnknownMethod(String),

    /// The request body could not be decoded or the response could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The handler itself failed.
    #[error("handler failed: {0}")]
    Handler(String),

    /// The handler panicked; the payload message is kept.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl ProcessError {
    /// Creates a handler failure from anything printable.
    pub fn handler(reason: impl std::fmt::Display) -> Self {
        ProcessError::Handler(reason.to_string())
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::UnknownMethod(_) => "process_unknown_method",
            ProcessError::Protocol(_) => "process_protocol",
            ProcessError::Handler(_) => "process_handler",
            ProcessError::Panicked(_) => "process_panicked",
        }
    }

    /// The application exception kind reported back to the caller.
    pub fn exception_kind(&self) -> ApplicationExceptionKind {
        match self {
            ProcessError::UnknownMethod(_) => ApplicationExceptionKind::UnknownMethod,
            ProcessError::Protocol(_) => ApplicationExceptionKind::ProtocolError,
            ProcessError::Handler(_) | ProcessError::Panicked(_) => {
                ApplicationExceptionKind::InternalError
            }
        }
    }
}

/// Extracts the message carried by a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// # Reasons a serving session gave up its connection.
///
/// Every variant is connection-fatal but worker-recoverable: the worker
/// closes the connection, backs off and reconnects.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SessionError {
    /// The framed channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A received frame did not decode as a message.
    #[error("undecodable frame: {0}")]
    Protocol(#[from] ProtocolError),

    /// No heartbeat arrived within the staleness threshold.
    #[error("no heartbeat for {elapsed:?} (limit {limit:?})")]
    HeartbeatStale {
        /// Time since the last heartbeat.
        elapsed: Duration,
        /// Configured staleness threshold.
        limit: Duration,
    },
}

impl SessionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::Transport(e) => e.as_label(),
            SessionError::Protocol(e) => e.as_label(),
            SessionError::HeartbeatStale { .. } => "session_heartbeat_stale",
        }
    }
}
