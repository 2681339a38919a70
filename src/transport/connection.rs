//! # Framed connection to the proxy.
//!
//! A [`Connection`] owns one open stream wrapped in a 4-byte big-endian
//! length-delimited codec. Each frame carries exactly one message.
//!
//! ```text
//! ┌──────────────┬────────────────────────────────┐
//! │ u32 length   │ message (header ‖ body)        │
//! └──────────────┴────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - A read timeout with nothing buffered is [`ReadOutcome::Idle`], not an error.
//! - A read timeout with a frame half received is fatal: the stream cannot be
//!   resynchronised.
//! - Every write is flushed before it returns.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio_util::codec::{Framed, LengthDelimitedCodec, LengthDelimitedCodecError};

use super::connector::BoxedStream;
use super::endpoint::Endpoint;
use crate::error::TransportError;

/// Result of one bounded frame read.
#[derive(Debug)]
pub enum ReadOutcome {
    /// One complete frame.
    Frame(BytesMut),
    /// The read timeout passed without the next frame starting.
    Idle,
}

/// One open framed channel. Exclusively owned by the session using it.
pub struct Connection {
    framed: Framed<BoxedStream, LengthDelimitedCodec>,
    endpoint: Endpoint,
    max_frame_length: usize,
}

impl Connection {
    /// Wraps an open stream.
    pub fn new(stream: BoxedStream, endpoint: Endpoint, max_frame_length: usize) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(max_frame_length)
            .new_codec();
        Self {
            framed: Framed::new(stream, codec),
            endpoint,
            max_frame_length,
        }
    }

    /// Endpoint this connection was opened to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Reads the next frame, waiting at most `timeout`.
    pub async fn read_frame(&mut self, timeout: Duration) -> Result<ReadOutcome, TransportError> {
        let next = tokio::time::timeout(timeout, self.framed.next()).await;
        match next {
            Err(_) if self.framed.read_buffer().is_empty() => Ok(ReadOutcome::Idle),
            Err(_) => Err(TransportError::Timeout {
                op: "reading frame",
                timeout,
            }),
            Ok(None) => Err(TransportError::Closed),
            Ok(Some(Ok(frame))) => Ok(ReadOutcome::Frame(frame)),
            Ok(Some(Err(e))) => Err(self.classify(e)),
        }
    }

    /// Writes and flushes one frame; `None` waits indefinitely.
    pub async fn write_frame(
        &mut self,
        frame: Bytes,
        timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        let sent = match timeout {
            None => self.framed.send(frame).await,
            Some(limit) => tokio::time::timeout(limit, self.framed.send(frame))
                .await
                .map_err(|_| TransportError::Timeout {
                    op: "writing frame",
                    timeout: limit,
                })?,
        };
        sent.map_err(|e| self.classify(e))
    }

    /// Drops the stream, closing the socket. Unsent bytes are discarded:
    /// every successful `write_frame` has already flushed.
    pub fn close(self) {
        drop(self.framed);
    }

    fn classify(&self, e: std::io::Error) -> TransportError {
        let too_large = e
            .get_ref()
            .is_some_and(|inner| inner.is::<LengthDelimitedCodecError>());
        if too_large {
            TransportError::FrameTooLarge {
                max: self.max_frame_length,
            }
        } else {
            TransportError::Io(e)
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("buffered", &self.framed.read_buffer().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn pair(max: usize) -> (Connection, tokio::io::DuplexStream) {
        let (ours, theirs) = tokio::io::duplex(4096);
        let conn = Connection::new(Box::new(ours), Endpoint::unix("/test.sock"), max);
        (conn, theirs)
    }

    #[tokio::test(start_paused = true)]
    async fn idle_when_nothing_arrives() {
        let (mut conn, _peer) = pair(1024);
        let outcome = conn.read_frame(Duration::from_secs(5)).await.unwrap();
        assert!(matches!(outcome, ReadOutcome::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_frame_timeout_is_fatal() {
        let (mut conn, mut peer) = pair(1024);
        peer.write_all(&[0, 0, 0, 10, 1, 2]).await.unwrap();

        let err = conn.read_frame(Duration::from_secs(5)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn full_frame_is_returned() {
        let (mut conn, mut peer) = pair(1024);
        peer.write_all(&[0, 0, 0, 3, 7, 8, 9]).await.unwrap();

        match conn.read_frame(Duration::from_secs(5)).await.unwrap() {
            ReadOutcome::Frame(frame) => assert_eq!(&frame[..], &[7, 8, 9]),
            ReadOutcome::Idle => panic!("expected a frame"),
        }
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut conn, mut peer) = pair(4);
        peer.write_all(&[0, 0, 0, 100]).await.unwrap();

        let err = conn.read_frame(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { max: 4 }));
    }

    #[tokio::test]
    async fn peer_close_is_reported() {
        let (mut conn, peer) = pair(1024);
        drop(peer);

        let err = conn.read_frame(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
