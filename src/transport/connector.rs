//! # Opening connections.
//!
//! [`Connect`] is the seam between the worker loop and the operating system:
//! the worker only ever asks a connector for "a byte stream to this
//! endpoint". [`SocketConnector`] is the production implementation; tests
//! plug in connectors that hand out in-memory streams.
//!
//! ## Rules
//! - TCP streams get `TCP_NODELAY`; every reply is one small frame that must
//!   leave immediately.
//! - The connect timeout (if any) bounds the whole open, DNS included.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use super::endpoint::Endpoint;
use crate::error::TransportError;

/// Byte stream a connection runs over.
pub trait IoStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> IoStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Boxed stream handed from a connector to the worker.
pub type BoxedStream = Box<dyn IoStream>;

/// # Opens byte streams to a proxy endpoint.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use rpc_worker::{BoxedStream, Connect, Endpoint, TransportError};
///
/// struct Refuse;
///
/// #[async_trait]
/// impl Connect for Refuse {
///     async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream, TransportError> {
///         Err(TransportError::Connect {
///             endpoint: endpoint.to_string(),
///             source: std::io::ErrorKind::ConnectionRefused.into(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Connect: Send + Sync + 'static {
    /// Opens one stream to `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream, TransportError>;
}

/// Connector for real TCP and Unix-domain sockets.
#[derive(Debug, Clone, Default)]
pub struct SocketConnector {
    connect_timeout: Option<Duration>,
}

impl SocketConnector {
    /// Creates a connector; `None` waits on the OS connect timeout.
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        Self { connect_timeout }
    }

    async fn open(endpoint: &Endpoint) -> Result<BoxedStream, TransportError> {
        let wrap = |source: std::io::Error| TransportError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };

        match endpoint {
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port)).await.map_err(wrap)?;
                stream.set_nodelay(true).map_err(wrap)?;
                Ok(Box::new(stream))
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path).await.map_err(wrap)?;
                Ok(Box::new(stream))
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::InvalidEndpoint(format!(
                "unix sockets are not supported on this platform: {endpoint}"
            ))),
        }
    }
}

#[async_trait]
impl Connect for SocketConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream, TransportError> {
        match self.connect_timeout {
            None => Self::open(endpoint).await,
            Some(limit) => tokio::time::timeout(limit, Self::open(endpoint))
                .await
                .map_err(|_| TransportError::ConnectTimeout {
                    endpoint: endpoint.to_string(),
                    timeout: limit,
                })?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tcp_connect_sets_up_stream() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = SocketConnector::new(Some(Duration::from_secs(1)));
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        connector
            .connect(&Endpoint::tcp("127.0.0.1", port))
            .await
            .unwrap();
        accept.await.unwrap().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_socket_file_is_a_connect_error() {
        let connector = SocketConnector::default();
        let err = connector
            .connect(&Endpoint::unix("/nonexistent/rpc-worker-test.sock"))
            .await
            .err()
            .unwrap();
        assert!(err.is_connect());
        assert_eq!(err.as_label(), "transport_connect");
    }
}
