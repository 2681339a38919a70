//! # Proxy endpoint addressing.
//!
//! The proxy publishes its worker port either as a Unix-domain socket or as
//! a TCP address. [`Endpoint::parse`] follows the proxy's address convention:
//!
//! | `host`                          | `port`  | Result                         |
//! |---------------------------------|---------|--------------------------------|
//! | `/usr/local/proxy/backend.sock` | ignored | `Unix("/usr/local/proxy/…")`   |
//! | `unix:///run/proxy.sock`        | ignored | `Unix("/run/proxy.sock")`      |
//! | `tcp://localhost`               | `5556`  | `Tcp { "localhost", 5556 }`    |
//! | `tcp://localhost`               | `0`     | error: port required           |
//!
//! A host with no `:` at all is a socket path.

use std::fmt;
use std::path::PathBuf;

use crate::error::TransportError;

/// Where the worker connects to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// TCP address.
    Tcp { host: String, port: u16 },
    /// Unix-domain socket path.
    Unix(PathBuf),
}

impl Endpoint {
    /// Parses a `(host, port)` pair using the proxy address convention.
    pub fn parse(host: &str, port: u16) -> Result<Self, TransportError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(TransportError::InvalidEndpoint("empty host".into()));
        }

        if let Some(path) = host.strip_prefix("unix://") {
            return Self::unix_path(path);
        }
        if !host.contains(':') {
            return Self::unix_path(host);
        }

        let name = host.strip_prefix("tcp://").unwrap_or(host);
        if name.is_empty() {
            return Err(TransportError::InvalidEndpoint(format!("missing host in {host:?}")));
        }
        if port == 0 {
            return Err(TransportError::InvalidEndpoint(format!(
                "tcp endpoint {host:?} requires a port > 0"
            )));
        }
        Ok(Endpoint::Tcp {
            host: name.to_string(),
            port,
        })
    }

    /// TCP endpoint without going through the address convention.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Endpoint::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Unix-domain endpoint.
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Endpoint::Unix(path.into())
    }

    fn unix_path(path: &str) -> Result<Self, TransportError> {
        if path.is_empty() {
            return Err(TransportError::InvalidEndpoint("empty socket path".into()));
        }
        Ok(Endpoint::Unix(PathBuf::from(path)))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_path_is_unix_and_ignores_port() {
        let ep = Endpoint::parse("/usr/local/proxy/hello_backend.sock", 5556).unwrap();
        assert_eq!(ep, Endpoint::unix("/usr/local/proxy/hello_backend.sock"));
    }

    #[test]
    fn tcp_scheme_is_stripped() {
        let ep = Endpoint::parse("tcp://localhost", 5556).unwrap();
        assert_eq!(ep, Endpoint::tcp("localhost", 5556));
        assert_eq!(ep.to_string(), "tcp://localhost:5556");
    }

    #[test]
    fn unix_scheme_is_stripped() {
        let ep = Endpoint::parse("unix:///run/proxy.sock", 0).unwrap();
        assert_eq!(ep, Endpoint::unix("/run/proxy.sock"));
    }

    #[test]
    fn tcp_requires_port() {
        let err = Endpoint::parse("tcp://localhost", 0).unwrap_err();
        assert_eq!(err.as_label(), "transport_invalid_endpoint");
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(Endpoint::parse("  ", 1).is_err());
        assert!(Endpoint::parse("tcp://", 1).is_err());
    }
}
