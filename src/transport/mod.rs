//! Socket layer: where to connect ([`Endpoint`]), how to open it
//! ([`Connect`], [`SocketConnector`]) and how frames move over it
//! ([`Connection`]).

mod connection;
mod connector;
mod endpoint;

pub use connection::{Connection, ReadOutcome};
pub use connector::{BoxedStream, Connect, IoStream, SocketConnector};
pub use endpoint::Endpoint;
