//! Thrift binary protocol pieces the worker needs: message headers, the
//! proxy control tags, a binary reader/writer pair and application exceptions.
//!
//! - [`message`] header type and the extended message type tags.
//! - [`binary`] `BinaryReader` / `BinaryWriter` over one frame.
//! - [`exception`] the exception struct written for failed requests.

mod binary;
mod exception;
mod message;

pub use binary::{BinaryReader, BinaryWriter, TType};
pub use exception::{ApplicationException, ApplicationExceptionKind};
pub use message::{MessageHeader, MessageType};
