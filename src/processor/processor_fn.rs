//! # Function-backed processor (`ProcessorFn`)
//!
//! [`ProcessorFn`] wraps a synchronous closure
//! `Fn(&MessageHeader, &mut BinaryReader, &mut BinaryWriter) -> Result<(), ProcessError>`.
//! Most generated dispatchers are plain functions over the two buffers, so
//! this covers them without writing an `impl Processor`.
//!
//! ## Example
//! ```rust
//! use rpc_worker::{MessageType, ProcessError, ProcessorFn, ProcessorRef};
//!
//! let p: ProcessorRef = ProcessorFn::arc(|header, _input, output| {
//!     if header.name != "ping" {
//!         return Err(ProcessError::UnknownMethod(header.name.clone()));
//!     }
//!     output.write_message_begin(&header.with_kind(MessageType::Reply));
//!     output.write_field_stop();
//!     Ok(())
//! });
//! # let _ = p;
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use super::processor::Processor;
use crate::error::ProcessError;
use crate::protocol::{BinaryReader, BinaryWriter, MessageHeader};

/// Function-backed processor implementation.
#[derive(Debug, Clone)]
pub struct ProcessorFn<F> {
    f: F,
}

impl<F> ProcessorFn<F> {
    /// Creates a new function-backed processor.
    ///
    /// Prefer [`ProcessorFn::arc`] when you immediately need a [`ProcessorRef`](super::ProcessorRef).
    pub fn new(f: F) -> Self
    where
        F: Fn(&MessageHeader, &mut BinaryReader, &mut BinaryWriter) -> Result<(), ProcessError>,
    {
        Self { f }
    }

    /// Creates the processor and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self>
    where
        F: Fn(&MessageHeader, &mut BinaryReader, &mut BinaryWriter) -> Result<(), ProcessError>,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> Processor for ProcessorFn<F>
where
    F: Fn(&MessageHeader, &mut BinaryReader, &mut BinaryWriter) -> Result<(), ProcessError>
        + Send
        + Sync
        + 'static,
{
    async fn process(
        &self,
        header: &MessageHeader,
        input: &mut BinaryReader,
        output: &mut BinaryWriter,
    ) -> Result<(), ProcessError> {
        (self.f)(header, input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageType;

    #[tokio::test]
    async fn closure_sees_body_and_fills_writer() {
        let p = ProcessorFn::new(|header: &MessageHeader, input: &mut BinaryReader, output: &mut BinaryWriter| {
            let n = input.read_i32()?;
            output.write_message_begin(&header.with_kind(MessageType::Reply));
            output.write_i32(n * 2);
            Ok(())
        });

        let header = MessageHeader::new("double", MessageType::Call, 3);
        let mut input = BinaryReader::new(vec![0, 0, 0, 21]);
        let mut output = BinaryWriter::new();
        p.process(&header, &mut input, &mut output).await.unwrap();

        let mut reply = BinaryReader::new(output.freeze());
        let reply_header = reply.read_message_begin().unwrap();
        assert_eq!(reply_header.kind, MessageType::Reply);
        assert_eq!(reply_header.seq_id, 3);
        assert_eq!(reply.read_i32().unwrap(), 42);
    }

    #[tokio::test]
    async fn decode_errors_propagate() {
        let p = ProcessorFn::new(|_: &MessageHeader, input: &mut BinaryReader, _: &mut BinaryWriter| {
            input.read_i64()?;
            Ok(())
        });

        let header = MessageHeader::new("x", MessageType::Call, 1);
        let err = p
            .process(&header, &mut BinaryReader::new(vec![1]), &mut BinaryWriter::new())
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "process_protocol");
    }
}
