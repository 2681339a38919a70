//! # Request processor abstraction.
//!
//! This module defines the [`Processor`] trait: the generated-service side of
//! the worker. The worker decodes each message header itself, then hands the
//! processor a reader positioned on the body and a fresh writer for the reply.
//! The common handle type is [`ProcessorRef`], an `Arc<dyn Processor>`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProcessError;
use crate::protocol::{BinaryReader, BinaryWriter, MessageHeader};

/// # Handles one request message.
///
/// `process` reads the arguments from `input` and writes a complete reply
/// (header and body) into `output`. Writing nothing is valid for oneway
/// calls; the worker then sends no frame.
///
/// Returning an error discards whatever was written and makes the worker
/// send an exception reply for `header.seq_id` instead. The connection stays
/// up either way.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use rpc_worker::{
///     BinaryReader, BinaryWriter, MessageHeader, MessageType, ProcessError, Processor,
/// };
///
/// struct Echo;
///
/// #[async_trait]
/// impl Processor for Echo {
///     async fn process(
///         &self,
///         header: &MessageHeader,
///         input: &mut BinaryReader,
///         output: &mut BinaryWriter,
///     ) -> Result<(), ProcessError> {
///         let body = input.read_binary()?;
///         output.write_message_begin(&header.with_kind(MessageType::Reply));
///         output.write_binary(&body);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    /// Processes one request.
    async fn process(
        &self,
        header: &MessageHeader,
        input: &mut BinaryReader,
        output: &mut BinaryWriter,
    ) -> Result<(), ProcessError>;
}

/// Shared handle to a processor.
pub type ProcessorRef = Arc<dyn Processor>;
