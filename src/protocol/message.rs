//! # Message headers.
//!
//! Every frame carries exactly one message. Its header names the method, the
//! message type and the sequence id chosen by the caller.
//!
//! The proxy extends the standard Thrift message types with three control
//! tags that only ever travel between the proxy and its workers:
//!
//! | Tag | Type           | Direction       | Meaning                                  |
//! |-----|----------------|-----------------|------------------------------------------|
//! | 20  | `Heartbeat`    | proxy ⇄ worker  | liveness check, echoed back unchanged    |
//! | 21  | `Stop`         | worker → proxy  | "drain me": stop routing new calls here  |
//! | 22  | `StopConfirm`  | proxy → worker  | drain acknowledged, worker may exit      |

use bytes::Bytes;

use super::binary::BinaryWriter;

/// Message type tag carried in every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Request expecting a reply.
    Call,
    /// Successful reply.
    Reply,
    /// Application exception reply.
    Exception,
    /// Request without reply.
    Oneway,
    /// Proxy liveness check.
    Heartbeat,
    /// Worker drain request.
    Stop,
    /// Proxy drain acknowledgement.
    StopConfirm,
    /// Any other tag; opaque to the worker and handed to the processor.
    Other(u8),
}

impl MessageType {
    /// True for the proxy control tags (heartbeat, stop, stop-confirm).
    pub fn is_control(self) -> bool {
        matches!(
            self,
            MessageType::Heartbeat | MessageType::Stop | MessageType::StopConfirm
        )
    }
}

impl From<u8> for MessageType {
    fn from(tag: u8) -> Self {
        match tag {
            1 => MessageType::Call,
            2 => MessageType::Reply,
            3 => MessageType::Exception,
            4 => MessageType::Oneway,
            20 => MessageType::Heartbeat,
            21 => MessageType::Stop,
            22 => MessageType::StopConfirm,
            other => MessageType::Other(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Call => 1,
            MessageType::Reply => 2,
            MessageType::Exception => 3,
            MessageType::Oneway => 4,
            MessageType::Heartbeat => 20,
            MessageType::Stop => 21,
            MessageType::StopConfirm => 22,
            MessageType::Other(tag) => tag,
        }
    }
}

/// Decoded message header: `{name, type, seq_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Method name (or the control message name).
    pub name: String,
    /// Message type tag.
    pub kind: MessageType,
    /// Caller-chosen sequence id, echoed in the reply.
    pub seq_id: i32,
}

impl MessageHeader {
    /// Name the worker uses for its drain request.
    pub const STOP_NAME: &'static str = "stop";

    /// Creates a header.
    pub fn new(name: impl Into<String>, kind: MessageType, seq_id: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            seq_id,
        }
    }

    /// The drain request the worker sends after a positive stop poll.
    pub fn stop() -> Self {
        Self::new(Self::STOP_NAME, MessageType::Stop, 0)
    }

    /// Returns a header with the same name and seq id but another type.
    pub fn with_kind(&self, kind: MessageType) -> Self {
        Self::new(self.name.clone(), kind, self.seq_id)
    }

    /// Encodes a body-less message consisting of this header only.
    ///
    /// Control messages (heartbeat echo, stop) are sent this way.
    pub fn encode(&self) -> Bytes {
        let mut w = BinaryWriter::new();
        w.write_message_begin(self);
        w.freeze()
    }
}
