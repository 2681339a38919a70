//! # Application exceptions.
//!
//! When a processor fails on one request the worker answers with an
//! `EXCEPTION` message whose body is the standard application exception
//! struct:
//!
//! ```text
//! struct TApplicationException {
//!   1: string message
//!   2: i32    type
//! }
//! ```
//!
//! The caller sees a normal RPC error for that sequence id; the connection
//! itself is unaffected.

use bytes::Bytes;

use super::binary::{BinaryReader, BinaryWriter, TType};
use super::message::{MessageHeader, MessageType};
use crate::error::ProtocolError;

const FIELD_MESSAGE: i16 = 1;
const FIELD_KIND: i16 = 2;

/// Exception kind carried in field 2 of the exception struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationExceptionKind {
    Unknown,
    UnknownMethod,
    InvalidMessageType,
    WrongMethodName,
    BadSequenceId,
    MissingResult,
    InternalError,
    ProtocolError,
    InvalidTransform,
    InvalidProtocol,
    UnsupportedClientType,
}

impl ApplicationExceptionKind {
    /// Wire value of the kind.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::UnknownMethod => 1,
            Self::InvalidMessageType => 2,
            Self::WrongMethodName => 3,
            Self::BadSequenceId => 4,
            Self::MissingResult => 5,
            Self::InternalError => 6,
            Self::ProtocolError => 7,
            Self::InvalidTransform => 8,
            Self::InvalidProtocol => 9,
            Self::UnsupportedClientType => 10,
        }
    }

    /// Decodes a wire value; unrecognised values become [`Self::Unknown`].
    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::UnknownMethod,
            2 => Self::InvalidMessageType,
            3 => Self::WrongMethodName,
            4 => Self::BadSequenceId,
            5 => Self::MissingResult,
            6 => Self::InternalError,
            7 => Self::ProtocolError,
            8 => Self::InvalidTransform,
            9 => Self::InvalidProtocol,
            10 => Self::UnsupportedClientType,
            _ => Self::Unknown,
        }
    }
}

/// Decoded or to-be-sent application exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationException {
    pub kind: ApplicationExceptionKind,
    pub message: String,
}

impl ApplicationException {
    pub fn new(kind: ApplicationExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Writes the exception struct (without a message header).
    pub fn write(&self, w: &mut BinaryWriter) {
        w.write_field_begin(TType::String, FIELD_MESSAGE);
        w.write_string(&self.message);
        w.write_field_begin(TType::I32, FIELD_KIND);
        w.write_i32(self.kind.as_i32());
        w.write_field_stop();
    }

    /// Reads the exception struct, skipping unknown fields.
    pub fn read(r: &mut BinaryReader) -> Result<Self, ProtocolError> {
        let mut message = String::new();
        let mut kind = ApplicationExceptionKind::Unknown;

        while let Some((ty, id)) = r.read_field_begin()? {
            match (id, ty) {
                (FIELD_MESSAGE, TType::String) => message = r.read_string()?,
                (FIELD_KIND, TType::I32) => kind = ApplicationExceptionKind::from_i32(r.read_i32()?),
                _ => r.skip(ty)?,
            }
        }
        Ok(Self { kind, message })
    }

    /// Encodes a full `EXCEPTION` message answering `name`/`seq_id`.
    pub fn encode_reply(&self, name: &str, seq_id: i32) -> Bytes {
        let mut w = BinaryWriter::with_capacity(32 + name.len() + self.message.len());
        w.write_message_begin(&MessageHeader::new(name, MessageType::Exception, seq_id));
        self.write(&mut w);
        w.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_carries_method_and_seq() {
        let exc = ApplicationException::new(ApplicationExceptionKind::InternalError, "boom");
        let frame = exc.encode_reply("sayHello", 41);

        let mut r = BinaryReader::new(frame);
        let header = r.read_message_begin().unwrap();
        assert_eq!(header.name, "sayHello");
        assert_eq!(header.kind, MessageType::Exception);
        assert_eq!(header.seq_id, 41);

        let decoded = ApplicationException::read(&mut r).unwrap();
        assert_eq!(decoded, exc);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn unknown_kind_values_decode_as_unknown() {
        assert_eq!(
            ApplicationExceptionKind::from_i32(77),
            ApplicationExceptionKind::Unknown
        );
        assert_eq!(ApplicationExceptionKind::InvalidProtocol.as_i32(), 9);
    }

    #[test]
    fn read_skips_foreign_fields() {
        let mut w = BinaryWriter::new();
        w.write_field_begin(TType::I64, 9);
        w.write_i64(5);
        w.write_field_begin(TType::I32, FIELD_KIND);
        w.write_i32(1);
        w.write_field_stop();

        let decoded = ApplicationException::read(&mut BinaryReader::new(w.freeze())).unwrap();
        assert_eq!(decoded.kind, ApplicationExceptionKind::UnknownMethod);
        assert!(decoded.message.is_empty());
    }
}
