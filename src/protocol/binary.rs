//! # Thrift binary protocol reader and writer.
//!
//! [`BinaryReader`] decodes from one received frame; [`BinaryWriter`] encodes
//! into an in-memory buffer that becomes one outgoing frame.
//!
//! ## Message header encodings
//! ```text
//! strict (written):   i32 (0x8001_0000 | type) │ string name │ i32 seq_id
//! non-strict (read):  string name              │ i8 type     │ i32 seq_id
//! ```
//! All integers are big-endian; strings are `i32 length ‖ utf-8 bytes`.
//!
//! Reading the header and reading the body are separate calls: the worker
//! calls [`BinaryReader::read_message_begin`] and then hands the same reader,
//! positioned on the body, to the processor.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::message::{MessageHeader, MessageType};
use crate::error::ProtocolError;

const VERSION_1: u32 = 0x8001_0000;
const VERSION_MASK: u32 = 0xffff_0000;
const TYPE_MASK: u32 = 0x0000_00ff;

/// Nesting limit for [`BinaryReader::skip`].
const MAX_SKIP_DEPTH: usize = 64;

/// Wire type of a struct field or container element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TType {
    /// End-of-struct marker.
    Stop,
    /// Unused on the wire.
    Void,
    Bool,
    Byte,
    Double,
    I16,
    I32,
    I64,
    String,
    Struct,
    Map,
    Set,
    List,
}

impl TType {
    fn from_wire(tag: u8) -> Result<Self, ProtocolError> {
        Ok(match tag {
            0 => TType::Stop,
            1 => TType::Void,
            2 => TType::Bool,
            3 => TType::Byte,
            4 => TType::Double,
            6 => TType::I16,
            8 => TType::I32,
            10 => TType::I64,
            11 => TType::String,
            12 => TType::Struct,
            13 => TType::Map,
            14 => TType::Set,
            15 => TType::List,
            other => return Err(ProtocolError::UnknownType(other)),
        })
    }

    fn to_wire(self) -> u8 {
        match self {
            TType::Stop => 0,
            TType::Void => 1,
            TType::Bool => 2,
            TType::Byte => 3,
            TType::Double => 4,
            TType::I16 => 6,
            TType::I32 => 8,
            TType::I64 => 10,
            TType::String => 11,
            TType::Struct => 12,
            TType::Map => 13,
            TType::Set => 14,
            TType::List => 15,
        }
    }
}

/// Decoder over the bytes of one frame.
#[derive(Debug, Clone)]
pub struct BinaryReader {
    buf: Bytes,
}

impl BinaryReader {
    /// Creates a reader over a complete frame.
    pub fn new(frame: impl Into<Bytes>) -> Self {
        Self { buf: frame.into() }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Returns the unread bytes, consuming the reader.
    pub fn into_remaining(self) -> Bytes {
        self.buf
    }

    fn need(&self, needed: usize) -> Result<(), ProtocolError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(ProtocolError::Truncated { needed, remaining });
        }
        Ok(())
    }

    /// Reads a message header in either the strict or the non-strict encoding.
    pub fn read_message_begin(&mut self) -> Result<MessageHeader, ProtocolError> {
        let size = self.read_i32()?;
        if size < 0 {
            let word = size as u32;
            if word & VERSION_MASK != VERSION_1 {
                return Err(ProtocolError::BadVersion(word));
            }
            let kind = MessageType::from((word & TYPE_MASK) as u8);
            let name = self.read_string()?;
            let seq_id = self.read_i32()?;
            Ok(MessageHeader { name, kind, seq_id })
        } else {
            let name = self.read_string_body(size as usize)?;
            let kind = MessageType::from(self.read_byte()? as u8);
            let seq_id = self.read_i32()?;
            Ok(MessageHeader { name, kind, seq_id })
        }
    }

    /// Reads a field header; `None` marks the end of the struct.
    pub fn read_field_begin(&mut self) -> Result<Option<(TType, i16)>, ProtocolError> {
        let ty = TType::from_wire(self.read_byte()? as u8)?;
        if ty == TType::Stop {
            return Ok(None);
        }
        let id = self.read_i16()?;
        Ok(Some((ty, id)))
    }

    /// Reads a list header: element type and size.
    pub fn read_list_begin(&mut self) -> Result<(TType, usize), ProtocolError> {
        let elem = TType::from_wire(self.read_byte()? as u8)?;
        let size = self.read_len()?;
        Ok((elem, size))
    }

    /// Reads a set header: element type and size.
    pub fn read_set_begin(&mut self) -> Result<(TType, usize), ProtocolError> {
        self.read_list_begin()
    }

    /// Reads a map header: key type, value type and size.
    pub fn read_map_begin(&mut self) -> Result<(TType, TType, usize), ProtocolError> {
        let key = TType::from_wire(self.read_byte()? as u8)?;
        let value = TType::from_wire(self.read_byte()? as u8)?;
        let size = self.read_len()?;
        Ok((key, value, size))
    }

    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_byte(&mut self) -> Result<i8, ProtocolError> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        self.need(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        self.need(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn read_double(&mut self) -> Result<f64, ProtocolError> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    /// Reads a length-prefixed binary value without copying.
    pub fn read_binary(&mut self) -> Result<Bytes, ProtocolError> {
        let len = self.read_len()?;
        self.need(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_len()?;
        self.read_string_body(len)
    }

    fn read_string_body(&mut self, len: usize) -> Result<String, ProtocolError> {
        self.need(len)?;
        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
    }

    fn read_len(&mut self) -> Result<usize, ProtocolError> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| ProtocolError::NegativeLength(len))
    }

    /// Skips one value of type `ty`, including nested structs and containers.
    pub fn skip(&mut self, ty: TType) -> Result<(), ProtocolError> {
        self.skip_depth(ty, 0)
    }

    fn skip_depth(&mut self, ty: TType, depth: usize) -> Result<(), ProtocolError> {
        if depth > MAX_SKIP_DEPTH {
            return Err(ProtocolError::DepthLimit);
        }
        match ty {
            TType::Stop | TType::Void => {}
            TType::Bool | TType::Byte => self.advance(1)?,
            TType::I16 => self.advance(2)?,
            TType::I32 => self.advance(4)?,
            TType::Double | TType::I64 => self.advance(8)?,
            TType::String => {
                let len = self.read_len()?;
                self.advance(len)?;
            }
            TType::Struct => {
                while let Some((field_ty, _)) = self.read_field_begin()? {
                    self.skip_depth(field_ty, depth + 1)?;
                }
            }
            TType::Map => {
                let (key, value, size) = self.read_map_begin()?;
                for _ in 0..size {
                    self.skip_depth(key, depth + 1)?;
                    self.skip_depth(value, depth + 1)?;
                }
            }
            TType::Set | TType::List => {
                let (elem, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip_depth(elem, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn advance(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.need(n)?;
        self.buf.advance(n);
        Ok(())
    }
}

/// Encoder into an in-memory buffer.
///
/// A fresh writer is handed to the processor for every request, so a failed
/// request never leaves partial bytes on the connection.
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: BytesMut,
}

impl BinaryWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Writes a strict message header.
    pub fn write_message_begin(&mut self, header: &MessageHeader) {
        let word = VERSION_1 | u32::from(u8::from(header.kind));
        self.buf.put_u32(word);
        self.write_string(&header.name);
        self.write_i32(header.seq_id);
    }

    pub fn write_field_begin(&mut self, ty: TType, id: i16) {
        self.buf.put_u8(ty.to_wire());
        self.buf.put_i16(id);
    }

    /// Writes the end-of-struct marker.
    pub fn write_field_stop(&mut self) {
        self.buf.put_u8(TType::Stop.to_wire());
    }

    pub fn write_list_begin(&mut self, elem: TType, size: usize) {
        self.buf.put_u8(elem.to_wire());
        self.write_len(size);
    }

    pub fn write_set_begin(&mut self, elem: TType, size: usize) {
        self.write_list_begin(elem, size);
    }

    pub fn write_map_begin(&mut self, key: TType, value: TType, size: usize) {
        self.buf.put_u8(key.to_wire());
        self.buf.put_u8(value.to_wire());
        self.write_len(size);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.put_u8(u8::from(v));
    }

    pub fn write_byte(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.put_i16(v);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    pub fn write_double(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    pub fn write_string(&mut self, v: &str) {
        self.write_binary(v.as_bytes());
    }

    pub fn write_binary(&mut self, v: &[u8]) {
        self.write_len(v.len());
        self.buf.put_slice(v);
    }

    fn write_len(&mut self, len: usize) {
        // Frames are bounded well below i32::MAX by the framed channel.
        self.buf.put_i32(i32::try_from(len).unwrap_or(i32::MAX));
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Freezes the written bytes into an immutable frame body.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_header_layout() {
        let header = MessageHeader::new("ping", MessageType::Heartbeat, 7);
        let mut w = BinaryWriter::new();
        w.write_message_begin(&header);

        let expected: &[u8] = &[
            0x80, 0x01, 0x00, 20, // version | type
            0, 0, 0, 4, b'p', b'i', b'n', b'g', // name
            0, 0, 0, 7, // seq id
        ];
        assert_eq!(w.as_bytes(), expected);

        let mut r = BinaryReader::new(w.freeze());
        assert_eq!(r.read_message_begin().unwrap(), header);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn non_strict_header_is_accepted() {
        let mut raw = BytesMut::new();
        raw.put_i32(5);
        raw.put_slice(b"hello");
        raw.put_i8(1);
        raw.put_i32(99);

        let mut r = BinaryReader::new(raw.freeze());
        let header = r.read_message_begin().unwrap();
        assert_eq!(header, MessageHeader::new("hello", MessageType::Call, 99));
    }

    #[test]
    fn bad_version_is_rejected() {
        let mut raw = BytesMut::new();
        raw.put_u32(0x8002_0001);
        let mut r = BinaryReader::new(raw.freeze());
        assert_eq!(
            r.read_message_begin(),
            Err(ProtocolError::BadVersion(0x8002_0001))
        );
    }

    #[test]
    fn truncated_string_is_an_error_not_a_panic() {
        let mut raw = BytesMut::new();
        raw.put_i32(100);
        raw.put_slice(b"short");
        let mut r = BinaryReader::new(raw.freeze());
        assert_eq!(
            r.read_string(),
            Err(ProtocolError::Truncated {
                needed: 100,
                remaining: 5
            })
        );
    }

    #[test]
    fn negative_length_is_rejected() {
        let mut raw = BytesMut::new();
        raw.put_i32(-3);
        let mut r = BinaryReader::new(raw.freeze());
        assert_eq!(r.read_binary(), Err(ProtocolError::NegativeLength(-3)));
    }

    #[test]
    fn skip_walks_nested_values() {
        let mut w = BinaryWriter::new();
        // struct { 1: list<string> ["a", "bc"], 2: map<i32, struct{1: i64}> {3: {..}} }
        w.write_field_begin(TType::List, 1);
        w.write_list_begin(TType::String, 2);
        w.write_string("a");
        w.write_string("bc");
        w.write_field_begin(TType::Map, 2);
        w.write_map_begin(TType::I32, TType::Struct, 1);
        w.write_i32(3);
        w.write_field_begin(TType::I64, 1);
        w.write_i64(-1);
        w.write_field_stop();
        w.write_field_stop();
        w.write_i32(0x0bad_cafe);

        let mut r = BinaryReader::new(w.freeze());
        r.skip(TType::Struct).unwrap();
        assert_eq!(r.read_i32().unwrap(), 0x0bad_cafe);
    }

    #[test]
    fn unknown_field_type_fails() {
        let mut r = BinaryReader::new(Bytes::from_static(&[5, 0, 1]));
        assert_eq!(r.read_field_begin(), Err(ProtocolError::UnknownType(5)));
    }
}
