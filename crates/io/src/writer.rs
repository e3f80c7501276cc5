//! Tagged value writer.
//!
//! Encodes values into a MsgPack-compatible byte stream. Integers are written
//! in the smallest representation that preserves the value; all multi-byte
//! fields are big-endian.

use crate::tags;
use bytes::{BufMut, BytesMut};

/// A writer for serializing Ember values to a tagged binary stream.
pub struct ValueWriter {
    /// The buffer being written to
    buffer: BytesMut,
}

impl ValueWriter {
    /// Creates a new value writer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Creates a new value writer with the specified initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consumes the writer and returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Returns the encoded bytes without consuming the writer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Writes a nil marker.
    pub fn write_nil(&mut self) {
        self.buffer.put_u8(tags::NIL);
    }

    /// Writes a boolean value.
    pub fn write_bool(&mut self, value: bool) {
        self.buffer
            .put_u8(if value { tags::TRUE } else { tags::FALSE });
    }

    /// Writes a signed integer in its smallest encoding.
    pub fn write_i64(&mut self, value: i64) {
        if value >= 0 {
            self.write_u64(value as u64);
        } else if value >= -32 {
            self.buffer.put_u8(value as u8);
        } else if value >= i64::from(i8::MIN) {
            self.buffer.put_u8(tags::INT8);
            self.buffer.put_i8(value as i8);
        } else if value >= i64::from(i16::MIN) {
            self.buffer.put_u8(tags::INT16);
            self.buffer.put_i16(value as i16);
        } else if value >= i64::from(i32::MIN) {
            self.buffer.put_u8(tags::INT32);
            self.buffer.put_i32(value as i32);
        } else {
            self.buffer.put_u8(tags::INT64);
            self.buffer.put_i64(value);
        }
    }

    /// Writes an unsigned integer in its smallest encoding.
    pub fn write_u64(&mut self, value: u64) {
        if value < 0x80 {
            self.buffer.put_u8(value as u8);
        } else if value <= u64::from(u8::MAX) {
            self.buffer.put_u8(tags::UINT8);
            self.buffer.put_u8(value as u8);
        } else if value <= u64::from(u16::MAX) {
            self.buffer.put_u8(tags::UINT16);
            self.buffer.put_u16(value as u16);
        } else if value <= u64::from(u32::MAX) {
            self.buffer.put_u8(tags::UINT32);
            self.buffer.put_u32(value as u32);
        } else {
            self.buffer.put_u8(tags::UINT64);
            self.buffer.put_u64(value);
        }
    }

    /// Writes a signed 8-bit integer.
    pub fn write_i8(&mut self, value: i8) {
        self.write_i64(i64::from(value));
    }

    /// Writes a signed 16-bit integer.
    pub fn write_i16(&mut self, value: i16) {
        self.write_i64(i64::from(value));
    }

    /// Writes a signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) {
        self.write_i64(i64::from(value));
    }

    /// Writes an unsigned 8-bit integer.
    pub fn write_u8(&mut self, value: u8) {
        self.write_u64(u64::from(value));
    }

    /// Writes an unsigned 16-bit integer.
    pub fn write_u16(&mut self, value: u16) {
        self.write_u64(u64::from(value));
    }

    /// Writes an unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) {
        self.write_u64(u64::from(value));
    }

    /// Writes a 32-bit float.
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.put_u8(tags::FLOAT32);
        self.buffer.put_f32(value);
    }

    /// Writes a 64-bit float.
    pub fn write_f64(&mut self, value: f64) {
        self.buffer.put_u8(tags::FLOAT64);
        self.buffer.put_f64(value);
    }

    /// Writes a UTF-8 string.
    pub fn write_str(&mut self, value: &str) {
        let len = value.len();
        if len < 32 {
            self.buffer.put_u8(tags::FIXSTR_BASE | len as u8);
        } else if len <= usize::from(u8::MAX) {
            self.buffer.put_u8(tags::STR8);
            self.buffer.put_u8(len as u8);
        } else if len <= usize::from(u16::MAX) {
            self.buffer.put_u8(tags::STR16);
            self.buffer.put_u16(len as u16);
        } else {
            self.buffer.put_u8(tags::STR32);
            self.buffer.put_u32(len as u32);
        }
        self.buffer.put_slice(value.as_bytes());
    }

    /// Writes a raw byte blob.
    pub fn write_bin(&mut self, value: &[u8]) {
        let len = value.len();
        if len <= usize::from(u8::MAX) {
            self.buffer.put_u8(tags::BIN8);
            self.buffer.put_u8(len as u8);
        } else if len <= usize::from(u16::MAX) {
            self.buffer.put_u8(tags::BIN16);
            self.buffer.put_u16(len as u16);
        } else {
            self.buffer.put_u8(tags::BIN32);
            self.buffer.put_u32(len as u32);
        }
        self.buffer.put_slice(value);
    }

    /// Writes an array header; the caller writes `len` elements afterwards.
    pub fn write_array_header(&mut self, len: usize) {
        if len < 16 {
            self.buffer.put_u8(tags::FIXARRAY_BASE | len as u8);
        } else if len <= usize::from(u16::MAX) {
            self.buffer.put_u8(tags::ARRAY16);
            self.buffer.put_u16(len as u16);
        } else {
            self.buffer.put_u8(tags::ARRAY32);
            self.buffer.put_u32(len as u32);
        }
    }

    /// Writes a map header; the caller writes `len` key/value pairs afterwards.
    pub fn write_map_header(&mut self, len: usize) {
        if len < 16 {
            self.buffer.put_u8(tags::FIXMAP_BASE | len as u8);
        } else if len <= usize::from(u16::MAX) {
            self.buffer.put_u8(tags::MAP16);
            self.buffer.put_u16(len as u16);
        } else {
            self.buffer.put_u8(tags::MAP32);
            self.buffer.put_u32(len as u32);
        }
    }
}

impl Default for ValueWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_integers_use_fixint() {
        let mut w = ValueWriter::new();
        w.write_i64(7);
        w.write_i64(-3);
        assert_eq!(w.as_bytes(), &[0x07, 0xfd]);
    }

    #[test]
    fn wide_integers_carry_tags() {
        let mut w = ValueWriter::new();
        w.write_u64(300);
        assert_eq!(w.as_bytes(), &[0xcd, 0x01, 0x2c]);

        let mut w = ValueWriter::new();
        w.write_i64(-200);
        assert_eq!(w.as_bytes(), &[0xd1, 0xff, 0x38]);
    }

    #[test]
    fn short_strings_use_fixstr() {
        let mut w = ValueWriter::new();
        w.write_str("ok");
        assert_eq!(w.as_bytes(), &[0xa2, b'o', b'k']);
    }
}
