//! Tagged value reader.
//!
//! Decodes the streams produced by [`crate::ValueWriter`]. Typed reads accept
//! any integer representation whose value fits the requested width, so a
//! writer choosing a compact encoding never breaks the reader.

use crate::error::{IoError, IoResult};
use crate::tags;
use bytes::Bytes;

/// The shape of the next value in a stream, as reported by [`ValueReader::peek_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    Nil,
    Bool,
    Int,
    Uint,
    Float32,
    Float64,
    Str,
    Bin,
    Array,
    Map,
}

/// A reader for deserializing Ember values from a tagged binary stream.
pub struct ValueReader {
    /// The data being read
    data: Bytes,

    /// The current position in the data
    position: usize,
}

impl ValueReader {
    /// Creates a new reader over the given data.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns whether the end of the data has been reached.
    pub fn is_eof(&self) -> bool {
        self.position >= self.data.len()
    }

    fn take(&mut self, count: usize) -> IoResult<&[u8]> {
        if self.remaining() < count {
            return Err(IoError::EndOfStream {
                needed: count - self.remaining(),
            });
        }
        let slice = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    fn take_byte(&mut self) -> IoResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reports the shape of the next value without consuming it.
    pub fn peek_tag(&self) -> IoResult<ValueTag> {
        if self.is_eof() {
            return Err(IoError::EndOfStream { needed: 1 });
        }
        let tag = self.data[self.position];
        let shape = match tag {
            tags::NIL => ValueTag::Nil,
            tags::FALSE | tags::TRUE => ValueTag::Bool,
            0x00..=0x7f | tags::UINT8 | tags::UINT16 | tags::UINT32 | tags::UINT64 => ValueTag::Uint,
            0xe0..=0xff | tags::INT8 | tags::INT16 | tags::INT32 | tags::INT64 => ValueTag::Int,
            tags::FLOAT32 => ValueTag::Float32,
            tags::FLOAT64 => ValueTag::Float64,
            0xa0..=0xbf | tags::STR8 | tags::STR16 | tags::STR32 => ValueTag::Str,
            tags::BIN8 | tags::BIN16 | tags::BIN32 => ValueTag::Bin,
            0x90..=0x9f | tags::ARRAY16 | tags::ARRAY32 => ValueTag::Array,
            0x80..=0x8f | tags::MAP16 | tags::MAP32 => ValueTag::Map,
            _ => {
                return Err(IoError::UnexpectedTag {
                    tag,
                    expected: "a value tag",
                })
            }
        };
        Ok(shape)
    }

    /// Reads a nil marker.
    pub fn read_nil(&mut self) -> IoResult<()> {
        let tag = self.take_byte()?;
        if tag != tags::NIL {
            return Err(IoError::UnexpectedTag {
                tag,
                expected: "nil",
            });
        }
        Ok(())
    }

    /// Reads a boolean value.
    pub fn read_bool(&mut self) -> IoResult<bool> {
        let tag = self.take_byte()?;
        match tag {
            tags::FALSE => Ok(false),
            tags::TRUE => Ok(true),
            _ => Err(IoError::UnexpectedTag {
                tag,
                expected: "bool",
            }),
        }
    }

    /// Reads any integer representation as a widened signed value.
    pub fn read_int(&mut self) -> IoResult<i128> {
        let tag = self.take_byte()?;
        let value = match tag {
            0x00..=0x7f => i128::from(tag),
            0xe0..=0xff => i128::from(tag as i8),
            tags::UINT8 => i128::from(self.take_byte()?),
            tags::UINT16 => i128::from(u16::from_be_bytes(self.take(2)?.try_into().unwrap())),
            tags::UINT32 => i128::from(u32::from_be_bytes(self.take(4)?.try_into().unwrap())),
            tags::UINT64 => i128::from(u64::from_be_bytes(self.take(8)?.try_into().unwrap())),
            tags::INT8 => i128::from(self.take_byte()? as i8),
            tags::INT16 => i128::from(i16::from_be_bytes(self.take(2)?.try_into().unwrap())),
            tags::INT32 => i128::from(i32::from_be_bytes(self.take(4)?.try_into().unwrap())),
            tags::INT64 => i128::from(i64::from_be_bytes(self.take(8)?.try_into().unwrap())),
            _ => {
                return Err(IoError::UnexpectedTag {
                    tag,
                    expected: "integer",
                })
            }
        };
        Ok(value)
    }

    /// Reads a signed 64-bit integer.
    pub fn read_i64(&mut self) -> IoResult<i64> {
        let value = self.read_int()?;
        i64::try_from(value).map_err(|_| IoError::IntegerOutOfRange {
            value,
            target: "i64",
        })
    }

    /// Reads a signed 32-bit integer.
    pub fn read_i32(&mut self) -> IoResult<i32> {
        let value = self.read_int()?;
        i32::try_from(value).map_err(|_| IoError::IntegerOutOfRange {
            value,
            target: "i32",
        })
    }

    /// Reads a signed 16-bit integer.
    pub fn read_i16(&mut self) -> IoResult<i16> {
        let value = self.read_int()?;
        i16::try_from(value).map_err(|_| IoError::IntegerOutOfRange {
            value,
            target: "i16",
        })
    }

    /// Reads a signed 8-bit integer.
    pub fn read_i8(&mut self) -> IoResult<i8> {
        let value = self.read_int()?;
        i8::try_from(value).map_err(|_| IoError::IntegerOutOfRange {
            value,
            target: "i8",
        })
    }

    /// Reads an unsigned 64-bit integer.
    pub fn read_u64(&mut self) -> IoResult<u64> {
        let value = self.read_int()?;
        u64::try_from(value).map_err(|_| IoError::IntegerOutOfRange {
            value,
            target: "u64",
        })
    }

    /// Reads an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> IoResult<u32> {
        let value = self.read_int()?;
        u32::try_from(value).map_err(|_| IoError::IntegerOutOfRange {
            value,
            target: "u32",
        })
    }

    /// Reads an unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> IoResult<u16> {
        let value = self.read_int()?;
        u16::try_from(value).map_err(|_| IoError::IntegerOutOfRange {
            value,
            target: "u16",
        })
    }

    /// Reads an unsigned 8-bit integer.
    pub fn read_u8(&mut self) -> IoResult<u8> {
        let value = self.read_int()?;
        u8::try_from(value).map_err(|_| IoError::IntegerOutOfRange {
            value,
            target: "u8",
        })
    }

    /// Reads a 32-bit float.
    pub fn read_f32(&mut self) -> IoResult<f32> {
        let tag = self.take_byte()?;
        if tag != tags::FLOAT32 {
            return Err(IoError::UnexpectedTag {
                tag,
                expected: "f32",
            });
        }
        Ok(f32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Reads a 64-bit float.
    pub fn read_f64(&mut self) -> IoResult<f64> {
        let tag = self.take_byte()?;
        if tag != tags::FLOAT64 {
            return Err(IoError::UnexpectedTag {
                tag,
                expected: "f64",
            });
        }
        Ok(f64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_length(&mut self, length: usize) -> IoResult<usize> {
        if length > self.remaining() {
            return Err(IoError::InvalidLength {
                length,
                remaining: self.remaining(),
            });
        }
        Ok(length)
    }

    /// Reads a UTF-8 string.
    pub fn read_str(&mut self) -> IoResult<String> {
        let tag = self.take_byte()?;
        let len = match tag {
            0xa0..=0xbf => usize::from(tag & 0x1f),
            tags::STR8 => usize::from(self.take_byte()?),
            tags::STR16 => usize::from(u16::from_be_bytes(self.take(2)?.try_into().unwrap())),
            tags::STR32 => u32::from_be_bytes(self.take(4)?.try_into().unwrap()) as usize,
            _ => {
                return Err(IoError::UnexpectedTag {
                    tag,
                    expected: "str",
                })
            }
        };
        let len = self.read_length(len)?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| IoError::Utf8)
    }

    /// Reads a raw byte blob.
    pub fn read_bin(&mut self) -> IoResult<Vec<u8>> {
        let tag = self.take_byte()?;
        let len = match tag {
            tags::BIN8 => usize::from(self.take_byte()?),
            tags::BIN16 => usize::from(u16::from_be_bytes(self.take(2)?.try_into().unwrap())),
            tags::BIN32 => u32::from_be_bytes(self.take(4)?.try_into().unwrap()) as usize,
            _ => {
                return Err(IoError::UnexpectedTag {
                    tag,
                    expected: "bin",
                })
            }
        };
        let len = self.read_length(len)?;
        Ok(self.take(len)?.to_vec())
    }

    /// Reads an array header, returning the element count.
    pub fn read_array_header(&mut self) -> IoResult<usize> {
        let tag = self.take_byte()?;
        let len = match tag {
            0x90..=0x9f => usize::from(tag & 0x0f),
            tags::ARRAY16 => usize::from(u16::from_be_bytes(self.take(2)?.try_into().unwrap())),
            tags::ARRAY32 => u32::from_be_bytes(self.take(4)?.try_into().unwrap()) as usize,
            _ => {
                return Err(IoError::UnexpectedTag {
                    tag,
                    expected: "array",
                })
            }
        };
        Ok(len)
    }

    /// Reads a map header, returning the pair count.
    pub fn read_map_header(&mut self) -> IoResult<usize> {
        let tag = self.take_byte()?;
        let len = match tag {
            0x80..=0x8f => usize::from(tag & 0x0f),
            tags::MAP16 => usize::from(u16::from_be_bytes(self.take(2)?.try_into().unwrap())),
            tags::MAP32 => u32::from_be_bytes(self.take(4)?.try_into().unwrap()) as usize,
            _ => {
                return Err(IoError::UnexpectedTag {
                    tag,
                    expected: "map",
                })
            }
        };
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueWriter;

    #[test]
    fn round_trip_scalars() {
        let mut w = ValueWriter::new();
        w.write_nil();
        w.write_bool(true);
        w.write_i64(-70_000);
        w.write_u64(u64::MAX);
        w.write_f64(2.5);
        w.write_str("hello");
        w.write_bin(&[1, 2, 3]);

        let mut r = ValueReader::new(w.into_bytes());
        r.read_nil().unwrap();
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_i64().unwrap(), -70_000);
        assert_eq!(r.read_u64().unwrap(), u64::MAX);
        assert_eq!(r.read_f64().unwrap(), 2.5);
        assert_eq!(r.read_str().unwrap(), "hello");
        assert_eq!(r.read_bin().unwrap(), vec![1, 2, 3]);
        assert!(r.is_eof());
    }

    #[test]
    fn round_trip_containers() {
        let mut w = ValueWriter::new();
        w.write_array_header(2);
        w.write_i32(1);
        w.write_i32(2);
        w.write_map_header(1);
        w.write_str("k");
        w.write_u8(9);

        let mut r = ValueReader::new(w.into_bytes());
        assert_eq!(r.read_array_header().unwrap(), 2);
        assert_eq!(r.read_i32().unwrap(), 1);
        assert_eq!(r.read_i32().unwrap(), 2);
        assert_eq!(r.read_map_header().unwrap(), 1);
        assert_eq!(r.read_str().unwrap(), "k");
        assert_eq!(r.read_u8().unwrap(), 9);
    }

    #[test]
    fn narrow_reads_reject_wide_values() {
        let mut w = ValueWriter::new();
        w.write_i64(40_000);
        let mut r = ValueReader::new(w.into_bytes());
        assert!(matches!(
            r.read_i16(),
            Err(IoError::IntegerOutOfRange { .. })
        ));
    }

    #[test]
    fn truncated_stream_is_detected() {
        let mut r = ValueReader::new(vec![0xda, 0x00]);
        assert!(matches!(r.read_str(), Err(IoError::EndOfStream { .. })));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut w = ValueWriter::new();
        w.write_str("x");
        let mut r = ValueReader::new(w.into_bytes());
        assert_eq!(r.peek_tag().unwrap(), ValueTag::Str);
        assert_eq!(r.peek_tag().unwrap(), ValueTag::Str);
        assert_eq!(r.read_str().unwrap(), "x");
    }
}
