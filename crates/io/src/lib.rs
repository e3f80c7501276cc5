//! Tagged binary value codec for the Ember virtual machine.
//!
//! Every Ember object serializes into a length-prefixed stream of tagged
//! values that is wire-compatible with the MsgPack family for the subset in
//! use: nil, bool, signed and unsigned integers, floats, strings, byte
//! blobs, and array/map headers. The VM itself never interprets the payload;
//! it only moves these streams between objects, the persistent state
//! observer, and the host.

#![warn(rustdoc::missing_crate_level_docs)]

/// Codec error types
pub mod error;
/// Tagged value reader
pub mod reader;
/// Tagged value writer
pub mod writer;

pub use error::{IoError, IoResult};
pub use reader::{ValueReader, ValueTag};
pub use writer::ValueWriter;

/// Format tag bytes shared by the reader and writer.
pub(crate) mod tags {
    pub const NIL: u8 = 0xc0;
    pub const FALSE: u8 = 0xc2;
    pub const TRUE: u8 = 0xc3;

    pub const BIN8: u8 = 0xc4;
    pub const BIN16: u8 = 0xc5;
    pub const BIN32: u8 = 0xc6;

    pub const FLOAT32: u8 = 0xca;
    pub const FLOAT64: u8 = 0xcb;

    pub const UINT8: u8 = 0xcc;
    pub const UINT16: u8 = 0xcd;
    pub const UINT32: u8 = 0xce;
    pub const UINT64: u8 = 0xcf;

    pub const INT8: u8 = 0xd0;
    pub const INT16: u8 = 0xd1;
    pub const INT32: u8 = 0xd2;
    pub const INT64: u8 = 0xd3;

    pub const FIXSTR_BASE: u8 = 0xa0;
    pub const STR8: u8 = 0xd9;
    pub const STR16: u8 = 0xda;
    pub const STR32: u8 = 0xdb;

    pub const FIXARRAY_BASE: u8 = 0x90;
    pub const ARRAY16: u8 = 0xdc;
    pub const ARRAY32: u8 = 0xdd;

    pub const FIXMAP_BASE: u8 = 0x80;
    pub const MAP16: u8 = 0xde;
    pub const MAP32: u8 = 0xdf;
}
