//! Error types for the Ember IO crate.

use thiserror::Error;

/// Errors raised while encoding or decoding a tagged value stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    /// The reader ran off the end of the buffer.
    #[error("end of stream: needed {needed} more bytes")]
    EndOfStream { needed: usize },

    /// The next tag in the stream did not match the requested read.
    #[error("unexpected tag {tag:#04x}: expected {expected}")]
    UnexpectedTag { tag: u8, expected: &'static str },

    /// A length prefix exceeded the remaining data.
    #[error("invalid length {length}: only {remaining} bytes remain")]
    InvalidLength { length: usize, remaining: usize },

    /// A decoded integer did not fit the requested width.
    #[error("integer {value} out of range for {target}")]
    IntegerOutOfRange { value: i128, target: &'static str },

    /// A string payload was not valid UTF-8.
    #[error("invalid utf-8 in string payload")]
    Utf8,
}

/// Result type for codec operations.
pub type IoResult<T> = Result<T, IoError>;
