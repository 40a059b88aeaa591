//! Error types for unlzma2 operations.
//!
//! One error enum covers the whole workspace: container validation errors
//! from the XZ envelope layer, decode errors from the LZMA2 decoder, and I/O
//! errors from the test bench.

use std::io;
use thiserror::Error;

/// The main error type for unlzma2 operations.
#[derive(Debug, Error)]
pub enum UnlzmaError {
    /// I/O error from an underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in a container header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// CRC checksum mismatch.
    #[error("CRC mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Expected CRC value from the container.
        expected: u32,
        /// Computed CRC value from the data.
        computed: u32,
    },

    /// Invalid header format.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Corrupted compressed data.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: usize,
        /// Description of the corruption.
        message: String,
    },

    /// Input ended before the stream did.
    #[error("Truncated input: stream continues past offset {offset}")]
    TruncatedInput {
        /// Bytes consumed before the input ran out.
        offset: usize,
    },

    /// Output buffer cannot hold the next decoded byte.
    #[error("Output buffer full after {produced} bytes")]
    OutputFull {
        /// Bytes produced before the buffer filled up.
        produced: usize,
    },
}

/// Result type alias for unlzma2 operations.
pub type Result<T> = std::result::Result<T, UnlzmaError>;

impl UnlzmaError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: usize, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create a truncated input error.
    pub fn truncated(offset: usize) -> Self {
        Self::TruncatedInput { offset }
    }

    /// Create an output-full error.
    pub fn output_full(produced: usize) -> Self {
        Self::OutputFull { produced }
    }
}
