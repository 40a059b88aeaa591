//! # unlzma2
//!
//! One-shot, buffer-to-buffer LZMA2 decompression.
//!
//! LZMA2 is the chunked container around raw LZMA used by XZ and 7-Zip. This
//! crate decodes a complete LZMA2 stream from one input slice into one output
//! slice, reporting how much of each was used. It is meant for decompressing
//! constant data whose decoded size has a known bound — the shape of zlib's
//! `uncompress()`, not a streaming reader.
//!
//! ## Usage
//!
//! ```
//! use unlzma2::{decompress_into, Status};
//!
//! // A single uncompressed chunk holding "Hello" plus the end marker.
//! let stream = [0x01, 0x00, 0x04, b'H', b'e', b'l', b'l', b'o', 0x00];
//! let mut out = [0u8; 16];
//! let outcome = decompress_into(&stream, &mut out);
//! assert_eq!(outcome.status, Status::Ok);
//! assert_eq!(&out[..outcome.produced], b"Hello");
//! ```
//!
//! ## Model
//!
//! - The dictionary is the output buffer itself: match distances refer to
//!   earlier decoded bytes, so the effective dictionary size is capped by the
//!   caller's output capacity.
//! - The decoder performs no allocation and no I/O; all working state
//!   (~29 KiB, dominated by the probability table) lives on the stack for the
//!   duration of the call.
//! - Errors are never recovered internally: decoding stops at the first bad
//!   signal and the cursor positions reached are reported either way.
//!
//! See [`Status`] for the possible outcomes and [`decompress`] for a
//! `Result`-flavoured wrapper.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod lzma;
mod lzma2;
mod model;
mod range_coder;

pub use lzma2::{decompress, decompress_into, Outcome, Status};
