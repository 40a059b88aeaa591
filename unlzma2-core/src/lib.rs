//! # unlzma2 Core
//!
//! Shared building blocks for the unlzma2 workspace:
//!
//! - [`error`]: the workspace error type
//! - [`crc`]: CRC-32 (ISO 3309), used by the XZ envelope
//!
//! The decoder itself lives in the `unlzma2` crate; the XZ container layer in
//! `unlzma2-xz`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crc;
pub mod error;

pub use crc::Crc32;
pub use error::{Result, UnlzmaError};
