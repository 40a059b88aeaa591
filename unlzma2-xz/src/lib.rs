//! XZ container handling for buffer-oriented decompression.
//!
//! Based on the XZ file format specification:
//! <https://tukaani.org/xz/xz-file-format.txt>
//!
//! An XZ file wraps its compressed payload in a fixed amount of framing:
//!
//! ```text
//! ┌───────────────┬──────────────┬─────────────┬───────┬───────┬────────┐
//! │ stream header │ block header │ LZMA2 data  │ check │ index │ footer │
//! │   12 bytes    │  multiple 4  │ + padding   │ 0-32  │       │ 12     │
//! └───────────────┴──────────────┴─────────────┴───────┴───────┴────────┘
//! ```
//!
//! This crate validates the framing of a single-block stream entirely
//! in-place and hands back the raw LZMA2 payload as a sub-slice, so the
//! decoder never sees the container. Every framing structure carries a CRC-32
//! which is verified during [`strip`]; the content check (if the stream
//! carries one) is verified separately after decoding via
//! [`RawStream::verify`].
//!
//! Multi-block streams, multi-stream files and non-LZMA2 filter chains are
//! rejected — this is a companion to a one-shot decoder, not a general XZ
//! reader.

#![warn(missing_docs)]
#![warn(clippy::all)]

use unlzma2_core::error::{Result, UnlzmaError};
use unlzma2_core::Crc32;

/// XZ magic bytes: 0xFD, '7', 'z', 'X', 'Z', 0x00.
pub const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];

/// XZ footer magic bytes: 'Y', 'Z'.
pub const XZ_FOOTER_MAGIC: [u8; 2] = [0x59, 0x5A];

/// Content check types defined by the XZ format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CheckType {
    /// No check.
    None = 0x00,
    /// CRC-32.
    Crc32 = 0x01,
    /// CRC-64.
    Crc64 = 0x04,
    /// SHA-256.
    Sha256 = 0x0A,
}

impl CheckType {
    /// Create from a check ID.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::None),
            0x01 => Some(Self::Crc32),
            0x04 => Some(Self::Crc64),
            0x0A => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Size of the check field in bytes.
    pub fn size(self) -> usize {
        match self {
            CheckType::None => 0,
            CheckType::Crc32 => 4,
            CheckType::Crc64 => 8,
            CheckType::Sha256 => 32,
        }
    }
}

/// XZ stream flags (two bytes in the header and footer).
#[derive(Debug, Clone, Copy)]
pub struct StreamFlags {
    /// Content check type (low nibble of the second byte).
    pub check_type: CheckType,
}

impl StreamFlags {
    /// Decode stream flags from their two-byte representation.
    pub fn decode(bytes: [u8; 2]) -> Result<Self> {
        if bytes[0] != 0x00 {
            return Err(UnlzmaError::invalid_header(
                "Invalid XZ stream flags: reserved byte is not zero",
            ));
        }
        if bytes[1] & 0xF0 != 0 {
            return Err(UnlzmaError::invalid_header(
                "Invalid XZ stream flags: reserved bits are set",
            ));
        }
        let check_type = CheckType::from_id(bytes[1] & 0x0F).ok_or_else(|| {
            UnlzmaError::invalid_header(format!(
                "Unsupported XZ check type: {}",
                bytes[1] & 0x0F
            ))
        })?;
        Ok(Self { check_type })
    }
}

/// The raw LZMA2 payload of a stripped XZ stream.
///
/// `payload` still includes the block padding (up to three zero bytes) that
/// aligns the compressed data; the decoder stops at the stream's end marker
/// and [`verify`](Self::verify) tolerates the remainder.
#[derive(Debug)]
pub struct RawStream<'a> {
    /// The raw LZMA2 stream, plus up to three trailing padding bytes.
    pub payload: &'a [u8],
    /// The content check type declared by the stream flags.
    pub check_type: CheckType,
    check_value: &'a [u8],
}

fn le32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Quick probe: does this buffer look like an XZ stream?
///
/// True when the magic matches and the stream flags pass their CRC-32 —
/// enough to distinguish an XZ file from a raw LZMA2 stream without parsing
/// the rest of the container.
pub fn is_xz(data: &[u8]) -> bool {
    data.len() >= 12
        && data[..6] == XZ_MAGIC
        && Crc32::compute(&data[6..8]) == le32(&data[8..12])
}

/// Validate a single-block XZ container and return its LZMA2 payload.
///
/// Checks, in order: stream header magic and flags CRC, block header shape
/// and CRC, footer magic/flags/CRC, and the index (which must describe
/// exactly one block) with its CRC. The payload sub-slice spans from the end
/// of the block header to the start of the content check field.
pub fn strip(data: &[u8]) -> Result<RawStream<'_>> {
    // Smallest conceivable single-block file: header 12 + block header 8 +
    // payload + index 8 + footer 12.
    if data.len() < 40 {
        return Err(UnlzmaError::invalid_header("XZ stream too short"));
    }
    if data[..6] != XZ_MAGIC {
        return Err(UnlzmaError::invalid_magic(XZ_MAGIC, &data[..6]));
    }
    let flags_bytes = [data[6], data[7]];
    let expected = le32(&data[8..12]);
    let computed = Crc32::compute(&flags_bytes);
    if expected != computed {
        return Err(UnlzmaError::crc_mismatch(expected, computed));
    }
    let flags = StreamFlags::decode(flags_bytes)?;

    // Block header. A zero size byte would be the index indicator, i.e. a
    // stream with no blocks at all.
    let size_byte = data[12] as usize;
    if size_byte == 0 {
        return Err(UnlzmaError::invalid_header("XZ stream contains no blocks"));
    }
    let header_end = 12 + (size_byte + 1) * 4;
    if header_end + 12 + 8 > data.len() {
        return Err(UnlzmaError::invalid_header("XZ block header out of bounds"));
    }
    if data[13] & 0x03 != 0 {
        return Err(UnlzmaError::invalid_header(
            "XZ block uses more than one filter",
        ));
    }
    let expected = le32(&data[header_end - 4..header_end]);
    let computed = Crc32::compute(&data[12..header_end - 4]);
    if expected != computed {
        return Err(UnlzmaError::crc_mismatch(expected, computed));
    }

    // Footer: CRC32, backward size, stream flags again, then "YZ".
    let len = data.len();
    if data[len - 2..] != XZ_FOOTER_MAGIC {
        return Err(UnlzmaError::invalid_header("Invalid XZ footer magic"));
    }
    if data[len - 4..len - 2] != flags_bytes {
        return Err(UnlzmaError::invalid_header(
            "XZ footer stream flags don't match the header",
        ));
    }
    let expected = le32(&data[len - 12..len - 8]);
    let computed = Crc32::compute(&data[len - 8..len - 2]);
    if expected != computed {
        return Err(UnlzmaError::crc_mismatch(expected, computed));
    }
    let backward = le32(&data[len - 8..len - 4]) as usize;

    // The index sits between the check field and the footer; its stored size
    // is (real size / 4) - 1.
    let index_start = len
        .checked_sub(16)
        .and_then(|v| v.checked_sub(backward.checked_mul(4)?))
        .ok_or_else(|| UnlzmaError::invalid_header("XZ index position out of bounds"))?;
    if backward < 1 || index_start < header_end {
        return Err(UnlzmaError::invalid_header("XZ index position out of bounds"));
    }
    if data[index_start] != 0x00 {
        return Err(UnlzmaError::invalid_header("Missing XZ index indicator"));
    }
    if data[index_start + 1] != 0x01 {
        return Err(UnlzmaError::invalid_header(
            "XZ index describes more than one block",
        ));
    }
    let expected = le32(&data[len - 16..len - 12]);
    let computed = Crc32::compute(&data[index_start..len - 16]);
    if expected != computed {
        return Err(UnlzmaError::crc_mismatch(expected, computed));
    }

    let check_size = flags.check_type.size();
    let payload_end = index_start
        .checked_sub(check_size)
        .filter(|&end| end >= header_end)
        .ok_or_else(|| UnlzmaError::invalid_header("XZ check field out of bounds"))?;

    Ok(RawStream {
        payload: &data[header_end..payload_end],
        check_type: flags.check_type,
        check_value: &data[payload_end..index_start],
    })
}

impl RawStream<'_> {
    /// Verify the decoded content against the stream's check field.
    ///
    /// `consumed` is how much of [`payload`](Self::payload) the decoder used;
    /// at most three zero padding bytes may follow it. CRC-32 checks are
    /// verified; CRC-64 and SHA-256 are accepted without verification, and a
    /// checkless stream always passes.
    pub fn verify(&self, consumed: usize, decoded: &[u8]) -> Result<()> {
        let padding = self
            .payload
            .get(consumed..)
            .ok_or_else(|| UnlzmaError::corrupted(consumed, "decoder overran the payload"))?;
        if padding.len() > 3 || padding.iter().any(|&b| b != 0) {
            return Err(UnlzmaError::corrupted(
                consumed,
                "invalid block padding after the compressed data",
            ));
        }
        if self.check_type == CheckType::Crc32 {
            let expected = le32(self.check_value);
            let computed = Crc32::compute(decoded);
            if expected != computed {
                return Err(UnlzmaError::crc_mismatch(expected, computed));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_type_sizes() {
        assert_eq!(CheckType::None.size(), 0);
        assert_eq!(CheckType::Crc32.size(), 4);
        assert_eq!(CheckType::Crc64.size(), 8);
        assert_eq!(CheckType::Sha256.size(), 32);
        assert_eq!(CheckType::from_id(0x02), None);
    }

    #[test]
    fn test_stream_flags_reserved_bits() {
        assert!(StreamFlags::decode([0x00, 0x01]).is_ok());
        assert!(StreamFlags::decode([0x01, 0x01]).is_err());
        assert!(StreamFlags::decode([0x00, 0x11]).is_err());
        assert!(StreamFlags::decode([0x00, 0x0F]).is_err());
    }

    #[test]
    fn test_is_xz_rejects_near_misses() {
        assert!(!is_xz(b""));
        assert!(!is_xz(&XZ_MAGIC));
        // Right magic, garbage flags CRC.
        let mut data = [0u8; 12];
        data[..6].copy_from_slice(&XZ_MAGIC);
        data[7] = 0x01;
        assert!(!is_xz(&data));
    }
}
