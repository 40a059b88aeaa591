//! CRC-32 (ISO 3309) implementation.
//!
//! This is the checksum used throughout the XZ container format: stream
//! flags, block headers, the index, the footer, and (optionally) the decoded
//! content all carry CRC-32 fields.
//!
//! - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
//! - Initial value: 0xFFFFFFFF
//! - Final XOR: 0xFFFFFFFF
//! - Reflected input and output

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Incremental CRC-32 calculator.
///
/// # Example
///
/// ```
/// use unlzma2_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), Crc32::compute(b"Hello, World!"));
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    value: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { value: 0xFFFF_FFFF }
    }

    /// Update the CRC with more data.
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.value;
        for &byte in data {
            crc = (crc >> 8) ^ CRC32_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize];
        }
        self.value = crc;
    }

    /// Finish the calculation and return the checksum.
    pub fn finalize(&self) -> u32 {
        self.value ^ 0xFFFF_FFFF
    }

    /// Compute the CRC-32 of a byte slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(Crc32::compute(b""), 0);
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF4_3926);
        assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4A_C3D0);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut crc = Crc32::new();
        for chunk in data.chunks(7) {
            crc.update(chunk);
        }
        assert_eq!(crc.finalize(), Crc32::compute(data));
    }
}
