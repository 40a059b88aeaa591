//! LZMA2 chunk framing and the one-shot entry points.
//!
//! An LZMA2 stream is a sequence of chunks, each led by a control byte:
//!
//! - `0x00`: end of stream
//! - `0x01`: uncompressed chunk, dictionary reset
//! - `0x02`: uncompressed chunk, no reset
//! - `0x03..=0x7F`: reserved
//! - `0x80..=0xFF`: LZMA compressed chunk; bits 5..7 select dictionary,
//!   state and property resets, bits 0..4 are the top of the uncompressed
//!   size
//!
//! Uncompressed chunks carry a 16-bit size; compressed chunks carry 16-bit
//! uncompressed/compressed size fields (both stored minus one; the
//! uncompressed size gains five more bits from the control byte, so a chunk
//! expands to at most 2 MiB from at most 64 KiB).
//!
//! The first chunk must reset the dictionary, and the first compressed chunk
//! after any dictionary reset must carry a property byte.

use crate::lzma::{Abort, Lzma};
use crate::model::Properties;
use crate::range_coder::{RangeDecoder, INIT_BYTES};
use unlzma2_core::error::{Result, UnlzmaError};

/// Decoder status, reported alongside the cursor positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The stream's end marker was consumed, or the output was exactly
    /// filled by a complete chunk.
    Ok,
    /// Reserved for decoders that allocate; never returned here.
    NoMemory,
    /// The stream is malformed.
    DataError,
    /// The input ended before the stream did; more input would have allowed
    /// progress.
    InputLimit,
    /// The output buffer cannot hold the next byte; more output would have
    /// allowed progress.
    OutputLimit,
}

impl Status {
    /// Whether this is the success status.
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

/// Result of a one-shot decode: a status plus how far each cursor moved.
///
/// The counts are valid for every status — on error they mark where the
/// decoder stopped.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    /// Decode status.
    pub status: Status,
    /// Bytes consumed from the input.
    pub consumed: usize,
    /// Bytes written to the output.
    pub produced: usize,
}

/// Decompress a complete LZMA2 stream from `input` into `output`.
///
/// This is the primary entry point: it never allocates, never reads past
/// `input`, never writes past `output`, and always reports how much of each
/// buffer it used. The output buffer doubles as the LZ dictionary, so it
/// bounds the longest reachable match distance.
///
/// This is a one-shot call; to retry with a larger buffer, start over.
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> Outcome {
    let mut consumed = 0;
    let mut produced = 0;
    let status = run(input, &mut consumed, output, &mut produced);
    Outcome {
        status,
        consumed,
        produced,
    }
}

/// [`decompress_into`], with non-success statuses converted to the workspace
/// error type.
///
/// Returns `(consumed, produced)` on success.
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<(usize, usize)> {
    let outcome = decompress_into(input, output);
    match outcome.status {
        Status::Ok => Ok((outcome.consumed, outcome.produced)),
        Status::DataError => Err(UnlzmaError::corrupted(
            outcome.consumed,
            "malformed LZMA2 stream",
        )),
        Status::InputLimit => Err(UnlzmaError::truncated(outcome.consumed)),
        Status::OutputLimit => Err(UnlzmaError::output_full(outcome.produced)),
        Status::NoMemory => Err(UnlzmaError::corrupted(
            outcome.consumed,
            "decoder requested memory",
        )),
    }
}

/// The chunk loop. Cursor positions are written through even on early return.
fn run(input: &[u8], incount: &mut usize, out: &mut [u8], outcount: &mut usize) -> Status {
    let mut lzma = Lzma::new();
    let mut need_props = false;
    let mut dict_reset_done = false;
    let mut dict_origin = 0usize;

    loop {
        if *incount >= input.len() {
            return Status::InputLimit;
        }
        let control = input[*incount];
        *incount += 1;

        if control == 0x00 {
            return Status::Ok;
        }
        if control >= 0xE0 || control == 0x01 {
            // Dictionary reset; the next compressed chunk must carry
            // properties.
            need_props = true;
            dict_origin = *outcount;
            dict_reset_done = true;
        } else if !dict_reset_done {
            return Status::DataError;
        }

        if control >= 0x80 {
            // LZMA compressed chunk.
            if control >= 0xC0 {
                need_props = false;
            } else if need_props {
                return Status::DataError;
            }

            if input.len() - *incount < 4 {
                return Status::InputLimit;
            }
            let hdr = [
                input[*incount],
                input[*incount + 1],
                input[*incount + 2],
                input[*incount + 3],
            ];
            *incount += 4;
            let uncompressed = ((usize::from(control & 0x1F) << 16)
                | (usize::from(hdr[0]) << 8)
                | usize::from(hdr[1]))
                + 1;
            let compressed = ((usize::from(hdr[2]) << 8) | usize::from(hdr[3])) + 1;

            if control >= 0xC0 {
                if *incount >= input.len() {
                    return Status::InputLimit;
                }
                let byte = input[*incount];
                *incount += 1;
                match Properties::from_byte(byte) {
                    Some(props) => lzma.props = props,
                    None => return Status::DataError,
                }
            }
            if control >= 0xA0 {
                lzma.reset();
            }

            let rc_limit = (*incount + compressed).min(input.len());
            if compressed < INIT_BYTES {
                return Status::DataError;
            }
            if input.len() - *incount < INIT_BYTES {
                return Status::InputLimit;
            }
            let mut rc = RangeDecoder::new(input, *incount, rc_limit);

            // Cap the chunk's output at whichever is nearer: its declared
            // size or the caller's buffer. Which one it was decides how an
            // overrunning match is reported.
            let mut out_limit = out.len();
            let mut bounded = false;
            if out_limit - *outcount > uncompressed {
                out_limit = *outcount + uncompressed;
                bounded = true;
            }

            let res = lzma.run_chunk(&mut rc, out, outcount, dict_origin, out_limit, bounded);
            *incount = rc.pos();
            match res {
                Ok(()) => {
                    // The chunk produced its bytes; it must also have
                    // consumed exactly the compressed bytes it declared.
                    if *incount < rc_limit {
                        return Status::DataError;
                    }
                }
                Err(Abort::Exhausted) => {
                    return if *incount >= input.len() {
                        Status::InputLimit
                    } else {
                        Status::DataError
                    };
                }
                Err(Abort::Corrupt) => return Status::DataError,
                Err(Abort::OutputFull) => return Status::OutputLimit,
            }
        } else if control > 0x02 {
            return Status::DataError;
        } else {
            // Uncompressed chunk: a 16-bit size minus one, then the bytes.
            if input.len() - *incount < 2 {
                return Status::InputLimit;
            }
            let declared =
                ((usize::from(input[*incount]) << 8) | usize::from(input[*incount + 1])) + 1;
            *incount += 2;

            let mut copy_len = declared;
            let mut status = Status::Ok;
            if input.len() - *incount < copy_len {
                copy_len = input.len() - *incount;
                status = Status::InputLimit;
            }
            if out.len() - *outcount < copy_len {
                copy_len = out.len() - *outcount;
                status = Status::OutputLimit;
            }
            out[*outcount..*outcount + copy_len]
                .copy_from_slice(&input[*incount..*incount + copy_len]);
            *incount += copy_len;
            *outcount += copy_len;
            if status != Status::Ok {
                return status;
            }
        }
    }
}
