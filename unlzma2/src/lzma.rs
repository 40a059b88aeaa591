//! The LZMA symbol loop.
//!
//! One call to [`Lzma::run_chunk`] decodes the body of a single compressed
//! chunk: literals, matches and rep-matches, until the chunk's output limit
//! is reached or the range coder runs out of payload. The dictionary is the
//! output buffer itself — match distances index backwards from the write
//! position, never crossing the most recent dictionary reset.

use crate::model::{
    LengthModel, Probabilities, Properties, State, ALIGN_BITS, DIST_MODEL_END, DIST_MODEL_START,
    DIST_SLOT_BITS, DIST_STATES, LEN_HIGH_BITS, LEN_LOW_BITS, LEN_LOW_SYMBOLS, LEN_MID_BITS,
    LEN_MID_SYMBOLS, MATCH_LEN_MIN,
};
use crate::range_coder::{Exhausted, RangeDecoder};

/// Why the symbol loop stopped before the chunk's output limit was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Abort {
    /// The range coder needed a byte past the chunk's compressed payload.
    Exhausted,
    /// The stream is malformed.
    Corrupt,
    /// The caller's output buffer filled up mid-copy.
    OutputFull,
}

impl From<Exhausted> for Abort {
    fn from(_: Exhausted) -> Self {
        Abort::Exhausted
    }
}

/// LZMA decoder state that survives across chunks (unless a chunk resets it).
#[derive(Debug)]
pub(crate) struct Lzma {
    /// Active lc/lp/pb parameters.
    pub props: Properties,
    /// State machine position.
    pub state: State,
    /// The four most recent match distances, most recent first.
    pub rep: [u32; 4],
    /// The full probability table.
    pub probs: Probabilities,
}

impl Lzma {
    pub(crate) fn new() -> Self {
        Self {
            props: Properties::default(),
            state: State::new(),
            rep: [0; 4],
            probs: Probabilities::new(),
        }
    }

    /// State reset: back to the initial state with a fresh probability table.
    ///
    /// The active properties are kept; a chunk that carries new ones installs
    /// them before calling this.
    pub(crate) fn reset(&mut self) {
        self.state = State::new();
        self.rep = [0; 4];
        self.probs.reset();
    }

    /// Decode chunk contents into `out[..out_limit]`, advancing `*outcount`.
    ///
    /// `dict_origin` is the output offset of the most recent dictionary
    /// reset; no distance may reach at or before it. `bounded` records
    /// whether `out_limit` came from the chunk's declared uncompressed size
    /// (overrunning it is then a stream error) or from the caller's capacity
    /// (overrunning it just means the output is full).
    ///
    /// On `Err`, `*outcount` still reflects every byte produced.
    pub(crate) fn run_chunk(
        &mut self,
        rc: &mut RangeDecoder<'_>,
        out: &mut [u8],
        outcount: &mut usize,
        dict_origin: usize,
        out_limit: usize,
        bounded: bool,
    ) -> Result<(), Abort> {
        let pos_mask = self.props.pos_mask();
        let lp_mask = self.props.literal_pos_mask();
        let lc = self.props.lc;

        loop {
            rc.normalize()?;
            let pos = *outcount;
            if pos >= out_limit {
                return Ok(());
            }
            let pos_state = (pos - dict_origin) & pos_mask;
            let st = self.state.value();

            if rc.bit(&mut self.probs.is_match[st][pos_state]) == 0 {
                // Literal.
                let prev = if pos > dict_origin { out[pos - 1] } else { 0 };
                // Widen before shifting: lc = 0 shifts the whole byte out.
                let coder =
                    (usize::from(prev) >> (8 - lc)) | (((pos - dict_origin) & lp_mask) << lc);
                let probs = &mut self.probs.literal[coder];

                let byte = if self.state.is_literal() {
                    rc.bittree(probs, 8)? as u8
                } else {
                    // The previous event was a match, so the byte at rep[0]
                    // guides the tree walk until the first mismatching bit.
                    let rep0 = self.rep[0] as usize;
                    if pos - dict_origin <= rep0 {
                        return Err(Abort::Corrupt);
                    }
                    let mut match_byte = u32::from(out[pos - rep0 - 1]);
                    let mut offset = 0x100u32;
                    let mut symbol = 1u32;
                    while symbol < 0x100 {
                        match_byte <<= 1;
                        let match_bit = match_byte & offset;
                        let i = (offset + match_bit + symbol) as usize;
                        let bit = rc.decode_bit(&mut probs[i])?;
                        symbol = (symbol << 1) | bit;
                        if bit != 0 {
                            offset &= match_bit;
                        } else {
                            offset &= !match_bit;
                        }
                    }
                    symbol as u8
                };
                out[pos] = byte;
                *outcount = pos + 1;
                self.state.update_literal();
                continue;
            }

            // Match or rep-match; either way a length and a distance.
            let len;
            if rc.decode_bit(&mut self.probs.is_rep[st])? == 1 {
                if rc.decode_bit(&mut self.probs.is_rep0[st])? == 0 {
                    if rc.decode_bit(&mut self.probs.is_rep0_long[st][pos_state])? == 0 {
                        // Short rep: a single byte at rep[0].
                        self.state.update_short_rep();
                        len = 1;
                    } else {
                        self.state.update_long_rep();
                        len = decode_len(rc, &mut self.probs.rep_len, pos_state)?;
                    }
                } else {
                    // An older rep distance moves to the front.
                    let tmp;
                    if rc.decode_bit(&mut self.probs.is_rep1[st])? == 0 {
                        tmp = self.rep[1];
                    } else {
                        if rc.decode_bit(&mut self.probs.is_rep2[st])? == 0 {
                            tmp = self.rep[2];
                        } else {
                            tmp = self.rep[3];
                            self.rep[3] = self.rep[2];
                        }
                        self.rep[2] = self.rep[1];
                    }
                    self.rep[1] = self.rep[0];
                    self.rep[0] = tmp;
                    self.state.update_long_rep();
                    len = decode_len(rc, &mut self.probs.rep_len, pos_state)?;
                }
            } else {
                // Fresh match: the rep cache shifts down and a new distance
                // is decoded into rep[0].
                self.state.update_match();
                self.rep[3] = self.rep[2];
                self.rep[2] = self.rep[1];
                self.rep[1] = self.rep[0];

                len = decode_len(rc, &mut self.probs.match_len, pos_state)?;
                let slot_ctx = (len - MATCH_LEN_MIN).min(DIST_STATES - 1);
                let slot = rc.bittree(&mut self.probs.dist_slot[slot_ctx], DIST_SLOT_BITS)?;

                self.rep[0] = if slot < DIST_MODEL_START {
                    slot
                } else {
                    let extra = (slot >> 1) - 1;
                    if slot < DIST_MODEL_END {
                        let dist = (2 | (slot & 1)) << extra;
                        // This slot's tree is rooted at dist - slot; for
                        // slot 4 that is the very first entry of the table.
                        let base = (dist - slot) as usize;
                        dist + rc.bittree_reverse(&mut self.probs.dist_special[base..], extra)?
                    } else {
                        let mut dist = 2 | (slot & 1);
                        dist = (dist << (extra - ALIGN_BITS)) | rc.direct_bits(extra - ALIGN_BITS)?;
                        dist <<= ALIGN_BITS;
                        dist | rc.bittree_reverse(&mut self.probs.dist_align[1..], ALIGN_BITS)?
                    }
                };
            }

            // Copy from the dictionary, i.e. from earlier output.
            let pos = *outcount;
            let dist = self.rep[0] as usize;
            if pos - dict_origin <= dist {
                return Err(Abort::Corrupt);
            }
            let mut len = len;
            let mut overrun = None;
            if out_limit - pos < len {
                len = out_limit - pos;
                overrun = Some(if bounded {
                    Abort::Corrupt
                } else {
                    Abort::OutputFull
                });
            }
            // Byte at a time: the source may overlap the destination when the
            // distance is shorter than the length.
            for i in 0..len {
                out[pos + i] = out[pos + i - dist - 1];
            }
            *outcount = pos + len;
            if let Some(abort) = overrun {
                return Err(abort);
            }
        }
    }
}

/// Decode a match length (2..=273).
fn decode_len(
    rc: &mut RangeDecoder<'_>,
    model: &mut LengthModel,
    pos_state: usize,
) -> Result<usize, Exhausted> {
    if rc.decode_bit(&mut model.choice)? == 0 {
        let sym = rc.bittree(&mut model.low[pos_state], LEN_LOW_BITS)?;
        Ok(MATCH_LEN_MIN + sym as usize)
    } else if rc.decode_bit(&mut model.choice2)? == 0 {
        let sym = rc.bittree(&mut model.mid[pos_state], LEN_MID_BITS)?;
        Ok(MATCH_LEN_MIN + LEN_LOW_SYMBOLS + sym as usize)
    } else {
        let sym = rc.bittree(&mut model.high, LEN_HIGH_BITS)?;
        Ok(MATCH_LEN_MIN + LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS + sym as usize)
    }
}
