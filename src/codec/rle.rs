//! Byte-oriented run-length coding.
//!
//! A byte other than [`RLE_TOKEN`] is a literal. [`RLE_TOKEN`] always starts a
//! `[TOKEN, count, value]` triple. Runs of two or more are written as triples
//! (split at 255) and a lone literal equal to the token is escaped as a run of
//! one, so every byte value round-trips. A count of zero never appears in a
//! valid stream.

use super::error::RleFault;

pub const RLE_TOKEN: u8 = 128;
pub const MAX_RUN: usize = 255;

/// Append the run-length encoding of `data` to `out`.
pub fn encode(data: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < data.len() {
        let value = data[i];
        let mut run = 1;
        while i + run < data.len() && data[i + run] == value && run < MAX_RUN {
            run += 1;
        }
        if run == 1 && value != RLE_TOKEN {
            out.push(value);
        } else {
            out.extend_from_slice(&[RLE_TOKEN, run as u8, value]);
        }
        i += run;
    }
}

/// Decode from `input[*pos..]` until `out` is full, advancing `pos`.
///
/// Fault offsets are indices into `input`.
pub fn decode_into(input: &[u8], pos: &mut usize, out: &mut [u8]) -> Result<(), RleFault> {
    let mut filled = 0;
    while filled < out.len() {
        let at = *pos;
        let &byte = input.get(at).ok_or(RleFault::Truncated { offset: at })?;
        if byte != RLE_TOKEN {
            out[filled] = byte;
            filled += 1;
            *pos += 1;
            continue;
        }
        let (&count, &value) = match (input.get(at + 1), input.get(at + 2)) {
            (Some(c), Some(v)) => (c, v),
            _ => return Err(RleFault::Truncated { offset: input.len() }),
        };
        let count = count as usize;
        if count == 0 {
            return Err(RleFault::ZeroRun { offset: at });
        }
        if filled + count > out.len() {
            return Err(RleFault::Overflow { offset: at });
        }
        out[filled..filled + count].fill(value);
        filled += count;
        *pos += 3;
    }
    Ok(())
}

/// Decode exactly `len` bytes from the start of `input`.
pub fn decode(input: &[u8], len: usize) -> Result<Vec<u8>, RleFault> {
    let mut out = vec![0u8; len];
    let mut pos = 0;
    decode_into(input, &mut pos, &mut out)?;
    Ok(out)
}
