//! Block-matching motion estimation and residual coding.
//!
//! For every 8x8 block of the "now" plane, the search compares against the
//! "past" plane at offsets within `[-radius, radius]` in both axes using the
//! sum of absolute differences (SAD). The zero offset is evaluated first and a
//! candidate only replaces the best match when its SAD is strictly lower, so
//! ties always resolve to the earliest offset in scan order (`dy` outer, `dx`
//! inner), and zero motion wins every tie it takes part in.
//!
//! # Boundary policy
//!
//! SAD clips each row of the "now" block at the end of its plane row. When the
//! shifted reference index falls outside the past plane's storage the reference
//! is taken as 0. Note the reference check is against the whole buffer, not the
//! row, so horizontally shifted references may wrap into the neighbouring row.
//! Residuals use proper 2D bounds instead.

use crate::codec::chunker::Chunker;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const BLOCK_SIZE: usize = 8;

/// Largest supported search radius; vectors must fit a nibble once biased.
pub const MAX_RADIUS: u8 = 7;

/// Encoded form of the zero vector.
pub const ZERO_VECTOR: u8 = 0x77;

/// Added to signed residuals to centre them in a byte.
pub const RESIDUAL_BIAS: i32 = 127;

/// How the two chroma planes obtain their vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChromaVectors {
    /// Plane 2 reuses the vectors found for plane 1.
    #[default]
    Shared,
    /// Plane 2 runs its own search.
    Independent,
}

impl ChromaVectors {
    pub fn all() -> &'static [ChromaVectors] {
        &[ChromaVectors::Shared, ChromaVectors::Independent]
    }

    pub fn name(self) -> &'static str {
        match self {
            ChromaVectors::Shared => "shared",
            ChromaVectors::Independent => "independent",
        }
    }
}

/// A per-block displacement in `[-7, 7] x [-7, 7]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionVector {
    pub dx: i8,
    pub dy: i8,
}

impl MotionVector {
    pub const ZERO: MotionVector = MotionVector { dx: 0, dy: 0 };

    pub fn new(dx: i8, dy: i8) -> Self {
        let r = MAX_RADIUS as i8;
        Self {
            dx: dx.clamp(-r, r),
            dy: dy.clamp(-r, r),
        }
    }

    /// High nibble `dx + 7`, low nibble `dy + 7`.
    pub fn encode(self) -> u8 {
        (((self.dx + 7) as u8) << 4) | ((self.dy + 7) as u8 & 0x0f)
    }

    pub fn decode(byte: u8) -> Self {
        Self {
            dx: ((byte >> 4) as i8) - 7,
            dy: ((byte & 0x0f) as i8) - 7,
        }
    }
}

/// SAD between the block of `now` starting at `start_now` and the region of
/// `past` starting at `start_past`.
pub fn sad(now: &[u8], start_now: usize, past: &[u8], start_past: isize, stride: usize) -> u32 {
    if stride == 0 {
        return 0;
    }
    let rows = now.len() / stride;
    let top = start_now / stride;
    let mut total = 0u32;
    for y in 0..BLOCK_SIZE {
        if top + y >= rows {
            break;
        }
        let row_end = (top + y + 1) * stride;
        for x in 0..BLOCK_SIZE {
            let rel = y * stride + x;
            let ia = start_now + rel;
            if ia >= row_end {
                continue;
            }
            let ib = start_past + rel as isize;
            let reference = if ib < 0 {
                None
            } else {
                past.get(ib as usize)
            };
            total += match reference {
                Some(&b) => now[ia].abs_diff(b) as u32,
                None => now[ia] as u32,
            };
        }
    }
    total
}

/// Search for the best offset of the block at `top_left`.
pub fn find_offset(now: &[u8], past: &[u8], top_left: usize, stride: usize, radius: u8) -> MotionVector {
    let radius = radius.min(MAX_RADIUS) as isize;
    let origin = top_left as isize;
    let mut best = MotionVector::ZERO;
    let mut min = sad(now, top_left, past, origin, stride);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let start = origin + dy * stride as isize + dx;
            let candidate = sad(now, top_left, past, start, stride);
            if candidate < min {
                min = candidate;
                best = MotionVector::new(dx as i8, dy as i8);
            }
        }
    }
    best
}

/// Residual of the block at `top_left` against `past` shifted by `vector`,
/// in raster block order. Positions past the plane edge are left at 0.
pub fn residual_block(
    now: &[u8],
    past: &[u8],
    top_left: usize,
    vector: MotionVector,
    width: usize,
    height: usize,
) -> [u8; BLOCK_SIZE * BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE * BLOCK_SIZE];
    for_each_pixel(top_left, vector, width, height, |at, target, reference| {
        let value = match reference {
            Some(r) => now[target] as i32 - past[r] as i32 + RESIDUAL_BIAS,
            None => now[target] as i32 + RESIDUAL_BIAS,
        };
        out[at] = value.clamp(0, 255) as u8;
    });
    out
}

/// Undo [`residual_block`]: rebuild the "now" block from its residual.
pub fn compose_block(
    residual: &[u8],
    past: &[u8],
    top_left: usize,
    vector: MotionVector,
    width: usize,
    height: usize,
) -> [u8; BLOCK_SIZE * BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE * BLOCK_SIZE];
    for_each_pixel(top_left, vector, width, height, |at, target, reference| {
        let delta = residual[target] as i32 - RESIDUAL_BIAS;
        let value = match reference {
            Some(r) => past[r] as i32 + delta,
            None => delta,
        };
        out[at] = value.clamp(0, 255) as u8;
    });
    out
}

/// Visit the in-plane pixels of a block, passing the block-local raster
/// position, the plane index and the shifted reference index (if in bounds).
fn for_each_pixel(
    top_left: usize,
    vector: MotionVector,
    width: usize,
    height: usize,
    mut visit: impl FnMut(usize, usize, Option<usize>),
) {
    if width == 0 {
        return;
    }
    let x0 = top_left % width;
    let y0 = top_left / width;
    for j in 0..BLOCK_SIZE {
        let y = y0 + j;
        if y >= height {
            break;
        }
        let yref = y as isize + vector.dy as isize;
        for i in 0..BLOCK_SIZE {
            let x = x0 + i;
            if x >= width {
                break;
            }
            let xref = x as isize + vector.dx as isize;
            let reference = if xref < 0 || xref >= width as isize || yref < 0 || yref >= height as isize {
                None
            } else {
                Some(yref as usize * width + xref as usize)
            };
            visit(j * BLOCK_SIZE + i, y * width + x, reference);
        }
    }
}

/// Encoded vectors for every block of a `width x height` plane.
pub fn estimate_vectors(now: &[u8], past: &[u8], width: usize, height: usize, radius: u8) -> Vec<u8> {
    let chunker = Chunker::for_plane(BLOCK_SIZE, width, height);
    (0..chunker.block_count())
        .into_par_iter()
        .map(|i| find_offset(now, past, chunker.pixel_index(i), width, radius).encode())
        .collect()
}

/// Residual plane for `now` given per-block encoded `vectors`.
pub fn residual_plane(now: &[u8], past: &[u8], width: usize, height: usize, vectors: &[u8]) -> Vec<u8> {
    let chunker = Chunker::for_plane(BLOCK_SIZE, width, height);
    let blocks: Vec<_> = (0..chunker.block_count())
        .into_par_iter()
        .map(|i| {
            let vector = MotionVector::decode(vectors.get(i).copied().unwrap_or(ZERO_VECTOR));
            residual_block(now, past, chunker.pixel_index(i), vector, width, height)
        })
        .collect();
    let mut out = vec![0u8; width * height];
    for (i, block) in blocks.iter().enumerate() {
        chunker.set_block(&mut out, i, block);
    }
    out
}

/// Rebuild a plane from `past`, its residual and per-block vectors.
pub fn compose_plane(residual: &[u8], past: &[u8], width: usize, height: usize, vectors: &[u8]) -> Vec<u8> {
    let chunker = Chunker::for_plane(BLOCK_SIZE, width, height);
    let blocks: Vec<_> = (0..chunker.block_count())
        .into_par_iter()
        .map(|i| {
            let vector = MotionVector::decode(vectors.get(i).copied().unwrap_or(ZERO_VECTOR));
            compose_block(residual, past, chunker.pixel_index(i), vector, width, height)
        })
        .collect();
    let mut out = vec![0u8; width * height];
    for (i, block) in blocks.iter().enumerate() {
        chunker.set_block(&mut out, i, block);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(width: usize, height: usize) -> Vec<u8> {
        (0..width * height)
            .map(|i| ((i % width) * 13 + (i / width) * 29) as u8)
            .collect()
    }

    #[test]
    fn test_vector_byte_layout() {
        assert_eq!(MotionVector::ZERO.encode(), ZERO_VECTOR);
        assert_eq!(MotionVector::new(-7, 7).encode(), 0x0e);
        assert_eq!(MotionVector::new(7, -7).encode(), 0xe0);
        assert_eq!(MotionVector::decode(0x5a), MotionVector::new(-2, 3));
        assert_eq!(MotionVector::new(9, -12), MotionVector::new(7, -7));
    }

    #[test]
    fn test_identical_blocks_yield_zero_vector() {
        let plane = pattern(8, 8);
        assert_eq!(find_offset(&plane, &plane, 0, 8, 7), MotionVector::ZERO);
        let residual = residual_block(&plane, &plane, 0, MotionVector::ZERO, 8, 8);
        assert!(residual.iter().all(|&r| r == 127));
    }

    #[test]
    fn test_finds_shifted_content() {
        let (w, h) = (32, 32);
        let past = pattern(w, h);
        // now[x, y] = past[x + 2, y - 1]
        let mut now = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                let (sx, sy) = (x + 2, y as isize - 1);
                if sx < w && sy >= 0 {
                    now[y * w + x] = past[sy as usize * w + sx];
                }
            }
        }
        let top_left = 8 * w + 8;
        let v = find_offset(&now, &past, top_left, w, 7);
        assert_eq!(v, MotionVector::new(2, -1));
        let residual = residual_block(&now, &past, top_left, v, w, h);
        assert!(residual.iter().all(|&r| r == 127));
    }

    #[test]
    fn test_tie_prefers_zero_offset() {
        // Uniform planes: every offset that stays in-bounds matches equally
        let plane = vec![50u8; 32 * 32];
        let top_left = 8 * 32 + 8;
        assert_eq!(find_offset(&plane, &plane, top_left, 32, 7), MotionVector::ZERO);
    }

    #[test]
    fn test_tie_prefers_earliest_scanned_offset() {
        // Past rows 7..=14 match a flat "now" block shifted up by one row. Every
        // dx at dy = -1 scores zero; the first one scanned wins.
        let w = 24;
        let now = vec![10u8; w * w];
        let past: Vec<u8> = (0..w * w)
            .map(|i| if (7..=14).contains(&(i / w)) { 10 } else { 0 })
            .collect();
        let top_left = 8 * w + 8;
        let v = find_offset(&now, &past, top_left, w, 1);
        assert_eq!(v, MotionVector::new(-1, -1));
    }

    #[test]
    fn test_sad_clips_rows_and_zero_fills_reference() {
        let w = 10;
        let now = vec![5u8; w * 4];
        let past = vec![5u8; w * 4];
        // block at x=8: only columns 8,9 are in the row; 4 rows exist
        assert_eq!(sad(&now, 8, &past, 8, w), 0);
        // reference entirely before the buffer: every counted pixel adds 5
        assert_eq!(sad(&now, 8, &past, -100, w), 2 * 4 * 5);
    }

    #[test]
    fn test_residual_out_of_bounds_reference() {
        let now = vec![200u8; 64];
        let past = vec![0u8; 64];
        let r = residual_block(&now, &past, 0, MotionVector::new(-1, 0), 8, 8);
        // column 0 references x = -1: 200 + 127 saturates
        assert_eq!(r[0], 255);
        // others: 200 - 0 + 127 also saturates
        let r = residual_block(&vec![10u8; 64], &vec![40u8; 64], 0, MotionVector::new(-1, 0), 8, 8);
        assert_eq!(r[0], 137);
        assert_eq!(r[1], 97);
    }

    #[test]
    fn test_plane_round_trip() {
        let (w, h) = (20, 13);
        let past = pattern(w, h);
        let now: Vec<u8> = past.iter().map(|&p| p.wrapping_add(3)).collect();
        let vectors = estimate_vectors(&now, &past, w, h, 3);
        assert_eq!(vectors.len(), 3 * 2);
        let residual = residual_plane(&now, &past, w, h, &vectors);
        let rebuilt = compose_plane(&residual, &past, w, h, &vectors);
        // exact wherever no saturation occurred
        for i in 0..w * h {
            if residual[i] != 0 && residual[i] != 255 {
                assert_eq!(rebuilt[i], now[i], "pixel {}", i);
            }
        }
    }
}
