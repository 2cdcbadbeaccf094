//! 8x8 block cosine transform with quantization.
//!
//! The forward pass computes the orthonormal 2D DCT-II of each block, divides
//! by the quantization table and saturates to a byte. Coefficients outside
//! `[0, 255]` are clamped, never wrapped. The inverse pass multiplies back and
//! applies the matching DCT-III.
//!
//! Quantization tables are the textbook luminance/chrominance tables,
//! optionally rescaled by a quality factor in `[1, 100]` (50 = unscaled).

use crate::codec::chunker::Chunker;
use rayon::prelude::*;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

pub const BLOCK_SIZE: usize = 8;
pub const BLOCK_LEN: usize = BLOCK_SIZE * BLOCK_SIZE;

/// Quality that reproduces the base tables exactly.
pub const DEFAULT_QUALITY: u8 = 50;

pub type QuantTable = [[u16; BLOCK_SIZE]; BLOCK_SIZE];

/// Luminance quantization table, indexed `[v][u]`.
pub const LUMA_QUANTIZATION: QuantTable = [
    [16, 11, 10, 16, 24, 40, 51, 61],
    [12, 12, 14, 19, 26, 58, 60, 55],
    [14, 13, 16, 24, 40, 57, 69, 56],
    [14, 17, 22, 29, 51, 87, 80, 62],
    [18, 22, 37, 56, 68, 109, 103, 77],
    [24, 35, 55, 64, 81, 104, 113, 92],
    [49, 64, 78, 87, 103, 121, 120, 101],
    [72, 92, 95, 98, 112, 100, 103, 99],
];

/// Chrominance quantization table, indexed `[v][u]`.
pub const CHROMA_QUANTIZATION: QuantTable = [
    [17, 18, 24, 47, 99, 99, 99, 99],
    [18, 21, 26, 66, 99, 99, 99, 99],
    [24, 26, 56, 99, 99, 99, 99, 99],
    [47, 66, 99, 99, 99, 99, 99, 99],
    [99, 99, 99, 99, 99, 99, 99, 99],
    [99, 99, 99, 99, 99, 99, 99, 99],
    [99, 99, 99, 99, 99, 99, 99, 99],
    [99, 99, 99, 99, 99, 99, 99, 99],
];

/// Scale a base table by `quality` (0 is treated as 1, values above 100 as 100).
pub fn scale_table(base: &QuantTable, quality: u8) -> QuantTable {
    let q = quality.clamp(1, 100) as u32;
    let scale = if q < 50 { 5000 / q } else { 200 - 2 * q };
    let mut out = [[0u16; BLOCK_SIZE]; BLOCK_SIZE];
    for (row_out, row_in) in out.iter_mut().zip(base) {
        for (o, &b) in row_out.iter_mut().zip(row_in) {
            *o = ((b as u32 * scale + 50) / 100).clamp(1, 255) as u16;
        }
    }
    out
}

/// Table for a plane: plane 0 uses luma, every other plane chroma.
pub fn table_for_plane(plane: usize, quality: u8) -> QuantTable {
    if plane == 0 {
        scale_table(&LUMA_QUANTIZATION, quality)
    } else {
        scale_table(&CHROMA_QUANTIZATION, quality)
    }
}

/// `COS[x][u] = cos((2x + 1) u pi / 16)`
fn cosines() -> [[f64; BLOCK_SIZE]; BLOCK_SIZE] {
    let mut table = [[0.0; BLOCK_SIZE]; BLOCK_SIZE];
    for (x, row) in table.iter_mut().enumerate() {
        for (u, c) in row.iter_mut().enumerate() {
            *c = (((2 * x + 1) * u) as f64 * PI / (2 * BLOCK_SIZE) as f64).cos();
        }
    }
    table
}

#[inline]
fn norm(k: usize) -> f64 {
    if k == 0 {
        FRAC_1_SQRT_2
    } else {
        1.0
    }
}

fn saturate(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Unquantized forward DCT of a raster-order 8x8 block. Output is raster
/// order by `(v, u)`.
pub fn forward_coefficients(block: &[u8]) -> [f64; BLOCK_LEN] {
    let cos = cosines();
    let mut out = [0.0; BLOCK_LEN];
    for v in 0..BLOCK_SIZE {
        for u in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for y in 0..BLOCK_SIZE {
                for x in 0..BLOCK_SIZE {
                    acc += cos[x][u] * cos[y][v] * block[y * BLOCK_SIZE + x] as f64;
                }
            }
            out[v * BLOCK_SIZE + u] = acc * 2.0 / BLOCK_SIZE as f64 * norm(u) * norm(v);
        }
    }
    out
}

/// Inverse DCT of unquantized coefficients back to (unclamped) pixel values.
pub fn inverse_coefficients(coeffs: &[f64; BLOCK_LEN]) -> [f64; BLOCK_LEN] {
    let cos = cosines();
    let mut out = [0.0; BLOCK_LEN];
    for y in 0..BLOCK_SIZE {
        for x in 0..BLOCK_SIZE {
            let mut acc = 0.0;
            for v in 0..BLOCK_SIZE {
                for u in 0..BLOCK_SIZE {
                    acc += norm(u) * norm(v) * coeffs[v * BLOCK_SIZE + u] * cos[x][u] * cos[y][v];
                }
            }
            out[y * BLOCK_SIZE + x] = acc * 2.0 / BLOCK_SIZE as f64;
        }
    }
    out
}

/// Forward transform and quantize one block.
pub fn forward_block(block: &[u8], table: &QuantTable) -> [u8; BLOCK_LEN] {
    let coeffs = forward_coefficients(block);
    let mut out = [0u8; BLOCK_LEN];
    for (i, c) in coeffs.iter().enumerate() {
        out[i] = saturate(c / table[i / BLOCK_SIZE][i % BLOCK_SIZE] as f64);
    }
    out
}

/// Dequantize and inverse transform one block.
pub fn inverse_block(block: &[u8], table: &QuantTable) -> [u8; BLOCK_LEN] {
    let mut coeffs = [0.0; BLOCK_LEN];
    for (i, c) in coeffs.iter_mut().enumerate() {
        *c = block[i] as f64 * table[i / BLOCK_SIZE][i % BLOCK_SIZE] as f64;
    }
    let pixels = inverse_coefficients(&coeffs);
    let mut out = [0u8; BLOCK_LEN];
    for (o, p) in out.iter_mut().zip(pixels.iter()) {
        *o = saturate(*p);
    }
    out
}

/// Transform every block of a `width x height` plane in place.
pub fn transform_plane(plane: &mut [u8], width: usize, height: usize, table: &QuantTable, inverse: bool) {
    let chunker = Chunker::for_plane(BLOCK_SIZE, width, height);
    let source: &[u8] = plane;
    let blocks: Vec<[u8; BLOCK_LEN]> = (0..chunker.block_count())
        .into_par_iter()
        .map(|i| {
            let data = chunker.get_block(source, i);
            if inverse {
                inverse_block(&data, table)
            } else {
                forward_block(&data, table)
            }
        })
        .collect();
    for (i, block) in blocks.iter().enumerate() {
        chunker.set_block(plane, i, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_block_has_only_dc() {
        let block = [64u8; BLOCK_LEN];
        let coeffs = forward_coefficients(&block);
        assert!((coeffs[0] - 512.0).abs() < 1e-9);
        for c in &coeffs[1..] {
            assert!(c.abs() < 1e-9);
        }

        let q = forward_block(&block, &LUMA_QUANTIZATION);
        assert_eq!(q[0], 32);
        assert!(q[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_constant_block_round_trip() {
        for value in [0u8, 17, 64, 128, 200] {
            let block = [value; BLOCK_LEN];
            let q = forward_block(&block, &LUMA_QUANTIZATION);
            let back = inverse_block(&q, &LUMA_QUANTIZATION);
            // DC step 16 at scale 1/8 gives at most 1 level of error
            for &p in back.iter() {
                assert!((p as i32 - value as i32).abs() <= 1, "{} vs {}", p, value);
            }
        }
    }

    #[test]
    fn test_dc_saturates_instead_of_wrapping() {
        // DC = 255 * 8 = 2040; with a unit table it must clamp to 255, not wrap
        let block = [255u8; BLOCK_LEN];
        let unit = [[1u16; BLOCK_SIZE]; BLOCK_SIZE];
        let q = forward_block(&block, &unit);
        assert_eq!(q[0], 255);
    }

    #[test]
    fn test_flat_level_limit_at_high_quality() {
        // q90 luma DC step is 3, so flat blocks above 95 no longer fit a byte
        let table = table_for_plane(0, 90);
        assert_eq!(table[0][0], 3);

        let kept = inverse_block(&forward_block(&[95u8; BLOCK_LEN], &table), &table);
        assert!(kept.iter().all(|&p| p == 95));

        let bright = forward_block(&[200u8; BLOCK_LEN], &table);
        assert_eq!(bright[0], 255);
        let clipped = inverse_block(&bright, &table);
        // 255 * 3 / 8 rounds to 96
        assert!(clipped.iter().all(|&p| p == 96));
    }

    #[test]
    fn test_quantization_error_within_one_step() {
        // Smooth gradient: non-negative low-frequency energy dominates
        let mut block = [0u8; BLOCK_LEN];
        for y in 0..BLOCK_SIZE {
            for x in 0..BLOCK_SIZE {
                block[y * BLOCK_SIZE + x] = (200 - 10 * x - 5 * y) as u8;
            }
        }
        let coeffs = forward_coefficients(&block);
        let q = forward_block(&block, &LUMA_QUANTIZATION);
        for i in 0..BLOCK_LEN {
            let step = LUMA_QUANTIZATION[i / BLOCK_SIZE][i % BLOCK_SIZE] as f64;
            // only coefficients representable in a byte are checked
            if coeffs[i] >= 0.0 && coeffs[i] <= 255.0 * step {
                let restored = q[i] as f64 * step;
                assert!((restored - coeffs[i]).abs() <= step, "coefficient {}", i);
            }
        }
    }

    #[test]
    fn test_exact_inverse_of_unquantized() {
        let block: Vec<u8> = (0..BLOCK_LEN).map(|i| (i * 3 % 251) as u8).collect();
        let back = inverse_coefficients(&forward_coefficients(&block));
        for (a, b) in block.iter().zip(back.iter()) {
            assert!((*a as f64 - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_quality_scaling() {
        assert_eq!(scale_table(&LUMA_QUANTIZATION, 50), LUMA_QUANTIZATION);
        assert_eq!(scale_table(&LUMA_QUANTIZATION, 100), [[1; 8]; 8]);
        assert_eq!(scale_table(&LUMA_QUANTIZATION, 25)[0][0], 32);
        // 0 behaves like 1
        assert_eq!(
            scale_table(&CHROMA_QUANTIZATION, 0),
            scale_table(&CHROMA_QUANTIZATION, 1)
        );
        assert_eq!(table_for_plane(1, 50), CHROMA_QUANTIZATION);
        assert_eq!(table_for_plane(0, 50), LUMA_QUANTIZATION);
    }

    #[test]
    fn test_transform_plane_handles_partial_blocks() {
        let (w, h) = (12, 10);
        let mut plane = vec![80u8; w * h];
        transform_plane(&mut plane, w, h, &LUMA_QUANTIZATION, false);
        assert_eq!(plane[0], 40);
        transform_plane(&mut plane, w, h, &LUMA_QUANTIZATION, true);
        // the full top-left block returns to its original level
        assert!(plane[..8].iter().all(|&p| (p as i32 - 80).abs() <= 1));
    }
}
