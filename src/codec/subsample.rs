//! Chroma subsampling geometry and resampling.
//!
//! Plane 0 always carries full resolution. Planes 1 and 2 are reduced
//! according to the [`SamplingMode`], with ceiling division so odd sizes keep
//! their last column/row.

use serde::{Deserialize, Serialize};

/// Chroma subsampling scheme. The discriminant is the on-disk ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum SamplingMode {
    /// Full-resolution chroma.
    S444 = 0,
    /// Half horizontal chroma resolution.
    S422 = 1,
    /// Half horizontal and vertical chroma resolution.
    #[default]
    S420 = 2,
}

impl SamplingMode {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(SamplingMode::S444),
            1 => Some(SamplingMode::S422),
            2 => Some(SamplingMode::S420),
            _ => None,
        }
    }

    pub fn all() -> &'static [SamplingMode] {
        &[SamplingMode::S444, SamplingMode::S422, SamplingMode::S420]
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SamplingMode::S444 => "4:4:4",
            SamplingMode::S422 => "4:2:2",
            SamplingMode::S420 => "4:2:0",
        }
    }

    /// Horizontal and vertical reduction factors.
    fn factors(self) -> (usize, usize) {
        match self {
            SamplingMode::S444 => (1, 1),
            SamplingMode::S422 => (2, 1),
            SamplingMode::S420 => (2, 2),
        }
    }
}

impl std::fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Size of the chroma planes derived from a luma size.
pub fn chroma_size(luma: (usize, usize), mode: SamplingMode) -> (usize, usize) {
    let (fx, fy) = mode.factors();
    (luma.0.div_ceil(fx), luma.1.div_ceil(fy))
}

/// Size of plane `plane` given the plane-0 size.
pub fn plane_size(luma: (usize, usize), mode: SamplingMode, plane: usize) -> (usize, usize) {
    if plane == 0 {
        luma
    } else {
        chroma_size(luma, mode)
    }
}

/// Box-filter a full-resolution plane down to the chroma size. Each output
/// sample is the rounded mean of the in-range source pixels it covers.
pub fn downsample(plane: &[u8], width: usize, height: usize, mode: SamplingMode) -> Vec<u8> {
    let (fx, fy) = mode.factors();
    let (cw, ch) = chroma_size((width, height), mode);
    let mut out = Vec::with_capacity(cw * ch);
    for cy in 0..ch {
        for cx in 0..cw {
            let mut sum = 0u32;
            let mut count = 0u32;
            for y in (cy * fy)..((cy + 1) * fy).min(height) {
                for x in (cx * fx)..((cx + 1) * fx).min(width) {
                    sum += plane.get(y * width + x).copied().unwrap_or(0) as u32;
                    count += 1;
                }
            }
            out.push(if count == 0 {
                0
            } else {
                ((sum + count / 2) / count) as u8
            });
        }
    }
    out
}

/// Replicate a chroma plane back up to `width x height`.
pub fn upsample(chroma: &[u8], width: usize, height: usize, mode: SamplingMode) -> Vec<u8> {
    let (fx, fy) = mode.factors();
    let (cw, _) = chroma_size((width, height), mode);
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            out.push(chroma.get((y / fy) * cw + x / fx).copied().unwrap_or(0));
        }
    }
    out
}
