//! Core data types for mpegflow-rs
//!
//! [`DataBlob`] is the unit exchanged between pipeline nodes. It carries one or
//! more byte planes together with the geometry needed to interpret them:
//!
//! - [`BlobKind::Bitmap`] - a single interleaved RGB plane, 3 bytes per pixel
//! - [`BlobKind::Channels`] - planar channels; plane 0 full size, planes 1-2
//!   sized by the sampling mode
//! - [`BlobKind::Vectors`] - one motion vector byte per 8x8 block; plane 0 is
//!   the luma block grid and planes 1-2 follow the sampling mode over it
//!
//! Plane geometry is always derived from plane 0 and the sampling mode, never
//! stored per plane.

use crate::codec::dct::DEFAULT_QUALITY;
use crate::codec::subsample::{self, SamplingMode};
use serde::{Deserialize, Serialize};

/// Bytes per pixel of a bitmap blob.
pub const BITMAP_ELEMENTS: usize = 3;

/// Maximum number of planes a channel or vector blob holds.
pub const MAX_PLANES: usize = 3;

/// What the planes of a [`DataBlob`] contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BlobKind {
    Bitmap,
    #[default]
    Channels,
    Vectors,
}

impl BlobKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            BlobKind::Bitmap => "Bitmap",
            BlobKind::Channels => "Channels",
            BlobKind::Vectors => "Vectors",
        }
    }
}

impl std::fmt::Display for BlobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Image data flowing between nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlob {
    pub kind: BlobKind,
    pub channels: Vec<Vec<u8>>,
    /// Pixel size of the source image.
    pub image_width: usize,
    pub image_height: usize,
    /// Element size of plane 0.
    pub channel_width: usize,
    pub channel_height: usize,
    pub sampling_mode: SamplingMode,
    pub quantize_quality: u8,
}

impl DataBlob {
    /// An interleaved RGB bitmap.
    pub fn bitmap(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        Self {
            kind: BlobKind::Bitmap,
            channels: vec![pixels],
            image_width: width,
            image_height: height,
            channel_width: width,
            channel_height: height,
            sampling_mode: SamplingMode::S444,
            quantize_quality: DEFAULT_QUALITY,
        }
    }

    /// Planar channels for a `width x height` image.
    pub fn channels(width: usize, height: usize, mode: SamplingMode, planes: Vec<Vec<u8>>) -> Self {
        Self {
            kind: BlobKind::Channels,
            channels: planes,
            image_width: width,
            image_height: height,
            channel_width: width,
            channel_height: height,
            sampling_mode: mode,
            quantize_quality: DEFAULT_QUALITY,
        }
    }

    /// A single-plane channel blob, e.g. a grayscale image.
    pub fn single(width: usize, height: usize, plane: Vec<u8>) -> Self {
        Self::channels(width, height, SamplingMode::S444, vec![plane])
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quantize_quality = quality;
        self
    }

    /// Copy of everything but the planes.
    pub fn without_planes(&self) -> DataBlob {
        DataBlob {
            kind: self.kind,
            channels: Vec::new(),
            image_width: self.image_width,
            image_height: self.image_height,
            channel_width: self.channel_width,
            channel_height: self.channel_height,
            sampling_mode: self.sampling_mode,
            quantize_quality: self.quantize_quality,
        }
    }

    pub fn plane_count(&self) -> usize {
        self.channels.len()
    }

    /// Element dimensions of plane `plane`.
    pub fn plane_size(&self, plane: usize) -> (usize, usize) {
        match self.kind {
            BlobKind::Bitmap => (self.channel_width, self.channel_height),
            BlobKind::Channels | BlobKind::Vectors => subsample::plane_size(
                (self.channel_width, self.channel_height),
                self.sampling_mode,
                plane,
            ),
        }
    }

    /// Expected byte length of plane `plane`.
    pub fn plane_len(&self, plane: usize) -> usize {
        let (w, h) = self.plane_size(plane);
        match self.kind {
            BlobKind::Bitmap => w * h * BITMAP_ELEMENTS,
            _ => w * h,
        }
    }

    /// Whether every plane has the length its geometry implies.
    pub fn is_consistent(&self) -> bool {
        let max = match self.kind {
            BlobKind::Bitmap => 1,
            _ => MAX_PLANES,
        };
        !self.channels.is_empty()
            && self.channels.len() <= max
            && self
                .channels
                .iter()
                .enumerate()
                .all(|(i, plane)| plane.len() == self.plane_len(i))
    }

    /// Same plane-0 resolution, sampling mode and plane count. Used to validate
    /// paired inputs.
    pub fn same_geometry(&self, other: &DataBlob) -> bool {
        self.channel_width == other.channel_width
            && self.channel_height == other.channel_height
            && self.sampling_mode == other.sampling_mode
            && self.channels.len() == other.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_geometry() {
        let blob = DataBlob::bitmap(4, 2, vec![0; 24]);
        assert_eq!(blob.plane_size(0), (4, 2));
        assert_eq!(blob.plane_len(0), 24);
        assert!(blob.is_consistent());
    }

    #[test]
    fn test_channel_geometry_follows_sampling() {
        let blob = DataBlob::channels(
            5,
            3,
            SamplingMode::S420,
            vec![vec![0; 15], vec![0; 6], vec![0; 6]],
        );
        assert_eq!(blob.plane_size(1), (3, 2));
        assert!(blob.is_consistent());

        let mut broken = blob.clone();
        broken.channels[2].pop();
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_default_quality() {
        let blob = DataBlob::single(1, 1, vec![0]);
        assert_eq!(blob.quantize_quality, 50);
        assert_eq!(blob.with_quality(90).quantize_quality, 90);
    }

    #[test]
    fn test_same_geometry() {
        let a = DataBlob::single(8, 8, vec![0; 64]);
        let b = DataBlob::single(8, 8, vec![1; 64]);
        let c = DataBlob::single(8, 4, vec![0; 32]);
        assert!(a.same_geometry(&b));
        assert!(!a.same_geometry(&c));
    }
}
