//! Test data builders for creating test objects

use mpegflow_rs::codec::subsample::{plane_size, SamplingMode};
use mpegflow_rs::DataBlob;

/// Builder for planar channel blobs. Each plane is filled from a function of
/// `(plane, x, y)`.
pub struct ChannelsBuilder {
    width: usize,
    height: usize,
    mode: SamplingMode,
    planes: usize,
    quality: u8,
}

impl ChannelsBuilder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            mode: SamplingMode::S444,
            planes: 3,
            quality: 50,
        }
    }

    pub fn mode(mut self, mode: SamplingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn planes(mut self, planes: usize) -> Self {
        self.planes = planes;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn fill(self, value: u8) -> DataBlob {
        self.build(|_, _, _| value)
    }

    pub fn build(self, f: impl Fn(usize, usize, usize) -> u8) -> DataBlob {
        let planes = (0..self.planes)
            .map(|p| {
                let (w, h) = plane_size((self.width, self.height), self.mode, p);
                (0..w * h).map(|i| f(p, i % w, i / w)).collect()
            })
            .collect();
        DataBlob::channels(self.width, self.height, self.mode, planes).with_quality(self.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_builder() {
        let blob = ChannelsBuilder::new(10, 6)
            .mode(SamplingMode::S420)
            .build(|p, x, _| (p * 10 + x) as u8);

        assert_eq!(blob.plane_count(), 3);
        assert_eq!(blob.channels[1].len(), 5 * 3);
        assert_eq!(blob.channels[2][4], 24);
        assert!(blob.is_consistent());
    }
}
