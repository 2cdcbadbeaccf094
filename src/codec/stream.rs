//! Channel stream framing.
//!
//! ```text
//! offset  size  field
//!      0     2  image width      (u16, little-endian)
//!      2     2  image height     (u16, little-endian)
//!      4     2  channel width    (u16, little-endian)
//!      6     2  channel height   (u16, little-endian)
//!      8     1  quantize quality
//!      9     1  sampling mode ordinal
//!     10     -  payload
//! ```
//!
//! The payload holds each plane in order. A plane is its 8x8 blocks in raster
//! order, each block linearized in zigzag order and run-length coded on its
//! own, so runs never cross block boundaries.
//!
//! Two layouts share the header:
//! - **single**: one channel blob of 1 to 3 planes
//! - **pair**: channels C1 (3 planes), vectors V2 (3 planes), channels C2
//!   (3 planes). V2 geometry is the block grid of C1 under the same sampling
//!   mode and is not stored separately.

use super::chunker::{zigzag_index, Chunker};
use super::error::{CodecError, CodecResult};
use super::rle;
use super::subsample::SamplingMode;
use crate::types::{BlobKind, DataBlob, MAX_PLANES};
use serde::{Deserialize, Serialize};

pub const HEADER_LEN: usize = 10;
const BLOCK_SIZE: usize = 8;
const BLOCK_LEN: usize = BLOCK_SIZE * BLOCK_SIZE;
/// Shortest coded block: one run `[token, 64, value]`.
const MIN_BLOCK_BYTES: usize = 3;

/// Which planes a stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StreamLayout {
    #[default]
    Single,
    Pair,
}

impl StreamLayout {
    pub fn all() -> &'static [StreamLayout] {
        &[StreamLayout::Single, StreamLayout::Pair]
    }

    pub fn name(self) -> &'static str {
        match self {
            StreamLayout::Single => "single",
            StreamLayout::Pair => "pair",
        }
    }
}

/// Fixed-size stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub image_width: u16,
    pub image_height: u16,
    pub channel_width: u16,
    pub channel_height: u16,
    pub quantize_quality: u8,
    pub sampling_mode: SamplingMode,
}

fn to_u16(width: usize, height: usize, value: usize) -> CodecResult<u16> {
    u16::try_from(value).map_err(|_| CodecError::DimensionOverflow { width, height })
}

impl StreamHeader {
    pub fn from_blob(blob: &DataBlob) -> CodecResult<Self> {
        Ok(Self {
            image_width: to_u16(blob.image_width, blob.image_height, blob.image_width)?,
            image_height: to_u16(blob.image_width, blob.image_height, blob.image_height)?,
            channel_width: to_u16(blob.channel_width, blob.channel_height, blob.channel_width)?,
            channel_height: to_u16(blob.channel_width, blob.channel_height, blob.channel_height)?,
            quantize_quality: blob.quantize_quality,
            sampling_mode: blob.sampling_mode,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.image_width.to_le_bytes());
        out.extend_from_slice(&self.image_height.to_le_bytes());
        out.extend_from_slice(&self.channel_width.to_le_bytes());
        out.extend_from_slice(&self.channel_height.to_le_bytes());
        out.push(self.quantize_quality);
        out.push(self.sampling_mode.ordinal());
    }

    pub fn read(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::TruncatedHeader { len: bytes.len() });
        }
        let word = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let sampling_mode =
            SamplingMode::from_ordinal(bytes[9]).ok_or(CodecError::InvalidSamplingMode(bytes[9]))?;
        Ok(Self {
            image_width: word(0),
            image_height: word(2),
            channel_width: word(4),
            channel_height: word(6),
            quantize_quality: bytes[8],
            sampling_mode,
        })
    }

    /// Empty channel blob with this header's geometry.
    fn channel_blob(&self) -> DataBlob {
        DataBlob {
            kind: BlobKind::Channels,
            channels: Vec::new(),
            image_width: self.image_width as usize,
            image_height: self.image_height as usize,
            channel_width: self.channel_width as usize,
            channel_height: self.channel_height as usize,
            sampling_mode: self.sampling_mode,
            quantize_quality: self.quantize_quality,
        }
    }

    /// Empty vector blob over this header's block grid.
    fn vector_blob(&self) -> DataBlob {
        let (gw, gh) = block_grid(self.channel_width as usize, self.channel_height as usize);
        DataBlob {
            kind: BlobKind::Vectors,
            channel_width: gw,
            channel_height: gh,
            ..self.channel_blob()
        }
    }
}

/// Number of 8x8 blocks across and down a plane.
pub fn block_grid(width: usize, height: usize) -> (usize, usize) {
    (width.div_ceil(BLOCK_SIZE), height.div_ceil(BLOCK_SIZE))
}

fn check(blob: &DataBlob, kind: BlobKind, what: &str) -> CodecResult<()> {
    if blob.kind != kind || !blob.is_consistent() {
        return Err(CodecError::Inconsistent(format!(
            "{} blob ({}, {} planes) does not match its geometry",
            what,
            blob.kind,
            blob.plane_count()
        )));
    }
    Ok(())
}

fn encode_planes(blob: &DataBlob, out: &mut Vec<u8>) {
    let order = zigzag_index(BLOCK_SIZE);
    for (i, plane) in blob.channels.iter().enumerate() {
        let (w, h) = blob.plane_size(i);
        let chunker = Chunker::for_plane(BLOCK_SIZE, w, h);
        for block in 0..chunker.block_count() {
            rle::encode(&chunker.get_zigzag_block(plane, block, &order), out);
        }
    }
}

fn decode_plane(bytes: &[u8], pos: &mut usize, blob: &DataBlob, plane: usize) -> CodecResult<Vec<u8>> {
    let order = zigzag_index(BLOCK_SIZE);
    let (w, h) = blob.plane_size(plane);
    let chunker = Chunker::for_plane(BLOCK_SIZE, w, h);
    let available = bytes.len().saturating_sub(*pos) / MIN_BLOCK_BYTES;
    if available < chunker.block_count() {
        return Err(CodecError::Truncated {
            offset: bytes.len(),
            plane,
            block: available,
        });
    }
    let mut out = vec![0u8; w * h];
    let mut buf = [0u8; BLOCK_LEN];
    for block in 0..chunker.block_count() {
        rle::decode_into(bytes, pos, &mut buf)
            .map_err(|fault| CodecError::from_fault(fault, 0, plane, block))?;
        chunker.set_zigzag_block(&mut out, block, &buf, &order);
    }
    Ok(out)
}

fn decode_planes(bytes: &[u8], pos: &mut usize, blob: &mut DataBlob, count: usize) -> CodecResult<()> {
    for plane in 0..count {
        let data = decode_plane(bytes, pos, blob, plane)?;
        blob.channels.push(data);
    }
    Ok(())
}

/// Encode a channel blob in the single layout.
pub fn encode_stream(blob: &DataBlob) -> CodecResult<Vec<u8>> {
    check(blob, BlobKind::Channels, "channel")?;
    let mut out = Vec::new();
    StreamHeader::from_blob(blob)?.write(&mut out);
    encode_planes(blob, &mut out);
    Ok(out)
}

/// Encode the pair layout: `header, C1, V2, C2`. The header is taken from C1.
pub fn encode_pair(channels: &DataBlob, vectors: &DataBlob, channels2: &DataBlob) -> CodecResult<Vec<u8>> {
    check(channels, BlobKind::Channels, "channel")?;
    check(vectors, BlobKind::Vectors, "vector")?;
    check(channels2, BlobKind::Channels, "second channel")?;
    let header = StreamHeader::from_blob(channels)?;
    let expected = header.vector_blob();
    if channels.plane_count() != MAX_PLANES
        || !channels.same_geometry(channels2)
        || vectors.plane_count() != MAX_PLANES
        || vectors.channel_width != expected.channel_width
        || vectors.channel_height != expected.channel_height
        || vectors.sampling_mode != channels.sampling_mode
    {
        return Err(CodecError::Inconsistent(
            "pair layout needs three planes per blob over one geometry".to_string(),
        ));
    }
    // C2 is decoded under C1's header
    if channels2.quantize_quality != channels.quantize_quality
        || (channels2.image_width, channels2.image_height) != (channels.image_width, channels.image_height)
    {
        return Err(CodecError::Inconsistent(format!(
            "pair layout needs both channel blobs at one quality and image size (q{} {}x{} vs q{} {}x{})",
            channels.quantize_quality,
            channels.image_width,
            channels.image_height,
            channels2.quantize_quality,
            channels2.image_width,
            channels2.image_height
        )));
    }
    let mut out = Vec::new();
    header.write(&mut out);
    encode_planes(channels, &mut out);
    encode_planes(vectors, &mut out);
    encode_planes(channels2, &mut out);
    Ok(out)
}

fn finish(bytes: &[u8], pos: usize) -> CodecResult<()> {
    if pos != bytes.len() {
        return Err(CodecError::TrailingBytes { offset: pos });
    }
    Ok(())
}

/// Decode a single-layout stream. Plane 0 is required; planes 1 and 2 are
/// decoded while payload remains.
pub fn decode_stream(bytes: &[u8]) -> CodecResult<DataBlob> {
    let header = StreamHeader::read(bytes)?;
    let mut blob = header.channel_blob();
    let mut pos = HEADER_LEN;
    decode_planes(bytes, &mut pos, &mut blob, 1)?;
    while pos < bytes.len() && blob.channels.len() < MAX_PLANES {
        let plane = blob.channels.len();
        let data = decode_plane(bytes, &mut pos, &blob, plane)?;
        blob.channels.push(data);
    }
    finish(bytes, pos)?;
    Ok(blob)
}

/// The three blobs of a pair-layout stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairStream {
    pub channels: DataBlob,
    pub vectors: DataBlob,
    pub channels2: DataBlob,
}

/// Decode a pair-layout stream.
pub fn decode_pair(bytes: &[u8]) -> CodecResult<PairStream> {
    let header = StreamHeader::read(bytes)?;
    let mut pos = HEADER_LEN;
    let mut channels = header.channel_blob();
    decode_planes(bytes, &mut pos, &mut channels, MAX_PLANES)?;
    let mut vectors = header.vector_blob();
    decode_planes(bytes, &mut pos, &mut vectors, MAX_PLANES)?;
    let mut channels2 = header.channel_blob();
    decode_planes(bytes, &mut pos, &mut channels2, MAX_PLANES)?;
    finish(bytes, pos)?;
    Ok(PairStream {
        channels,
        vectors,
        channels2,
    })
}
