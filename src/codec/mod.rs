//! Numeric building blocks of the compression pipeline.
//!
//! - [`chunker`] - block addressing and zigzag ordering over byte planes
//! - [`subsample`] - chroma plane geometry and resampling
//! - [`dct`] - 8x8 cosine transform with quantization
//! - [`motion`] - block-matching motion search and residual coding
//! - [`rle`] / [`stream`] - run-length coding and the binary channel stream
//!
//! Everything here is a pure function of its inputs. The pipeline nodes in
//! [`crate::pipeline`] wrap these with caching and wiring.

pub mod chunker;
pub mod dct;
pub mod error;
pub mod motion;
pub mod rle;
pub mod stream;
pub mod subsample;

pub use chunker::{zigzag_index, Chunker};
pub use error::{CodecError, CodecResult, RleFault};
pub use motion::{ChromaVectors, MotionVector};
pub use stream::{decode_pair, decode_stream, encode_pair, encode_stream, PairStream, StreamHeader, StreamLayout};
pub use subsample::SamplingMode;
