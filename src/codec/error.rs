//! Codec-specific error types.
//!
//! Every decode failure carries the byte offset into the stream and, once the
//! payload has been reached, the plane and block being decoded.

use thiserror::Error;

/// Low-level fault raised by the run-length decoder.
///
/// Offsets are relative to the start of the buffer handed to the decoder.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RleFault {
    #[error("stream ended at offset {offset}")]
    Truncated { offset: usize },

    #[error("run at offset {offset} overflows the block")]
    Overflow { offset: usize },

    #[error("zero-length run at offset {offset}")]
    ZeroRun { offset: usize },
}

/// Errors produced while encoding or decoding a channel stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Truncated header: need 10 bytes, found {len}")]
    TruncatedHeader { len: usize },

    #[error("Truncated stream at offset {offset} (plane {plane}, block {block})")]
    Truncated {
        offset: usize,
        plane: usize,
        block: usize,
    },

    #[error("Run overflows block at offset {offset} (plane {plane}, block {block})")]
    BlockOverflow {
        offset: usize,
        plane: usize,
        block: usize,
    },

    #[error("Zero-length run at offset {offset} (plane {plane}, block {block})")]
    ZeroRun {
        offset: usize,
        plane: usize,
        block: usize,
    },

    #[error("Invalid sampling mode ordinal: {0}")]
    InvalidSamplingMode(u8),

    #[error("Dimensions {width}x{height} do not fit the 16-bit header")]
    DimensionOverflow { width: usize, height: usize },

    #[error("Unexpected trailing data at offset {offset}")]
    TrailingBytes { offset: usize },

    #[error("Inconsistent input: {0}")]
    Inconsistent(String),
}

impl CodecError {
    /// Attach plane/block context to a decoder fault. `base` is the absolute
    /// stream offset of the buffer the fault offset is relative to.
    pub fn from_fault(fault: RleFault, base: usize, plane: usize, block: usize) -> Self {
        match fault {
            RleFault::Truncated { offset } => CodecError::Truncated {
                offset: base + offset,
                plane,
                block,
            },
            RleFault::Overflow { offset } => CodecError::BlockOverflow {
                offset: base + offset,
                plane,
                block,
            },
            RleFault::ZeroRun { offset } => CodecError::ZeroRun {
                offset: base + offset,
                plane,
                block,
            },
        }
    }
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_context() {
        let err = CodecError::from_fault(RleFault::Truncated { offset: 3 }, 10, 1, 4);
        assert_eq!(
            err,
            CodecError::Truncated {
                offset: 13,
                plane: 1,
                block: 4
            }
        );
        assert!(err.to_string().contains("plane 1"));
        assert!(err.to_string().contains("block 4"));
    }
}
