//! Node type enumeration for dynamic node creation.
//!
//! The variant name doubles as the registry key used by
//! [`NodeFactory`](crate::pipeline::NodeFactory) and by graph documents.

use serde::{Deserialize, Serialize};

/// Types of nodes that can be instantiated dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    // Sources
    /// Loads an image file as an RGB bitmap.
    ReadImage,
    /// Emits a blob supplied by the caller.
    BlobSource,
    /// Decodes a channel stream file.
    ReadChannels,

    // Transforms
    /// Splits a bitmap into planar, chroma-subsampled channels.
    Subsample,
    /// Reassembles channels into a bitmap.
    Merge,
    /// Forward or inverse block DCT with quantization.
    Dct,
    /// Block-matching motion search with residual output.
    MotionEstimator,
    /// Rebuilds a frame from past frame, vectors and residual.
    MotionCompose,
    /// Forwards its input unchanged.
    PassThrough,

    // Sinks
    /// Encodes channels (and optionally a vector/residual pair) to a stream.
    WriteChannels,
}

impl NodeType {
    /// Registry key for this node type.
    pub fn key(&self) -> &'static str {
        match self {
            NodeType::ReadImage => "ReadImage",
            NodeType::BlobSource => "BlobSource",
            NodeType::ReadChannels => "ReadChannels",
            NodeType::Subsample => "Subsample",
            NodeType::Merge => "Merge",
            NodeType::Dct => "Dct",
            NodeType::MotionEstimator => "MotionEstimator",
            NodeType::MotionCompose => "MotionCompose",
            NodeType::PassThrough => "PassThrough",
            NodeType::WriteChannels => "WriteChannels",
        }
    }

    /// Get the display name for this node type.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeType::ReadImage => "Read Image",
            NodeType::BlobSource => "Blob Source",
            NodeType::ReadChannels => "Read Channels",
            NodeType::Subsample => "Subsample",
            NodeType::Merge => "Merge",
            NodeType::Dct => "DCT",
            NodeType::MotionEstimator => "Motion Estimator",
            NodeType::MotionCompose => "Motion Compose",
            NodeType::PassThrough => "Pass Through",
            NodeType::WriteChannels => "Write Channels",
        }
    }

    /// Get all available node types.
    pub fn all() -> &'static [NodeType] {
        &[
            NodeType::ReadImage,
            NodeType::BlobSource,
            NodeType::ReadChannels,
            NodeType::Subsample,
            NodeType::Merge,
            NodeType::Dct,
            NodeType::MotionEstimator,
            NodeType::MotionCompose,
            NodeType::PassThrough,
            NodeType::WriteChannels,
        ]
    }

    pub fn from_key(key: &str) -> Option<NodeType> {
        Self::all().iter().copied().find(|t| t.key() == key)
    }

    /// Check if this node type has no inputs.
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            NodeType::ReadImage | NodeType::BlobSource | NodeType::ReadChannels
        )
    }

    /// Get a detailed description of what this node does.
    pub fn description(&self) -> &'static str {
        match self {
            NodeType::ReadImage =>
                "Loads an image file from disk.\n\
                 Any format the image decoder supports.\n\
                 Output is 8-bit interleaved RGB.",

            NodeType::BlobSource =>
                "Emits a blob handed in by the caller.\n\
                 Used to feed frames that do not come from files.",

            NodeType::ReadChannels =>
                "Decodes a run-length channel stream file.\n\
                 Single layout yields channels only.\n\
                 Pair layout also yields vectors and residual.",

            NodeType::Subsample =>
                "Splits RGB into three planes.\n\
                 Box-averages planes 1 and 2 down to chroma size.",

            NodeType::Merge =>
                "Upsamples chroma and interleaves the planes\n\
                 back into an RGB bitmap.",

            NodeType::Dct =>
                "8x8 cosine transform with quantization.\n\
                 Quality scales the quantization tables.\n\
                 Inverse mode dequantizes and reconstructs.",

            NodeType::MotionEstimator =>
                "Searches the past frame for each 8x8 block.\n\
                 Emits one vector byte per block\n\
                 and the residual against the match.",

            NodeType::MotionCompose =>
                "Adds a residual back onto the motion-shifted\n\
                 past frame to rebuild the current frame.",

            NodeType::PassThrough => "Forwards its input unchanged.",

            NodeType::WriteChannels =>
                "Encodes channels into a run-length stream.\n\
                 With vectors and a second channel set connected,\n\
                 writes the pair layout instead.",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for t in NodeType::all() {
            assert_eq!(NodeType::from_key(t.key()), Some(*t));
        }
        assert_eq!(NodeType::from_key("Nope"), None);
    }

    #[test]
    fn test_sources() {
        assert!(NodeType::ReadImage.is_source());
        assert!(!NodeType::Dct.is_source());
    }
}
