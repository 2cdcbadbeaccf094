//! Built-in node implementations.

pub mod blob_source;
pub mod channels_io;
pub mod dct;
pub mod motion;
pub mod pass_through;
pub mod read_image;
pub mod subsample;

pub use blob_source::BlobSourceNode;
pub use channels_io::{ReadChannelsNode, WriteChannelsNode};
pub use dct::DctNode;
pub use motion::{MotionComposeNode, MotionEstimatorNode};
pub use pass_through::PassThroughNode;
pub use read_image::ReadImageNode;
pub use subsample::{MergeNode, SubsampleNode};
