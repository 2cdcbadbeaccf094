//! # mpegflow-rs: block-based image compression on a dataflow graph
//!
//! A small compression engine built from four numeric stages, wired together
//! by a lazily evaluated node graph:
//!
//! - **Chunker**: 8x8 block addressing and zigzag ordering over planar buffers
//! - **Subsample**: 4:4:4 / 4:2:2 / 4:2:0 chroma geometry
//! - **DCT + quantization**: quality-scaled JPEG-style tables
//! - **Motion estimation**: exhaustive block matching with a biased residual
//! - **Channel codec**: RLE framing of zigzag-ordered blocks behind a fixed header
//!
//! ## Architecture
//!
//! - [`codec`] holds the pure transforms and the binary stream format.
//! - [`pipeline`] holds the graph: nodes, ports, properties, dirty tracking and
//!   demand-driven evaluation.
//! - [`types::DataBlob`] is what flows along graph edges.
//!
//! ## Configuration
//!
//! Defaults for new nodes and logging settings live in a TOML file under the
//! platform config directory (`mpegflow-rs/config.toml`).
//!
//! ## Example
//!
//! ```ignore
//! use mpegflow_rs::{config::EngineConfig, pipeline::{Graph, NodeFactory}};
//!
//! let config = EngineConfig::load_or_default(EngineConfig::default_path()?);
//! let _guard = mpegflow_rs::logging::init(&config.logging);
//!
//! let mut graph = Graph::with_factory(NodeFactory::new(config.defaults));
//! let read = graph.add_node("ReadImage")?;
//! let split = graph.add_node("Subsample")?;
//! let dct = graph.add_node("Dct")?;
//! let write = graph.add_node("WriteChannels")?;
//! graph.set_property(read, "path", "frame.png")?;
//! graph.set_property(write, "path", "frame.bin")?;
//! graph.connect(read, "outColor", split, "inColor")?;
//! graph.connect(split, "outChannels", dct, "inChannels")?;
//! graph.connect(dct, "outChannels", write, "inChannels")?;
//! graph.save(write)?;
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use codec::{CodecError, SamplingMode};
pub use config::{EngineConfig, NodeDefaults};
pub use error::{Error, Result, ResultExt};
pub use pipeline::{Graph, GraphDocument, GraphError, NodeFactory, NodeId, NodeType};
pub use types::{BlobKind, DataBlob};
