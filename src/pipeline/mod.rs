//! Lazily evaluated dataflow graph.
//!
//! Nodes expose typed input and output ports and a set of typed properties.
//! Connections are stored on the consuming side as an [`Address`] naming the
//! producer's node and port. Values are only computed on demand: asking a node
//! for an output pulls its inputs first, and a node recomputes only after it
//! has been marked dirty.
//!
//! # Architecture
//!
//! ```text
//! [ReadImage] ──► [Subsample] ──► [Dct] ──► [WriteChannels]
//!                                   ▲
//! [BlobSource] ─────────────────────┘ (any node may feed any compatible port)
//! ```
//!
//! # Design
//!
//! - **Enum dispatch** - `BuiltinNode` enum for all built-in nodes.
//! - **Arena of slots** - `NodeId` is the slot index; ids are never reused.
//! - **Pull evaluation** - `Graph::get_output` recomputes dirty nodes upstream-first.
//! - **Absence, not errors** - missing or mismatched data yields `None` outputs.

pub mod document;
pub mod error;
pub mod executor;
pub mod id;
pub mod node;
pub mod node_type;
pub mod nodes;
pub mod port;
pub mod property;

pub use document::{GraphDocument, LinkDocument, NodeDocument, DOCUMENT_VERSION};
pub use error::{GraphError, GraphResult};
pub use executor::{Address, CacheState, Graph, NodeConstructor, NodeFactory};
pub use id::NodeId;
pub use node::{BuiltinNode, ComputeNode, NodeContext, Output};
pub use node_type::NodeType;
pub use port::{PortDescriptor, PortDirection, PortKind};
pub use property::{Property, PropertyDescriptor, PropertyKind, PropertyValue};
