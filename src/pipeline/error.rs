//! Graph-specific error types.
//!
//! These are construction-time failures: bad wiring, unknown names, values of
//! the wrong type. Missing or mismatched data during evaluation is never an
//! error; it shows up as an absent output.

use crate::pipeline::id::NodeId;
use thiserror::Error;

/// Errors that can occur while building or configuring a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {node} has no {direction} port '{port}'")]
    UnknownPort {
        node: NodeId,
        port: String,
        direction: &'static str,
    },

    #[error("Port mismatch: {0}")]
    PortMismatch(String),

    #[error("Input '{port}' of node {node} is already connected")]
    PortAlreadyConnected { node: NodeId, port: String },

    #[error("Connecting {from} -> {to} would create a cycle")]
    CycleDetected { from: NodeId, to: NodeId },

    #[error("Node {0} cannot be connected to itself")]
    SelfLoop(NodeId),

    #[error("Node {node} has no property '{key}'")]
    UnknownProperty { node: NodeId, key: String },

    #[error("Invalid value for property '{key}': {message}")]
    PropertyType { key: String, message: String },

    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    #[error("Node {0} is not a blob source")]
    NotASource(NodeId),

    #[error("Node {0} has no data to save")]
    NoData(NodeId),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
