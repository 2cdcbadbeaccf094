//! Node abstraction for the graph.
//!
//! Two-layer design:
//! - **`ComputeNode` trait** - the uniform contract every node kind implements:
//!   static ports, typed properties and a single `compute` step.
//! - **`BuiltinNode` enum** - the closed set of node kinds. The graph stores
//!   these and dispatches with `match`, so no trait objects are involved.

use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::id::NodeId;
use crate::pipeline::node_type::NodeType;
use crate::pipeline::nodes::{
    BlobSourceNode, DctNode, MergeNode, MotionComposeNode, MotionEstimatorNode, PassThroughNode,
    ReadChannelsNode, ReadImageNode, SubsampleNode, WriteChannelsNode,
};
use crate::pipeline::port::{port_index, PortDescriptor, PortDirection};
use crate::pipeline::property::{Property, PropertyDescriptor, PropertyValue};
use crate::types::{BlobKind, DataBlob};
use std::sync::Arc;

/// Cached value of one output port.
pub type Output = Option<Arc<DataBlob>>;

/// Context passed to [`ComputeNode::compute`].
///
/// Inputs and outputs are indexed by position among the node's declared input
/// and output ports respectively.
pub struct NodeContext<'a> {
    node: NodeId,
    inputs: &'a [Output],
    outputs: Vec<Output>,
    error: Option<String>,
}

impl<'a> NodeContext<'a> {
    pub fn new(node: NodeId, inputs: &'a [Output], output_count: usize) -> Self {
        Self {
            node,
            inputs,
            outputs: vec![None; output_count],
            error: None,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Raw input value, if any.
    pub fn input(&self, index: usize) -> Option<&Arc<DataBlob>> {
        self.inputs.get(index).and_then(|i| i.as_ref())
    }

    /// Input `index` if present, of the expected kind and internally
    /// consistent. Anything else is treated as absent.
    pub fn require(&self, index: usize, kind: BlobKind) -> Option<Arc<DataBlob>> {
        let Some(blob) = self.input(index) else {
            tracing::debug!("{}: input {} absent", self.node, index);
            return None;
        };
        if blob.kind != kind {
            tracing::warn!(
                "{}: input {} carries {} data, expected {}",
                self.node,
                index,
                blob.kind,
                kind
            );
            return None;
        }
        if !blob.is_consistent() {
            tracing::warn!("{}: input {} has inconsistent plane sizes", self.node, index);
            return None;
        }
        Some(Arc::clone(blob))
    }

    pub fn set_output(&mut self, index: usize, blob: DataBlob) {
        self.forward(index, Arc::new(blob));
    }

    /// Publish an existing blob without copying it.
    pub fn forward(&mut self, index: usize, blob: Arc<DataBlob>) {
        if let Some(slot) = self.outputs.get_mut(index) {
            *slot = Some(blob);
        }
    }

    /// Record why this computation produced nothing. The graph keeps the
    /// message as the node's last error.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{}: {}", self.node, message);
        self.error = Some(message);
    }

    pub fn into_parts(self) -> (Vec<Output>, Option<String>) {
        (self.outputs, self.error)
    }
}

/// Contract shared by every node kind.
pub trait ComputeNode {
    fn node_type(&self) -> NodeType;

    /// Port descriptors for this node.
    fn ports(&self) -> &'static [PortDescriptor];

    fn property_descriptors(&self) -> &'static [PropertyDescriptor] {
        &[]
    }

    /// Current value of property `key`.
    fn property(&self, _key: &str) -> Option<PropertyValue> {
        None
    }

    /// Store an already validated value.
    fn apply_property(&mut self, _key: &str, _value: PropertyValue) {}

    /// Produce outputs from inputs. Absent inputs mean absent outputs.
    fn compute(&mut self, ctx: &mut NodeContext);
}

/// Enum dispatch for built-in nodes.
#[derive(Debug)]
pub enum BuiltinNode {
    ReadImage(ReadImageNode),
    BlobSource(BlobSourceNode),
    Subsample(SubsampleNode),
    Merge(MergeNode),
    Dct(DctNode),
    MotionEstimator(MotionEstimatorNode),
    MotionCompose(MotionComposeNode),
    WriteChannels(WriteChannelsNode),
    ReadChannels(ReadChannelsNode),
    PassThrough(PassThroughNode),
}

macro_rules! dispatch {
    ($self:expr, $n:ident => $body:expr) => {
        match $self {
            BuiltinNode::ReadImage($n) => $body,
            BuiltinNode::BlobSource($n) => $body,
            BuiltinNode::Subsample($n) => $body,
            BuiltinNode::Merge($n) => $body,
            BuiltinNode::Dct($n) => $body,
            BuiltinNode::MotionEstimator($n) => $body,
            BuiltinNode::MotionCompose($n) => $body,
            BuiltinNode::WriteChannels($n) => $body,
            BuiltinNode::ReadChannels($n) => $body,
            BuiltinNode::PassThrough($n) => $body,
        }
    };
}

impl BuiltinNode {
    pub fn node_type(&self) -> NodeType {
        dispatch!(self, n => n.node_type())
    }

    pub fn ports(&self) -> &'static [PortDescriptor] {
        dispatch!(self, n => n.ports())
    }

    pub fn property_descriptors(&self) -> &'static [PropertyDescriptor] {
        dispatch!(self, n => n.property_descriptors())
    }

    pub fn compute(&mut self, ctx: &mut NodeContext) {
        dispatch!(self, n => n.compute(ctx))
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        port_index(self.ports(), PortDirection::Input, name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        port_index(self.ports(), PortDirection::Output, name)
    }

    pub fn input_count(&self) -> usize {
        self.ports().iter().filter(|p| p.direction == PortDirection::Input).count()
    }

    pub fn output_count(&self) -> usize {
        self.ports().iter().filter(|p| p.direction == PortDirection::Output).count()
    }

    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        dispatch!(self, n => n.property(key))
    }

    /// Descriptors paired with current values.
    pub fn properties(&self) -> Vec<Property> {
        self.property_descriptors()
            .iter()
            .filter_map(|d| {
                self.property(d.key).map(|value| Property {
                    descriptor: *d,
                    value,
                })
            })
            .collect()
    }

    /// Validate and store a property. Returns whether the stored value
    /// changed.
    pub fn set_property(&mut self, node: NodeId, key: &str, value: PropertyValue) -> GraphResult<bool> {
        let descriptor = self
            .property_descriptors()
            .iter()
            .find(|d| d.key == key)
            .ok_or_else(|| GraphError::UnknownProperty {
                node,
                key: key.to_string(),
            })?;
        let value = descriptor
            .coerce(value)
            .map_err(|message| GraphError::PropertyType {
                key: key.to_string(),
                message,
            })?;
        if self.property(key).as_ref() == Some(&value) {
            return Ok(false);
        }
        dispatch!(self, n => n.apply_property(key, value));
        Ok(true)
    }
}
