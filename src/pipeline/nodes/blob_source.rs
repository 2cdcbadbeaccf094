//! BlobSource node: emits whatever blob the caller last handed in.

use crate::pipeline::node::{ComputeNode, NodeContext};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::port::{PortDescriptor, PortKind};
use crate::types::DataBlob;
use std::sync::Arc;

static PORTS: &[PortDescriptor] = &[PortDescriptor::output("outData", PortKind::Any)];

#[derive(Debug, Default)]
pub struct BlobSourceNode {
    blob: Option<Arc<DataBlob>>,
}

impl BlobSourceNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_blob(&mut self, blob: Option<DataBlob>) {
        self.blob = blob.map(Arc::new);
    }

    pub fn blob(&self) -> Option<&DataBlob> {
        self.blob.as_deref()
    }
}

impl ComputeNode for BlobSourceNode {
    fn node_type(&self) -> NodeType {
        NodeType::BlobSource
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        PORTS
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        if let Some(blob) = &self.blob {
            ctx.forward(0, Arc::clone(blob));
        }
    }
}
