//! PassThrough node: forwards any blob unchanged.

use crate::pipeline::node::{ComputeNode, NodeContext};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::port::{PortDescriptor, PortKind};
use std::sync::Arc;

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("in", PortKind::Any),
    PortDescriptor::output("out", PortKind::Any),
];

#[derive(Debug, Default)]
pub struct PassThroughNode;

impl PassThroughNode {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeNode for PassThroughNode {
    fn node_type(&self) -> NodeType {
        NodeType::PassThrough
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        PORTS
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        if let Some(blob) = ctx.input(0).map(Arc::clone) {
            ctx.forward(0, blob);
        }
    }
}
