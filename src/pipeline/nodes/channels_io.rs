//! WriteChannels and ReadChannels nodes: the channel stream on disk.
//!
//! `WriteChannels` encodes on recompute and keeps the bytes; nothing touches
//! the filesystem until [`Graph::save`](crate::pipeline::Graph::save) is
//! called. `ReadChannels` reads and decodes its file on recompute. Decode and
//! I/O failures become absence plus a last-error message.

use crate::codec::error::CodecError;
use crate::codec::stream::{self, StreamLayout};
use crate::pipeline::node::{ComputeNode, NodeContext};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::port::{PortDescriptor, PortKind};
use crate::pipeline::property::{PropertyDescriptor, PropertyKind, PropertyValue};
use crate::types::BlobKind;
use std::sync::Arc;

static WRITE_PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("inChannels", PortKind::Channels),
    PortDescriptor::input("inVectors2", PortKind::Vectors),
    PortDescriptor::input("inChannels2", PortKind::Channels),
    PortDescriptor::output("outChannels", PortKind::Channels),
];

static WRITE_PROPERTIES: &[PropertyDescriptor] = &[PropertyDescriptor::new("path", "File", PropertyKind::String)];

#[derive(Debug, Default)]
pub struct WriteChannelsNode {
    path: String,
    encoded: Option<Result<Vec<u8>, CodecError>>,
}

impl WriteChannelsNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            encoded: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Result of the last encode, if the node has computed since its inputs
    /// were last available.
    pub fn encoded(&self) -> Option<&Result<Vec<u8>, CodecError>> {
        self.encoded.as_ref()
    }
}

impl ComputeNode for WriteChannelsNode {
    fn node_type(&self) -> NodeType {
        NodeType::WriteChannels
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        WRITE_PORTS
    }

    fn property_descriptors(&self) -> &'static [PropertyDescriptor] {
        WRITE_PROPERTIES
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        match key {
            "path" => Some(PropertyValue::String(self.path.clone())),
            _ => None,
        }
    }

    fn apply_property(&mut self, key: &str, value: PropertyValue) {
        if let ("path", PropertyValue::String(path)) = (key, value) {
            self.path = path;
        }
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        self.encoded = None;
        let Some(channels) = ctx.require(0, BlobKind::Channels) else {
            return;
        };
        let pair = match (ctx.input(1), ctx.input(2)) {
            (Some(_), Some(_)) => ctx
                .require(1, BlobKind::Vectors)
                .zip(ctx.require(2, BlobKind::Channels)),
            _ => None,
        };
        let encoded = match &pair {
            Some((vectors, channels2)) => stream::encode_pair(&channels, vectors, channels2),
            None => stream::encode_stream(&channels),
        };
        match &encoded {
            Ok(bytes) => tracing::debug!(
                "{}: encoded {} bytes ({})",
                ctx.node(),
                bytes.len(),
                if pair.is_some() { "pair" } else { "single" }
            ),
            Err(e) => ctx.fail(format!("encode failed: {}", e)),
        }
        self.encoded = Some(encoded);
        ctx.forward(0, Arc::clone(&channels));
    }
}

static READ_PORTS: &[PortDescriptor] = &[
    PortDescriptor::output("outChannels", PortKind::Channels),
    PortDescriptor::output("outVectors2", PortKind::Vectors),
    PortDescriptor::output("outChannels2", PortKind::Channels),
];

pub const LAYOUT_OPTIONS: &[&str] = &["single", "pair"];

static READ_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("path", "File", PropertyKind::String),
    PropertyDescriptor::new(
        "layout",
        "Layout",
        PropertyKind::Choice {
            options: LAYOUT_OPTIONS,
        },
    ),
];

#[derive(Debug, Default)]
pub struct ReadChannelsNode {
    path: String,
    layout: StreamLayout,
}

impl ReadChannelsNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<String>, layout: StreamLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    pub fn layout(&self) -> StreamLayout {
        self.layout
    }
}

impl ComputeNode for ReadChannelsNode {
    fn node_type(&self) -> NodeType {
        NodeType::ReadChannels
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        READ_PORTS
    }

    fn property_descriptors(&self) -> &'static [PropertyDescriptor] {
        READ_PROPERTIES
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        match key {
            "path" => Some(PropertyValue::String(self.path.clone())),
            "layout" => StreamLayout::all()
                .iter()
                .position(|&l| l == self.layout)
                .map(PropertyValue::Choice),
            _ => None,
        }
    }

    fn apply_property(&mut self, key: &str, value: PropertyValue) {
        match (key, value) {
            ("path", PropertyValue::String(path)) => self.path = path,
            ("layout", PropertyValue::Choice(i)) => {
                if let Some(&layout) = StreamLayout::all().get(i) {
                    self.layout = layout;
                }
            }
            _ => {}
        }
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        if self.path.is_empty() {
            ctx.fail("no stream path set");
            return;
        }
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                ctx.fail(format!("failed to read {}: {}", self.path, e));
                return;
            }
        };
        match self.layout {
            StreamLayout::Single => match stream::decode_stream(&bytes) {
                Ok(blob) => ctx.set_output(0, blob),
                Err(e) => ctx.fail(format!("failed to decode {}: {}", self.path, e)),
            },
            StreamLayout::Pair => match stream::decode_pair(&bytes) {
                Ok(pair) => {
                    ctx.set_output(0, pair.channels);
                    ctx.set_output(1, pair.vectors);
                    ctx.set_output(2, pair.channels2);
                }
                Err(e) => ctx.fail(format!("failed to decode {}: {}", self.path, e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::id::NodeId;
    use crate::pipeline::node::Output;
    use crate::types::DataBlob;

    #[test]
    fn test_write_then_read_single() {
        let blob = DataBlob::single(10, 9, (0..90).map(|i| (i * 3) as u8).collect());
        let inputs: Vec<Output> = vec![Some(Arc::new(blob.clone())), None, None];
        let mut writer = WriteChannelsNode::new();
        let mut ctx = NodeContext::new(NodeId(0), &inputs, 1);
        writer.compute(&mut ctx);
        let (outputs, error) = ctx.into_parts();
        assert!(error.is_none());
        assert_eq!(outputs[0].as_deref(), Some(&blob));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.bin");
        let bytes = writer.encoded().unwrap().as_ref().unwrap();
        std::fs::write(&path, bytes).unwrap();

        let mut reader = ReadChannelsNode::with_path(path.to_string_lossy(), StreamLayout::Single);
        let mut ctx = NodeContext::new(NodeId(1), &[], 3);
        reader.compute(&mut ctx);
        let (outputs, _) = ctx.into_parts();
        assert_eq!(outputs[0].as_deref(), Some(&blob));
        assert!(outputs[1].is_none());
    }

    #[test]
    fn test_encode_failure_keeps_passthrough() {
        let mut blob = DataBlob::single(1, 1, vec![0]);
        blob.image_width = 100_000;
        let inputs: Vec<Output> = vec![Some(Arc::new(blob)), None, None];
        let mut writer = WriteChannelsNode::new();
        let mut ctx = NodeContext::new(NodeId(0), &inputs, 1);
        writer.compute(&mut ctx);
        let (outputs, error) = ctx.into_parts();
        assert!(outputs[0].is_some());
        assert!(error.unwrap().contains("encode failed"));
        assert!(matches!(writer.encoded(), Some(Err(CodecError::DimensionOverflow { .. }))));
    }

    #[test]
    fn test_read_corrupt_file_is_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, [1, 2, 3]).unwrap();
        let mut reader = ReadChannelsNode::with_path(path.to_string_lossy(), StreamLayout::Pair);
        let mut ctx = NodeContext::new(NodeId(0), &[], 3);
        reader.compute(&mut ctx);
        let (outputs, error) = ctx.into_parts();
        assert!(outputs.iter().all(|o| o.is_none()));
        assert!(error.unwrap().contains("Truncated header"));
    }
}
