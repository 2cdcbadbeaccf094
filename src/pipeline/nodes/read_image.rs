//! ReadImage node: loads an image file as an RGB bitmap.
//!
//! A missing path, unreadable file or undecodable image is not an error: the
//! node produces nothing and keeps the reason as its last error.

use crate::pipeline::node::{ComputeNode, NodeContext};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::port::{PortDescriptor, PortKind};
use crate::pipeline::property::{PropertyDescriptor, PropertyKind, PropertyValue};
use crate::types::DataBlob;

static PORTS: &[PortDescriptor] = &[PortDescriptor::output("outColor", PortKind::Bitmap)];

static PROPERTIES: &[PropertyDescriptor] = &[PropertyDescriptor::new("path", "File", PropertyKind::String)];

#[derive(Debug, Default)]
pub struct ReadImageNode {
    path: String,
}

impl ReadImageNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ComputeNode for ReadImageNode {
    fn node_type(&self) -> NodeType {
        NodeType::ReadImage
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        PORTS
    }

    fn property_descriptors(&self) -> &'static [PropertyDescriptor] {
        PROPERTIES
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
        if self.path.is_empty() {
            ctx.fail("no image path set");
            return;
        }
        match image::open(&self.path) {
            Ok(img) => {
                let rgb = img.to_rgb8();
                let (width, height) = rgb.dimensions();
                tracing::debug!("Loaded {} ({}x{})", self.path, width, height);
                ctx.set_output(0, DataBlob::bitmap(width as usize, height as usize, rgb.into_raw()));
            }
            Err(e) => ctx.fail(format!("failed to load {}: {}", self.path, e)),
        }
    }
}
