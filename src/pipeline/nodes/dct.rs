//! Dct node: block transform with quantization over every plane.
//!
//! The forward pass stamps its quality on the output blob. The inverse pass
//! ignores its own `quality` property and uses the value carried by the
//! input, so a decoder always dequantizes with the encoder's tables.

use crate::codec::dct::{table_for_plane, transform_plane};
use crate::pipeline::node::{ComputeNode, NodeContext};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::port::{PortDescriptor, PortKind};
use crate::pipeline::property::{PropertyDescriptor, PropertyKind, PropertyValue};
use crate::types::{BlobKind, DataBlob};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("inChannels", PortKind::Channels),
    PortDescriptor::output("outChannels", PortKind::Channels),
];

static PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("inverse", "Inverse", PropertyKind::Bool),
    PropertyDescriptor::new("quality", "Quality", PropertyKind::Int { min: 1, max: 100 }),
];

#[derive(Debug)]
pub struct DctNode {
    inverse: bool,
    quality: u8,
}

impl DctNode {
    pub fn new(quality: u8, inverse: bool) -> Self {
        Self {
            inverse,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

/// Transform every plane of `blob`. Forward passes record `quality`.
pub fn transform_blob(blob: &DataBlob, quality: u8, inverse: bool) -> DataBlob {
    let mut out = blob.clone();
    let quality = if inverse { blob.quantize_quality } else { quality };
    for (i, plane) in out.channels.iter_mut().enumerate() {
        let (w, h) = blob.plane_size(i);
        transform_plane(plane, w, h, &table_for_plane(i, quality), inverse);
    }
    out.quantize_quality = quality;
    out
}

impl ComputeNode for DctNode {
    fn node_type(&self) -> NodeType {
        NodeType::Dct
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        PORTS
    }

    fn property_descriptors(&self) -> &'static [PropertyDescriptor] {
        PROPERTIES
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        match key {
            "inverse" => Some(PropertyValue::Bool(self.inverse)),
            "quality" => Some(PropertyValue::Int(self.quality as i64)),
            _ => None,
        }
    }

    fn apply_property(&mut self, key: &str, value: PropertyValue) {
        match (key, value) {
            ("inverse", PropertyValue::Bool(v)) => self.inverse = v,
            ("quality", PropertyValue::Int(v)) => self.quality = v.clamp(1, 100) as u8,
            _ => {}
        }
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        let Some(input) = ctx.require(0, BlobKind::Channels) else {
            return;
        };
        ctx.set_output(0, transform_blob(&input, self.quality, self.inverse));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::subsample::SamplingMode;

    #[test]
    fn test_forward_uniform_plane() {
        let blob = DataBlob::single(16, 16, vec![64; 256]);
        let out = transform_blob(&blob, 50, false);
        // each 8x8 block starts with DC 512 / 16
        for block_top in [0, 8, 128, 136] {
            assert_eq!(out.channels[0][block_top], 32);
        }
        assert_eq!(out.channels[0].iter().filter(|&&c| c != 0).count(), 4);
    }

    #[test]
    fn test_inverse_uses_recorded_quality() {
        let planes = vec![vec![90; 64], vec![120; 16], vec![140; 16]];
        let blob = DataBlob::channels(8, 8, SamplingMode::S420, planes);
        let coded = transform_blob(&blob, 80, false);
        assert_eq!(coded.quantize_quality, 80);
        let decoded = transform_blob(&coded, 5, true);
        assert_eq!(decoded.quantize_quality, 80);
        for (a, b) in decoded.channels[0].iter().zip(&blob.channels[0]) {
            assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_quality_property_clamps() {
        let mut node = DctNode::new(50, false);
        node.apply_property("quality", PropertyValue::Int(500));
        assert_eq!(node.quality(), 100);
        assert_eq!(node.property("inverse"), Some(PropertyValue::Bool(false)));
    }
}
