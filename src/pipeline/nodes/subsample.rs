//! Subsample and Merge nodes: conversion between interleaved bitmaps and
//! planar, chroma-subsampled channels.
//!
//! The three bitmap components are taken as already being in the target
//! colour space; no conversion happens here.

use crate::codec::subsample::{self, SamplingMode};
use crate::pipeline::node::{ComputeNode, NodeContext};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::port::{PortDescriptor, PortKind};
use crate::pipeline::property::{PropertyDescriptor, PropertyKind, PropertyValue};
use crate::types::{BlobKind, DataBlob, BITMAP_ELEMENTS};

static SUBSAMPLE_PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("inColor", PortKind::Bitmap),
    PortDescriptor::output("outChannels", PortKind::Channels),
];

pub const SAMPLING_OPTIONS: &[&str] = &["4:4:4", "4:2:2", "4:2:0"];

static SUBSAMPLE_PROPERTIES: &[PropertyDescriptor] = &[PropertyDescriptor::new(
    "mode",
    "Sampling",
    PropertyKind::Choice {
        options: SAMPLING_OPTIONS,
    },
)];

#[derive(Debug, Default)]
pub struct SubsampleNode {
    mode: SamplingMode,
}

impl SubsampleNode {
    pub fn new(mode: SamplingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }
}

/// Split an interleaved bitmap into planes and reduce planes 1-2.
pub fn split_bitmap(bitmap: &DataBlob, mode: SamplingMode) -> DataBlob {
    let (w, h) = (bitmap.channel_width, bitmap.channel_height);
    let pixels = &bitmap.channels[0];
    let component = |c: usize| -> Vec<u8> { pixels.iter().skip(c).step_by(BITMAP_ELEMENTS).copied().collect() };
    let planes = vec![
        component(0),
        subsample::downsample(&component(1), w, h, mode),
        subsample::downsample(&component(2), w, h, mode),
    ];
    let mut blob = DataBlob::channels(w, h, mode, planes).with_quality(bitmap.quantize_quality);
    blob.image_width = bitmap.image_width;
    blob.image_height = bitmap.image_height;
    blob
}

impl ComputeNode for SubsampleNode {
    fn node_type(&self) -> NodeType {
        NodeType::Subsample
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        SUBSAMPLE_PORTS
    }

    fn property_descriptors(&self) -> &'static [PropertyDescriptor] {
        SUBSAMPLE_PROPERTIES
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        match key {
            "mode" => Some(PropertyValue::Choice(self.mode.ordinal() as usize)),
            _ => None,
        }
    }

    fn apply_property(&mut self, key: &str, value: PropertyValue) {
        if let ("mode", PropertyValue::Choice(i)) = (key, value) {
            if let Some(mode) = SamplingMode::from_ordinal(i as u8) {
                self.mode = mode;
            }
        }
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        let Some(bitmap) = ctx.require(0, BlobKind::Bitmap) else {
            return;
        };
        ctx.set_output(0, split_bitmap(&bitmap, self.mode));
    }
}

static MERGE_PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("inChannels", PortKind::Channels),
    PortDescriptor::output("outColor", PortKind::Bitmap),
];

#[derive(Debug, Default)]
pub struct MergeNode;

impl MergeNode {
    pub fn new() -> Self {
        Self
    }
}

/// Interleave planes back into a bitmap. One plane is treated as gray.
pub fn merge_channels(blob: &DataBlob) -> Option<DataBlob> {
    let (w, h) = (blob.channel_width, blob.channel_height);
    let planes: Vec<Vec<u8>> = match blob.channels.len() {
        1 => vec![blob.channels[0].clone(); BITMAP_ELEMENTS],
        3 => vec![
            blob.channels[0].clone(),
            subsample::upsample(&blob.channels[1], w, h, blob.sampling_mode),
            subsample::upsample(&blob.channels[2], w, h, blob.sampling_mode),
        ],
        _ => return None,
    };
    let mut pixels = Vec::with_capacity(w * h * BITMAP_ELEMENTS);
    for i in 0..w * h {
        pixels.extend(planes.iter().map(|p| p[i]));
    }
    let mut bitmap = DataBlob::bitmap(w, h, pixels);
    bitmap.image_width = blob.image_width;
    bitmap.image_height = blob.image_height;
    Some(bitmap)
}

impl ComputeNode for MergeNode {
    fn node_type(&self) -> NodeType {
        NodeType::Merge
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        MERGE_PORTS
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        let Some(channels) = ctx.require(0, BlobKind::Channels) else {
            return;
        };
        match merge_channels(&channels) {
            Some(bitmap) => ctx.set_output(0, bitmap),
            None => tracing::warn!(
                "{}: cannot merge {} planes into a bitmap",
                ctx.node(),
                channels.plane_count()
            ),
        }
    }
}
