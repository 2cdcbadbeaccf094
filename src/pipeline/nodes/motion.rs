//! MotionEstimator and MotionCompose nodes.
//!
//! The estimator searches every plane of "now" against the same plane of
//! "past" and emits a vector blob (one byte per block) plus the residual
//! channels. Under [`ChromaVectors::Shared`] plane 2 reuses plane 1's vectors
//! instead of searching; the vector blob still stores them per plane so the
//! composer never needs to know which policy was used.

use crate::codec::motion::{self, ChromaVectors, MAX_RADIUS};
use crate::codec::stream::block_grid;
use crate::pipeline::node::{ComputeNode, NodeContext};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::port::{PortDescriptor, PortKind};
use crate::pipeline::property::{PropertyDescriptor, PropertyKind, PropertyValue};
use crate::types::{BlobKind, DataBlob};

static ESTIMATOR_PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("inChannelsPast", PortKind::Channels),
    PortDescriptor::input("inChannelsNow", PortKind::Channels),
    PortDescriptor::output("outVectors", PortKind::Vectors),
    PortDescriptor::output("outChannels", PortKind::Channels),
];

pub const CHROMA_VECTOR_OPTIONS: &[&str] = &["shared", "independent"];

static ESTIMATOR_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new(
        "radius",
        "Search radius",
        PropertyKind::Int {
            min: 0,
            max: MAX_RADIUS as i64,
        },
    ),
    PropertyDescriptor::new(
        "chromaVectors",
        "Chroma vectors",
        PropertyKind::Choice {
            options: CHROMA_VECTOR_OPTIONS,
        },
    ),
];

#[derive(Debug)]
pub struct MotionEstimatorNode {
    radius: u8,
    chroma: ChromaVectors,
}

impl MotionEstimatorNode {
    pub fn new(radius: u8, chroma: ChromaVectors) -> Self {
        Self {
            radius: radius.min(MAX_RADIUS),
            chroma,
        }
    }

    pub fn radius(&self) -> u8 {
        self.radius
    }

    pub fn chroma_vectors(&self) -> ChromaVectors {
        self.chroma
    }
}

/// Estimate vectors for every plane of `now` and the residual against `past`.
/// Both blobs must share geometry.
pub fn estimate(past: &DataBlob, now: &DataBlob, radius: u8, chroma: ChromaVectors) -> (DataBlob, DataBlob) {
    let mut vector_planes: Vec<Vec<u8>> = Vec::with_capacity(now.plane_count());
    let mut residual_planes = Vec::with_capacity(now.plane_count());
    for i in 0..now.plane_count() {
        let (w, h) = now.plane_size(i);
        let vectors = match (i, chroma) {
            (2, ChromaVectors::Shared) => vector_planes[1].clone(),
            _ => motion::estimate_vectors(&now.channels[i], &past.channels[i], w, h, radius),
        };
        residual_planes.push(motion::residual_plane(&now.channels[i], &past.channels[i], w, h, &vectors));
        vector_planes.push(vectors);
    }

    let (gw, gh) = block_grid(now.channel_width, now.channel_height);
    let vectors = DataBlob {
        kind: BlobKind::Vectors,
        channels: vector_planes,
        channel_width: gw,
        channel_height: gh,
        ..now.without_planes()
    };
    let residual = DataBlob {
        channels: residual_planes,
        ..now.without_planes()
    };
    (vectors, residual)
}

/// Rebuild "now" from `past`, per-plane `vectors` and `residual`.
pub fn compose(past: &DataBlob, vectors: &DataBlob, residual: &DataBlob) -> DataBlob {
    let planes = (0..residual.plane_count())
        .map(|i| {
            let (w, h) = residual.plane_size(i);
            motion::compose_plane(&residual.channels[i], &past.channels[i], w, h, &vectors.channels[i])
        })
        .collect();
    DataBlob {
        channels: planes,
        ..residual.without_planes()
    }
}

impl ComputeNode for MotionEstimatorNode {
    fn node_type(&self) -> NodeType {
        NodeType::MotionEstimator
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        ESTIMATOR_PORTS
    }

    fn property_descriptors(&self) -> &'static [PropertyDescriptor] {
        ESTIMATOR_PROPERTIES
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        match key {
            "radius" => Some(PropertyValue::Int(self.radius as i64)),
            "chromaVectors" => Some(PropertyValue::Choice(match self.chroma {
                ChromaVectors::Shared => 0,
                ChromaVectors::Independent => 1,
            })),
            _ => None,
        }
    }

    fn apply_property(&mut self, key: &str, value: PropertyValue) {
        match (key, value) {
            ("radius", PropertyValue::Int(v)) => self.radius = v.clamp(0, MAX_RADIUS as i64) as u8,
            ("chromaVectors", PropertyValue::Choice(i)) => {
                if let Some(&policy) = ChromaVectors::all().get(i) {
                    self.chroma = policy;
                }
            }
            _ => {}
        }
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        let (Some(past), Some(now)) = (
            ctx.require(0, BlobKind::Channels),
            ctx.require(1, BlobKind::Channels),
        ) else {
            return;
        };
        if !past.same_geometry(&now) {
            tracing::warn!(
                "{}: past {}x{} and now {}x{} differ, no output",
                ctx.node(),
                past.channel_width,
                past.channel_height,
                now.channel_width,
                now.channel_height
            );
            return;
        }
        let (vectors, residual) = estimate(&past, &now, self.radius, self.chroma);
        ctx.set_output(0, vectors);
        ctx.set_output(1, residual);
    }
}

static COMPOSE_PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("inChannelsPast", PortKind::Channels),
    PortDescriptor::input("inVectors", PortKind::Vectors),
    PortDescriptor::input("inChannels", PortKind::Channels),
    PortDescriptor::output("outChannels", PortKind::Channels),
];

#[derive(Debug, Default)]
pub struct MotionComposeNode;

impl MotionComposeNode {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeNode for MotionComposeNode {
    fn node_type(&self) -> NodeType {
        NodeType::MotionCompose
    }

    fn ports(&self) -> &'static [PortDescriptor] {
        COMPOSE_PORTS
    }

    fn compute(&mut self, ctx: &mut NodeContext) {
        let (Some(past), Some(vectors), Some(residual)) = (
            ctx.require(0, BlobKind::Channels),
            ctx.require(1, BlobKind::Vectors),
            ctx.require(2, BlobKind::Channels),
        ) else {
            return;
        };
        let grid = block_grid(residual.channel_width, residual.channel_height);
        if !past.same_geometry(&residual)
            || (vectors.channel_width, vectors.channel_height) != grid
            || vectors.plane_count() < residual.plane_count()
        {
            tracing::warn!("{}: past, vectors and residual disagree on geometry", ctx.node());
            return;
        }
        ctx.set_output(0, compose(&past, &vectors, &residual));
    }
}
