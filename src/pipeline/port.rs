//! Port descriptors for the node system.
//!
//! Each node declares its ports (inputs/outputs) via static `PortDescriptor` arrays.
//! The graph uses these to validate connections.

/// The kind of data flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Interleaved RGB image.
    Bitmap,
    /// Planar channels.
    Channels,
    /// Per-block motion vectors.
    Vectors,
    /// Accepts or produces any blob.
    Any,
}

impl PortKind {
    /// Whether an output of kind `self` may feed an input of kind `input`.
    pub fn feeds(self, input: PortKind) -> bool {
        self == input || self == PortKind::Any || input == PortKind::Any
    }
}

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn label(self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

/// Static descriptor for a node's port.
#[derive(Debug, Clone)]
pub struct PortDescriptor {
    pub name: &'static str,
    pub direction: PortDirection,
    pub kind: PortKind,
}

impl PortDescriptor {
    pub const fn input(name: &'static str, kind: PortKind) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            kind,
        }
    }

    pub const fn output(name: &'static str, kind: PortKind) -> Self {
        Self {
            name,
            direction: PortDirection::Output,
            kind,
        }
    }
}

/// Position of the port named `name` among the ports of `direction`.
pub fn port_index(ports: &[PortDescriptor], direction: PortDirection, name: &str) -> Option<usize> {
    ports
        .iter()
        .filter(|p| p.direction == direction)
        .position(|p| p.name == name)
}

/// Ports of one direction, in declaration order.
pub fn ports_of(ports: &[PortDescriptor], direction: PortDirection) -> impl Iterator<Item = &PortDescriptor> {
    ports.iter().filter(move |p| p.direction == direction)
}
