//! Graph executor: node arena, wiring and demand-driven evaluation.
//!
//! Nodes live in an arena indexed by [`NodeId`]. An input port holds an
//! [`Address`] naming an upstream node and output port; it is a lookup key,
//! not a reference, so removing a node just makes addresses that name it
//! resolve to nothing.
//!
//! Each node is either `Dirty` or `Clean` with cached outputs. Requesting an
//! output of a dirty node pulls its inputs (recursively), recomputes it once,
//! caches the result and marks it clean. Marking a node dirty walks the
//! reverse-edge lists recorded at connect time; nothing is recomputed until
//! someone asks.
//!
//! The graph is kept acyclic: `connect` rejects self-loops and any edge that
//! would close a cycle.

use crate::config::NodeDefaults;
use crate::error::{Result, ResultExt};
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::id::NodeId;
use crate::pipeline::node::{BuiltinNode, NodeContext, Output};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::nodes::{
    BlobSourceNode, DctNode, MergeNode, MotionComposeNode, MotionEstimatorNode, PassThroughNode,
    ReadChannelsNode, ReadImageNode, SubsampleNode, WriteChannelsNode,
};
use crate::pipeline::port::{ports_of, PortDescriptor, PortDirection};
use crate::pipeline::property::{Property, PropertyValue};
use crate::types::DataBlob;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Reference to an output port of another node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub node: NodeId,
    pub port: String,
}

impl Address {
    pub fn new(node: NodeId, port: impl Into<String>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

/// Cache validity of a node.
#[derive(Debug, Clone)]
pub enum CacheState {
    Dirty,
    Clean(Vec<Output>),
}

/// A slot holding a node and its graph bookkeeping.
#[derive(Debug)]
pub struct NodeSlot {
    pub name: String,
    pub node: BuiltinNode,
    /// One entry per declared input port.
    inputs: Vec<Option<Address>>,
    /// Nodes with a live input pointing at this one.
    dependents: Vec<NodeId>,
    state: CacheState,
    recompute_count: u64,
    last_error: Option<String>,
}

impl NodeSlot {
    fn new(name: String, node: BuiltinNode) -> Self {
        let inputs = vec![None; node.input_count()];
        Self {
            name,
            node,
            inputs,
            dependents: Vec::new(),
            state: CacheState::Dirty,
            recompute_count: 0,
            last_error: None,
        }
    }
}

/// The dataflow graph.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Option<NodeSlot>>,
    factory: NodeFactory,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph whose `add_node` uses `factory`.
    pub fn with_factory(factory: NodeFactory) -> Self {
        Self {
            nodes: Vec::new(),
            factory,
        }
    }

    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    // ── Lookup ──

    fn slot(&self, id: NodeId) -> GraphResult<&NodeSlot> {
        self.nodes
            .get(id.index())
            .and_then(|s| s.as_ref())
            .ok_or(GraphError::UnknownNode(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> GraphResult<&mut NodeSlot> {
        self.nodes
            .get_mut(id.index())
            .and_then(|s| s.as_mut())
            .ok_or(GraphError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_ok()
    }

    /// Live node ids in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> GraphResult<&BuiltinNode> {
        Ok(&self.slot(id)?.node)
    }

    pub fn node_type(&self, id: NodeId) -> GraphResult<NodeType> {
        Ok(self.slot(id)?.node.node_type())
    }

    pub fn name(&self, id: NodeId) -> GraphResult<&str> {
        Ok(&self.slot(id)?.name)
    }

    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> GraphResult<()> {
        self.slot_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn input_ports(&self, id: NodeId) -> GraphResult<Vec<&'static PortDescriptor>> {
        Ok(ports_of(self.slot(id)?.node.ports(), PortDirection::Input).collect())
    }

    pub fn output_ports(&self, id: NodeId) -> GraphResult<Vec<&'static PortDescriptor>> {
        Ok(ports_of(self.slot(id)?.node.ports(), PortDirection::Output).collect())
    }

    /// The address stored on input `port` of `id`, live or dangling.
    pub fn upstream(&self, id: NodeId, port: &str) -> GraphResult<Option<&Address>> {
        let slot = self.slot(id)?;
        let index = input_index(slot, id, port)?;
        Ok(slot.inputs[index].as_ref())
    }

    pub fn properties(&self, id: NodeId) -> GraphResult<Vec<Property>> {
        Ok(self.slot(id)?.node.properties())
    }

    pub fn property(&self, id: NodeId, key: &str) -> GraphResult<Option<PropertyValue>> {
        Ok(self.slot(id)?.node.property(key))
    }

    pub fn is_dirty(&self, id: NodeId) -> GraphResult<bool> {
        Ok(matches!(self.slot(id)?.state, CacheState::Dirty))
    }

    /// How many times `id` has recomputed since it was created.
    pub fn recompute_count(&self, id: NodeId) -> GraphResult<u64> {
        Ok(self.slot(id)?.recompute_count)
    }

    /// Why the last recompute of `id` produced nothing, if it said.
    pub fn last_error(&self, id: NodeId) -> GraphResult<Option<&str>> {
        Ok(self.slot(id)?.last_error.as_deref())
    }

    /// Nodes with a live input pointing at `id`.
    pub fn dependents(&self, id: NodeId) -> GraphResult<&[NodeId]> {
        Ok(&self.slot(id)?.dependents)
    }

    // ── Graph building ──

    /// Create a node of registered type `kind` with the factory defaults.
    pub fn add_node(&mut self, kind: &str) -> GraphResult<NodeId> {
        let node = self.factory.create(kind)?;
        Ok(self.insert_node(node))
    }

    /// Add an already constructed node. Returns its NodeId.
    pub fn insert_node(&mut self, node: BuiltinNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let name = format!("{} {}", node.node_type().display_name(), id.0);
        tracing::info!("Added node {:?} ({})", id, node.node_type().key());
        self.nodes.push(Some(NodeSlot::new(name, node)));
        id
    }

    /// Remove a node. Its dependents become dirty and their addresses that
    /// name it dangle.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<()> {
        self.mark_dirty(id)?;
        let upstream: Vec<NodeId> = self
            .slot(id)?
            .inputs
            .iter()
            .flatten()
            .map(|a| a.node)
            .collect();
        for up in upstream {
            if let Ok(slot) = self.slot_mut(up) {
                slot.dependents.retain(|&d| d != id);
            }
        }
        self.nodes[id.index()] = None;
        tracing::info!("Removed node {:?}", id);
        Ok(())
    }

    /// Connect output `src_port` of `src` to input `dst_port` of `dst`.
    pub fn connect(&mut self, src: NodeId, src_port: &str, dst: NodeId, dst_port: &str) -> GraphResult<()> {
        let src_slot = self.slot(src)?;
        let dst_slot = self.slot(dst)?;

        let out_index = src_slot
            .node
            .output_index(src_port)
            .ok_or_else(|| GraphError::UnknownPort {
                node: src,
                port: src_port.to_string(),
                direction: PortDirection::Output.label(),
            })?;
        let in_index = input_index(dst_slot, dst, dst_port)?;

        let out_kind = ports_of(src_slot.node.ports(), PortDirection::Output)
            .nth(out_index)
            .map(|p| p.kind);
        let in_kind = ports_of(dst_slot.node.ports(), PortDirection::Input)
            .nth(in_index)
            .map(|p| p.kind);
        if let (Some(out_kind), Some(in_kind)) = (out_kind, in_kind) {
            if !out_kind.feeds(in_kind) {
                return Err(GraphError::PortMismatch(format!(
                    "{}.{} ({:?}) cannot feed {}.{} ({:?})",
                    src, src_port, out_kind, dst, dst_port, in_kind
                )));
            }
        }

        if let Some(existing) = &dst_slot.inputs[in_index] {
            if self.contains(existing.node) {
                return Err(GraphError::PortAlreadyConnected {
                    node: dst,
                    port: dst_port.to_string(),
                });
            }
        }
        if src == dst {
            return Err(GraphError::SelfLoop(src));
        }
        if self.would_create_cycle(src, dst) {
            return Err(GraphError::CycleDetected { from: src, to: dst });
        }

        let dst_slot = self.slot_mut(dst)?;
        dst_slot.inputs[in_index] = Some(Address::new(src, src_port));
        let src_slot = self.slot_mut(src)?;
        if !src_slot.dependents.contains(&dst) {
            src_slot.dependents.push(dst);
        }
        tracing::info!("Connected {:?}.{} -> {:?}.{}", src, src_port, dst, dst_port);
        self.mark_dirty(dst)
    }

    /// Clear input `port` of `id`, returning the address it held.
    pub fn disconnect(&mut self, id: NodeId, port: &str) -> GraphResult<Option<Address>> {
        let slot = self.slot_mut(id)?;
        let index = input_index(slot, id, port)?;
        let Some(old) = slot.inputs[index].take() else {
            return Ok(None);
        };
        let still_linked = slot.inputs.iter().flatten().any(|a| a.node == old.node);
        if !still_linked {
            if let Ok(up) = self.slot_mut(old.node) {
                up.dependents.retain(|&d| d != id);
            }
        }
        tracing::info!("Disconnected {:?}.{}", id, port);
        self.mark_dirty(id)?;
        Ok(Some(old))
    }

    /// Check if adding an edge from `from` to `to` would create a cycle.
    fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        // If `to` can reach `from` through existing edges, adding from->to creates a cycle.
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![to];

        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            let idx = current.index();
            if idx >= self.nodes.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;
            if let Ok(slot) = self.slot(current) {
                stack.extend(slot.dependents.iter().copied());
            }
        }
        false
    }

    // ── Dirty tracking ──

    /// Mark `id` and everything downstream of it dirty.
    pub fn mark_dirty(&mut self, id: NodeId) -> GraphResult<()> {
        self.slot(id)?;
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let idx = current.index();
            if visited.get(idx).copied().unwrap_or(true) {
                continue;
            }
            visited[idx] = true;
            if let Some(Some(slot)) = self.nodes.get_mut(idx) {
                slot.state = CacheState::Dirty;
                stack.extend(slot.dependents.iter().copied());
            }
        }
        Ok(())
    }

    /// Validate and set a property. Marks the node dirty and returns `true`
    /// only if the stored value changed.
    pub fn set_property(&mut self, id: NodeId, key: &str, value: impl Into<PropertyValue>) -> GraphResult<bool> {
        let changed = self.slot_mut(id)?.node.set_property(id, key, value.into())?;
        if changed {
            tracing::debug!("{:?}: property '{}' changed", id, key);
            self.mark_dirty(id)?;
        }
        Ok(changed)
    }

    /// Replace the blob emitted by a `BlobSource` node.
    pub fn set_source_blob(&mut self, id: NodeId, blob: Option<DataBlob>) -> GraphResult<()> {
        match &mut self.slot_mut(id)?.node {
            BuiltinNode::BlobSource(source) => source.set_blob(blob),
            _ => return Err(GraphError::NotASource(id)),
        }
        self.mark_dirty(id)
    }

    // ── Evaluation ──

    /// Value of output `port` of `id`, recomputing first if the node is dirty.
    pub fn get_output(&mut self, id: NodeId, port: &str) -> GraphResult<Option<Arc<DataBlob>>> {
        let slot = self.slot(id)?;
        let index = slot.node.output_index(port).ok_or_else(|| GraphError::UnknownPort {
            node: id,
            port: port.to_string(),
            direction: PortDirection::Output.label(),
        })?;
        Ok(self.pull(id, index))
    }

    /// Force `id` to recompute on next access and return its first output.
    pub fn recompute(&mut self, id: NodeId) -> GraphResult<Option<Arc<DataBlob>>> {
        self.mark_dirty(id)?;
        self.ensure_clean(id);
        Ok(self.cached(id, 0))
    }

    fn cached(&self, id: NodeId, index: usize) -> Output {
        match &self.slot(id).ok()?.state {
            CacheState::Clean(outputs) => outputs.get(index).cloned().flatten(),
            CacheState::Dirty => None,
        }
    }

    fn pull(&mut self, id: NodeId, index: usize) -> Output {
        self.ensure_clean(id);
        self.cached(id, index)
    }

    fn resolve(&mut self, address: &Address) -> Output {
        let index = self.slot(address.node).ok()?.node.output_index(&address.port)?;
        self.pull(address.node, index)
    }

    fn ensure_clean(&mut self, id: NodeId) {
        let addresses = match self.slot(id) {
            Ok(slot) if matches!(slot.state, CacheState::Dirty) => slot.inputs.clone(),
            _ => return,
        };
        let inputs: Vec<Output> = addresses
            .iter()
            .map(|a| a.as_ref().and_then(|a| self.resolve(a)))
            .collect();

        let Ok(slot) = self.slot_mut(id) else {
            return;
        };
        let mut ctx = NodeContext::new(id, &inputs, slot.node.output_count());
        slot.node.compute(&mut ctx);
        let (outputs, error) = ctx.into_parts();
        slot.recompute_count += 1;
        tracing::debug!(
            "Recomputed {:?} ({}): {}/{} outputs",
            id,
            slot.name,
            outputs.iter().filter(|o| o.is_some()).count(),
            outputs.len()
        );
        slot.last_error = error;
        slot.state = CacheState::Clean(outputs);
    }

    // ── Persistence ──

    /// Write the stream encoded by a `WriteChannels` node to its path.
    /// Returns the path and the number of bytes written.
    pub fn save(&mut self, id: NodeId) -> Result<(PathBuf, usize)> {
        self.slot(id)?;
        self.ensure_clean(id);
        let BuiltinNode::WriteChannels(writer) = &self.slot(id)?.node else {
            return Err(GraphError::NoData(id).into());
        };
        let bytes = match writer.encoded() {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => return Err(e.clone().into()),
            None => return Err(GraphError::NoData(id).into()),
        };
        let path = PathBuf::from(writer.path());
        std::fs::write(&path, bytes).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::info!("Saved {} bytes to {:?}", bytes.len(), path);
        Ok((path, bytes.len()))
    }

    pub(crate) fn input_addresses(&self, id: NodeId) -> GraphResult<Vec<(&'static str, Option<&Address>)>> {
        let slot = self.slot(id)?;
        Ok(ports_of(slot.node.ports(), PortDirection::Input)
            .map(|p| p.name)
            .zip(slot.inputs.iter().map(|a| a.as_ref()))
            .collect())
    }
}

fn input_index(slot: &NodeSlot, id: NodeId, port: &str) -> GraphResult<usize> {
    slot.node.input_index(port).ok_or_else(|| GraphError::UnknownPort {
        node: id,
        port: port.to_string(),
        direction: PortDirection::Input.label(),
    })
}

/// Constructor stored in the [`NodeFactory`] registry.
pub type NodeConstructor = fn(&NodeDefaults) -> BuiltinNode;

/// Factory for creating nodes by registered name.
///
/// Seeded with every built-in [`NodeType`] under its key. Extra names can be
/// registered to expose pre-configured variants.
#[derive(Debug, Clone)]
pub struct NodeFactory {
    defaults: NodeDefaults,
    registry: BTreeMap<String, NodeConstructor>,
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::new(NodeDefaults::default())
    }
}

impl NodeFactory {
    pub fn new(defaults: NodeDefaults) -> Self {
        let mut factory = Self {
            defaults: defaults.sanitized(),
            registry: BTreeMap::new(),
        };
        for &node_type in NodeType::all() {
            factory.register(node_type.key(), builtin_constructor(node_type));
        }
        factory
    }

    pub fn defaults(&self) -> &NodeDefaults {
        &self.defaults
    }

    /// Register (or replace) a constructor under `name`.
    pub fn register(&mut self, name: impl Into<String>, constructor: NodeConstructor) {
        self.registry.insert(name.into(), constructor);
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registry.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str) -> GraphResult<BuiltinNode> {
        let constructor = self
            .registry
            .get(name)
            .ok_or_else(|| GraphError::UnknownNodeType(name.to_string()))?;
        Ok(constructor(&self.defaults))
    }

    /// Create a built-in node, bypassing any re-registration of its key.
    pub fn create_type(&self, node_type: NodeType) -> BuiltinNode {
        builtin_constructor(node_type)(&self.defaults)
    }
}

fn builtin_constructor(node_type: NodeType) -> NodeConstructor {
    match node_type {
        NodeType::ReadImage => |_: &NodeDefaults| BuiltinNode::ReadImage(ReadImageNode::new()),
        NodeType::BlobSource => |_: &NodeDefaults| BuiltinNode::BlobSource(BlobSourceNode::new()),
        NodeType::ReadChannels => |_: &NodeDefaults| BuiltinNode::ReadChannels(ReadChannelsNode::new()),
        NodeType::Subsample => |d: &NodeDefaults| BuiltinNode::Subsample(SubsampleNode::new(d.sampling_mode)),
        NodeType::Merge => |_: &NodeDefaults| BuiltinNode::Merge(MergeNode::new()),
        NodeType::Dct => |d: &NodeDefaults| BuiltinNode::Dct(DctNode::new(d.quality, false)),
        NodeType::MotionEstimator => |d: &NodeDefaults| {
            BuiltinNode::MotionEstimator(MotionEstimatorNode::new(d.search_radius, d.chroma_vectors))
        },
        NodeType::MotionCompose => |_: &NodeDefaults| BuiltinNode::MotionCompose(MotionComposeNode::new()),
        NodeType::PassThrough => |_: &NodeDefaults| BuiltinNode::PassThrough(PassThroughNode::new()),
        NodeType::WriteChannels => |_: &NodeDefaults| BuiltinNode::WriteChannels(WriteChannelsNode::new()),
    }
}
