//! Graph documents: a serializable description of a graph.
//!
//! A document stores node kinds, names, property values and links. Cached
//! values, blob source contents and dirty state are not part of it; a loaded
//! graph starts with every node dirty.

use crate::error::{Error, Result};
use crate::pipeline::error::GraphError;
use crate::pipeline::executor::{Graph, NodeFactory};
use crate::pipeline::id::NodeId;
use crate::pipeline::node_type::NodeType;
use crate::pipeline::property::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// One node of a saved graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: NodeId,
    pub kind: NodeType,
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

/// A connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDocument {
    pub from: NodeId,
    pub from_port: String,
    pub to: NodeId,
    pub to_port: String,
}

/// A saved graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub links: Vec<LinkDocument>,
}

impl Default for GraphDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl GraphDocument {
    /// Load a graph document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read graph file {:?}: {}", path, e)))?;

        let doc: GraphDocument = serde_json::from_str(&content).map_err(|e| {
            Error::Serialization(format!("Failed to parse graph file {:?}: {}", path, e))
        })?;
        if doc.version > DOCUMENT_VERSION {
            return Err(Error::Serialization(format!(
                "Graph file {:?} has version {}, newest supported is {}",
                path, doc.version, DOCUMENT_VERSION
            )));
        }
        Ok(doc)
    }

    /// Save the document to disk as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create graph directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize graph: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write graph file {:?}: {}", path, e)))
    }
}

impl Graph {
    /// Describe the graph's structure. Dangling links are left out.
    pub fn to_document(&self) -> GraphDocument {
        let mut doc = GraphDocument::default();
        for id in self.node_ids() {
            let (Ok(node), Ok(name)) = (self.node(id), self.name(id)) else {
                continue;
            };
            doc.nodes.push(NodeDocument {
                id,
                kind: node.node_type(),
                name: name.to_string(),
                properties: node
                    .properties()
                    .into_iter()
                    .map(|p| (p.descriptor.key.to_string(), p.value))
                    .collect(),
            });

            let Ok(inputs) = self.input_addresses(id) else {
                continue;
            };
            for (port, address) in inputs {
                if let Some(address) = address.filter(|a| self.contains(a.node)) {
                    doc.links.push(LinkDocument {
                        from: address.node,
                        from_port: address.port.clone(),
                        to: id,
                        to_port: port.to_string(),
                    });
                }
            }
        }
        doc
    }

    /// Build a graph from a document. Returns the graph and a map from the
    /// document's node ids to the new ones.
    pub fn from_document(
        doc: &GraphDocument,
        factory: NodeFactory,
    ) -> Result<(Graph, BTreeMap<NodeId, NodeId>)> {
        let mut graph = Graph::with_factory(factory);
        let mut ids = BTreeMap::new();

        for node_doc in &doc.nodes {
            let node = graph.factory().create_type(node_doc.kind);
            let id = graph.insert_node(node);
            graph.rename(id, node_doc.name.clone())?;
            for (key, value) in &node_doc.properties {
                graph.set_property(id, key, value.clone())?;
            }
            if ids.insert(node_doc.id, id).is_some() {
                return Err(Error::Serialization(format!(
                    "Duplicate node id {} in graph document",
                    node_doc.id
                )));
            }
        }

        for link in &doc.links {
            let from = *ids.get(&link.from).ok_or(GraphError::UnknownNode(link.from))?;
            let to = *ids.get(&link.to).ok_or(GraphError::UnknownNode(link.to))?;
            graph.connect(from, &link.from_port, to, &link.to_port)?;
        }

        tracing::info!(
            "Loaded graph document: {} nodes, {} links",
            doc.nodes.len(),
            doc.links.len()
        );
        Ok((graph, ids))
    }
}
