//! Lazy evaluation, dirty propagation and graph persistence.

mod common;

use common::builders::ChannelsBuilder;
use mpegflow_rs::pipeline::{PropertyValue, DOCUMENT_VERSION};
use mpegflow_rs::{EngineConfig, Graph, GraphDocument, GraphError, NodeFactory, NodeType};

#[test]
fn test_chain_recomputes_once_until_dirty() {
    let mut graph = Graph::new();
    let a = graph.add_node("BlobSource").unwrap();
    let b = graph.add_node("Dct").unwrap();
    let c = graph.add_node("PassThrough").unwrap();
    graph.connect(a, "outData", b, "inChannels").unwrap();
    graph.connect(b, "outChannels", c, "in").unwrap();
    graph
        .set_source_blob(a, Some(ChannelsBuilder::new(8, 8).planes(1).fill(64)))
        .unwrap();

    let first = graph.get_output(c, "out").unwrap().unwrap();
    let second = graph.get_output(c, "out").unwrap().unwrap();
    assert_eq!(first, second);
    for id in [a, b, c] {
        assert_eq!(graph.recompute_count(id).unwrap(), 1);
    }

    // marking the middle dirty recomputes it and everything after it only
    graph.mark_dirty(b).unwrap();
    graph.get_output(c, "out").unwrap();
    assert_eq!(graph.recompute_count(a).unwrap(), 1);
    assert_eq!(graph.recompute_count(b).unwrap(), 2);
    assert_eq!(graph.recompute_count(c).unwrap(), 2);
}

#[test]
fn test_property_change_reaches_downstream() {
    let mut graph = Graph::new();
    let a = graph.add_node("BlobSource").unwrap();
    let b = graph.add_node("Dct").unwrap();
    let c = graph.add_node("PassThrough").unwrap();
    graph.connect(a, "outData", b, "inChannels").unwrap();
    graph.connect(b, "outChannels", c, "in").unwrap();
    graph
        .set_source_blob(a, Some(ChannelsBuilder::new(8, 8).planes(1).fill(200)))
        .unwrap();

    let before = graph.get_output(c, "out").unwrap().unwrap();
    assert_eq!(before.channels[0][0], 100);

    assert!(graph.set_property(b, "quality", 100).unwrap());
    assert!(graph.is_dirty(c).unwrap());
    let after = graph.get_output(c, "out").unwrap().unwrap();
    assert_eq!(after.quantize_quality, 100);
    assert_ne!(after.channels[0][0], before.channels[0][0]);

    // same value again changes nothing
    assert!(!graph.set_property(b, "quality", 100).unwrap());
    assert!(!graph.is_dirty(c).unwrap());
}

#[test]
fn test_source_absence_flows_through() {
    let mut graph = Graph::new();
    let a = graph.add_node("BlobSource").unwrap();
    let b = graph.add_node("Subsample").unwrap();
    let c = graph.add_node("Dct").unwrap();
    graph.connect(a, "outData", b, "inColor").unwrap();
    graph.connect(b, "outChannels", c, "inChannels").unwrap();

    assert!(graph.get_output(c, "outChannels").unwrap().is_none());

    // a channel blob on a bitmap input is a mismatch, not an error
    graph
        .set_source_blob(a, Some(ChannelsBuilder::new(8, 8).fill(1)))
        .unwrap();
    assert!(graph.get_output(c, "outChannels").unwrap().is_none());
    assert_eq!(graph.recompute_count(c).unwrap(), 2);
}

#[test]
fn test_connection_errors() {
    let mut graph = Graph::new();
    let a = graph.add_node("PassThrough").unwrap();
    let b = graph.add_node("PassThrough").unwrap();
    graph.connect(a, "out", b, "in").unwrap();

    assert_eq!(
        graph.connect(b, "out", a, "in"),
        Err(GraphError::CycleDetected { from: b, to: a })
    );
    assert!(matches!(
        graph.connect(a, "out", b, "in"),
        Err(GraphError::PortAlreadyConnected { .. })
    ));
    assert!(matches!(
        graph.connect(a, "nope", b, "in"),
        Err(GraphError::UnknownPort { .. })
    ));
    assert!(matches!(
        graph.add_node("Blur"),
        Err(GraphError::UnknownNodeType(_))
    ));
}

#[test]
fn test_document_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.mpegflow.json");

    let mut graph = Graph::new();
    let read = graph.add_node("ReadChannels").unwrap();
    let idct = graph.add_node("Dct").unwrap();
    let merge = graph.add_node("Merge").unwrap();
    graph.set_property(read, "path", "clip.bin").unwrap();
    graph.set_property(read, "layout", 1).unwrap();
    graph.set_property(idct, "inverse", true).unwrap();
    graph.rename(merge, "Output").unwrap();
    graph.connect(read, "outChannels", idct, "inChannels").unwrap();
    graph.connect(idct, "outChannels", merge, "inChannels").unwrap();

    graph.to_document().save(&path).unwrap();
    let doc = GraphDocument::load(&path).unwrap();
    assert_eq!(doc.version, DOCUMENT_VERSION);

    let (loaded, ids) = Graph::from_document(&doc, NodeFactory::default()).unwrap();
    let read2 = ids[&read];
    let idct2 = ids[&idct];
    assert_eq!(loaded.node_type(read2).unwrap(), NodeType::ReadChannels);
    assert_eq!(
        loaded.property(read2, "layout").unwrap(),
        Some(PropertyValue::Choice(1))
    );
    assert_eq!(
        loaded.property(idct2, "inverse").unwrap(),
        Some(PropertyValue::Bool(true))
    );
    assert_eq!(loaded.name(ids[&merge]).unwrap(), "Output");
    assert_eq!(loaded.upstream(idct2, "inChannels").unwrap().unwrap().node, read2);
}

#[test]
fn test_config_defaults_reach_new_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[defaults]\nsearch_radius = 3\nquality = 80\nsampling_mode = \"S422\"\n",
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    let mut graph = Graph::with_factory(NodeFactory::new(config.defaults));
    let me = graph.add_node("MotionEstimator").unwrap();
    let dct = graph.add_node("Dct").unwrap();
    let sub = graph.add_node("Subsample").unwrap();

    assert_eq!(graph.property(me, "radius").unwrap(), Some(PropertyValue::Int(3)));
    assert_eq!(graph.property(dct, "quality").unwrap(), Some(PropertyValue::Int(80)));
    assert_eq!(graph.property(sub, "mode").unwrap(), Some(PropertyValue::Choice(1)));
}
