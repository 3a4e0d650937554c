//! Unit tests for plain-text rendering

use jacsparse::pretty::{render_coloring, render_graph, render_matrix};
use jacsparse::{BoolMatrix, Coloring, CompressionMode, ConnectivityGraph, OracleSignature, SparsityMatrix};

fn scenario() -> SparsityMatrix {
    let sig = OracleSignature::new(["i0", "i1", "i2", "i3"], ["o0", "o1", "o2"]).unwrap();
    SparsityMatrix::from_dense(
        &sig,
        &[
            vec![true, true, false, false],
            vec![false, true, true, false],
            vec![false, false, false, true],
        ],
    )
    .unwrap()
}

#[test]
fn test_render_sparsity_grid() {
    let rendered = scenario().to_string();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "    i0  i1  i2  i3");
    assert_eq!(lines[1], "o0   1   1   .   .");
    assert_eq!(lines[3], "o2   .   .   .   1");
}

#[test]
fn test_render_falls_back_to_indices() {
    let m = BoolMatrix::identity(2);
    let rendered = render_matrix(&m, &[], &[]);
    assert_eq!(rendered, "   0  1\n0  1  .\n1  .  1\n");
}

#[test]
fn test_render_graph_edges_by_name() {
    let graph = ConnectivityGraph::build(&scenario(), CompressionMode::Column);
    assert_eq!(render_graph(&graph), "i0 -- i1\ni1 -- i2\n");
}

#[test]
fn test_render_coloring_classes() {
    let coloring = Coloring::from_colors(vec![1, 0, 1, 0], "largest_first");
    let names: Vec<String> = ["i0", "i1", "i2", "i3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(render_coloring(&coloring, &names), "0: i1, i3\n1: i0, i2\n");
}

#[test]
fn test_render_compressed_uses_group_labels() {
    let sparsity = scenario();
    let coloring = Coloring::from_colors(vec![1, 0, 1, 0], "largest_first");
    let compressed = jacsparse::compress(&sparsity, &coloring, CompressionMode::Column).unwrap();
    let rendered = compressed.to_string();
    assert!(rendered.lines().next().unwrap().contains("i1, i3"));
    assert_eq!(rendered.lines().count(), 4);
}
