//! Proptest generators for jacsparse data structures
//!
//! Provides `Strategy` implementations for generating valid graphs,
//! sparsity patterns and coloring strategies, plus oracles with a known
//! dependency structure.

#![allow(dead_code)]

use jacsparse::{
    Coloring, ConnectivityGraph, FnOracle, InputVector, Oracle, OracleError, OracleSignature,
    SparsityMatrix,
};
use proptest::collection::vec;
use proptest::prelude::*;

// ============================================================================
// Graph Generation
// ============================================================================

/// Parameters for graph generation
#[derive(Debug, Clone)]
pub struct GraphParams {
    pub max_nodes: usize,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self { max_nodes: 12 }
    }
}

/// Generate an undirected simple graph: each possible edge present or not
pub fn arb_graph(params: GraphParams) -> impl Strategy<Value = ConnectivityGraph> {
    (0..=params.max_nodes).prop_flat_map(|n| {
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|u| (u + 1..n).map(move |v| (u, v)))
            .collect();
        vec(any::<bool>(), pairs.len()).prop_map(move |present| {
            let edges: Vec<(usize, usize)> = pairs
                .iter()
                .zip(&present)
                .filter(|(_, keep)| **keep)
                .map(|(&e, _)| e)
                .collect();
            ConnectivityGraph::from_edges(n, &edges).expect("generated edges are valid")
        })
    })
}

/// Generate a graph together with an extra isolated node appended
pub fn arb_graph_with_isolated(
    params: GraphParams,
) -> impl Strategy<Value = (ConnectivityGraph, ConnectivityGraph)> {
    arb_graph(params).prop_map(|graph| {
        let n = graph.num_nodes();
        let edges: Vec<(usize, usize)> = graph.edges().collect();
        let extended =
            ConnectivityGraph::from_edges(n + 1, &edges).expect("same edges plus one node");
        (graph, extended)
    })
}

// ============================================================================
// Sparsity Generation
// ============================================================================

/// Parameters for sparsity generation
#[derive(Debug, Clone)]
pub struct SparsityParams {
    pub max_inputs: usize,
    pub max_outputs: usize,
}

impl Default for SparsityParams {
    fn default() -> Self {
        Self {
            max_inputs: 10,
            max_outputs: 10,
        }
    }
}

/// Signature with inputs `x0..` and outputs `y0..`
pub fn signature(num_inputs: usize, num_outputs: usize) -> OracleSignature {
    OracleSignature::new(
        (0..num_inputs).map(|j| format!("x{}", j)),
        (0..num_outputs).map(|i| format!("y{}", i)),
    )
    .expect("generated names are unique")
}

/// Generate a dense outputs × inputs pattern
pub fn arb_pattern(params: SparsityParams) -> impl Strategy<Value = Vec<Vec<bool>>> {
    (0..=params.max_inputs, 0..=params.max_outputs)
        .prop_flat_map(|(n, m)| vec(vec(any::<bool>(), n..=n), m..=m))
}

/// Generate a labelled sparsity matrix
pub fn arb_sparsity(params: SparsityParams) -> impl Strategy<Value = SparsityMatrix> {
    (1..=params.max_inputs.max(1), 0..=params.max_outputs).prop_flat_map(|(n, m)| {
        vec(vec(any::<bool>(), n..=n), m..=m).prop_map(move |dense| {
            SparsityMatrix::from_dense(&signature(n, m), &dense).expect("rows have n entries")
        })
    })
}

// ============================================================================
// Coloring Strategy Generation
// ============================================================================

/// Generate any built-in coloring strategy (random seeds included)
pub fn arb_strategy() -> impl Strategy<Value = jacsparse::Strategy> {
    prop_oneof![
        Just(jacsparse::Strategy::LargestFirst),
        Just(jacsparse::Strategy::SmallestLast),
        Just(jacsparse::Strategy::IndependentSet),
        any::<u64>().prop_map(|seed| jacsparse::Strategy::RandomSequential { seed }),
        Just(jacsparse::Strategy::ConnectedSequentialBfs),
        Just(jacsparse::Strategy::ConnectedSequentialDfs),
        Just(jacsparse::Strategy::SaturationLargestFirst),
    ]
}

// ============================================================================
// Oracles
// ============================================================================

/// An oracle whose output `i` is the sum of the inputs marked in row `i`,
/// so contamination recovers `pattern` exactly.
pub fn linear_oracle(pattern: Vec<Vec<bool>>, num_inputs: usize) -> impl Oracle + Sync {
    let sig = signature(num_inputs, pattern.len());
    FnOracle::new(sig, move |v: &InputVector| {
        Ok::<_, OracleError>(
            pattern
                .iter()
                .map(|row| {
                    row.iter()
                        .zip(v.values())
                        .filter(|(on, _)| **on)
                        .map(|(_, &x)| x)
                        .sum::<f64>()
                })
                .collect(),
        )
    })
}

// ============================================================================
// Invariant Checking
// ============================================================================

/// Check that a coloring is total and proper on `graph`
pub fn check_coloring(graph: &ConnectivityGraph, coloring: &Coloring) -> Result<(), String> {
    if coloring.len() != graph.num_nodes() {
        return Err(format!(
            "coloring covers {} nodes, graph has {}",
            coloring.len(),
            graph.num_nodes()
        ));
    }
    for (u, v) in graph.edges() {
        if coloring.color(u) == coloring.color(v) {
            return Err(format!(
                "edge ({}, {}) is monochromatic with color {}",
                u,
                v,
                coloring.color(u)
            ));
        }
    }
    let expected = coloring.colors().iter().max().map_or(0, |&c| c + 1);
    if coloring.num_colors() != expected {
        return Err(format!(
            "num_colors is {}, max color + 1 is {}",
            coloring.num_colors(),
            expected
        ));
    }
    Ok(())
}
