//! Fuzz the greedy colorer
//!
//! Bytes are read as pairs of node indices; every built-in strategy must
//! color the resulting graph properly.

#![no_main]

use jacsparse::{greedy_color, ConnectivityGraph, Strategy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&size, rest)) = data.split_first() else {
        return;
    };
    let n = (size % 64) as usize;
    if n == 0 {
        return;
    }

    let edges: Vec<(usize, usize)> = rest
        .chunks_exact(2)
        .map(|pair| (pair[0] as usize % n, pair[1] as usize % n))
        .filter(|(u, v)| u != v)
        .collect();
    let graph = ConnectivityGraph::from_edges(n, &edges).expect("edges are in range");

    for strategy in Strategy::ALL {
        let coloring = greedy_color(&graph, &strategy).expect("valid graph colors");
        assert!(coloring.num_colors() <= graph.max_degree() + 1);
    }
});
