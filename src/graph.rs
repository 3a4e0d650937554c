//! Connectivity (conflict) graphs.
//!
//! Two nodes conflict when they cannot be perturbed together without losing
//! the ability to tell their effects apart:
//!
//! - **column mode** (reverse-mode compression): nodes are inputs, and inputs
//!   `j`, `k` conflict iff some output depends on both, i.e. `(SᵀS)[j,k]`
//! - **row mode** (forward-mode compression): nodes are outputs, and outputs
//!   `i`, `i'` conflict iff they share an input, i.e. `(SSᵀ)[i,i']`
//!
//! In both cases the diagonal is discarded. The product is computed over the
//! Boolean semiring with bitmaps: the neighbourhood of a node is the union of
//! every line it appears on, minus itself.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use roaring::RoaringBitmap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::id::{key, try_key, NodeIdx, MAX_INDEX_COUNT};
use crate::matrix::BoolMatrix;
use crate::signature::Labels;
use crate::sparsity::SparsityMatrix;

// ============================================================================
// COMPRESSION MODE
// ============================================================================

/// Which axis of the sparsity matrix is compressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompressionMode {
    /// Group inputs (columns); nodes are inputs
    #[default]
    Column,
    /// Group outputs (rows); nodes are outputs
    Row,
}

impl CompressionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMode::Column => "column",
            CompressionMode::Row => "row",
        }
    }

    /// Number of nodes this mode yields for a sparsity matrix
    pub fn node_count(&self, sparsity: &SparsityMatrix) -> usize {
        match self {
            CompressionMode::Column => sparsity.num_inputs(),
            CompressionMode::Row => sparsity.num_outputs(),
        }
    }

    /// Labels of the nodes this mode yields
    pub fn node_labels<'s>(&self, sparsity: &'s SparsityMatrix) -> &'s Labels {
        match self {
            CompressionMode::Column => sparsity.inputs(),
            CompressionMode::Row => sparsity.outputs(),
        }
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "column" | "col" | "reverse" => Ok(CompressionMode::Column),
            "row" | "forward" => Ok(CompressionMode::Row),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

// ============================================================================
// CONNECTIVITY GRAPH
// ============================================================================

/// An undirected simple graph stored as one neighbour bitmap per node.
#[derive(Clone, PartialEq)]
pub struct ConnectivityGraph {
    /// Mode the graph was built for (`None` when built directly)
    mode: Option<CompressionMode>,
    /// Node names, when known
    labels: Option<Labels>,
    adjacency: Vec<RoaringBitmap>,
}

impl ConnectivityGraph {
    /// Build the conflict graph of a sparsity matrix.
    pub fn build(sparsity: &SparsityMatrix, mode: CompressionMode) -> Self {
        // Lines are the entries being shared: rows (outputs) in column mode,
        // columns (inputs) in row mode. Each node's neighbourhood is the
        // union of the lines it sits on.
        let (lines, by_node) = match mode {
            CompressionMode::Column => {
                let lines = sparsity.matrix().clone();
                let by_node = lines.transpose();
                (lines, by_node)
            }
            CompressionMode::Row => {
                let by_node = sparsity.matrix().clone();
                let lines = by_node.transpose();
                (lines, by_node)
            }
        };

        let adjacency: Vec<RoaringBitmap> = by_node
            .rows()
            .par_iter()
            .enumerate()
            .map(|(node, on_lines)| {
                let mut neighbours = RoaringBitmap::new();
                for line in on_lines {
                    neighbours |= lines.row(line as usize);
                }
                neighbours.remove(key(node));
                neighbours
            })
            .collect();

        let graph = Self {
            mode: Some(mode),
            labels: Some(mode.node_labels(sparsity).clone()),
            adjacency,
        };
        debug!(
            mode = %mode,
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "built connectivity graph"
        );
        graph
    }

    /// Build a graph from per-node neighbour sets, validating them.
    pub fn from_adjacency(adjacency: Vec<RoaringBitmap>) -> Result<Self> {
        let graph = Self {
            mode: None,
            labels: None,
            adjacency,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Build a graph with `n` nodes from an edge list.
    ///
    /// Self-loops and out-of-range endpoints are rejected; duplicate edges
    /// are merged.
    pub fn from_edges(n: usize, edges: &[(NodeIdx, NodeIdx)]) -> Result<Self> {
        if n > MAX_INDEX_COUNT {
            return Err(Error::MalformedGraph {
                node: MAX_INDEX_COUNT,
                reason: format!("{} nodes exceed the supported index range", n),
            });
        }
        let mut adjacency = vec![RoaringBitmap::new(); n];
        for &(u, v) in edges {
            if u == v {
                return Err(Error::MalformedGraph {
                    node: u,
                    reason: "self-loop".to_string(),
                });
            }
            if u >= n || v >= n {
                return Err(Error::MalformedGraph {
                    node: u.max(v),
                    reason: format!("edge ({}, {}) outside {} nodes", u, v, n),
                });
            }
            adjacency[u].insert(key(v));
            adjacency[v].insert(key(u));
        }
        Ok(Self {
            mode: None,
            labels: None,
            adjacency,
        })
    }

    /// Attach node names. The label count must match the node count.
    pub fn with_labels(mut self, labels: Labels) -> Result<Self> {
        if labels.len() != self.num_nodes() {
            return Err(Error::dimension_mismatch(
                crate::error::Stage::GraphConstruction,
                format!("{} labels", self.num_nodes()),
                format!("{} labels", labels.len()),
            ));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Check the coloring precondition: symmetric, loop-free, in range.
    pub fn validate(&self) -> Result<()> {
        let n = self.num_nodes();
        for (u, neighbours) in self.adjacency.iter().enumerate() {
            if neighbours.contains(key(u)) {
                return Err(Error::MalformedGraph {
                    node: u,
                    reason: "self-loop".to_string(),
                });
            }
            if let Some(max) = neighbours.max() {
                if max as usize >= n {
                    return Err(Error::MalformedGraph {
                        node: u,
                        reason: format!("neighbour {} outside {} nodes", max, n),
                    });
                }
            }
            for v in neighbours {
                if !self.adjacency[v as usize].contains(key(u)) {
                    return Err(Error::MalformedGraph {
                        node: u,
                        reason: format!("edge to {} has no reverse edge", v),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn mode(&self) -> Option<CompressionMode> {
        self.mode
    }

    pub fn labels(&self) -> Option<&Labels> {
        self.labels.as_ref()
    }

    /// Name of a node, or its index when the graph is unlabeled
    pub fn node_name(&self, node: NodeIdx) -> String {
        self.labels
            .as_ref()
            .and_then(|labels| labels.name(node))
            .map(str::to_string)
            .unwrap_or_else(|| node.to_string())
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(|n| n.len() as usize).sum::<usize>() / 2
    }

    pub fn neighbours(&self, node: NodeIdx) -> &RoaringBitmap {
        &self.adjacency[node]
    }

    pub fn adjacency(&self) -> &[RoaringBitmap] {
        &self.adjacency
    }

    pub fn has_edge(&self, u: NodeIdx, v: NodeIdx) -> bool {
        try_key(v)
            .zip(self.adjacency.get(u))
            .is_some_and(|(k, n)| n.contains(k))
    }

    pub fn degree(&self, node: NodeIdx) -> usize {
        self.adjacency[node].len() as usize
    }

    /// Degrees of every node, computed in parallel
    pub fn degrees(&self) -> Vec<usize> {
        self.adjacency
            .par_iter()
            .map(|n| n.len() as usize)
            .collect()
    }

    pub fn max_degree(&self) -> usize {
        self.adjacency
            .iter()
            .map(|n| n.len() as usize)
            .max()
            .unwrap_or(0)
    }

    /// Edges as (u, v) with u < v, ascending
    pub fn edges(&self) -> impl Iterator<Item = (NodeIdx, NodeIdx)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(u, neighbours)| {
            neighbours
                .iter()
                .map(|v| v as usize)
                .filter(move |&v| v > u)
                .map(move |v| (u, v))
        })
    }

    /// Check whether every pair of distinct nodes is adjacent
    pub fn is_complete(&self) -> bool {
        let n = self.num_nodes();
        self.adjacency.iter().all(|nb| nb.len() as usize + 1 == n)
    }

    /// The conflict matrix (nodes × nodes, diagonal false)
    pub fn to_matrix(&self) -> BoolMatrix {
        BoolMatrix::from_rows(self.num_nodes(), self.adjacency.clone())
    }
}

impl fmt::Debug for ConnectivityGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityGraph")
            .field("mode", &self.mode)
            .field("nodes", &self.num_nodes())
            .field("edges", &self.edges().collect::<Vec<_>>())
            .finish()
    }
}
