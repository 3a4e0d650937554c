//! Node ordering strategies for the greedy colorer.
//!
//! A strategy decides only *which node is colored next*; the color itself is
//! always the smallest one not used by an already-colored neighbour. Static
//! strategies fix the whole order up front, adaptive ones (DSATUR) look at
//! the colors assigned so far.
//!
//! Every built-in strategy is deterministic: ties are broken by ascending
//! node index, and `random_sequential` shuffles with a seeded generator.

use std::cmp::Reverse;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use roaring::RoaringBitmap;

use crate::error::Error;
use crate::graph::ConnectivityGraph;
use crate::id::{key, Color, NodeIdx};

/// Source of the next node to color.
pub trait NodeOrder {
    /// Next node to color, given the colors assigned so far (indexed by
    /// node, `None` for uncolored). `None` ends the coloring.
    fn next_node(&mut self, colors: &[Option<Color>]) -> Option<NodeIdx>;
}

/// A named, pluggable ordering policy.
pub trait ColoringStrategy {
    /// Name used in logs and errors
    fn name(&self) -> String;

    /// Start an ordering session over `graph`.
    fn ordering<'g>(&self, graph: &'g ConnectivityGraph) -> Box<dyn NodeOrder + 'g>;
}

/// A fixed, precomputed order.
#[derive(Clone, Debug)]
pub struct StaticOrder {
    nodes: std::vec::IntoIter<NodeIdx>,
}

impl StaticOrder {
    pub fn new(nodes: Vec<NodeIdx>) -> Self {
        Self {
            nodes: nodes.into_iter(),
        }
    }
}

impl NodeOrder for StaticOrder {
    fn next_node(&mut self, _colors: &[Option<Color>]) -> Option<NodeIdx> {
        self.nodes.next()
    }
}

// ============================================================================
// BUILT-IN STRATEGIES
// ============================================================================

/// The built-in strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Descending degree, ties by ascending index
    #[default]
    LargestFirst,
    /// Reverse of a minimum-degree elimination order
    SmallestLast,
    /// One maximal independent set per color
    IndependentSet,
    /// Seeded random permutation
    RandomSequential { seed: u64 },
    /// Breadth-first within each connected component
    ConnectedSequentialBfs,
    /// Depth-first within each connected component
    ConnectedSequentialDfs,
    /// DSATUR: most distinct neighbour colors first
    SaturationLargestFirst,
}

impl Strategy {
    /// Every built-in strategy (random with seed 0)
    pub const ALL: [Strategy; 7] = [
        Strategy::LargestFirst,
        Strategy::SmallestLast,
        Strategy::IndependentSet,
        Strategy::RandomSequential { seed: 0 },
        Strategy::ConnectedSequentialBfs,
        Strategy::ConnectedSequentialDfs,
        Strategy::SaturationLargestFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::LargestFirst => "largest_first",
            Strategy::SmallestLast => "smallest_last",
            Strategy::IndependentSet => "independent_set",
            Strategy::RandomSequential { .. } => "random_sequential",
            Strategy::ConnectedSequentialBfs => "connected_sequential_bfs",
            Strategy::ConnectedSequentialDfs => "connected_sequential_dfs",
            Strategy::SaturationLargestFirst => "saturation_largest_first",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::RandomSequential { seed } => write!(f, "random_sequential:{}", seed),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let lowered = s.trim().to_ascii_lowercase();
        if let Some(seed) = lowered.strip_prefix("random_sequential:") {
            let seed = seed
                .parse::<u64>()
                .map_err(|_| Error::UnknownStrategy(s.to_string()))?;
            return Ok(Strategy::RandomSequential { seed });
        }
        match lowered.as_str() {
            "largest_first" | "lf" => Ok(Strategy::LargestFirst),
            "smallest_last" | "sl" => Ok(Strategy::SmallestLast),
            "independent_set" | "is" => Ok(Strategy::IndependentSet),
            "random_sequential" | "rs" => Ok(Strategy::RandomSequential { seed: 0 }),
            "connected_sequential_bfs" | "connected_sequential" | "csbfs" => {
                Ok(Strategy::ConnectedSequentialBfs)
            }
            "connected_sequential_dfs" | "csdfs" => Ok(Strategy::ConnectedSequentialDfs),
            "saturation_largest_first" | "dsatur" => Ok(Strategy::SaturationLargestFirst),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

impl ColoringStrategy for Strategy {
    fn name(&self) -> String {
        self.to_string()
    }

    fn ordering<'g>(&self, graph: &'g ConnectivityGraph) -> Box<dyn NodeOrder + 'g> {
        match *self {
            Strategy::LargestFirst => Box::new(StaticOrder::new(largest_first(graph))),
            Strategy::SmallestLast => Box::new(StaticOrder::new(smallest_last(graph))),
            Strategy::IndependentSet => Box::new(StaticOrder::new(independent_sets(graph))),
            Strategy::RandomSequential { seed } => {
                Box::new(StaticOrder::new(random_sequential(graph, seed)))
            }
            Strategy::ConnectedSequentialBfs => {
                Box::new(StaticOrder::new(connected_sequential(graph, Traversal::Breadth)))
            }
            Strategy::ConnectedSequentialDfs => {
                Box::new(StaticOrder::new(connected_sequential(graph, Traversal::Depth)))
            }
            Strategy::SaturationLargestFirst => Box::new(Saturation::new(graph)),
        }
    }
}

// ============================================================================
// ORDERINGS
// ============================================================================

/// Nodes by descending degree; the stable sort keeps ascending index on ties.
pub fn largest_first(graph: &ConnectivityGraph) -> Vec<NodeIdx> {
    let degrees = graph.degrees();
    let mut order: Vec<NodeIdx> = (0..graph.num_nodes()).collect();
    order.sort_by_key(|&v| Reverse(degrees[v]));
    order
}

/// Repeatedly remove a node of minimum remaining degree (lowest index on
/// ties), then reverse the removal order.
pub fn smallest_last(graph: &ConnectivityGraph) -> Vec<NodeIdx> {
    let mut degrees = graph.degrees();
    let mut queue: BTreeSet<(usize, NodeIdx)> =
        degrees.iter().enumerate().map(|(v, &d)| (d, v)).collect();
    let mut removed = vec![false; graph.num_nodes()];
    let mut order = Vec::with_capacity(graph.num_nodes());

    while let Some((_, v)) = queue.pop_first() {
        removed[v] = true;
        order.push(v);
        for u in graph.neighbours(v) {
            let u = u as usize;
            if !removed[u] {
                queue.remove(&(degrees[u], u));
                degrees[u] -= 1;
                queue.insert((degrees[u], u));
            }
        }
    }

    order.reverse();
    order
}

/// Maximal independent sets of the remaining graph, one after another.
///
/// Each set is grown greedily from the candidate with fewest candidate
/// neighbours (lowest index on ties), dropping that node's neighbours from
/// the candidates. Nodes of a set are emitted in ascending order. Because
/// every later node has a neighbour in each earlier set, the greedy rule
/// turns set `k` into color class `k`.
pub fn independent_sets(graph: &ConnectivityGraph) -> Vec<NodeIdx> {
    let n = graph.num_nodes();
    let mut remaining: RoaringBitmap = (0..n).map(key).collect();
    let mut order = Vec::with_capacity(n);

    while !remaining.is_empty() {
        let mut candidates = remaining.clone();
        let mut set = RoaringBitmap::new();
        loop {
            let Some(v) = candidates
                .iter()
                .min_by_key(|&v| (graph.neighbours(v as usize).intersection_len(&candidates), v))
            else {
                break;
            };
            set.insert(v);
            candidates.remove(v);
            candidates -= graph.neighbours(v as usize);
        }
        order.extend(set.iter().map(|v| v as usize));
        remaining -= &set;
    }

    order
}

/// A permutation of all nodes drawn from a generator seeded with `seed`.
pub fn random_sequential(graph: &ConnectivityGraph, seed: u64) -> Vec<NodeIdx> {
    let mut order: Vec<NodeIdx> = (0..graph.num_nodes()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    order
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Traversal {
    Breadth,
    Depth,
}

/// Components in order of their smallest node, each traversed from that node
/// with neighbours taken in ascending order.
fn connected_sequential(graph: &ConnectivityGraph, traversal: Traversal) -> Vec<NodeIdx> {
    let n = graph.num_nodes();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    for start in 0..n {
        if visited[start] {
            continue;
        }
        match traversal {
            Traversal::Breadth => {
                let mut queue = VecDeque::from([start]);
                visited[start] = true;
                while let Some(u) = queue.pop_front() {
                    order.push(u);
                    for v in graph.neighbours(u) {
                        let v = v as usize;
                        if !visited[v] {
                            visited[v] = true;
                            queue.push_back(v);
                        }
                    }
                }
            }
            Traversal::Depth => {
                let mut stack = vec![start];
                while let Some(u) = stack.pop() {
                    if visited[u] {
                        continue;
                    }
                    visited[u] = true;
                    order.push(u);
                    // Reversed so the smallest neighbour is popped first
                    let mut next: Vec<NodeIdx> = graph
                        .neighbours(u)
                        .iter()
                        .map(|v| v as usize)
                        .filter(|&v| !visited[v])
                        .collect();
                    next.reverse();
                    stack.extend(next);
                }
            }
        }
    }

    order
}

/// DSATUR ordering: next is the uncolored node whose colored neighbours use
/// the most distinct colors, ties by degree, then by lowest index.
struct Saturation<'g> {
    graph: &'g ConnectivityGraph,
    degrees: Vec<usize>,
    uncolored: RoaringBitmap,
    /// Distinct neighbour colors per node
    seen: Vec<RoaringBitmap>,
    last: Option<NodeIdx>,
}

impl<'g> Saturation<'g> {
    fn new(graph: &'g ConnectivityGraph) -> Self {
        let n = graph.num_nodes();
        Self {
            graph,
            degrees: graph.degrees(),
            uncolored: (0..n).map(key).collect(),
            seen: vec![RoaringBitmap::new(); n],
            last: None,
        }
    }
}

impl NodeOrder for Saturation<'_> {
    fn next_node(&mut self, colors: &[Option<Color>]) -> Option<NodeIdx> {
        if let Some(prev) = self.last.take() {
            if let Some(color) = colors.get(prev).copied().flatten() {
                for v in self.graph.neighbours(prev) {
                    self.seen[v as usize].insert(key(color));
                }
            }
        }

        let seen = &self.seen;
        let degrees = &self.degrees;
        let next = self
            .uncolored
            .iter()
            .map(|v| v as usize)
            .max_by_key(|&v| (seen[v].len(), degrees[v], Reverse(v)))?;

        self.uncolored.remove(key(next));
        self.last = Some(next);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> ConnectivityGraph {
        // 0 - 1 - 2, 3 isolated
        ConnectivityGraph::from_edges(4, &[(0, 1), (1, 2)]).unwrap()
    }

    #[test]
    fn test_largest_first_ties_by_index() {
        assert_eq!(largest_first(&path4()), vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_smallest_last_is_permutation() {
        let order = smallest_last(&path4());
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
        // 3 (degree 0) is removed first and therefore colored last
        assert_eq!(order.last(), Some(&3));
    }

    #[test]
    fn test_independent_sets_on_path() {
        // first set grows 3 (deg 0), then 0, then 2 => {0,2,3}; second set {1}
        assert_eq!(independent_sets(&path4()), vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_random_sequential_is_seeded() {
        let graph = ConnectivityGraph::from_edges(20, &[]).unwrap();
        assert_eq!(random_sequential(&graph, 7), random_sequential(&graph, 7));
        let mut order = random_sequential(&graph, 7);
        order.sort_unstable();
        assert_eq!(order, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_connected_sequential_orders() {
        // 0 - 2, 0 - 3, 2 - 1, 4 isolated
        let graph = ConnectivityGraph::from_edges(5, &[(0, 2), (0, 3), (2, 1)]).unwrap();
        assert_eq!(connected_sequential(&graph, Traversal::Breadth), vec![0, 2, 3, 1, 4]);
        assert_eq!(connected_sequential(&graph, Traversal::Depth), vec![0, 2, 1, 3, 4]);
    }

    #[test]
    fn test_strategy_names_roundtrip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!(
            "random_sequential:42".parse::<Strategy>().unwrap(),
            Strategy::RandomSequential { seed: 42 }
        );
        assert_eq!("DSATUR".parse::<Strategy>().unwrap(), Strategy::SaturationLargestFirst);
        assert!(matches!(
            "best_possible".parse::<Strategy>(),
            Err(Error::UnknownStrategy(_))
        ));
    }
}
