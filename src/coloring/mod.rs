//! Greedy graph coloring.
//!
//! The colorer walks the nodes of a [`ConnectivityGraph`] in the order a
//! [`ColoringStrategy`] chooses and gives each node the smallest color not
//! already used by a colored neighbour. The result is always a valid
//! coloring and uses at most `max_degree + 1` colors, but it is not
//! guaranteed to be minimal.
//!
//! Coloring is sequential: each decision depends on the colors already
//! assigned, so the walk itself is never parallelized. Strategies may use
//! parallel degree computation up front.
//!
//! # Usage
//!
//! ```ignore
//! use jacsparse::coloring::{greedy_color, Strategy};
//!
//! let coloring = greedy_color(&graph, &Strategy::LargestFirst)?;
//! for (color, nodes) in coloring.classes().iter().enumerate() {
//!     println!("{}: {:?}", color, nodes);
//! }
//! ```

pub mod strategy;

pub use strategy::{ColoringStrategy, NodeOrder, StaticOrder, Strategy};

use tracing::debug;

use crate::error::{Error, Result, Stage};
use crate::graph::ConnectivityGraph;
use crate::id::{Color, NodeIdx};

/// A total assignment of colors to nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coloring {
    colors: Vec<Color>,
    num_colors: usize,
    strategy: String,
}

impl Coloring {
    /// Wrap an explicit color assignment (indexed by node).
    pub fn from_colors(colors: Vec<Color>, strategy: impl Into<String>) -> Self {
        let num_colors = colors.iter().max().map_or(0, |&c| c.saturating_add(1));
        Self {
            colors,
            num_colors,
            strategy: strategy.into(),
        }
    }

    /// Color of a node
    pub fn color(&self, node: NodeIdx) -> Color {
        self.colors[node]
    }

    /// Colors indexed by node
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Number of colors used (`max + 1`, 0 for no nodes)
    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    /// Number of colored nodes
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Name of the strategy that produced this coloring
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Nodes of each color, ascending within a class
    pub fn classes(&self) -> Vec<Vec<NodeIdx>> {
        let mut classes = vec![Vec::new(); self.num_colors];
        for (node, &color) in self.colors.iter().enumerate() {
            classes[color].push(node);
        }
        classes
    }

    /// Check that colors are exactly `0..num_colors` with every color used.
    ///
    /// Greedy colorings always are; hand-built or loaded ones may not be.
    pub fn check_compact(&self) -> Result<()> {
        let nodes = self.colors.len();
        if let Some(&color) = self.colors.iter().find(|&&c| c >= nodes) {
            return Err(Error::NonCompactColoring { color, nodes });
        }
        let mut used = vec![false; self.num_colors];
        for &c in &self.colors {
            used[c] = true;
        }
        match used.iter().position(|&u| !u) {
            Some(color) => Err(Error::NonCompactColoring { color, nodes }),
            None => Ok(()),
        }
    }

    /// Check that this coloring covers `graph` and has no monochromatic edge.
    pub fn verify(&self, graph: &ConnectivityGraph) -> Result<()> {
        if self.colors.len() != graph.num_nodes() {
            return Err(Error::dimension_mismatch(
                Stage::Coloring,
                format!("colors for {} nodes", graph.num_nodes()),
                format!("colors for {} nodes", self.colors.len()),
            ));
        }
        for (u, v) in graph.edges() {
            if self.colors[u] == self.colors[v] {
                return Err(Error::ColoringInvariantViolation {
                    u,
                    v,
                    color: self.colors[u],
                });
            }
        }
        Ok(())
    }
}

/// Color `graph` greedily in the order chosen by `strategy`.
///
/// Fails if the graph is malformed, if the strategy's order skips or
/// repeats a node, or (never, for a correct colorer) if the result has a
/// monochromatic edge.
pub fn greedy_color<S>(graph: &ConnectivityGraph, strategy: &S) -> Result<Coloring>
where
    S: ColoringStrategy + ?Sized,
{
    graph.validate()?;

    let n = graph.num_nodes();
    let name = strategy.name();
    let mut colors: Vec<Option<Color>> = vec![None; n];
    // forbidden[c] == stamp  <=>  color c is used by a neighbour of the current node
    let mut forbidden: Vec<usize> = Vec::new();
    let mut colored = 0;

    let mut order = strategy.ordering(graph);
    while let Some(node) = order.next_node(&colors) {
        if node >= n || colors[node].is_some() {
            return Err(Error::InvalidOrdering {
                strategy: name,
                node,
            });
        }

        let stamp = colored + 1;
        for v in graph.neighbours(node) {
            if let Some(c) = colors[v as usize] {
                if c >= forbidden.len() {
                    forbidden.resize(c + 1, 0);
                }
                forbidden[c] = stamp;
            }
        }
        let color = forbidden
            .iter()
            .position(|&s| s != stamp)
            .unwrap_or(forbidden.len());

        colors[node] = Some(color);
        colored += 1;
    }

    let colors = colors
        .into_iter()
        .enumerate()
        .map(|(node, c)| {
            c.ok_or_else(|| Error::InvalidOrdering {
                strategy: name.clone(),
                node,
            })
        })
        .collect::<Result<Vec<Color>>>()?;

    let coloring = Coloring::from_colors(colors, name);
    coloring.verify(graph)?;

    debug!(
        strategy = coloring.strategy(),
        nodes = n,
        colors = coloring.num_colors(),
        max_degree = graph.max_degree(),
        "greedy coloring done"
    );
    Ok(coloring)
}
