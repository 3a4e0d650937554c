//! Compression of a sparsity matrix by color groups.
//!
//! Nodes of the same color never conflict, so they can be perturbed (column
//! mode) or observed (row mode) together. The compressed matrix has one
//! column (or row) per color:
//!
//! ```text
//! column mode:  S_c[i, c] = OR_{j : color(j) = c} S[i, j]     outputs × colors
//! row mode:     S_c[c, j] = OR_{i : color(i) = c} S[i, j]     colors × inputs
//! ```
//!
//! Because a group never contains two nodes sharing a line, every true entry
//! of `S_c` comes from exactly one original node. [`CompressedSparsity::attribute`]
//! recovers it, which is all a downstream estimator needs to decode a
//! combined probe.

use std::fmt;

use roaring::RoaringBitmap;
use tracing::debug;

use crate::coloring::Coloring;
use crate::error::{Error, Result, Stage};
use crate::graph::CompressionMode;
use crate::id::{key, Color, NodeIdx};
use crate::matrix::BoolMatrix;
use crate::signature::Labels;
use crate::sparsity::SparsityMatrix;

/// Separator used when joining the names of a color group
pub const GROUP_SEPARATOR: &str = ", ";

/// A sparsity matrix reduced to one line per color, with the groups that
/// produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedSparsity {
    mode: CompressionMode,
    matrix: BoolMatrix,
    groups: Vec<Vec<NodeIdx>>,
    sparsity: SparsityMatrix,
    coloring: Coloring,
}

/// Reduce `sparsity` along the axis `mode` compresses, one line per color.
///
/// The coloring must cover exactly the nodes of that axis, use every color
/// in `0..k`, and never give one color to two nodes sharing a line.
pub fn compress(
    sparsity: &SparsityMatrix,
    coloring: &Coloring,
    mode: CompressionMode,
) -> Result<CompressedSparsity> {
    let n = mode.node_count(sparsity);
    if coloring.len() != n {
        return Err(Error::dimension_mismatch(
            Stage::Compression,
            format!("a coloring of {} {} nodes", n, mode),
            format!("a coloring of {} nodes", coloring.len()),
        ));
    }
    coloring.check_compact()?;
    check_lines(sparsity, coloring, mode)?;

    let groups = coloring.classes();
    let rows = sparsity.matrix().rows();
    let matrix = match mode {
        CompressionMode::Column => {
            let compressed = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|j| key(coloring.color(j as usize)))
                        .collect::<RoaringBitmap>()
                })
                .collect();
            BoolMatrix::from_rows(coloring.num_colors(), compressed)
        }
        CompressionMode::Row => {
            let compressed = groups
                .iter()
                .map(|group| {
                    group.iter().fold(RoaringBitmap::new(), |mut acc, &i| {
                        acc |= &rows[i];
                        acc
                    })
                })
                .collect();
            BoolMatrix::from_rows(sparsity.num_inputs(), compressed)
        }
    };

    debug!(
        mode = mode.as_str(),
        nodes = n,
        colors = coloring.num_colors(),
        true_entries = matrix.count_true(),
        "compressed sparsity"
    );

    Ok(CompressedSparsity {
        mode,
        matrix,
        groups,
        sparsity: sparsity.clone(),
        coloring: coloring.clone(),
    })
}

/// Every line must reach each color through at most one node.
///
/// This is the coloring invariant restated on `S` directly, so no conflict
/// graph is needed.
fn check_lines(
    sparsity: &SparsityMatrix,
    coloring: &Coloring,
    mode: CompressionMode,
) -> Result<()> {
    let transposed;
    let lines = match mode {
        CompressionMode::Column => sparsity.matrix(),
        CompressionMode::Row => {
            transposed = sparsity.matrix().transpose();
            &transposed
        }
    };

    // last[c] = (line, node) of the latest node seen with color c
    let mut last: Vec<Option<(usize, NodeIdx)>> = vec![None; coloring.num_colors()];
    for (line, nodes) in lines.rows().iter().enumerate() {
        for node in nodes {
            let node = node as usize;
            let color = coloring.color(node);
            match last[color] {
                Some((seen_on, other)) if seen_on == line => {
                    return Err(Error::ColoringInvariantViolation {
                        u: other,
                        v: node,
                        color,
                    });
                }
                _ => last[color] = Some((line, node)),
            }
        }
    }
    Ok(())
}

impl CompressedSparsity {
    pub fn mode(&self) -> CompressionMode {
        self.mode
    }

    /// Outputs × colors (column mode) or colors × inputs (row mode)
    pub fn matrix(&self) -> &BoolMatrix {
        &self.matrix
    }

    /// The uncompressed sparsity this was built from
    pub fn sparsity(&self) -> &SparsityMatrix {
        &self.sparsity
    }

    pub fn coloring(&self) -> &Coloring {
        &self.coloring
    }

    pub fn num_colors(&self) -> usize {
        self.groups.len()
    }

    /// Node indices of every color, ascending within a group
    pub fn groups(&self) -> &[Vec<NodeIdx>] {
        &self.groups
    }

    /// Node indices of one color
    pub fn group(&self, color: Color) -> &[NodeIdx] {
        &self.groups[color]
    }

    /// Labels of the compressed axis (inputs in column mode)
    pub fn node_labels(&self) -> &Labels {
        self.mode.node_labels(&self.sparsity)
    }

    /// Labels of the axis left intact (outputs in column mode)
    pub fn line_labels(&self) -> &Labels {
        match self.mode {
            CompressionMode::Column => self.sparsity.outputs(),
            CompressionMode::Row => self.sparsity.inputs(),
        }
    }

    /// Node names of every color, in group order
    pub fn group_names(&self) -> Vec<Vec<String>> {
        let labels = self.node_labels();
        self.groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .filter_map(|&node| labels.name(node).map(str::to_string))
                    .collect()
            })
            .collect()
    }

    /// One label per color: the group's names joined with `", "`
    pub fn group_labels(&self) -> Vec<String> {
        self.group_names()
            .into_iter()
            .map(|names| names.join(GROUP_SEPARATOR))
            .collect()
    }

    /// Nodes per color: how many evaluations the compression saves.
    ///
    /// 1.0 when there is nothing to compress.
    pub fn compression_ratio(&self) -> f64 {
        if self.groups.is_empty() {
            return 1.0;
        }
        self.coloring.len() as f64 / self.groups.len() as f64
    }

    /// Nodes × colors, `seed[j, c]` iff node `j` has color `c`.
    ///
    /// In column mode this is the matrix of combined input directions; in
    /// row mode the combined output weights.
    pub fn seed_matrix(&self) -> BoolMatrix {
        let mut seed = BoolMatrix::new(self.coloring.len(), self.groups.len());
        for (node, &color) in self.coloring.colors().iter().enumerate() {
            seed.set(node, color, true);
        }
        seed
    }

    /// The original node behind a true entry of the compressed matrix.
    ///
    /// `line` is an output in column mode and an input in row mode. Returns
    /// `None` when the line does not touch `color` at all.
    pub fn attribute(&self, line: usize, color: Color) -> Option<NodeIdx> {
        if color >= self.groups.len() {
            return None;
        }
        let touched = match self.mode {
            CompressionMode::Column => {
                if line >= self.sparsity.num_outputs() {
                    return None;
                }
                self.sparsity.matrix().row(line).clone()
            }
            CompressionMode::Row => {
                if line >= self.sparsity.num_inputs() {
                    return None;
                }
                self.sparsity.matrix().column(line)
            }
        };
        touched
            .iter()
            .map(|node| node as usize)
            .find(|&node| self.coloring.color(node) == color)
    }
}

impl fmt::Display for CompressedSparsity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.line_labels().to_vec();
        let groups = self.group_labels();
        let rendered = match self.mode {
            CompressionMode::Column => crate::pretty::render_matrix(&self.matrix, &lines, &groups),
            CompressionMode::Row => crate::pretty::render_matrix(&self.matrix, &groups, &lines),
        };
        f.write_str(&rendered)
    }
}
