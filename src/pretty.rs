//! Plain-text rendering of sparsity artifacts
//!
//! Produces aligned grids for logs, test failures and terminal output.

use crate::coloring::Coloring;
use crate::graph::ConnectivityGraph;
use crate::matrix::BoolMatrix;

/// Rendering configuration
pub struct PrettyConfig {
    /// Spaces between columns
    pub gap: usize,
    pub true_mark: char,
    pub false_mark: char,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            gap: 2,
            true_mark: '1',
            false_mark: '.',
        }
    }
}

/// A text renderer with an output buffer
pub struct Pretty {
    output: String,
    config: PrettyConfig,
}

impl Default for Pretty {
    fn default() -> Self {
        Self::new()
    }
}

impl Pretty {
    pub fn new() -> Self {
        Self::with_config(PrettyConfig::default())
    }

    pub fn with_config(config: PrettyConfig) -> Self {
        Self {
            output: String::new(),
            config,
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    /// Write `s` right-aligned in `width` columns, preceded by the gap.
    fn cell(&mut self, s: &str, width: usize) {
        let pad = self.config.gap + width.saturating_sub(s.chars().count());
        self.output.extend(std::iter::repeat(' ').take(pad));
        self.write(s);
    }

    /// Write `s` left-aligned in `width` columns.
    fn label(&mut self, s: &str, width: usize) {
        self.write(s);
        let pad = width.saturating_sub(s.chars().count());
        self.output.extend(std::iter::repeat(' ').take(pad));
    }
}

// ============ Rendering implementations ============

impl Pretty {
    /// A labelled grid, one line per row.
    ///
    /// Missing labels fall back to the index.
    pub fn matrix(&mut self, matrix: &BoolMatrix, rows: &[String], columns: &[String]) {
        let row_names: Vec<String> = (0..matrix.nrows())
            .map(|i| rows.get(i).cloned().unwrap_or_else(|| i.to_string()))
            .collect();
        let col_names: Vec<String> = (0..matrix.ncols())
            .map(|j| columns.get(j).cloned().unwrap_or_else(|| j.to_string()))
            .collect();

        let row_width = row_names.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let widths: Vec<usize> = col_names.iter().map(|s| s.chars().count().max(1)).collect();

        self.label("", row_width);
        for (name, &width) in col_names.iter().zip(&widths) {
            self.cell(name, width);
        }
        self.newline();

        let true_mark = self.config.true_mark.to_string();
        let false_mark = self.config.false_mark.to_string();
        for (i, name) in row_names.iter().enumerate() {
            self.label(name, row_width);
            for (j, &width) in widths.iter().enumerate() {
                let mark = if matrix.get(i, j) {
                    &true_mark
                } else {
                    &false_mark
                };
                self.cell(mark, width);
            }
            self.newline();
        }
    }

    /// Edge list, `a -- b` per line, with node names when the graph has them.
    pub fn graph(&mut self, graph: &ConnectivityGraph) {
        for (u, v) in graph.edges() {
            let line = format!("{} -- {}", graph.node_name(u), graph.node_name(v));
            self.write(&line);
            self.newline();
        }
    }

    /// Color classes, `color: a, b` per line.
    pub fn coloring(&mut self, coloring: &Coloring, names: &[String]) {
        for (color, nodes) in coloring.classes().iter().enumerate() {
            let members: Vec<String> = nodes
                .iter()
                .map(|&n| names.get(n).cloned().unwrap_or_else(|| n.to_string()))
                .collect();
            let line = format!("{}: {}", color, members.join(", "));
            self.write(&line);
            self.newline();
        }
    }
}

/// Render a labelled boolean grid
pub fn render_matrix(matrix: &BoolMatrix, rows: &[String], columns: &[String]) -> String {
    let mut p = Pretty::new();
    p.matrix(matrix, rows, columns);
    p.finish()
}

/// Render a graph's edge list
pub fn render_graph(graph: &ConnectivityGraph) -> String {
    let mut p = Pretty::new();
    p.graph(graph);
    p.finish()
}

/// Render color classes with node names
pub fn render_coloring(coloring: &Coloring, names: &[String]) -> String {
    let mut p = Pretty::new();
    p.coloring(coloring, names);
    p.finish()
}

// Unit tests live in tests/unit_pretty.rs
