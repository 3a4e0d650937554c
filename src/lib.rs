//! jacsparse: Jacobian sparsity detection and compression for black-box models
//!
//! Probes a vector-valued oracle once per input with a propagating NaN to
//! find which outputs depend on which inputs, turns that pattern into a
//! conflict graph, colors the graph greedily, and compresses the pattern to
//! one column (or row) per color.

pub mod coloring;
pub mod compress;
pub mod config;
pub mod detect;
pub mod error;
pub mod graph;
pub mod id;
pub mod matrix;
pub mod oracle;
pub mod pipeline;
pub mod pretty;
pub mod sentinel;
pub mod serialize;
pub mod signature;
pub mod sparsity;
pub mod zerocopy;

pub use coloring::{greedy_color, Coloring, ColoringStrategy, NodeOrder, Strategy};
pub use compress::{compress, CompressedSparsity};
pub use config::{AnalysisConfig, DetectorConfig, Workers};
pub use detect::{ContaminationDetector, DependencyTracer};
pub use error::{Error, OracleError, Result, Stage};
pub use graph::{CompressionMode, ConnectivityGraph};
pub use matrix::BoolMatrix;
pub use oracle::{FnOracle, Oracle};
pub use pipeline::{analyze, analyze_serial, analyze_with, Analysis};
pub use sentinel::{NanSentinel, Sentinel};
pub use signature::{InputVector, Labels, OperatingPoint, OracleSignature, OutputVector};
pub use sparsity::SparsityMatrix;

/// Detect the sparsity of an oracle with NaN contamination, reading the
/// worker count from the environment
pub fn detect<O>(oracle: &O, point: &OperatingPoint) -> Result<SparsityMatrix>
where
    O: Oracle + Sync + ?Sized,
{
    ContaminationDetector::new(DetectorConfig::from_env()).detect(oracle, point)
}
