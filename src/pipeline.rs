//! End-to-end analysis: detect, build the conflict graph, color, compress.
//!
//! Each stage consumes the previous stage's artifact and nothing else, so a
//! failure names exactly one stage (see [`crate::Error::stage`]) and no
//! partial result is returned.

use tracing::info;

use crate::coloring::{greedy_color, Coloring, ColoringStrategy};
use crate::compress::{compress, CompressedSparsity};
use crate::config::AnalysisConfig;
use crate::detect::{ContaminationDetector, DependencyTracer};
use crate::error::Result;
use crate::graph::{CompressionMode, ConnectivityGraph};
use crate::oracle::Oracle;
use crate::signature::OperatingPoint;
use crate::sparsity::SparsityMatrix;

/// Every artifact of one analysis run.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub sparsity: SparsityMatrix,
    pub graph: ConnectivityGraph,
    pub coloring: Coloring,
    pub compressed: CompressedSparsity,
}

impl Analysis {
    /// Stages 3-5 on an existing sparsity matrix.
    pub fn from_sparsity<C>(
        sparsity: SparsityMatrix,
        mode: CompressionMode,
        strategy: &C,
    ) -> Result<Self>
    where
        C: ColoringStrategy + ?Sized,
    {
        let graph = ConnectivityGraph::build(&sparsity, mode);
        let coloring = greedy_color(&graph, strategy)?;
        let compressed = compress(&sparsity, &coloring, mode)?;

        info!(
            mode = mode.as_str(),
            strategy = coloring.strategy(),
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            colors = coloring.num_colors(),
            ratio = compressed.compression_ratio(),
            "analysis done"
        );

        Ok(Self {
            sparsity,
            graph,
            coloring,
            compressed,
        })
    }

    pub fn mode(&self) -> CompressionMode {
        self.compressed.mode()
    }

    pub fn num_colors(&self) -> usize {
        self.coloring.num_colors()
    }
}

/// Run the whole pipeline with NaN contamination and the given settings.
pub fn analyze<O>(oracle: &O, point: &OperatingPoint, config: &AnalysisConfig) -> Result<Analysis>
where
    O: Oracle + Sync + ?Sized,
{
    let detector = ContaminationDetector::new(config.detector.clone());
    analyze_with(&detector, oracle, point, config.mode, &config.strategy)
}

/// Like [`analyze`], for oracles that must not be called concurrently.
pub fn analyze_serial<O>(
    oracle: &O,
    point: &OperatingPoint,
    config: &AnalysisConfig,
) -> Result<Analysis>
where
    O: Oracle + ?Sized,
{
    let detector = ContaminationDetector::new(config.detector.clone());
    let sparsity = detector.detect_serial(oracle, point)?;
    Analysis::from_sparsity(sparsity, config.mode, &config.strategy)
}

/// Run the whole pipeline with any tracer and coloring strategy.
pub fn analyze_with<T, O, C>(
    tracer: &T,
    oracle: &O,
    point: &OperatingPoint,
    mode: CompressionMode,
    strategy: &C,
) -> Result<Analysis>
where
    T: DependencyTracer,
    O: Oracle + Sync + ?Sized,
    C: ColoringStrategy + ?Sized,
{
    let sparsity = tracer.trace(oracle, point)?;
    Analysis::from_sparsity(sparsity, mode, strategy)
}
