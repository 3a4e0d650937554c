//! Error taxonomy for jacsparse
//!
//! Every failure is fatal to the stage that raised it and carries enough
//! context (stage, node or input index, names) to locate the offender.
//! Nothing here is recoverable locally: callers never receive a partially
//! valid artifact.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::id::{Color, NodeIdx};

/// Pipeline stage that raised an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Building signatures, named vectors and operating points
    Signature,
    /// Probing the oracle
    Detection,
    /// Building or validating a connectivity graph
    GraphConstruction,
    /// Greedy coloring
    Coloring,
    /// Assembling the compressed sparsity matrix
    Compression,
    /// Saving or loading artifacts
    Persistence,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Signature => "signature",
            Stage::Detection => "detection",
            Stage::GraphConstruction => "graph construction",
            Stage::Coloring => "coloring",
            Stage::Compression => "compression",
            Stage::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

/// Failure reported by an oracle adapter itself.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The model raised an error
    #[error("oracle failed: {0}")]
    Failed(String),

    /// The adapter gave up waiting for the model
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    /// The model returned a different number of outputs than its signature
    #[error("oracle returned {actual} outputs, signature declares {expected}")]
    WrongArity { expected: usize, actual: usize },

    /// Any other adapter-level error
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A probe call failed for a reason other than sentinel propagation.
    #[error("detection: oracle invocation failed while probing input {input} ('{name}'): {source}")]
    OracleInvocation {
        input: usize,
        name: String,
        #[source]
        source: OracleError,
    },

    /// The probe worker pool could not be started.
    #[error("detection: failed to build worker pool with {workers} threads: {reason}")]
    WorkerPool { workers: usize, reason: String },

    /// Shapes or label sets disagree between producer and consumer.
    ///
    /// `input` is the probe index when the mismatch came from an oracle call.
    #[error("{stage}: dimension mismatch{}: expected {expected}, got {actual}", probe_suffix(.input))]
    DimensionMismatch {
        stage: Stage,
        input: Option<usize>,
        expected: String,
        actual: String,
    },

    /// Adjacency that breaks the coloring precondition.
    #[error("graph construction: malformed graph at node {node}: {reason}")]
    MalformedGraph { node: NodeIdx, reason: String },

    /// A colored edge with both endpoints in the same class.
    #[error("coloring: invariant violated, nodes {u} and {v} are adjacent and share color {color}")]
    ColoringInvariantViolation { u: NodeIdx, v: NodeIdx, color: Color },

    /// Colors that are not exactly `0..k` with every color used.
    #[error("coloring: color {color} is unused or out of range for {nodes} nodes")]
    NonCompactColoring { color: Color, nodes: usize },

    /// A strategy emitted an order that does not visit each node exactly once.
    #[error("coloring: strategy '{strategy}' produced an invalid ordering at node {node}")]
    InvalidOrdering { strategy: String, node: NodeIdx },

    #[error("coloring: unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("graph construction: unknown compression mode '{0}'")]
    UnknownMode(String),

    #[error("signature: duplicate name '{name}'")]
    DuplicateName { name: String },

    #[error("signature: unknown name '{name}'")]
    UnknownName { name: String },

    #[error("signature: no value given for '{name}'")]
    MissingName { name: String },

    #[error("signature: input '{name}' has non-finite value {value}")]
    NonFiniteInput { name: String, value: f64 },

    #[error("signature: {count} names exceed the supported index range")]
    TooManyNames { count: usize },

    #[error("persistence: {0}")]
    Persistence(String),
}

fn probe_suffix(input: &Option<usize>) -> String {
    match input {
        Some(j) => format!(" in probe of input {}", j),
        None => String::new(),
    }
}

impl Error {
    /// The stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::OracleInvocation { .. } | Error::WorkerPool { .. } => Stage::Detection,
            Error::DimensionMismatch { stage, .. } => *stage,
            Error::MalformedGraph { .. } | Error::UnknownMode(_) => Stage::GraphConstruction,
            Error::ColoringInvariantViolation { .. }
            | Error::NonCompactColoring { .. }
            | Error::InvalidOrdering { .. }
            | Error::UnknownStrategy(_) => Stage::Coloring,
            Error::DuplicateName { .. }
            | Error::UnknownName { .. }
            | Error::MissingName { .. }
            | Error::NonFiniteInput { .. }
            | Error::TooManyNames { .. } => Stage::Signature,
            Error::Persistence(_) => Stage::Persistence,
        }
    }

    pub(crate) fn dimension_mismatch(
        stage: Stage,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Error::DimensionMismatch {
            stage,
            input: None,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
