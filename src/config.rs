//! Detector and pipeline configuration.

use std::fmt;

use tracing::warn;

use crate::coloring::Strategy;
use crate::graph::CompressionMode;

/// Environment variable read by [`DetectorConfig::from_env`].
pub const WORKERS_ENV: &str = "JACSPARSE_WORKERS";

/// Size of the probe worker pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Workers {
    /// One worker per available core (rayon's default)
    #[default]
    Auto,
    /// Exactly this many workers (0 is treated as 1)
    Fixed(usize),
}

impl Workers {
    /// Concrete thread count
    pub fn resolve(&self) -> usize {
        match *self {
            Workers::Auto => rayon::current_num_threads().max(1),
            Workers::Fixed(n) => n.max(1),
        }
    }

    /// Parse `auto` or a positive integer.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("auto") {
            return Some(Workers::Auto);
        }
        value
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .map(Workers::Fixed)
    }
}

impl fmt::Display for Workers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workers::Auto => f.write_str("auto"),
            Workers::Fixed(n) => write!(f, "{}", n),
        }
    }
}

/// Settings for [`crate::detect::ContaminationDetector`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectorConfig {
    pub workers: Workers,
}

impl DetectorConfig {
    pub fn with_workers(workers: Workers) -> Self {
        Self { workers }
    }

    /// A single worker: probes run one after another on one thread.
    pub fn serial() -> Self {
        Self::with_workers(Workers::Fixed(1))
    }

    /// Read the worker count from `JACSPARSE_WORKERS`.
    ///
    /// Unset means [`Workers::Auto`]. A value that is neither `auto` nor a
    /// positive integer is reported with a warning and also falls back to
    /// `Auto`.
    pub fn from_env() -> Self {
        match std::env::var(WORKERS_ENV) {
            Ok(value) => Self::with_workers(Workers::parse(&value).unwrap_or_else(|| {
                warn!(
                    var = WORKERS_ENV,
                    value = value.as_str(),
                    "ignoring invalid worker count, using auto"
                );
                Workers::Auto
            })),
            Err(_) => Self::default(),
        }
    }
}

/// Settings for a full [`crate::pipeline::analyze`] run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub detector: DetectorConfig,
    pub mode: CompressionMode,
    pub strategy: Strategy,
}

impl AnalysisConfig {
    pub fn with_mode(mut self, mode: CompressionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(Workers::parse("auto"), Some(Workers::Auto));
        assert_eq!(Workers::parse(" AUTO "), Some(Workers::Auto));
        assert_eq!(Workers::parse("4"), Some(Workers::Fixed(4)));
        assert_eq!(Workers::parse("0"), None);
        assert_eq!(Workers::parse("-2"), None);
        assert_eq!(Workers::parse("many"), None);
    }

    #[test]
    fn test_resolve_never_zero() {
        assert_eq!(Workers::Fixed(0).resolve(), 1);
        assert_eq!(Workers::Fixed(3).resolve(), 3);
        assert!(Workers::Auto.resolve() >= 1);
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.mode, CompressionMode::Column);
        assert_eq!(config.strategy, Strategy::LargestFirst);
        assert_eq!(config.detector.workers, Workers::Auto);
        assert_eq!(DetectorConfig::serial().workers, Workers::Fixed(1));
    }
}
