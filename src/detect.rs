//! Sparsity detection by contamination.
//!
//! For every input `j` the detector evaluates the oracle once at the
//! operating point with input `j` replaced by the sentinel, and records
//! which outputs come back contaminated. That is exactly `n` oracle calls
//! for `n` inputs. The probes share nothing but the read-only oracle and
//! operating point, so they run on a bounded rayon pool; results are joined
//! before the matrix is assembled and the first failing probe aborts the
//! whole detection.
//!
//! ```ignore
//! let detector = ContaminationDetector::new(DetectorConfig::from_env());
//! let sparsity = detector.detect(&oracle, &point)?;
//! ```

use rayon::prelude::*;
use roaring::RoaringBitmap;
use tracing::{debug, info, warn};

use crate::config::DetectorConfig;
use crate::error::{Error, OracleError, Result, Stage};
use crate::id::{key, InputIdx};
use crate::oracle::Oracle;
use crate::sentinel::{NanSentinel, Sentinel};
use crate::signature::OperatingPoint;
use crate::sparsity::SparsityMatrix;

/// Anything that can recover a sparsity pattern from an oracle at a point.
///
/// [`ContaminationDetector`] is the built-in tracer. A stricter tracer (for
/// example one that instruments the model itself) plugs into
/// [`crate::pipeline::analyze_with`] through this trait.
pub trait DependencyTracer {
    fn trace<O>(&self, oracle: &O, point: &OperatingPoint) -> Result<SparsityMatrix>
    where
        O: Oracle + Sync + ?Sized;
}

/// Probes an oracle once per input with a [`Sentinel`].
#[derive(Clone, Debug)]
pub struct ContaminationDetector<S: Sentinel = NanSentinel> {
    sentinel: S,
    config: DetectorConfig,
}

impl ContaminationDetector {
    /// NaN contamination with the given configuration
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_sentinel(NanSentinel, config)
    }
}

impl Default for ContaminationDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl<S: Sentinel> ContaminationDetector<S> {
    pub fn with_sentinel(sentinel: S, config: DetectorConfig) -> Self {
        Self { sentinel, config }
    }

    pub fn sentinel(&self) -> &S {
        &self.sentinel
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect the sparsity of a thread-safe oracle, probing in parallel.
    ///
    /// Runs on a dedicated pool of `config.workers` threads. With one worker
    /// the probes run sequentially on that single thread.
    pub fn detect<O>(&self, oracle: &O, point: &OperatingPoint) -> Result<SparsityMatrix>
    where
        O: Oracle + Sync + ?Sized,
    {
        self.check_point(oracle, point)?;
        let n = point.len();
        let workers = self.config.workers.resolve();
        self.log_start(oracle, workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::WorkerPool {
                workers,
                reason: e.to_string(),
            })?;

        let columns = pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|j| self.probe(oracle, point, j))
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(self.assemble(oracle, columns))
    }

    /// Detect the sparsity of an oracle that must not be called concurrently.
    ///
    /// Probes run one at a time on the calling thread, in input order.
    pub fn detect_serial<O>(&self, oracle: &O, point: &OperatingPoint) -> Result<SparsityMatrix>
    where
        O: Oracle + ?Sized,
    {
        self.check_point(oracle, point)?;
        self.log_start(oracle, 1);

        let columns = (0..point.len())
            .map(|j| self.probe(oracle, point, j))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.assemble(oracle, columns))
    }

    fn check_point<O>(&self, oracle: &O, point: &OperatingPoint) -> Result<()>
    where
        O: Oracle + ?Sized,
    {
        let inputs = oracle.signature().inputs();
        if !point.labels().same_as(inputs) {
            return Err(Error::dimension_mismatch(
                Stage::Detection,
                format!("operating point over inputs {:?}", inputs.to_vec()),
                format!("operating point over inputs {:?}", point.labels().to_vec()),
            ));
        }
        Ok(())
    }

    fn log_start<O>(&self, oracle: &O, workers: usize)
    where
        O: Oracle + ?Sized,
    {
        let signature = oracle.signature();
        info!(
            inputs = signature.num_inputs(),
            outputs = signature.num_outputs(),
            workers,
            sentinel = self.sentinel.name(),
            "starting sparsity detection"
        );
    }

    /// One oracle call with input `j` contaminated.
    fn probe<O>(&self, oracle: &O, point: &OperatingPoint, j: InputIdx) -> Result<RoaringBitmap>
    where
        O: Oracle + ?Sized,
    {
        let signature = oracle.signature();
        let name = signature.inputs().name(j).unwrap_or_default();
        let baseline = point.values().values()[j];
        let record = point.with_input(j, self.sentinel.contaminate(baseline));

        let outputs = match oracle.evaluate(&record) {
            Ok(outputs) => outputs,
            Err(OracleError::WrongArity { expected, actual }) => {
                return Err(Error::DimensionMismatch {
                    stage: Stage::Detection,
                    input: Some(j),
                    expected: format!("{} outputs", expected),
                    actual: format!("{} outputs", actual),
                });
            }
            Err(source) => {
                warn!(input = j, input_name = name, error = %source, "oracle failed during probe");
                return Err(Error::OracleInvocation {
                    input: j,
                    name: name.to_string(),
                    source,
                });
            }
        };

        if !outputs.labels().same_as(signature.outputs()) {
            return Err(Error::DimensionMismatch {
                stage: Stage::Detection,
                input: Some(j),
                expected: format!("outputs {:?}", signature.outputs().to_vec()),
                actual: format!("outputs {:?}", outputs.labels().to_vec()),
            });
        }

        let contaminated: RoaringBitmap = outputs
            .values()
            .iter()
            .enumerate()
            .filter(|(_, value)| self.sentinel.is_contaminated(**value))
            .map(|(i, _)| key(i))
            .collect();

        debug!(input = j, input_name = name, contaminated = contaminated.len(), "probe done");
        Ok(contaminated)
    }

    fn assemble<O>(&self, oracle: &O, columns: Vec<RoaringBitmap>) -> SparsityMatrix
    where
        O: Oracle + ?Sized,
    {
        let sparsity = SparsityMatrix::from_probe_columns(oracle.signature(), columns);
        info!(
            inputs = sparsity.num_inputs(),
            outputs = sparsity.num_outputs(),
            true_entries = sparsity.count_true(),
            density = sparsity.density(),
            "sparsity detection done"
        );
        sparsity
    }
}

impl<S: Sentinel> DependencyTracer for ContaminationDetector<S> {
    fn trace<O>(&self, oracle: &O, point: &OperatingPoint) -> Result<SparsityMatrix>
    where
        O: Oracle + Sync + ?Sized,
    {
        self.detect(oracle, point)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::Workers;
    use crate::oracle::FnOracle;
    use crate::signature::{InputVector, OracleSignature};

    fn scenario_signature() -> OracleSignature {
        OracleSignature::new(["i0", "i1", "i2", "i3"], ["o0", "o1", "o2"]).unwrap()
    }

    fn scenario(v: &InputVector) -> Vec<f64> {
        let x = v.values();
        vec![x[0] + x[1], x[1] + x[2], x[3]]
    }

    #[test]
    fn test_scenario_pattern() {
        let sig = scenario_signature();
        let oracle = FnOracle::new(sig.clone(), |v: &InputVector| Ok(scenario(v)));
        let point = OperatingPoint::new(&sig, vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let s = ContaminationDetector::new(DetectorConfig::default())
            .detect(&oracle, &point)
            .unwrap();
        assert_eq!(
            s.to_dense(),
            vec![
                vec![true, true, false, false],
                vec![false, true, true, false],
                vec![false, false, false, true],
            ]
        );
    }

    #[test]
    fn test_exactly_one_call_per_input() {
        let sig = scenario_signature();
        let calls = AtomicUsize::new(0);
        let oracle = FnOracle::new(sig.clone(), |v: &InputVector| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(scenario(v))
        });
        let point = OperatingPoint::new(&sig, vec![0.5; 4]).unwrap();

        for workers in [1, 2, 8] {
            calls.store(0, Ordering::SeqCst);
            let detector = ContaminationDetector::new(DetectorConfig::with_workers(
                Workers::Fixed(workers),
            ));
            detector.detect(&oracle, &point).unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 4, "workers = {}", workers);
        }

        calls.store(0, Ordering::SeqCst);
        ContaminationDetector::new(DetectorConfig::default())
            .detect_serial(&oracle, &point)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_point_from_other_signature_rejected() {
        let sig = scenario_signature();
        let oracle = FnOracle::new(sig, |v: &InputVector| Ok(scenario(v)));
        let other = OracleSignature::new(["a", "b", "c", "d"], ["y"]).unwrap();
        let point = OperatingPoint::new(&other, vec![1.0; 4]).unwrap();

        let err = ContaminationDetector::new(DetectorConfig::default())
            .detect(&oracle, &point)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                stage: Stage::Detection,
                input: None,
                ..
            }
        ));
    }
}
