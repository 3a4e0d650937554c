//! Oracle adapters.
//!
//! An oracle is the black-box model being probed. jacsparse only ever sees
//! it through [`Oracle`]: a fixed signature plus an `evaluate` call from a
//! complete input record to a complete output record. Whatever sits behind
//! that call (a native library, an embedded interpreter, a subprocess) is
//! the adapter's business, and the adapter is built and owned by the caller.
//!
//! Implementations should be pure for a fixed input: the same record must
//! give the same outputs on every call. Adapters that are safe to call from
//! several threads at once should be `Sync`; the detector only runs probes
//! concurrently for `Sync` oracles.

use crate::error::OracleError;
use crate::signature::{InputVector, OracleSignature, OutputVector};

/// A vector-valued black-box function with named inputs and outputs.
pub trait Oracle {
    /// The fixed input/output names. Must not change between calls.
    fn signature(&self) -> &OracleSignature;

    /// Evaluate the model at a complete input record.
    ///
    /// Errors are reported as-is (including timeouts enforced by the
    /// adapter); the detector never retries or substitutes a value.
    fn evaluate(&self, inputs: &InputVector) -> Result<OutputVector, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn signature(&self) -> &OracleSignature {
        (**self).signature()
    }

    fn evaluate(&self, inputs: &InputVector) -> Result<OutputVector, OracleError> {
        (**self).evaluate(inputs)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn signature(&self) -> &OracleSignature {
        (**self).signature()
    }

    fn evaluate(&self, inputs: &InputVector) -> Result<OutputVector, OracleError> {
        (**self).evaluate(inputs)
    }
}

/// An oracle backed by a closure over the input record.
///
/// The closure returns output values positionally, in signature order.
/// A wrong number of values is passed through untouched so that the
/// detector can report it as a dimension mismatch for the probe that
/// produced it.
pub struct FnOracle<F> {
    signature: OracleSignature,
    func: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&InputVector) -> Result<Vec<f64>, OracleError>,
{
    pub fn new(signature: OracleSignature, func: F) -> Self {
        Self { signature, func }
    }
}

impl<F> Oracle for FnOracle<F>
where
    F: Fn(&InputVector) -> Result<Vec<f64>, OracleError>,
{
    fn signature(&self) -> &OracleSignature {
        &self.signature
    }

    fn evaluate(&self, inputs: &InputVector) -> Result<OutputVector, OracleError> {
        let values = (self.func)(inputs)?;
        let expected = self.signature.num_outputs();
        if values.len() != expected {
            return Err(OracleError::WrongArity {
                expected,
                actual: values.len(),
            });
        }
        self.signature
            .output_vector(values)
            .map_err(|e| OracleError::Failed(e.to_string()))
    }
}

impl<F> std::fmt::Debug for FnOracle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOracle")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
