//! Oracle signatures and strongly typed named vectors.
//!
//! An oracle is described by two ordered lists of unique names: its inputs
//! and its outputs. The order fixes matrix indices for every artifact built
//! downstream, so it is captured once, in `Labels`, and shared by reference
//! count between the signature and every vector built against it.
//!
//! Values cross the oracle boundary as `NamedVector<Input>` and
//! `NamedVector<Output>`. The marker type keeps the two from being mixed up,
//! and construction checks that every label gets exactly one value, so a
//! name or order mismatch fails when the record is built rather than when a
//! model reads a field.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::error::{Error, Result, Stage};
use crate::id::{InputIdx, MAX_INDEX_COUNT};

// ============================================================================
// LABELS
// ============================================================================

/// An ordered set of unique names.
///
/// Cloning is cheap (the names are shared). Equality is order-sensitive.
#[derive(Clone)]
pub struct Labels {
    names: Arc<IndexSet<String>>,
}

impl Labels {
    /// Build labels from names, rejecting duplicates.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = IndexSet::new();
        for name in names {
            let name = name.into();
            if set.contains(&name) {
                return Err(Error::DuplicateName { name });
            }
            set.insert(name);
        }
        if set.len() >= MAX_INDEX_COUNT {
            return Err(Error::TooManyNames { count: set.len() });
        }
        Ok(Self {
            names: Arc::new(set),
        })
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if there are no names
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    /// Name at a position
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get_index(idx).map(|s| s.as_str())
    }

    /// Iterate over names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(|s| s.as_str())
    }

    /// Names as owned strings, in order
    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// Same names in the same order (fast path when the storage is shared)
    pub fn same_as(&self, other: &Labels) -> bool {
        Arc::ptr_eq(&self.names, &other.names) || self.names.iter().eq(other.names.iter())
    }
}

impl PartialEq for Labels {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Labels {}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names.iter()).finish()
    }
}

// ============================================================================
// NAMED VECTORS
// ============================================================================

/// Marker for oracle input records
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Input;

/// Marker for oracle output records
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Output;

/// A complete record of one `f64` per label.
#[derive(Clone, PartialEq)]
pub struct NamedVector<K> {
    labels: Labels,
    values: Vec<f64>,
    _kind: PhantomData<K>,
}

/// Values handed to an oracle
pub type InputVector = NamedVector<Input>;

/// Values returned by an oracle
pub type OutputVector = NamedVector<Output>;

impl<K> NamedVector<K> {
    /// Build a record positionally. `values` must have one entry per label.
    pub fn new(labels: &Labels, values: Vec<f64>) -> Result<Self> {
        if values.len() != labels.len() {
            return Err(Error::dimension_mismatch(
                Stage::Signature,
                format!("{} values", labels.len()),
                format!("{} values", values.len()),
            ));
        }
        Ok(Self {
            labels: labels.clone(),
            values,
            _kind: PhantomData,
        })
    }

    /// Build a record from `(name, value)` pairs in any order.
    ///
    /// Every label must appear exactly once and no other name may appear.
    pub fn from_pairs<I, S>(labels: &Labels, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut slots: Vec<Option<f64>> = vec![None; labels.len()];
        for (name, value) in pairs {
            let name = name.as_ref();
            let idx = labels.index_of(name).ok_or_else(|| Error::UnknownName {
                name: name.to_string(),
            })?;
            if slots[idx].replace(value).is_some() {
                return Err(Error::DuplicateName {
                    name: name.to_string(),
                });
            }
        }
        let values = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| Error::MissingName {
                    name: labels.name(idx).unwrap_or_default().to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(Self {
            labels: labels.clone(),
            values,
            _kind: PhantomData,
        })
    }

    /// The labels this record is bound to
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value by position
    pub fn value(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied()
    }

    /// Value by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.labels.index_of(name).map(|idx| self.values[idx])
    }

    /// All values in label order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over `(name, value)` in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels.iter().zip(self.values.iter().copied())
    }

    /// Copy of this record with one value replaced
    pub fn with_value(&self, idx: usize, value: f64) -> Self {
        let mut values = self.values.clone();
        values[idx] = value;
        Self {
            labels: self.labels.clone(),
            values,
            _kind: PhantomData,
        }
    }
}

impl<K> fmt::Debug for NamedVector<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// ============================================================================
// SIGNATURE
// ============================================================================

/// The fixed input and output names of an oracle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleSignature {
    inputs: Labels,
    outputs: Labels,
}

impl OracleSignature {
    /// Build a signature, rejecting duplicate names within inputs or outputs.
    pub fn new<I, O, S, T>(inputs: I, outputs: O) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Ok(Self {
            inputs: Labels::new(inputs)?,
            outputs: Labels::new(outputs)?,
        })
    }

    pub fn inputs(&self) -> &Labels {
        &self.inputs
    }

    pub fn outputs(&self) -> &Labels {
        &self.outputs
    }

    /// Number of inputs (n)
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of outputs (m)
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Build an input record positionally
    pub fn input_vector(&self, values: Vec<f64>) -> Result<InputVector> {
        InputVector::new(&self.inputs, values)
    }

    /// Build an output record positionally
    pub fn output_vector(&self, values: Vec<f64>) -> Result<OutputVector> {
        OutputVector::new(&self.outputs, values)
    }

    /// Build an output record from `(name, value)` pairs
    pub fn output_from_pairs<I, S>(&self, pairs: I) -> Result<OutputVector>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        OutputVector::from_pairs(&self.outputs, pairs)
    }
}

// ============================================================================
// OPERATING POINT
// ============================================================================

/// One concrete, finite assignment of every input.
#[derive(Clone, Debug, PartialEq)]
pub struct OperatingPoint {
    values: InputVector,
}

impl OperatingPoint {
    /// Build an operating point positionally.
    pub fn new(signature: &OracleSignature, values: Vec<f64>) -> Result<Self> {
        Self::from_vector(signature.input_vector(values)?)
    }

    /// Build an operating point from `(name, value)` pairs.
    pub fn from_pairs<I, S>(signature: &OracleSignature, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        Self::from_vector(InputVector::from_pairs(signature.inputs(), pairs)?)
    }

    /// Wrap an input record, rejecting non-finite values.
    pub fn from_vector(values: InputVector) -> Result<Self> {
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFiniteInput {
                name: name.to_string(),
                value,
            });
        }
        Ok(Self { values })
    }

    /// The baseline input record
    pub fn values(&self) -> &InputVector {
        &self.values
    }

    pub fn labels(&self) -> &Labels {
        self.values.labels()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Baseline with input `j` replaced by `value`.
    pub fn with_input(&self, j: InputIdx, value: f64) -> InputVector {
        self.values.with_value(j, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig() -> OracleSignature {
        OracleSignature::new(["a", "b", "c"], ["y"]).unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = OracleSignature::new(["a", "a"], ["y"]).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { ref name } if name == "a"));
        assert_eq!(err.stage(), Stage::Signature);

        // Same name on both sides is fine
        assert!(OracleSignature::new(["x"], ["x"]).is_ok());
    }

    #[test]
    fn test_from_pairs_any_order() {
        let sig = sig();
        let point = OperatingPoint::from_pairs(&sig, [("c", 3.0), ("a", 1.0), ("b", 2.0)]).unwrap();
        assert_eq!(point.values().values(), &[1.0, 2.0, 3.0]);
        assert_eq!(point.values().get("b"), Some(2.0));
    }

    #[test]
    fn test_from_pairs_errors() {
        let sig = sig();
        let missing = OperatingPoint::from_pairs(&sig, [("a", 1.0), ("b", 2.0)]).unwrap_err();
        assert!(matches!(missing, Error::MissingName { ref name } if name == "c"));

        let unknown =
            OperatingPoint::from_pairs(&sig, [("a", 1.0), ("b", 2.0), ("z", 0.0)]).unwrap_err();
        assert!(matches!(unknown, Error::UnknownName { ref name } if name == "z"));

        let twice =
            OperatingPoint::from_pairs(&sig, [("a", 1.0), ("a", 2.0), ("b", 0.0)]).unwrap_err();
        assert!(matches!(twice, Error::DuplicateName { .. }));
    }

    #[test]
    fn test_positional_length_checked() {
        let sig = sig();
        assert!(matches!(
            sig.input_vector(vec![1.0]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(sig.output_vector(vec![0.5]).is_ok());
    }

    #[test]
    fn test_operating_point_must_be_finite() {
        let sig = sig();
        let err = OperatingPoint::new(&sig, vec![1.0, f64::NAN, 0.0]).unwrap_err();
        assert!(matches!(err, Error::NonFiniteInput { ref name, .. } if name == "b"));
        assert!(OperatingPoint::new(&sig, vec![1.0, f64::INFINITY, 0.0]).is_err());
    }

    #[test]
    fn test_with_input_leaves_baseline() {
        let sig = sig();
        let point = OperatingPoint::new(&sig, vec![1.0, 2.0, 3.0]).unwrap();
        let probe = point.with_input(1, -7.0);
        assert_eq!(probe.values(), &[1.0, -7.0, 3.0]);
        assert_eq!(point.values().values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_labels_same_as() {
        let sig = sig();
        let copy = Labels::new(["a", "b", "c"]).unwrap();
        let reordered = Labels::new(["b", "a", "c"]).unwrap();
        assert!(sig.inputs().same_as(&copy));
        assert!(!sig.inputs().same_as(&reordered));
    }
}
