//! The sparsity artifact: which outputs may depend on which inputs.

use std::fmt;

use roaring::RoaringBitmap;

use crate::error::{Error, Result, Stage};
use crate::id::{InputIdx, OutputIdx};
use crate::matrix::BoolMatrix;
use crate::signature::{Labels, OracleSignature};

/// Boolean outputs × inputs matrix with row and column labels.
///
/// `get(i, j) == true` means output `i` was contaminated when input `j`
/// was probed. The pattern is a best-effort superset of the true
/// dependencies at the probed operating point: spurious entries are
/// harmless downstream, but a dependency carried only through a branch or
/// comparison can be missing (see [`crate::sentinel`]). Nothing in the
/// crate treats it as exact.
#[derive(Clone, PartialEq)]
pub struct SparsityMatrix {
    matrix: BoolMatrix,
    inputs: Labels,
    outputs: Labels,
}

impl SparsityMatrix {
    /// Wrap a matrix with its labels. The shape must be outputs × inputs.
    pub fn new(matrix: BoolMatrix, inputs: Labels, outputs: Labels) -> Result<Self> {
        let expected = (outputs.len(), inputs.len());
        if matrix.shape() != expected {
            return Err(Error::dimension_mismatch(
                Stage::Detection,
                format!("{}x{} matrix", expected.0, expected.1),
                format!("{}x{} matrix", matrix.nrows(), matrix.ncols()),
            ));
        }
        Ok(Self {
            matrix,
            inputs,
            outputs,
        })
    }

    /// Build from nested rows (one row per output) against a signature.
    pub fn from_dense(signature: &OracleSignature, dense: &[Vec<bool>]) -> Result<Self> {
        let ncols = signature.num_inputs();
        if let Some(row) = dense.iter().find(|row| row.len() != ncols) {
            return Err(Error::dimension_mismatch(
                Stage::Detection,
                format!("rows of length {}", ncols),
                format!("a row of length {}", row.len()),
            ));
        }
        Self::new(
            BoolMatrix::from_dense(ncols, dense),
            signature.inputs().clone(),
            signature.outputs().clone(),
        )
    }

    /// Assemble from one bitmap of contaminated outputs per probed input.
    pub(crate) fn from_probe_columns(
        signature: &OracleSignature,
        columns: Vec<RoaringBitmap>,
    ) -> Self {
        let by_input = BoolMatrix::from_rows(signature.num_outputs(), columns);
        Self {
            matrix: by_input.transpose(),
            inputs: signature.inputs().clone(),
            outputs: signature.outputs().clone(),
        }
    }

    pub fn matrix(&self) -> &BoolMatrix {
        &self.matrix
    }

    /// Column labels
    pub fn inputs(&self) -> &Labels {
        &self.inputs
    }

    /// Row labels
    pub fn outputs(&self) -> &Labels {
        &self.outputs
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// (outputs, inputs)
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    /// Whether output `i` possibly depends on input `j`
    pub fn get(&self, i: OutputIdx, j: InputIdx) -> bool {
        self.matrix.get(i, j)
    }

    /// Lookup by names
    pub fn depends(&self, output: &str, input: &str) -> Option<bool> {
        let i = self.outputs.index_of(output)?;
        let j = self.inputs.index_of(input)?;
        Some(self.get(i, j))
    }

    /// Inputs that output `i` possibly depends on
    pub fn dependencies_of(&self, i: OutputIdx) -> Vec<InputIdx> {
        self.matrix.row(i).iter().map(|j| j as usize).collect()
    }

    /// Outputs possibly affected by input `j`
    pub fn dependents_of(&self, j: InputIdx) -> Vec<OutputIdx> {
        self.matrix.column(j).iter().map(|i| i as usize).collect()
    }

    /// Number of true entries
    pub fn count_true(&self) -> usize {
        self.matrix.count_true()
    }

    pub fn density(&self) -> f64 {
        self.matrix.density()
    }

    pub fn to_dense(&self) -> Vec<Vec<bool>> {
        self.matrix.to_dense()
    }
}

impl fmt::Debug for SparsityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparsityMatrix")
            .field("outputs", &self.outputs)
            .field("inputs", &self.inputs)
            .field("true_entries", &self.count_true())
            .finish()
    }
}

impl fmt::Display for SparsityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self.inputs.to_vec();
        let rows: Vec<String> = self.outputs.to_vec();
        f.write_str(&crate::pretty::render_matrix(&self.matrix, &rows, &columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> SparsityMatrix {
        let sig = OracleSignature::new(["i0", "i1", "i2", "i3"], ["o0", "o1", "o2"]).unwrap();
        SparsityMatrix::from_dense(
            &sig,
            &[
                vec![true, true, false, false],
                vec![false, true, true, false],
                vec![false, false, false, true],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_by_name_and_index() {
        let s = scenario();
        assert_eq!(s.shape(), (3, 4));
        assert_eq!(s.depends("o1", "i2"), Some(true));
        assert_eq!(s.depends("o2", "i0"), Some(false));
        assert_eq!(s.depends("nope", "i0"), None);
        assert_eq!(s.dependencies_of(0), vec![0, 1]);
        assert_eq!(s.dependents_of(1), vec![0, 1]);
        assert_eq!(s.count_true(), 5);
    }

    #[test]
    fn test_shape_checked() {
        let sig = OracleSignature::new(["a", "b"], ["y"]).unwrap();
        let err = SparsityMatrix::from_dense(&sig, &[vec![true]]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        let err = SparsityMatrix::new(
            BoolMatrix::new(2, 2),
            sig.inputs().clone(),
            sig.outputs().clone(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_from_probe_columns_transposes() {
        let sig = OracleSignature::new(["a", "b"], ["y", "z"]).unwrap();
        let columns = vec![
            [0u32].into_iter().collect::<RoaringBitmap>(),
            [0u32, 1].into_iter().collect::<RoaringBitmap>(),
        ];
        let s = SparsityMatrix::from_probe_columns(&sig, columns);
        assert_eq!(s.to_dense(), vec![vec![true, true], vec![false, true]]);
    }
}
