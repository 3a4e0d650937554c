//! Bit-packed Boolean matrices.
//!
//! A `BoolMatrix` stores, for each row, the set of columns that are `true`
//! as a `RoaringBitmap`. This is the shared storage for sparsity matrices,
//! conflict matrices and compressed matrices: products over the Boolean
//! semiring (⊗ = AND, ⊕ = OR) become bitmap unions and intersections, and
//! nothing is ever multiplied in floating point.

use roaring::RoaringBitmap;

use crate::id::{key, try_key};

/// A dense-shaped, sparsely stored Boolean matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct BoolMatrix {
    nrows: usize,
    ncols: usize,
    /// One bitmap per row holding the column indices that are `true`
    rows: Vec<RoaringBitmap>,
}

impl BoolMatrix {
    /// Create an all-false matrix with the given shape
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            rows: vec![RoaringBitmap::new(); nrows],
        }
    }

    /// Build a matrix from per-row bitmaps.
    ///
    /// Columns outside `0..ncols` are dropped.
    pub fn from_rows(ncols: usize, rows: Vec<RoaringBitmap>) -> Self {
        let mut rows = rows;
        if ncols < u32::MAX as usize {
            for row in &mut rows {
                row.remove_range(key(ncols)..);
            }
        }
        Self {
            nrows: rows.len(),
            ncols,
            rows,
        }
    }

    /// Build a matrix from nested rows of booleans.
    ///
    /// All rows must have length `ncols`; shorter rows are padded with `false`
    /// and longer rows truncated.
    pub fn from_dense(ncols: usize, dense: &[Vec<bool>]) -> Self {
        let rows = dense
            .iter()
            .map(|row| {
                row.iter()
                    .take(ncols)
                    .enumerate()
                    .filter(|(_, b)| **b)
                    .map(|(j, _)| key(j))
                    .collect()
            })
            .collect();
        Self {
            nrows: dense.len(),
            ncols,
            rows,
        }
    }

    /// The n×n identity matrix
    pub fn identity(n: usize) -> Self {
        let rows = (0..n).map(|i| std::iter::once(key(i)).collect()).collect();
        Self {
            nrows: n,
            ncols: n,
            rows,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Entry at (i, j). Out-of-range entries are `false`.
    pub fn get(&self, i: usize, j: usize) -> bool {
        j < self.ncols
            && try_key(j)
                .zip(self.rows.get(i))
                .is_some_and(|(k, row)| row.contains(k))
    }

    /// Set entry (i, j). Returns the previous value.
    ///
    /// Panics if (i, j) is out of range or `j` does not fit a bitmap key.
    pub fn set(&mut self, i: usize, j: usize, value: bool) -> bool {
        let k = try_key(j).filter(|_| i < self.nrows && j < self.ncols);
        let Some(k) = k else {
            panic!("entry ({}, {}) outside {}x{} matrix", i, j, self.nrows, self.ncols);
        };
        let row = &mut self.rows[i];
        if value {
            !row.insert(k)
        } else {
            row.remove(k)
        }
    }

    /// Bitmap of true columns in row `i`
    pub fn row(&self, i: usize) -> &RoaringBitmap {
        &self.rows[i]
    }

    /// All rows
    pub fn rows(&self) -> &[RoaringBitmap] {
        &self.rows
    }

    /// Bitmap of true rows in column `j`
    pub fn column(&self, j: usize) -> RoaringBitmap {
        let Some(k) = try_key(j) else {
            return RoaringBitmap::new();
        };
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.contains(k))
            .map(|(i, _)| key(i))
            .collect()
    }

    /// The transposed matrix
    pub fn transpose(&self) -> Self {
        let mut rows = vec![RoaringBitmap::new(); self.ncols];
        for (i, row) in self.rows.iter().enumerate() {
            for j in row {
                rows[j as usize].insert(key(i));
            }
        }
        Self {
            nrows: self.ncols,
            ncols: self.nrows,
            rows,
        }
    }

    /// Number of true entries
    pub fn count_true(&self) -> usize {
        self.rows.iter().map(|row| row.len() as usize).sum()
    }

    /// Fraction of entries that are true (0.0 for an empty shape)
    pub fn density(&self) -> f64 {
        let total = self.nrows * self.ncols;
        if total == 0 {
            0.0
        } else {
            self.count_true() as f64 / total as f64
        }
    }

    /// Check if every entry is false
    pub fn is_all_false(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }

    /// Check if every entry is true
    pub fn is_all_true(&self) -> bool {
        self.rows.iter().all(|row| row.len() as usize == self.ncols)
    }

    /// Iterate over true entries as (row, col), row-major ascending
    pub fn iter_true(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |j| (i, j as usize)))
    }

    /// Nested rows of booleans
    pub fn to_dense(&self) -> Vec<Vec<bool>> {
        self.rows
            .iter()
            .map(|row| (0..self.ncols).map(|j| row.contains(key(j))).collect())
            .collect()
    }

    /// Boolean product `self · other` (OR of ANDs).
    ///
    /// Row i of the result is the union of `other`'s rows selected by row i
    /// of `self`.
    pub fn bool_product(&self, other: &BoolMatrix) -> BoolMatrix {
        debug_assert_eq!(self.ncols, other.nrows);
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut acc = RoaringBitmap::new();
                for k in row {
                    acc |= &other.rows[k as usize];
                }
                acc
            })
            .collect();
        BoolMatrix {
            nrows: self.nrows,
            ncols: other.ncols,
            rows,
        }
    }

    /// Copy with the diagonal cleared
    pub fn without_diagonal(&self) -> Self {
        let mut result = self.clone();
        for (i, row) in result.rows.iter_mut().enumerate() {
            row.remove(key(i));
        }
        result
    }
}
