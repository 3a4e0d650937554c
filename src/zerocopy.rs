//! Zero-copy access to saved sparsity matrices via memory mapping.
//!
//! `MappedSparsity` memory-maps a file written by
//! [`crate::serialize::save_sparsity`] and answers lookups directly from the
//! archived rows, without deserializing.
//!
//! # Trade-offs
//! - Read-only access (archived types are immutable)
//! - Name lookups are linear scans over the archived labels
//! - Opening validates labels and rows up front, so it costs one pass over
//!   the file
//! - The file must remain valid for the lifetime of `MappedSparsity`

use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use rkyv::{check_archived_root, Archived, Deserialize};

use crate::error::{Error, Result};
use crate::id::{InputIdx, OutputIdx};
use crate::serialize::{check_rows, map_file, SparsityData};
use crate::signature::Labels;
use crate::sparsity::SparsityMatrix;

/// A memory-mapped sparsity matrix.
pub struct MappedSparsity {
    /// The memory map - must outlive all references to archived data
    _mmap: Arc<Mmap>,
    /// Archived data inside the map (valid for the lifetime of `_mmap`)
    archived: &'static Archived<SparsityData>,
}

// Safety: The archived data is read-only and the mmap is reference-counted
unsafe impl Send for MappedSparsity {}
unsafe impl Sync for MappedSparsity {}

impl MappedSparsity {
    /// Map and validate a sparsity file.
    pub fn open(path: &Path) -> Result<Self> {
        let mmap = map_file(path)?;

        let archived = check_archived_root::<SparsityData>(&mmap).map_err(|e| {
            Error::Persistence(format!("invalid archive in {}: {}", path.display(), e))
        })?;

        // Same acceptance rules as the heap loader: unique labels, one
        // sorted in-range row per output (`get` binary-searches rows)
        for (what, names) in [("input", &archived.inputs), ("output", &archived.outputs)] {
            Labels::new(names.iter().map(|name| name.as_str())).map_err(|e| {
                Error::Persistence(format!(
                    "invalid {} labels in {}: {}",
                    what,
                    path.display(),
                    e
                ))
            })?;
        }
        check_rows(
            archived.rows.iter().map(|row| row.as_slice()),
            archived.outputs.len(),
            archived.inputs.len(),
        )?;

        // Extend lifetime to 'static - the mmap is Arc'd and outlives the reference
        let archived: &'static Archived<SparsityData> = unsafe { std::mem::transmute(archived) };

        Ok(Self {
            _mmap: Arc::new(mmap),
            archived,
        })
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.archived.inputs.len()
    }

    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.archived.rows.len()
    }

    /// (outputs, inputs)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_outputs(), self.num_inputs())
    }

    pub fn input_name(&self, j: InputIdx) -> Option<&str> {
        self.archived.inputs.get(j).map(|s| s.as_str())
    }

    pub fn output_name(&self, i: OutputIdx) -> Option<&str> {
        self.archived.outputs.get(i).map(|s| s.as_str())
    }

    pub fn input_index(&self, name: &str) -> Option<InputIdx> {
        self.archived.inputs.iter().position(|s| s.as_str() == name)
    }

    pub fn output_index(&self, name: &str) -> Option<OutputIdx> {
        self.archived.outputs.iter().position(|s| s.as_str() == name)
    }

    /// Whether output `i` possibly depends on input `j`
    pub fn get(&self, i: OutputIdx, j: InputIdx) -> bool {
        self.archived
            .rows
            .get(i)
            .is_some_and(|row| row.as_slice().binary_search(&(j as u32)).is_ok())
    }

    /// Lookup by names
    pub fn depends(&self, output: &str, input: &str) -> Option<bool> {
        let i = self.output_index(output)?;
        let j = self.input_index(input)?;
        Some(self.get(i, j))
    }

    /// Inputs that output `i` possibly depends on, ascending
    pub fn dependencies_of(&self, i: OutputIdx) -> impl Iterator<Item = InputIdx> + '_ {
        self.archived
            .rows
            .get(i)
            .into_iter()
            .flat_map(|row| row.iter().map(|&j| j as usize))
    }

    /// Number of true entries
    pub fn count_true(&self) -> usize {
        self.archived.rows.iter().map(|row| row.len()).sum()
    }

    /// Copy the archive onto the heap.
    pub fn to_sparsity(&self) -> Result<SparsityMatrix> {
        let data: SparsityData = self
            .archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|_| Error::Persistence("failed to deserialize sparsity".to_string()))?;
        data.to_sparsity()
    }
}

impl std::fmt::Debug for MappedSparsity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedSparsity")
            .field("outputs", &self.num_outputs())
            .field("inputs", &self.num_inputs())
            .finish_non_exhaustive()
    }
}
