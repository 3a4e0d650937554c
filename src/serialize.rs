//! Artifact serialization and deserialization.
//!
//! Provides rkyv-based persistence for the sparsity and compression
//! artifacts:
//! - `save_sparsity` / `load_sparsity`: heap-allocated deserialization
//! - `load_sparsity_mapped`: zero-copy memory-mapped access
//! - `save_compressed` / `load_compressed`: a compression together with the
//!   sparsity and coloring it was built from
//!
//! Files are written to a temporary path and renamed into place, and every
//! load validates the archive before touching it. Nothing else in the crate
//! depends on this module.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::{check_archived_root, Archive, Deserialize, Serialize};
use roaring::RoaringBitmap;
use tracing::debug;

use crate::coloring::Coloring;
use crate::compress::{compress, CompressedSparsity};
use crate::error::{Error, Result};
use crate::graph::CompressionMode;
use crate::matrix::BoolMatrix;
use crate::signature::Labels;
use crate::sparsity::SparsityMatrix;
use crate::zerocopy::MappedSparsity;

// ============================================================================
// SERIALIZABLE DATA TYPES
// ============================================================================

/// Serializable form of a sparsity matrix
#[derive(Archive, Deserialize, Serialize)]
#[archive(check_bytes)]
pub struct SparsityData {
    /// Column labels, in order
    pub inputs: Vec<String>,
    /// Row labels, in order
    pub outputs: Vec<String>,
    /// True columns of each row, ascending
    pub rows: Vec<Vec<u32>>,
}

/// Serializable form of a compression
#[derive(Archive, Deserialize, Serialize)]
#[archive(check_bytes)]
pub struct CompressedData {
    pub sparsity: SparsityData,
    /// `"column"` or `"row"`
    pub mode: String,
    pub strategy: String,
    /// Color of every node of the compressed axis
    pub colors: Vec<u32>,
}

impl SparsityData {
    pub fn from_sparsity(sparsity: &SparsityMatrix) -> Self {
        Self {
            inputs: sparsity.inputs().to_vec(),
            outputs: sparsity.outputs().to_vec(),
            rows: sparsity
                .matrix()
                .rows()
                .iter()
                .map(|row| row.iter().collect())
                .collect(),
        }
    }

    pub fn to_sparsity(&self) -> Result<SparsityMatrix> {
        let inputs = Labels::new(&self.inputs).map_err(invalid("input labels"))?;
        let outputs = Labels::new(&self.outputs).map_err(invalid("output labels"))?;

        let ncols = inputs.len();
        check_rows(
            self.rows.iter().map(|row| row.as_slice()),
            outputs.len(),
            ncols,
        )?;

        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().copied().collect::<RoaringBitmap>())
            .collect();
        SparsityMatrix::new(BoolMatrix::from_rows(ncols, rows), inputs, outputs)
            .map_err(invalid("matrix shape"))
    }
}

impl CompressedData {
    pub fn from_compressed(compressed: &CompressedSparsity) -> Self {
        Self {
            sparsity: SparsityData::from_sparsity(compressed.sparsity()),
            mode: compressed.mode().to_string(),
            strategy: compressed.coloring().strategy().to_string(),
            colors: compressed
                .coloring()
                .colors()
                .iter()
                .map(|&c| c as u32)
                .collect(),
        }
    }

    /// Rebuild the compression, re-checking every color: one per node of
    /// the compressed axis, in `0..k` with no class empty, and never shared
    /// by two nodes on the same line.
    pub fn to_compressed(&self) -> Result<CompressedSparsity> {
        let sparsity = self.sparsity.to_sparsity()?;
        let mode: CompressionMode = self.mode.parse().map_err(invalid("compression mode"))?;

        let nodes = mode.node_count(&sparsity);
        if self.colors.len() != nodes {
            return Err(Error::Persistence(format!(
                "archive has {} colors for {} {} nodes",
                self.colors.len(),
                nodes,
                mode
            )));
        }
        if let Some(&c) = self.colors.iter().find(|&&c| c as usize >= nodes) {
            return Err(Error::Persistence(format!(
                "archived color {} out of range for {} nodes",
                c, nodes
            )));
        }

        let coloring = Coloring::from_colors(
            self.colors.iter().map(|&c| c as usize).collect(),
            self.strategy.clone(),
        );
        compress(&sparsity, &coloring, mode).map_err(invalid("coloring"))
    }
}

/// Check archived rows: one per output, columns strictly ascending and
/// below `num_inputs`.
pub(crate) fn check_rows<'a, I>(rows: I, num_outputs: usize, num_inputs: usize) -> Result<()>
where
    I: ExactSizeIterator<Item = &'a [u32]>,
{
    if rows.len() != num_outputs {
        return Err(Error::Persistence(format!(
            "archive has {} rows for {} outputs",
            rows.len(),
            num_outputs
        )));
    }
    for (i, row) in rows.enumerate() {
        if row.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::Persistence(format!(
                "archived row {} is not strictly ascending",
                i
            )));
        }
        if let Some(&j) = row.last().filter(|&&j| j as usize >= num_inputs) {
            return Err(Error::Persistence(format!(
                "archived column {} out of range for {} inputs",
                j, num_inputs
            )));
        }
    }
    Ok(())
}

fn invalid(what: &'static str) -> impl Fn(Error) -> Error {
    move |e| Error::Persistence(format!("invalid {} in archive: {}", what, e))
}

// ============================================================================
// SAVE / LOAD FUNCTIONS
// ============================================================================

/// Archive `data` to `path` atomically (temp file, sync, rename).
fn write_archive<T>(data: &T, path: &Path) -> Result<()>
where
    T: Serialize<AllocSerializer<4096>>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Persistence(format!("failed to create directory: {}", e)))?;
    }

    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(data)
        .map_err(|e| Error::Persistence(format!("failed to serialize: {}", e)))?;
    let bytes = serializer.into_serializer().into_inner();

    let temp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&temp_path)
            .map_err(|e| Error::Persistence(format!("failed to create temp file: {}", e)))?;
        file.write_all(&bytes)
            .map_err(|e| Error::Persistence(format!("failed to write file: {}", e)))?;
        file.sync_all()
            .map_err(|e| Error::Persistence(format!("failed to sync file: {}", e)))?;
    }

    fs::rename(&temp_path, path)
        .map_err(|e| Error::Persistence(format!("failed to rename file: {}", e)))?;

    debug!(path = %path.display(), bytes = bytes.len(), "saved archive");
    Ok(())
}

/// Map `path` read-only. Empty files are rejected.
pub(crate) fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path)
        .map_err(|e| Error::Persistence(format!("failed to open {}: {}", path.display(), e)))?;

    // Safety: the map is read-only and only read through validated archives
    let mmap = unsafe { Mmap::map(&file) }
        .map_err(|e| Error::Persistence(format!("failed to mmap {}: {}", path.display(), e)))?;

    if mmap.is_empty() {
        return Err(Error::Persistence(format!(
            "empty archive file {}",
            path.display()
        )));
    }
    Ok(mmap)
}

/// Save a sparsity matrix to a file
pub fn save_sparsity(sparsity: &SparsityMatrix, path: &Path) -> Result<()> {
    write_archive(&SparsityData::from_sparsity(sparsity), path)
}

/// Load a sparsity matrix from a file (deserializes onto the heap)
pub fn load_sparsity(path: &Path) -> Result<SparsityMatrix> {
    let mmap = map_file(path)?;

    let archived = check_archived_root::<SparsityData>(&mmap)
        .map_err(|e| Error::Persistence(format!("failed to validate archive: {}", e)))?;

    let data: SparsityData = archived
        .deserialize(&mut rkyv::Infallible)
        .map_err(|_| Error::Persistence("failed to deserialize sparsity".to_string()))?;

    data.to_sparsity()
}

/// Open a sparsity file with zero-copy access
///
/// Lookups read the archived rows straight from the memory map, which is
/// much cheaper than [`load_sparsity`] when only a few entries are needed.
/// The file must not change while the returned value is alive.
pub fn load_sparsity_mapped(path: &Path) -> Result<MappedSparsity> {
    MappedSparsity::open(path)
}

/// Save a compression (with its sparsity and coloring) to a file
pub fn save_compressed(compressed: &CompressedSparsity, path: &Path) -> Result<()> {
    write_archive(&CompressedData::from_compressed(compressed), path)
}

/// Load a compression from a file
pub fn load_compressed(path: &Path) -> Result<CompressedSparsity> {
    let mmap = map_file(path)?;

    let archived = check_archived_root::<CompressedData>(&mmap)
        .map_err(|e| Error::Persistence(format!("failed to validate archive: {}", e)))?;

    let data: CompressedData = archived
        .deserialize(&mut rkyv::Infallible)
        .map_err(|_| Error::Persistence("failed to deserialize compression".to_string()))?;

    data.to_compressed()
}
