//! Unit tests for artifact persistence

use std::fs;
use std::path::Path;

use jacsparse::serialize::{
    load_compressed, load_sparsity, load_sparsity_mapped, save_compressed, save_sparsity,
    CompressedData, SparsityData,
};
use jacsparse::{
    compress, greedy_color, CompressionMode, ConnectivityGraph, Error, OracleSignature,
    SparsityMatrix, Stage, Strategy,
};
use tempfile::tempdir;

/// Archive hand-built data without going through the artifact types
fn write_raw<T>(data: &T, path: &Path)
where
    T: rkyv::Serialize<rkyv::ser::serializers::AllocSerializer<4096>>,
{
    let bytes = rkyv::to_bytes::<_, 4096>(data).unwrap();
    fs::write(path, bytes.as_slice()).unwrap();
}

fn raw_sparsity(inputs: &[&str], outputs: &[&str], rows: Vec<Vec<u32>>) -> SparsityData {
    SparsityData {
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
        outputs: outputs.iter().map(|s| s.to_string()).collect(),
        rows,
    }
}

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
fn test_sparsity_save_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("sparsity.jsp");

    let sparsity = scenario();
    save_sparsity(&sparsity, &path).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let loaded = load_sparsity(&path).unwrap();
    assert_eq!(loaded, sparsity);
    assert_eq!(loaded.inputs().to_vec(), vec!["i0", "i1", "i2", "i3"]);
}

#[test]
fn test_sparsity_mapped_lookups() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sparsity.jsp");
    let sparsity = scenario();
    save_sparsity(&sparsity, &path).unwrap();

    let mapped = load_sparsity_mapped(&path).unwrap();
    assert_eq!(mapped.shape(), (3, 4));
    assert_eq!(mapped.count_true(), 5);
    assert_eq!(mapped.input_name(2), Some("i2"));
    assert_eq!(mapped.output_index("o2"), Some(2));
    for i in 0..3 {
        for j in 0..4 {
            assert_eq!(mapped.get(i, j), sparsity.get(i, j), "entry ({}, {})", i, j);
        }
    }
    assert_eq!(mapped.depends("o1", "i2"), Some(true));
    assert_eq!(mapped.dependencies_of(0).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(mapped.to_sparsity().unwrap(), sparsity);
}

#[test]
fn test_compressed_save_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("compressed.jsp");

    let sparsity = scenario();
    for mode in [CompressionMode::Column, CompressionMode::Row] {
        let graph = ConnectivityGraph::build(&sparsity, mode);
        let coloring = greedy_color(&graph, &Strategy::SmallestLast).unwrap();
        let compressed = compress(&sparsity, &coloring, mode).unwrap();

        save_compressed(&compressed, &path).unwrap();
        let loaded = load_compressed(&path).unwrap();
        assert_eq!(loaded, compressed);
        assert_eq!(loaded.coloring().strategy(), "smallest_last");
    }
}

#[test]
fn test_empty_file_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.jsp");
    fs::write(&path, b"").unwrap();

    let err = load_sparsity(&path).unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
    assert_eq!(err.stage(), Stage::Persistence);
}

#[test]
fn test_garbage_file_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.jsp");
    fs::write(&path, [0xffu8; 64]).unwrap();

    assert!(matches!(load_sparsity(&path), Err(Error::Persistence(_))));
    assert!(matches!(load_sparsity_mapped(&path), Err(Error::Persistence(_))));
    assert!(matches!(load_compressed(&path), Err(Error::Persistence(_))));
}

#[test]
fn test_missing_file_rejected() {
    let dir = tempdir().unwrap();
    let err = load_sparsity(&dir.path().join("absent.jsp")).unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
}

#[test]
fn test_tampered_colors_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("compressed.jsp");

    let sparsity = scenario();
    let graph = ConnectivityGraph::build(&sparsity, CompressionMode::Column);
    let coloring = greedy_color(&graph, &Strategy::LargestFirst).unwrap();
    let compressed = compress(&sparsity, &coloring, CompressionMode::Column).unwrap();

    let tampered = [
        // far out of range: must not size anything by it
        vec![1, 0, 1, u32::MAX],
        vec![1, 0, 1, 1_000_000],
        // class 1 left empty
        vec![2, 0, 2, 0],
        // i0 and i1 share o0
        vec![0, 0, 1, 0],
        // wrong node count
        vec![1, 0, 1],
    ];
    for colors in tampered {
        let mut data = CompressedData::from_compressed(&compressed);
        data.colors = colors.clone();
        write_raw(&data, &path);

        let err = load_compressed(&path).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)), "colors {:?}: {}", colors, err);
        assert_eq!(err.stage(), Stage::Persistence);
    }

    // Untouched data still loads
    write_raw(&CompressedData::from_compressed(&compressed), &path);
    assert_eq!(load_compressed(&path).unwrap(), compressed);
}

#[test]
fn test_malformed_rows_rejected_by_both_loaders() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sparsity.jsp");

    let cases = [
        ("unsorted row", raw_sparsity(&["a", "b", "c"], &["y"], vec![vec![2, 1, 0]])),
        ("repeated column", raw_sparsity(&["a", "b"], &["y"], vec![vec![1, 1]])),
        ("extra row", raw_sparsity(&["a"], &["y"], vec![vec![0], vec![0]])),
        ("missing row", raw_sparsity(&["a"], &["y", "z"], vec![vec![0]])),
        ("column out of range", raw_sparsity(&["a"], &["y"], vec![vec![0, 3]])),
        ("duplicate input", raw_sparsity(&["a", "a"], &["y"], vec![vec![0]])),
        ("duplicate output", raw_sparsity(&["a"], &["y", "y"], vec![vec![0], vec![]])),
    ];
    for (what, data) in cases {
        write_raw(&data, &path);
        assert!(
            matches!(load_sparsity(&path), Err(Error::Persistence(_))),
            "heap load accepted {}",
            what
        );
        assert!(
            matches!(load_sparsity_mapped(&path), Err(Error::Persistence(_))),
            "mapped load accepted {}",
            what
        );
    }

    // A well-formed raw archive is read the same way by both
    write_raw(&raw_sparsity(&["a", "b", "c"], &["y"], vec![vec![0, 2]]), &path);
    let heap = load_sparsity(&path).unwrap();
    let mapped = load_sparsity_mapped(&path).unwrap();
    for j in 0..3 {
        assert_eq!(heap.get(0, j), mapped.get(0, j), "column {}", j);
    }
    assert!(mapped.get(0, 2));
}
