//! Fuzz archive loading
//!
//! Arbitrary bytes written to disk must be rejected with an error, never
//! accepted as a malformed artifact or cause a panic.

#![no_main]

use jacsparse::serialize::{load_compressed, load_sparsity, load_sparsity_mapped};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let path = dir.path().join("input.jsp");
    if std::fs::write(&path, data).is_err() {
        return;
    }

    if let Ok(sparsity) = load_sparsity(&path) {
        assert_eq!(sparsity.matrix().nrows(), sparsity.num_outputs());
    }
    if let Ok(mapped) = load_sparsity_mapped(&path) {
        let _ = mapped.to_sparsity();
    }
    let _ = load_compressed(&path);
});
