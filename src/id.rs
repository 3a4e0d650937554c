//! Index types for jacsparse
//!
//! Every artifact is indexed positionally by the oracle signature:
//! - input index: column of the sparsity matrix (0..n-1)
//! - output index: row of the sparsity matrix (0..m-1)
//! - node index: vertex of a connectivity graph, an input in column mode
//!   and an output in row mode
//!
//! Indices are stored bit-packed in `RoaringBitmap`s, so they must fit in
//! `u32`. `Labels` enforces this bound at construction.

/// Input index: position in the signature's input list
pub type InputIdx = usize;

/// Output index: position in the signature's output list
pub type OutputIdx = usize;

/// Node index within a connectivity graph
pub type NodeIdx = usize;

/// A color assigned by the greedy colorer
pub type Color = usize;

/// Largest index count a bitmap row can hold.
pub const MAX_INDEX_COUNT: usize = u32::MAX as usize;

/// Convert an index to its bitmap key.
///
/// Only for indices already bounded by a `Labels` length or a bitmap's own
/// contents; anything caller-supplied goes through [`try_key`].
#[inline]
pub(crate) fn key(idx: usize) -> u32 {
    debug_assert!(idx < MAX_INDEX_COUNT);
    idx as u32
}

/// Bitmap key of an arbitrary index, `None` when it cannot be stored.
#[inline]
pub(crate) fn try_key(idx: usize) -> Option<u32> {
    u32::try_from(idx).ok().filter(|&k| k != u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_key_bounds() {
        assert_eq!(try_key(0), Some(0));
        assert_eq!(try_key(MAX_INDEX_COUNT - 1), Some(u32::MAX - 1));
        assert_eq!(try_key(MAX_INDEX_COUNT), None);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(try_key((1usize << 32) + 1), None);
    }
}
