//! Contamination sentinels.
//!
//! Dependency detection replaces one input with a value that taints every
//! arithmetic result it flows into, then looks for the taint in the outputs.
//! A `Sentinel` names that value and the test for it.
//!
//! # NaN propagation
//!
//! IEEE-754 NaN propagates through `+ - * /`, `sqrt`, `exp`, `ln`, `sin` and
//! most of libm, and through `powf` except for the documented identities
//! (`x.powf(0.0) == 1.0` and `1.0_f64.powf(x) == 1.0` even for NaN `x`).
//!
//! It does NOT reliably propagate through:
//! - comparisons: every comparison with NaN is `false`, so `if x > 0.0`
//!   silently takes the `else` branch
//! - `f64::min` / `f64::max` / `clamp`-style selection, which return the
//!   non-NaN operand
//! - casts to integers (`NaN as usize == 0`) and any indexing that follows
//! - code that replaces non-finite values with defaults
//!
//! In all of those cases an output that really depends on the input can come
//! back clean. Detection by contamination is therefore a best-effort
//! superset on straight-line arithmetic and may miss dependencies carried
//! only through control flow.

/// A value that marks an input as "under probe" and the test that recognises
/// it downstream.
pub trait Sentinel: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// The value substituted for the probed input.
    fn contaminate(&self, baseline: f64) -> f64;

    /// Whether an output carries the contamination.
    fn is_contaminated(&self, value: f64) -> bool;
}

/// Quiet-NaN contamination; any NaN output counts as contaminated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NanSentinel;

impl Sentinel for NanSentinel {
    fn name(&self) -> &'static str {
        "nan"
    }

    fn contaminate(&self, _baseline: f64) -> f64 {
        f64::NAN
    }

    fn is_contaminated(&self, value: f64) -> bool {
        value.is_nan()
    }
}
