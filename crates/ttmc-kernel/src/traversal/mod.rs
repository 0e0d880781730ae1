//! Tree-traversal algorithms over CSF, one per combination of output-mode
//! depth.
//!
//! - [`root`]: output mode at tree level 0. No locking: every slice owns a
//!   distinct output row.
//! - [`internal`]: output mode at an internal tree level (3-mode only).
//!   Locking required: multiple slices can target the same output row.
//! - [`leaf`]: output mode at the leaf level (3-mode only). Locking
//!   required, one acquisition per non-zero rather than per fiber.
//! - [`nmode`]: the general N-mode root traversal for `nmodes > 3` (or any
//!   time the caller opts in for `nmodes == 3`), pushing partial
//!   intermediates down the tree and gathering them back up on backtrack.
//!
//! Every traversal distributes slices dynamically in chunks of 16 via
//! `rayon`, matching the `schedule(dynamic, 16) nowait` scheduling the
//! original OpenMP implementation used.

pub mod internal;
pub mod leaf;
pub mod nmode;
pub mod root;

/// Slices are handed to workers in chunks of this size under dynamic
/// scheduling, across every traversal in this module.
pub const SLICE_CHUNK: usize = 16;

/// `Y`'s columns are defined in ascending mode order (excluding the output
/// mode), independent of the order a CSF's `dim_perm` happens to visit the
/// other two modes in — the same canonicalization [`nmode::run`]'s
/// `build_scatter` derives generally for N modes. The 3-mode specialized
/// traversals only ever combine exactly two non-output modes, so the
/// general scatter permutation collapses to a single question: does tree
/// order (`mode_a` slow, `mode_b` fast) already match ascending order (the
/// smaller mode slow, the larger fast)? Returns `true` when it does — the
/// caller can write tree order directly — and `false` when the two modes
/// must be swapped before writing into `Y`.
pub fn tree_pair_is_ascending(mode_a: usize, mode_b: usize) -> bool {
    mode_a < mode_b
}
