//! General N-mode root traversal (§4.6).
//!
//! Used whenever `nmodes > 3` and the output mode is the CSF root, or any
//! time the caller opts into the general path for a 3-mode tensor. Pushes
//! partial Kronecker products down the tree and gathers them back up on
//! backtrack, exactly as described in spec: each recursive call owns its
//! own partial-product buffer, and that ownership is strictly nested with
//! the DFS walk (the buffer is freed when the call returns).
//!
//! One subtlety the recursive push-down doesn't resolve by itself: walking
//! the tree visits non-output modes in `dim_perm` order, but `Y`'s columns
//! are defined (spec.md's glossary: "the ordered outer product ... in a
//! fixed order") in ascending mode order, independent of how any particular
//! CSF happened to permute its tree. So each slice's fully-reduced
//! tree-order vector is scattered into ascending-mode-order columns once,
//! via a permutation computed purely from the shape (`dim_perm`, `n`, and
//! the factor column counts) and shared read-only across every slice and
//! worker.

use super::SLICE_CHUNK;
use crate::microkernel::outer;
use rayon::prelude::*;
use std::collections::HashMap;
use ttmc_core::{CsfTile, MatrixView, MatrixViewMut};

/// Runs the general N-mode root traversal for output mode `dim_perm[0]`.
///
/// # Panics
///
/// Panics in debug builds if `dim_perm[0]` is not the output mode implied by
/// `out`'s row count, or if `factors.len()` doesn't match the tensor order.
pub fn run(
    tile: &CsfTile,
    dim_perm: &[usize],
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
) {
    let nmodes = dim_perm.len();
    debug_assert!(nmodes >= 2, "N-mode root traversal needs at least 2 modes");
    let tree_modes = &dim_perm[1..];
    let cols: usize = tree_modes.iter().map(|&m| factors[m].cols()).product();
    debug_assert_eq!(out.cols(), cols);

    let scatter = build_scatter(tree_modes, factors);
    let nrows = out.rows();

    let mut slice_for_row: Vec<Option<u32>> = vec![None; nrows];
    for s in 0..tile.nfibs[0] {
        let r = tile.fid(0, s) as usize;
        slice_for_row[r] = Some(s as u32);
    }

    tracing::trace!(nrows, nmodes, cols, "nmode root traversal start");

    out.as_mut_slice()
        .par_chunks_mut(cols * SLICE_CHUNK)
        .enumerate()
        .for_each(|(block_idx, block)| {
            let base_row = block_idx * SLICE_CHUNK;
            let rows_in_block = block.len() / cols;
            for local in 0..rows_in_block {
                let row = base_row + local;
                let Some(s) = slice_for_row[row] else {
                    continue;
                };
                let out_row = &mut block[local * cols..(local + 1) * cols];
                let mut tree_order = vec![0.0; cols];
                for f in tile.children(0, s as usize) {
                    let contribution = reduce_node(tile, dim_perm, factors, 1, f);
                    for (t, c) in tree_order.iter_mut().zip(contribution.iter()) {
                        *t += c;
                    }
                }
                for (tree_flat, &v) in tree_order.iter().enumerate() {
                    out_row[scatter[tree_flat]] += v;
                }
            }
        });
}

/// Returns the length-`prod_{d'>=d} K_{dim_perm[d']}` vector equal to the
/// sum, over every leaf beneath `node` (a level-`d` tree node), of
/// `value * kron` of the factor rows from level `d` down to the leaf, in
/// tree order.
fn reduce_node(
    tile: &CsfTile,
    dim_perm: &[usize],
    factors: &[MatrixView<'_>],
    d: usize,
    node: usize,
) -> Vec<f64> {
    let nmodes = dim_perm.len();
    if d == nmodes - 1 {
        let mode = dim_perm[d];
        let v = tile.vals[node];
        let row = factors[mode].row(tile.fid(d, node) as usize);
        return row.iter().map(|&x| v * x).collect();
    }

    let mode = dim_perm[d];
    let row = factors[mode].row(tile.fid(d, node) as usize);
    let child_len = reduce_node_len(dim_perm, factors, d + 1);
    let mut child_sum = vec![0.0; child_len];
    for child in tile.children(d, node) {
        let contribution = reduce_node(tile, dim_perm, factors, d + 1, child);
        for (s, c) in child_sum.iter_mut().zip(contribution.iter()) {
            *s += c;
        }
    }
    let mut result = vec![0.0; row.len() * child_len];
    outer(row, &child_sum, &mut result);
    result
}

fn reduce_node_len(dim_perm: &[usize], factors: &[MatrixView<'_>], from_depth: usize) -> usize {
    dim_perm[from_depth..].iter().map(|&m| factors[m].cols()).product()
}

/// Builds the permutation from a tree-order flat column index to the
/// canonical ascending-mode-order flat column index, for the given
/// `tree_modes` (the non-root modes of a CSF, in tree order).
fn build_scatter(tree_modes: &[usize], factors: &[MatrixView<'_>]) -> Vec<usize> {
    let dims_k: Vec<usize> = factors.iter().map(|f| f.cols()).collect();
    let c: usize = tree_modes.iter().map(|&m| dims_k[m]).product();

    let mut ascending_modes = tree_modes.to_vec();
    ascending_modes.sort_unstable();

    let tree_strides = suffix_strides(tree_modes, &dims_k);
    let ascend_strides = suffix_strides(&ascending_modes, &dims_k);
    let ascend_pos: HashMap<usize, usize> =
        ascending_modes.iter().enumerate().map(|(p, &m)| (m, p)).collect();

    let mut scatter = vec![0usize; c.max(1)];
    for (tree_flat, slot) in scatter.iter_mut().enumerate() {
        let mut rem = tree_flat;
        let mut canonical = 0usize;
        for (i, &m) in tree_modes.iter().enumerate() {
            let stride = tree_strides[i];
            let idx = rem / stride;
            rem %= stride;
            canonical += idx * ascend_strides[ascend_pos[&m]];
        }
        *slot = canonical;
    }
    scatter
}

/// `strides[i]` = product of `dims_k[modes[j]]` for `j > i` (row-major,
/// `modes[0]` slowest-varying).
fn suffix_strides(modes: &[usize], dims_k: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; modes.len()];
    for i in (0..modes.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims_k[modes[i + 1]];
    }
    strides
}
