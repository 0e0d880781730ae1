//! Root traversal: output mode `n = dim_perm[0]` (§4.3 / §4.6's 3-mode
//! specialization).
//!
//! Every level-0 node (slice) owns a distinct output row, so no lock is
//! needed: the parallel region splits `Y` into disjoint row chunks up
//! front with [`MatrixViewMut::as_mut_slice`]`.par_chunks_mut`, which the
//! borrow checker accepts without any `unsafe`, and hands each chunk of
//! [`super::SLICE_CHUNK`] rows to whichever worker rayon schedules it to.
//!
//! `dim_perm[1]`/`dim_perm[2]` are visited in tree order, but `Y`'s columns
//! are ascending-mode-order; when `dim_perm[1] > dim_perm[2]` the two
//! micro-kernel operands are swapped so the smaller mode ends up
//! slow-varying regardless of tree order (see
//! [`super::tree_pair_is_ascending`]).

use super::{tree_pair_is_ascending, SLICE_CHUNK};
use crate::microkernel::batched_outer_add;
use crate::scratch::ScratchPool;
use rayon::prelude::*;
use ttmc_core::{CsfTile, MatrixView, MatrixViewMut};

/// Runs the 3-mode root traversal for output mode `dim_perm[0]`.
///
/// # Panics
///
/// Panics in debug builds if `dim_perm.len() != 3` or a scratch buffer is
/// too small for the tensor's largest slice; both are precondition
/// violations (the caller sized scratch via
/// [`crate::cost::max_fiber_and_outer_spans`]).
pub fn run(
    tile: &CsfTile,
    dim_perm: &[usize],
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
    scratch: &ScratchPool,
) {
    debug_assert_eq!(dim_perm.len(), 3, "root traversal is 3-mode specialized");
    let (m1, m2) = (dim_perm[1], dim_perm[2]);
    let k1 = factors[m1].cols();
    let k2 = factors[m2].cols();
    let cols = k1 * k2;
    debug_assert_eq!(out.cols(), cols, "output column count must be K1 * K2");
    let ascending = tree_pair_is_ascending(m1, m2);

    let nrows = out.rows();
    let mut slice_for_row: Vec<Option<u32>> = vec![None; nrows];
    for s in 0..tile.nfibs[0] {
        let r = tile.fid(0, s) as usize;
        slice_for_row[r] = Some(s as u32);
    }

    tracing::trace!(nrows, nslices = tile.nfibs[0], k1, k2, "root traversal start");

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
                process_slice(tile, s as usize, m1, m2, k1, k2, factors, out_row, scratch, ascending);
            }
        });
}

#[allow(clippy::too_many_arguments)]
fn process_slice(
    tile: &CsfTile,
    s: usize,
    m1: usize,
    m2: usize,
    k1: usize,
    k2: usize,
    factors: &[MatrixView<'_>],
    out_row: &mut [f64],
    scratch: &ScratchPool,
    ascending: bool,
) {
    let tid = scratch.current_slot();
    scratch.with_worker(tid, |ws| {
        let mut naccum = 0usize;
        for f in tile.children(0, s) {
            let acc = &mut ws.accum[naccum * k2..(naccum + 1) * k2];
            acc.fill(0.0);
            for jj in tile.children(1, f) {
                let c = tile.fid(2, jj) as usize;
                let v = tile.vals[jj];
                if v == 0.0 {
                    continue;
                }
                let row2 = factors[m2].row(c);
                for (d, &r2) in acc.iter_mut().zip(row2.iter()) {
                    *d += v * r2;
                }
            }
            ws.fids[naccum] = tile.fid(1, f);
            naccum += 1;
        }

        for idx in 0..naccum {
            let row1 = factors[m1].row(ws.fids[idx] as usize);
            ws.gather[idx * k1..(idx + 1) * k1].copy_from_slice(row1);
        }

        if ascending {
            batched_outer_add(&ws.gather[..naccum * k1], k1, &ws.accum[..naccum * k2], k2, out_row);
        } else {
            batched_outer_add(&ws.accum[..naccum * k2], k2, &ws.gather[..naccum * k1], k1, out_row);
        }
    });
}
