//! Internal traversal: output mode `n = dim_perm[1]`, a middle level (3-mode
//! only).
//!
//! Unlike the root traversal, more than one slice can target the same
//! output row here, so every row update is serialized by the stripe lock
//! table.
//!
//! `dim_perm[0]`/`dim_perm[2]` are visited in tree order, but `Y`'s columns
//! are ascending-mode-order; when `dim_perm[0] > dim_perm[2]` the two
//! micro-kernel operands are swapped (see
//! [`super::tree_pair_is_ascending`]).

use super::{tree_pair_is_ascending, SLICE_CHUNK};
use crate::locks::LockTable;
use crate::microkernel::outer_add;
use crate::scratch::ScratchPool;
use crate::shared_rows::SharedRows;
use rayon::prelude::*;
use ttmc_core::{CsfTile, MatrixView, MatrixViewMut};

/// Runs the 3-mode internal traversal for output mode `dim_perm[1]`.
pub fn run(
    tile: &CsfTile,
    dim_perm: &[usize],
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
    scratch: &ScratchPool,
) {
    debug_assert_eq!(dim_perm.len(), 3, "internal traversal is 3-mode specialized");
    let (m0, m2) = (dim_perm[0], dim_perm[2]);
    let k0 = factors[m0].cols();
    let k2 = factors[m2].cols();
    debug_assert_eq!(out.cols(), k0 * k2);
    let ascending = tree_pair_is_ascending(m0, m2);

    let shared = SharedRows::new(out);
    let locks = LockTable::global();
    let nfibs0 = tile.nfibs[0];

    tracing::trace!(nslices = nfibs0, k0, k2, "internal traversal start");

    (0..nfibs0)
        .into_par_iter()
        .with_min_len(SLICE_CHUNK)
        .for_each(|s| {
            let r = tile.fid(0, s) as usize;
            let a_row = factors[m0].row(r);
            let tid = scratch.current_slot();
            scratch.with_worker(tid, |ws| {
                for f in tile.children(0, s) {
                    let o = tile.fid(1, f) as usize;
                    let acc = &mut ws.accum[..k2];
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
                    let _guard = locks.lock(o);
                    // SAFETY: holding the stripe lock for row `o`.
                    let out_row = unsafe { shared.row_mut(o) };
                    if ascending {
                        outer_add(a_row, acc, out_row);
                    } else {
                        outer_add(acc, a_row, out_row);
                    }
                }
            });
        });
}
