//! Leaf traversal: output mode `n = dim_perm[2]` (3-mode only).
//!
//! The leaf path trades a larger per-non-zero cost (one locked row update
//! per non-zero, not per fiber) for skipping the per-fiber reduction the
//! root and internal traversals need.
//!
//! `dim_perm[0]`/`dim_perm[1]` are visited in tree order, but `Y`'s columns
//! are ascending-mode-order; when `dim_perm[0] > dim_perm[1]` the two
//! micro-kernel operands are swapped (see
//! [`super::tree_pair_is_ascending`]).

use super::{tree_pair_is_ascending, SLICE_CHUNK};
use crate::locks::LockTable;
use crate::microkernel::outer;
use crate::scratch::ScratchPool;
use crate::shared_rows::SharedRows;
use rayon::prelude::*;
use ttmc_core::{CsfTile, MatrixView, MatrixViewMut};

/// Runs the 3-mode leaf traversal for output mode `dim_perm[2]`.
pub fn run(
    tile: &CsfTile,
    dim_perm: &[usize],
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
    scratch: &ScratchPool,
) {
    debug_assert_eq!(dim_perm.len(), 3, "leaf traversal is 3-mode specialized");
    let (m0, m1) = (dim_perm[0], dim_perm[1]);
    let k0 = factors[m0].cols();
    let k1 = factors[m1].cols();
    debug_assert_eq!(out.cols(), k0 * k1);
    let ascending = tree_pair_is_ascending(m0, m1);

    let shared = SharedRows::new(out);
    let locks = LockTable::global();
    let nfibs0 = tile.nfibs[0];

    tracing::trace!(nslices = nfibs0, k0, k1, "leaf traversal start");

    (0..nfibs0)
        .into_par_iter()
        .with_min_len(SLICE_CHUNK)
        .for_each(|s| {
            let r = tile.fid(0, s) as usize;
            let a_row = factors[m0].row(r);
            let tid = scratch.current_slot();
            scratch.with_worker(tid, |ws| {
                let slot2 = &mut ws.gather[..k0 * k1];
                for f in tile.children(0, s) {
                    let b_row = factors[m1].row(tile.fid(1, f) as usize);
                    if ascending {
                        outer(a_row, b_row, slot2);
                    } else {
                        outer(b_row, a_row, slot2);
                    }
                    for jj in tile.children(1, f) {
                        let c = tile.fid(2, jj) as usize;
                        let v = tile.vals[jj];
                        if v == 0.0 {
                            continue;
                        }
                        let _guard = locks.lock(c);
                        // SAFETY: holding the stripe lock for row `c`.
                        let out_row = unsafe { shared.row_mut(c) };
                        for (o, &s2) in out_row.iter_mut().zip(slot2.iter()) {
                            *o += v * s2;
                        }
                    }
                }
            });
        });
}
