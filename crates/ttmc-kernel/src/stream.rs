//! Coordinate-streaming kernel (§4.8): TTMc computed directly over raw
//! non-zeros, with no CSF tree at all.
//!
//! Every non-zero builds its own contribution independently (the
//! `Send + Sync` work rayon splits across non-zeros), folding factor rows
//! together from the largest non-output mode down to the smallest with
//! [`outer`], then making exactly one locked accumulation into the row it
//! targets. Building from largest to smallest mode, ending with the
//! smallest as the final locked add, yields the same ascending-mode-order
//! column layout [`crate::traversal::nmode`] produces — this kernel is the
//! ground truth the equivalence tests compare CSF traversals against.

use crate::locks::LockTable;
use crate::microkernel::{outer, outer_add};
use crate::shared_rows::SharedRows;
use rayon::prelude::*;
use ttmc_core::{CoordTensor, MatrixView, MatrixViewMut, TtmcOptions};

/// Computes the mode-`n` TTMc unfolding of `coord` directly, without a CSF.
///
/// `out` must already be zeroed and sized `coord.dims[n] x prod(K_m, m !=
/// n)`; this kernel only ever adds to it.
///
/// # Panics
///
/// Panics in debug builds on a dimension mismatch between `coord`,
/// `factors`, and `out`.
pub fn ttmc_stream(
    coord: &CoordTensor,
    factors: &[MatrixView<'_>],
    mut out: MatrixViewMut<'_>,
    mode: usize,
    options: &TtmcOptions,
) {
    let nmodes = coord.nmodes;
    debug_assert_eq!(factors.len(), nmodes);
    debug_assert_eq!(out.rows(), coord.dims[mode]);

    let mut others_desc: Vec<usize> = (0..nmodes).filter(|&m| m != mode).collect();
    others_desc.sort_unstable_by(|a, b| b.cmp(a));
    debug_assert!(!others_desc.is_empty(), "streaming requires at least 2 modes");

    let cols: usize = others_desc.iter().map(|&m| factors[m].cols()).product();
    debug_assert_eq!(out.cols(), cols);

    let shared = SharedRows::new(&mut out);
    let locks = LockTable::global();
    let nnz = coord.nnz();

    tracing::trace!(nnz, mode, cols, nthreads = options.nthreads, "coordinate streaming start");

    (0..nnz).into_par_iter().for_each(|k| {
        let v = coord.vals[k];
        if v == 0.0 {
            return;
        }
        let first_mode = others_desc[0];
        let first_row = factors[first_mode].row(coord.ind[first_mode][k] as usize);
        let mut curr: Vec<f64> = first_row.iter().map(|&x| v * x).collect();

        if others_desc.len() == 1 {
            let out_row_idx = coord.ind[mode][k] as usize;
            let _guard = locks.lock(out_row_idx);
            // SAFETY: holding the stripe lock for row `out_row_idx`.
            let out_row = unsafe { shared.row_mut(out_row_idx) };
            for (o, &c) in out_row.iter_mut().zip(curr.iter()) {
                *o += c;
            }
            return;
        }

        for &m in &others_desc[1..others_desc.len() - 1] {
            let row = factors[m].row(coord.ind[m][k] as usize);
            let mut next = vec![0.0; row.len() * curr.len()];
            outer(row, &curr, &mut next);
            curr = next;
        }

        let last_mode = *others_desc.last().expect("checked non-empty above");
        let last_row = factors[last_mode].row(coord.ind[last_mode][k] as usize);
        let out_row_idx = coord.ind[mode][k] as usize;
        let _guard = locks.lock(out_row_idx);
        // SAFETY: holding the stripe lock for row `out_row_idx`.
        let out_row = unsafe { shared.row_mut(out_row_idx) };
        outer_add(last_row, &curr, out_row);
    });
}
