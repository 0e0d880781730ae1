//! Top-level entry point (§4.10 / §6): owns the thread pool and scratch
//! allocation for one `ttmc` call and hands the rest to [`crate::dispatch`].

use crate::cost::max_fiber_and_outer_spans;
use crate::dispatch;
use crate::scratch::ScratchPool;
use ttmc_core::{Csf, MatrixView, MatrixViewMut, TileKind, TtmcError, TtmcOptions, TtmcResult};

/// Computes the mode-`mode` TTMc unfolding `Y` from `csf_handles` and
/// `factors`, per `options`.
///
/// Zero-fills `out` before the parallel region begins (the only write to
/// `Y` this crate performs without a lock), builds a scoped `rayon` thread
/// pool sized `options.nthreads`, sizes a [`ScratchPool`] from the largest
/// fiber and outer spans across every supplied handle, and dispatches.
///
/// `ncolumns[m]` must equal `factors[m].cols()`; kept as an explicit
/// parameter (rather than re-derived from `factors`) so a caller can size
/// buffers before factors are fully populated.
///
/// # Errors
///
/// Returns [`TtmcError::FatalTiling`] if any handle is tiled,
/// [`TtmcError::UnsupportedAllocScheme`] if the handle count or the
/// requested mode isn't admissible under `options.csf_alloc`, and
/// [`TtmcError::ScratchAllocationFailed`] if the thread pool fails to
/// build.
///
/// # Panics
///
/// Panics in debug builds if `ncolumns[m] != factors[m].cols()` for any
/// mode; that is a precondition violation, not a recoverable error.
pub fn ttmc(
    mode: usize,
    ncolumns: &[usize],
    csf_handles: &[Csf],
    factors: &[MatrixView<'_>],
    mut out: MatrixViewMut<'_>,
    options: &TtmcOptions,
) -> TtmcResult<()> {
    debug_assert_eq!(ncolumns.len(), factors.len(), "ncolumns/factors rank mismatch");
    debug_assert!(
        ncolumns.iter().zip(factors).all(|(&k, f)| k == f.cols()),
        "ncolumns must match each factor's column count"
    );

    for handle in csf_handles {
        if handle.which_tile != TileKind::NoTile {
            return Err(TtmcError::FatalTiling { kind: handle.which_tile });
        }
    }

    let nmodes = csf_handles.first().map(|h| h.nmodes).unwrap_or(ncolumns.len());
    let want_handles = options.csf_alloc.expected_handle_count(nmodes);
    if csf_handles.len() != want_handles {
        return Err(TtmcError::UnsupportedAllocScheme {
            scheme: options.csf_alloc,
            reason: format!("expected {want_handles} CSF handle(s) for {nmodes} modes, got {}", csf_handles.len()),
        });
    }

    tracing::info!(mode, nmodes, nthreads = options.nthreads, csf_alloc = ?options.csf_alloc, "ttmc start");
    out.clear();

    let max_fiber_len =
        csf_handles.iter().map(|h| max_fiber_and_outer_spans(&h.tiles[0]).0).max().unwrap_or(0).max(1);
    let max_outer_count =
        csf_handles.iter().map(|h| max_fiber_and_outer_spans(&h.tiles[0]).1).max().unwrap_or(0).max(1);
    let max_k = factors.iter().map(|f| f.cols()).max().unwrap_or(1).max(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.nthreads.max(1))
        .build()
        .map_err(|e| TtmcError::ScratchAllocationFailed { reason: e.to_string() })?;

    // `gather`'s width must cover both the root traversal's
    // `max_outer_count * k1` rank-update batch and the leaf traversal's
    // `k0 * k1` per-fiber outer product, so it's sized by whichever of
    // `max_outer_count` or `max_k` is larger.
    let scratch = ScratchPool::new(
        pool.current_num_threads(),
        max_fiber_len,
        max_k,
        max_outer_count.max(max_k),
        max_k,
    );

    let result = pool.install(|| dispatch::run(mode, csf_handles, factors, &mut out, options, &scratch));
    tracing::info!(mode, ok = result.is_ok(), "ttmc done");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttmc_core::{CsfAllocScheme, CsfTile};

    #[test]
    fn end_to_end_matches_scenario_s1() {
        let csf = Csf {
            nmodes: 3,
            dims: vec![2, 2, 2],
            dim_perm: vec![0, 1, 2],
            which_tile: TileKind::NoTile,
            tiles: vec![CsfTile {
                nfibs: vec![1, 1, 1],
                fptr: vec![vec![0, 1], vec![0, 1]],
                fids: vec![Some(vec![0]), Some(vec![1]), Some(vec![0])],
                vals: vec![3.0],
            }],
        };
        let u0 = vec![2.0, 5.0];
        let u1 = vec![7.0, 11.0];
        let u2 = vec![13.0, 17.0];
        let factors = vec![
            MatrixView::new(2, 1, &u0),
            MatrixView::new(2, 1, &u1),
            MatrixView::new(2, 1, &u2),
        ];
        let mut ybuf = vec![9.0; 2];
        let y = MatrixViewMut::new(2, 1, &mut ybuf);
        let options = TtmcOptions { nthreads: 2, csf_alloc: CsfAllocScheme::OneMode, ..TtmcOptions::default() };

        ttmc(0, &[1, 1, 1], &[csf], &factors, y, &options).unwrap();

        assert!((ybuf[0] - 429.0).abs() < 1e-10);
        assert_eq!(ybuf[1], 0.0);
    }

    #[test]
    fn rejects_wrong_handle_count_before_clearing_y() {
        let csf = Csf {
            nmodes: 3,
            dims: vec![2, 2, 2],
            dim_perm: vec![0, 1, 2],
            which_tile: TileKind::NoTile,
            tiles: vec![CsfTile::default()],
        };
        let buf = vec![1.0; 2];
        let factors = vec![MatrixView::new(2, 1, &buf), MatrixView::new(2, 1, &buf), MatrixView::new(2, 1, &buf)];
        let mut ybuf = vec![9.0; 2];
        let y = MatrixViewMut::new(2, 1, &mut ybuf);
        let options = TtmcOptions { csf_alloc: CsfAllocScheme::TwoMode, ..TtmcOptions::default() };

        let err = ttmc(0, &[1, 1, 1], &[csf], &factors, y, &options).unwrap_err();

        assert!(matches!(err, TtmcError::UnsupportedAllocScheme { .. }));
        assert_eq!(ybuf, vec![9.0, 9.0], "Y must stay untouched when handle validation fails");
    }
}
