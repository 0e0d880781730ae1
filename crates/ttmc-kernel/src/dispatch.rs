//! Dispatcher (§4.7): routes a requested output mode to the traversal that
//! can serve it, given the caller's [`CsfAllocScheme`].
//!
//! - `OneMode`/`TwoMode` assume a 3-mode-specialized tree: root/internal/leaf
//!   traversal is chosen by the output mode's depth in `dim_perm`. Neither
//!   scheme generalizes past 3 modes for an internal or leaf output — only
//!   the root position is executable for `nmodes > 3` under these schemes.
//! - `AllMode` sidesteps that limit entirely: every mode gets its own tree
//!   rooted at itself, so every output mode always executes as a root
//!   traversal, 3-mode specialized or general (`nmode`) as `nmodes` dictates.

use crate::scratch::ScratchPool;
use crate::traversal::{internal, leaf, nmode, root};
use ttmc_core::{Csf, CsfAllocScheme, MatrixView, MatrixViewMut, TileKind, TtmcError, TtmcOptions, TtmcResult};

/// Routes `mode`'s TTMc to the right traversal across `csf_handles`, per
/// `options.csf_alloc`.
///
/// # Panics
///
/// Panics in debug builds if `options.tile != TileKind::NoTile` has already
/// been checked by the caller (this function still checks it defensively
/// and returns an error rather than panicking, since a malformed `Csf` can
/// arrive from outside this crate).
pub fn run(
    mode: usize,
    csf_handles: &[Csf],
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
    options: &TtmcOptions,
    scratch: &ScratchPool,
) -> TtmcResult<()> {
    for handle in csf_handles {
        if handle.which_tile != TileKind::NoTile {
            return Err(TtmcError::FatalTiling { kind: handle.which_tile });
        }
    }

    match options.csf_alloc {
        CsfAllocScheme::OneMode => run_one_mode(mode, csf_handles, factors, out, scratch),
        CsfAllocScheme::TwoMode => run_two_mode(mode, csf_handles, factors, out, scratch),
        CsfAllocScheme::AllMode => run_all_mode(mode, csf_handles, factors, out, scratch),
    }
}

fn require_handle_count(scheme: CsfAllocScheme, got: usize, nmodes: usize) -> TtmcResult<()> {
    let want = scheme.expected_handle_count(nmodes);
    if got != want {
        return Err(TtmcError::UnsupportedAllocScheme {
            scheme,
            reason: format!("expected {want} CSF handle(s) for {nmodes} modes, got {got}"),
        });
    }
    Ok(())
}

fn run_one_mode(
    mode: usize,
    csf_handles: &[Csf],
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
    scratch: &ScratchPool,
) -> TtmcResult<()> {
    let handle = &csf_handles[0];
    require_handle_count(CsfAllocScheme::OneMode, csf_handles.len(), handle.nmodes)?;
    run_rooted_or_specialized(handle, mode, factors, out, scratch, CsfAllocScheme::OneMode)
}

fn run_two_mode(
    mode: usize,
    csf_handles: &[Csf],
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
    scratch: &ScratchPool,
) -> TtmcResult<()> {
    let general = &csf_handles[0];
    require_handle_count(CsfAllocScheme::TwoMode, csf_handles.len(), general.nmodes)?;
    let leaf_mode = general.dim_perm[general.nmodes - 1];

    if mode == leaf_mode {
        let specialized = &csf_handles[1];
        if specialized.dim_perm[0] != mode {
            return Err(TtmcError::UnsupportedAllocScheme {
                scheme: CsfAllocScheme::TwoMode,
                reason: "the leaf-specialized handle must be rooted at its own mode".to_string(),
            });
        }
        run_root(specialized, factors, out, scratch);
        return Ok(());
    }

    run_rooted_or_specialized(general, mode, factors, out, scratch, CsfAllocScheme::TwoMode)
}

fn run_all_mode(
    mode: usize,
    csf_handles: &[Csf],
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
    scratch: &ScratchPool,
) -> TtmcResult<()> {
    let nmodes = csf_handles.first().map(|h| h.nmodes).unwrap_or(0);
    require_handle_count(CsfAllocScheme::AllMode, csf_handles.len(), nmodes)?;

    let handle = csf_handles
        .iter()
        .find(|h| h.dim_perm.first() == Some(&mode))
        .ok_or_else(|| TtmcError::UnsupportedAllocScheme {
            scheme: CsfAllocScheme::AllMode,
            reason: format!("no handle is rooted at mode {mode}"),
        })?;
    run_root(handle, factors, out, scratch);
    Ok(())
}

/// Dispatches on `handle`'s depth for `mode`: root always works; internal
/// and leaf require exactly 3 modes.
fn run_rooted_or_specialized(
    handle: &Csf,
    mode: usize,
    factors: &[MatrixView<'_>],
    out: &mut MatrixViewMut<'_>,
    scratch: &ScratchPool,
    scheme: CsfAllocScheme,
) -> TtmcResult<()> {
    let depth = handle.depth_of_mode(mode);
    if depth == 0 {
        run_root(handle, factors, out, scratch);
        return Ok(());
    }
    if handle.nmodes != 3 {
        return Err(TtmcError::UnsupportedAllocScheme {
            scheme,
            reason: format!(
                "mode {mode} sits at depth {depth} of a {}-mode tree; only the root position \
                 generalizes past 3 modes under this allocation scheme",
                handle.nmodes
            ),
        });
    }
    let tile = &handle.tiles[0];
    if depth == 1 {
        internal::run(tile, &handle.dim_perm, factors, out, scratch);
    } else {
        leaf::run(tile, &handle.dim_perm, factors, out, scratch);
    }
    Ok(())
}

fn run_root(handle: &Csf, factors: &[MatrixView<'_>], out: &mut MatrixViewMut<'_>, scratch: &ScratchPool) {
    let tile = &handle.tiles[0];
    if handle.nmodes == 3 {
        root::run(tile, &handle.dim_perm, factors, out, scratch);
    } else {
        nmode::run(tile, &handle.dim_perm, factors, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttmc_core::CsfTile;

    fn fixture_3mode() -> (Csf, Vec<f64>, Vec<f64>, Vec<f64>) {
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
        (csf, vec![2.0, 5.0], vec![7.0, 11.0], vec![13.0, 17.0])
    }

    #[test]
    fn one_mode_routes_root_depth_to_root_traversal() {
        let (csf, u0, u1, u2) = fixture_3mode();
        let factors = vec![
            MatrixView::new(2, 1, &u0),
            MatrixView::new(2, 1, &u1),
            MatrixView::new(2, 1, &u2),
        ];
        let mut ybuf = vec![0.0; 2];
        let mut y = MatrixViewMut::new(2, 1, &mut ybuf);
        let scratch = ScratchPool::new(1, 4, 1, 4, 1);
        let options = TtmcOptions { csf_alloc: CsfAllocScheme::OneMode, ..TtmcOptions::default() };

        run(0, std::slice::from_ref(&csf), &factors, &mut y, &options, &scratch).unwrap();

        assert!((ybuf[0] - 429.0).abs() < 1e-10);
    }

    #[test]
    fn one_mode_rejects_internal_output_on_a_4mode_tree() {
        let csf = Csf {
            nmodes: 4,
            dims: vec![2, 2, 2, 2],
            dim_perm: vec![0, 1, 2, 3],
            which_tile: TileKind::NoTile,
            tiles: vec![CsfTile::default()],
        };
        let buf = vec![1.0; 2];
        let factors = vec![
            MatrixView::new(2, 1, &buf),
            MatrixView::new(2, 1, &buf),
            MatrixView::new(2, 1, &buf),
            MatrixView::new(2, 1, &buf),
        ];
        let mut ybuf = vec![0.0; 8];
        let mut y = MatrixViewMut::new(2, 4, &mut ybuf);
        let scratch = ScratchPool::new(1, 4, 1, 4, 1);
        let options = TtmcOptions { csf_alloc: CsfAllocScheme::OneMode, ..TtmcOptions::default() };

        let err = run(1, std::slice::from_ref(&csf), &factors, &mut y, &options, &scratch).unwrap_err();
        assert!(matches!(err, TtmcError::UnsupportedAllocScheme { .. }));
    }

    #[test]
    fn fatal_tiling_is_reported_for_non_notile_handles() {
        let mut csf = fixture_3mode().0;
        csf.which_tile = TileKind::DenseTile;
        let buf = vec![1.0; 2];
        let factors = vec![MatrixView::new(2, 1, &buf), MatrixView::new(2, 1, &buf), MatrixView::new(2, 1, &buf)];
        let mut ybuf = vec![0.0; 2];
        let mut y = MatrixViewMut::new(2, 1, &mut ybuf);
        let scratch = ScratchPool::new(1, 4, 1, 4, 1);
        let options = TtmcOptions::default();

        let err = run(0, std::slice::from_ref(&csf), &factors, &mut y, &options, &scratch).unwrap_err();
        assert!(matches!(err, TtmcError::FatalTiling { kind: TileKind::DenseTile }));
    }
}
