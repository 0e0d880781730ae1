//! End-to-end correctness: the same 3-nonzero tensor's mode-0/1/2
//! unfoldings, computed three independent ways (`OneMode` CSF, `AllMode`
//! CSF, and coordinate streaming), must all agree with hand-derived
//! expected values.
//!
//! Tensor: 2x2x2, X[0,0,0]=1, X[0,1,1]=2, X[1,0,1]=3. Factor columns are
//! rank-1: u0=[2,3], u1=[5,7], u2=[11,13].

use ttmc::{ttmc, ttmc_stream, Csf, CsfAllocScheme, CsfTile, CoordTensor, MatrixView, MatrixViewMut, TileKind, TtmcOptions};

const U0: [f64; 2] = [2.0, 3.0];
const U1: [f64; 2] = [5.0, 7.0];
const U2: [f64; 2] = [11.0, 13.0];

const EXPECTED_MODE0: [f64; 2] = [237.0, 195.0];
const EXPECTED_MODE1: [f64; 2] = [139.0, 52.0];
const EXPECTED_MODE2: [f64; 2] = [10.0, 73.0];

fn factors() -> Vec<MatrixView<'static>> {
    vec![MatrixView::new(2, 1, &U0), MatrixView::new(2, 1, &U1), MatrixView::new(2, 1, &U2)]
}

/// Root = mode 0, internal = mode 1, leaf = mode 2: all three specialized
/// 3-mode traversals from a single shared tree.
fn csf_rooted_at_mode0() -> Csf {
    Csf {
        nmodes: 3,
        dims: vec![2, 2, 2],
        dim_perm: vec![0, 1, 2],
        which_tile: TileKind::NoTile,
        tiles: vec![CsfTile {
            nfibs: vec![2, 3, 3],
            fptr: vec![vec![0, 2, 3], vec![0, 1, 2, 3]],
            fids: vec![Some(vec![0, 1]), Some(vec![0, 1, 0]), Some(vec![0, 1, 1])],
            vals: vec![1.0, 2.0, 3.0],
        }],
    }
}

fn csf_rooted_at_mode1() -> Csf {
    Csf {
        nmodes: 3,
        dims: vec![2, 2, 2],
        dim_perm: vec![1, 0, 2],
        which_tile: TileKind::NoTile,
        tiles: vec![CsfTile {
            nfibs: vec![2, 3, 3],
            fptr: vec![vec![0, 2, 3], vec![0, 1, 2, 3]],
            fids: vec![Some(vec![0, 1]), Some(vec![0, 1, 0]), Some(vec![0, 1, 1])],
            vals: vec![1.0, 3.0, 2.0],
        }],
    }
}

fn csf_rooted_at_mode2() -> Csf {
    Csf {
        nmodes: 3,
        dims: vec![2, 2, 2],
        dim_perm: vec![2, 0, 1],
        which_tile: TileKind::NoTile,
        tiles: vec![CsfTile {
            nfibs: vec![2, 3, 3],
            fptr: vec![vec![0, 1, 3], vec![0, 1, 2, 3]],
            fids: vec![Some(vec![0, 1]), Some(vec![0, 0, 1]), Some(vec![0, 1, 0])],
            vals: vec![1.0, 2.0, 3.0],
        }],
    }
}

fn coord() -> CoordTensor {
    CoordTensor {
        nmodes: 3,
        dims: vec![2, 2, 2],
        ind: vec![vec![0, 0, 1], vec![0, 1, 0], vec![0, 1, 1]],
        vals: vec![1.0, 2.0, 3.0],
    }
}

fn run_one_mode(mode: usize) -> Vec<f64> {
    let factors = factors();
    let mut ybuf = vec![0.0; 2];
    let y = MatrixViewMut::new(2, 1, &mut ybuf);
    let options = TtmcOptions { csf_alloc: CsfAllocScheme::OneMode, ..TtmcOptions::default() };
    ttmc(mode, &[1, 1, 1], &[csf_rooted_at_mode0()], &factors, y, &options).unwrap();
    ybuf
}

fn run_all_mode(mode: usize) -> Vec<f64> {
    let factors = factors();
    let mut ybuf = vec![0.0; 2];
    let y = MatrixViewMut::new(2, 1, &mut ybuf);
    let options = TtmcOptions { csf_alloc: CsfAllocScheme::AllMode, ..TtmcOptions::default() };
    let handles = [csf_rooted_at_mode0(), csf_rooted_at_mode1(), csf_rooted_at_mode2()];
    ttmc(mode, &[1, 1, 1], &handles, &factors, y, &options).unwrap();
    ybuf
}

fn run_coord(mode: usize) -> Vec<f64> {
    let factors = factors();
    let mut ybuf = vec![0.0; 2];
    let mut y = MatrixViewMut::new(2, 1, &mut ybuf);
    y.clear();
    ttmc_stream(&coord(), &factors, y, mode, &TtmcOptions::default());
    ybuf
}

fn assert_close(got: &[f64], want: &[f64]) {
    for (g, w) in got.iter().zip(want.iter()) {
        assert!((g - w).abs() < 1e-9, "got {got:?}, want {want:?}");
    }
}

#[test]
fn one_mode_root_traversal_matches_hand_derived_mode0() {
    assert_close(&run_one_mode(0), &EXPECTED_MODE0);
}

#[test]
fn one_mode_internal_traversal_matches_hand_derived_mode1() {
    assert_close(&run_one_mode(1), &EXPECTED_MODE1);
}

#[test]
fn one_mode_leaf_traversal_matches_hand_derived_mode2() {
    assert_close(&run_one_mode(2), &EXPECTED_MODE2);
}

#[test]
fn all_mode_agrees_with_one_mode_on_every_output() {
    assert_close(&run_all_mode(0), &EXPECTED_MODE0);
    assert_close(&run_all_mode(1), &EXPECTED_MODE1);
    assert_close(&run_all_mode(2), &EXPECTED_MODE2);
}

#[test]
fn coordinate_streaming_agrees_with_csf_traversal_on_every_output() {
    assert_close(&run_coord(0), &EXPECTED_MODE0);
    assert_close(&run_coord(1), &EXPECTED_MODE1);
    assert_close(&run_coord(2), &EXPECTED_MODE2);
}

#[test]
fn two_mode_leaf_specialization_matches_one_mode() {
    let factors = factors();
    let mut ybuf = vec![0.0; 2];
    let y = MatrixViewMut::new(2, 1, &mut ybuf);
    let options = TtmcOptions { csf_alloc: CsfAllocScheme::TwoMode, ..TtmcOptions::default() };
    // general tree rooted at mode0 (leaf = mode2), specialized tree rooted at mode2.
    let handles = [csf_rooted_at_mode0(), csf_rooted_at_mode2()];
    ttmc(2, &[1, 1, 1], &handles, &factors, y, &options).unwrap();
    assert_close(&ybuf, &EXPECTED_MODE2);
}

#[test]
fn a_zero_valued_nonzero_contributes_nothing() {
    let mut csf = csf_rooted_at_mode0();
    csf.tiles[0].vals[0] = 0.0;
    let factors = factors();
    let mut ybuf = vec![0.0; 2];
    let y = MatrixViewMut::new(2, 1, &mut ybuf);
    let options = TtmcOptions::default();
    ttmc(0, &[1, 1, 1], &[csf], &factors, y, &options).unwrap();
    // Removing nz0's contribution (1 * 5 * 11 = 55) from Y[0].
    assert!((ybuf[0] - (EXPECTED_MODE0[0] - 55.0)).abs() < 1e-9);
    assert!((ybuf[1] - EXPECTED_MODE0[1]).abs() < 1e-9);
}
