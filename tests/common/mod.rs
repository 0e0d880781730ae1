//! Shared CSF-from-coordinate builder for integration tests.
//!
//! Building a CSF from a coordinate tensor is explicitly out of scope for
//! the library (see `ttmc_core::csf`'s module doc) but integration tests
//! still need *some* CSF to exercise the traversals against a larger
//! fixture than it's practical to hand-write. This assumes every index
//! tuple in `coord` is unique (no duplicate non-zeros to sum together).

use std::cmp::Ordering;
use ttmc::{Csf, CsfTile, CoordTensor, TileKind};

pub fn build_csf(coord: &CoordTensor, dim_perm: &[usize]) -> Csf {
    let nmodes = coord.nmodes;
    let nnz = coord.nnz();
    let mut order: Vec<usize> = (0..nnz).collect();
    order.sort_by(|&a, &b| {
        for &m in dim_perm {
            match coord.ind[m][a].cmp(&coord.ind[m][b]) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    });

    let mut level_ranges: Vec<(usize, usize)> = vec![(0, nnz)];
    let mut nfibs = vec![0usize; nmodes];
    let mut fptr: Vec<Vec<u64>> = vec![Vec::new(); nmodes.saturating_sub(1)];
    let mut fids: Vec<Option<Vec<u32>>> = vec![None; nmodes];

    for d in 0..nmodes {
        let mode = dim_perm[d];
        let mut new_ranges = Vec::new();
        let mut ptr = vec![0u64];
        for &(start, end) in &level_ranges {
            let mut i = start;
            while i < end {
                let mut j = i + 1;
                while j < end && coord.ind[mode][order[j]] == coord.ind[mode][order[i]] {
                    j += 1;
                }
                new_ranges.push((i, j));
                i = j;
            }
            ptr.push(new_ranges.len() as u64);
        }
        nfibs[d] = new_ranges.len();
        fids[d] = Some(new_ranges.iter().map(|&(i, _)| coord.ind[mode][order[i]]).collect());
        if d > 0 {
            fptr[d - 1] = ptr;
        }
        level_ranges = new_ranges;
    }

    let vals = level_ranges.iter().map(|&(i, _)| coord.vals[order[i]]).collect();

    let csf = Csf {
        nmodes,
        dims: coord.dims.clone(),
        dim_perm: dim_perm.to_vec(),
        which_tile: TileKind::NoTile,
        tiles: vec![CsfTile { nfibs, fptr, fids, vals }],
    };
    debug_assert!(csf.check_invariants(), "test-built CSF violated its own invariants");
    csf
}

/// A deterministic, not-actually-random synthetic tensor: dense over
/// `dims` with every cell present, value `f(i,j,k,...) = 1 + (weighted
/// index sum) % 13`. Big enough to exercise multi-fiber, multi-slice
/// traversal paths without relying on any RNG crate.
pub fn synthetic_dense_coord(dims: &[usize]) -> CoordTensor {
    let nmodes = dims.len();
    let mut ind: Vec<Vec<u32>> = vec![Vec::new(); nmodes];
    let mut vals = Vec::new();

    let total: usize = dims.iter().product();
    for flat in 0..total {
        let mut rem = flat;
        let mut idx = vec![0usize; nmodes];
        for m in (0..nmodes).rev() {
            idx[m] = rem % dims[m];
            rem /= dims[m];
        }
        let weighted: usize = idx.iter().enumerate().map(|(m, &i)| i * (m + 2)).sum();
        vals.push(1.0 + (weighted % 13) as f64);
        for m in 0..nmodes {
            ind[m].push(idx[m] as u32);
        }
    }

    CoordTensor { nmodes, dims: dims.to_vec(), ind, vals }
}

/// Same dense index layout as [`synthetic_dense_coord`], but with
/// caller-supplied values (`vals.len()` must equal `dims.iter().product()`).
/// Lets property tests vary values while keeping a fixed, unique index set.
pub fn dense_coord_with_vals(dims: &[usize], vals: Vec<f64>) -> CoordTensor {
    let nmodes = dims.len();
    let total: usize = dims.iter().product();
    assert_eq!(vals.len(), total);

    let mut ind: Vec<Vec<u32>> = vec![Vec::new(); nmodes];
    for flat in 0..total {
        let mut rem = flat;
        let mut idx = vec![0usize; nmodes];
        for m in (0..nmodes).rev() {
            idx[m] = rem % dims[m];
            rem /= dims[m];
        }
        for m in 0..nmodes {
            ind[m].push(idx[m] as u32);
        }
    }

    CoordTensor { nmodes, dims: dims.to_vec(), ind, vals }
}
