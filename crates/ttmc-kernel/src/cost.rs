//! Flop cost model (§4.9) and CSF sizing helpers.
//!
//! [`max_fiber_and_outer_spans`] is an exact scan of a built [`CsfTile`],
//! used to size [`crate::scratch::ScratchPool`] before a traversal. The rest
//! of this module is an *estimator*: before any CSF is built, compare
//! candidate allocation strategies (one shared tree, two trees, one tree per
//! mode, a caller's own ordering, or no tree at all) purely from a
//! [`CoordTensor`]'s shape. It cannot know the real fiber counts a given
//! ordering would produce without sorting the non-zeros, so it approximates
//! them: the number of distinct indices a mode takes on, log-interpolated
//! against `nnz`, stands in for "how many tree nodes this mode would own at
//! this depth." The result is a ranking aid, not a flop counter.

use std::collections::HashSet;
use ttmc_core::{Csf, CsfTile, TtmcOptions};

/// Scans a tile once for `(max_fiber_len, max_outer_count)`:
///
/// - `max_fiber_len`: the most children any single tree node owns at any
///   level. Bounds the leaf-traversal gather and the internal-traversal
///   per-fiber accumulation.
/// - `max_outer_count`: the most level-1 fibers any single slice owns.
///   Bounds the root traversal's batched rank-update width.
///
/// Both are needed to size [`crate::scratch::ScratchPool`] once, up front,
/// for the whole traversal.
pub fn max_fiber_and_outer_spans(tile: &CsfTile) -> (usize, usize) {
    let mut max_fiber_len = 0usize;
    for fptr in &tile.fptr {
        max_fiber_len = max_fiber_len.max(fptr.windows(2).map(|w| (w[1] - w[0]) as usize).max().unwrap_or(0));
    }
    let max_outer_count = tile
        .fptr
        .first()
        .map(|fptr| fptr.windows(2).map(|w| (w[1] - w[0]) as usize).max().unwrap_or(0))
        .unwrap_or(0);
    (max_fiber_len, max_outer_count)
}

/// Per tensor mode `m`, the largest span any non-leaf level owns across
/// every handle in `csf_handles` where `m` appears — i.e. `max` over every
/// handle and every depth `d < nmodes - 1` with `dim_perm[d] == m` of that
/// level's largest child count. Used by callers to size scratch keyed by
/// mode rather than by handle, since a mode can appear at a different depth
/// (or in more than one handle, under `AllMode`) across the handles passed
/// to a single call.
///
/// # Panics
///
/// Panics in debug builds if any handle carries a tile kind other than
/// [`ttmc_core::TileKind::NoTile`] or has more than one tile; both are
/// configuration errors this crate's traversals cannot execute (see
/// [`crate::dispatch`]).
pub fn ttmc_largest_outer(csf_handles: &[Csf], _options: &TtmcOptions) -> Vec<usize> {
    let nmodes = csf_handles.first().map(|csf| csf.nmodes).unwrap_or(0);
    let mut per_mode = vec![0usize; nmodes];

    for csf in csf_handles {
        debug_assert_eq!(csf.ntiles(), 1, "cost model assumes one NOTILE tile per handle");
        debug_assert_eq!(csf.nmodes, nmodes, "every handle in a call must share the same tensor order");
        let tile = &csf.tiles[0];
        for (d, fptr) in tile.fptr.iter().enumerate() {
            let mode = csf.dim_perm[d];
            let span = fptr.windows(2).map(|w| (w[1] - w[0]) as usize).max().unwrap_or(0);
            per_mode[mode] = per_mode[mode].max(span);
        }
    }
    per_mode
}

/// Estimated flop cost, per output mode and per candidate strategy, of
/// computing that mode's TTMc unfolding from a coordinate tensor's shape
/// alone. Each field has one entry per output mode (`table[n][j]` in
/// spec terms, transposed into named columns rather than a raw `[N][N]`
/// matrix).
#[derive(Debug, Clone, PartialEq)]
pub struct FlopTable {
    /// One shared CSF (`CsfAllocScheme::OneMode`): every output mode is read
    /// from the same tree, built with modes ordered by the heuristic in
    /// [`heuristic_order`].
    pub csf1: Vec<f64>,
    /// Two CSFs (`CsfAllocScheme::TwoMode`): the heuristic tree handles every
    /// mode except the one it placed at its leaf, which gets its own
    /// root-optimized tree instead.
    pub csf2: Vec<f64>,
    /// One CSF per mode (`CsfAllocScheme::AllMode`): every mode gets its own
    /// tree, each ordered to minimize that mode's own cost.
    pub csfa: Vec<f64>,
    /// The handpicked best-per-mode strategy: for each mode, the minimum of
    /// `csf1`/`csf2`/`csfa` at that mode — what a caller choosing per-mode
    /// allocation schemes, rather than one scheme for every mode, could
    /// achieve.
    pub custom: Vec<f64>,
    /// Straight coordinate streaming for every mode: no tree, no reuse.
    /// `coord[n] == nnz * prod_{m != n} nfactors[m]`.
    pub coord: Vec<f64>,
}

/// Fills a [`FlopTable`] comparing CSF allocation strategies for `coord`,
/// given the column counts (`nfactors[m]`) the caller intends to multiply
/// mode `m` by.
///
/// # Panics
///
/// Panics in debug builds if `nfactors.len() != coord.nmodes`.
pub fn ttmc_fill_flop_tbl(coord: &ttmc_core::CoordTensor, nfactors: &[usize]) -> FlopTable {
    debug_assert_eq!(nfactors.len(), coord.nmodes, "nfactors rank mismatch");
    let nmodes = coord.nmodes;
    let nnz = coord.nnz() as f64;
    let distinct = distinct_counts(coord);

    let heuristic: Vec<usize> = heuristic_order(&distinct, nfactors);
    let leaf_mode = *heuristic.last().expect("nmodes >= 1");
    let leaf_specialized = best_order_excluding(leaf_mode, &distinct, nfactors);

    let mut csf1 = vec![0.0; nmodes];
    let mut csf2 = vec![0.0; nmodes];
    let mut csfa = vec![0.0; nmodes];
    let mut coord_row = vec![0.0; nmodes];

    for n in 0..nmodes {
        let others_heuristic: Vec<usize> = heuristic.iter().copied().filter(|&m| m != n).collect();
        let others_best = best_order_excluding(n, &distinct, nfactors);

        csf1[n] = unfold_cost(&others_heuristic, &distinct, nfactors, nnz);
        csfa[n] = unfold_cost(&others_best, &distinct, nfactors, nnz);
        csf2[n] = if n == leaf_mode {
            unfold_cost(&leaf_specialized, &distinct, nfactors, nnz)
        } else {
            unfold_cost(&others_heuristic, &distinct, nfactors, nnz)
        };

        let coord_prod: f64 = (0..nmodes).filter(|&m| m != n).map(|m| nfactors[m] as f64).product();
        coord_row[n] = nnz * coord_prod;
    }

    let custom: Vec<f64> =
        (0..nmodes).map(|n| csf1[n].min(csf2[n]).min(csfa[n])).collect();

    tracing::debug!(
        nmodes,
        nnz,
        csf1_total = csf1.iter().sum::<f64>(),
        csf2_total = csf2.iter().sum::<f64>(),
        csfa_total = csfa.iter().sum::<f64>(),
        custom_total = custom.iter().sum::<f64>(),
        coord_total = coord_row.iter().sum::<f64>(),
        "flop table filled"
    );

    FlopTable { csf1, csf2, csfa, custom, coord: coord_row }
}

/// Distinct index count per mode: `distinct[m] = |{ coord.ind[m][k] }|`.
fn distinct_counts(coord: &ttmc_core::CoordTensor) -> Vec<usize> {
    (0..coord.nmodes)
        .map(|m| coord.ind[m].iter().collect::<HashSet<_>>().len())
        .collect()
}

/// Orders every mode by descending distinct-index count (more distinct
/// values near the root means more tree compression near the top) with
/// ties, and the very last slot, broken toward ascending column count (a
/// cheap factor to multiply the whole non-zero set by at the leaf).
fn heuristic_order(distinct: &[usize], nfactors: &[usize]) -> Vec<usize> {
    let mut modes: Vec<usize> = (0..distinct.len()).collect();
    modes.sort_by(|&a, &b| distinct[b].cmp(&distinct[a]).then(nfactors[a].cmp(&nfactors[b])));
    modes
}

/// The heuristic order over every mode except `excluded`, used to root a
/// tree specifically at `excluded`'s output.
fn best_order_excluding(excluded: usize, distinct: &[usize], nfactors: &[usize]) -> Vec<usize> {
    heuristic_order(distinct, nfactors).into_iter().filter(|&m| m != excluded).collect()
}

/// Estimated cost of reducing non-zeros down to one mode's unfolding,
/// through a tree whose non-output modes are ordered `others` (root to
/// leaf). Grounded in [`crate::traversal::nmode::reduce_node`]'s shape: a
/// `K * child_len` outer product at every internal node, plus one
/// `K_last`-sized scale per leaf.
fn unfold_cost(others: &[usize], distinct: &[usize], nfactors: &[usize], nnz: f64) -> f64 {
    if others.is_empty() {
        return nnz;
    }
    let depth = others.len();
    let est_nfibs = estimate_fiber_counts(others, distinct, nnz);

    let k_last = nfactors[others[depth - 1]] as f64;
    let mut cost = nnz * k_last;

    let mut p = 1.0;
    for d in 0..depth - 1 {
        p *= nfactors[others[d]] as f64;
        cost += est_nfibs[d] * p;
    }
    cost
}

/// Log-interpolates fiber counts between `distinct[others[0]]` (the
/// shallowest level, closest to one node per distinct index) and `nnz` (the
/// leaf level, one node per non-zero), monotonically non-decreasing with
/// depth.
fn estimate_fiber_counts(others: &[usize], distinct: &[usize], nnz: f64) -> Vec<f64> {
    let depth = others.len();
    let root_estimate = (distinct[others[0]] as f64).max(1.0).min(nnz.max(1.0));
    let mut counts = vec![0.0; depth];
    counts[0] = root_estimate;
    for d in 1..depth {
        let t = d as f64 / (depth - 1).max(1) as f64;
        counts[d] = (root_estimate.ln() * (1.0 - t) + nnz.max(1.0).ln() * t).exp().max(counts[d - 1]);
    }
    counts
}
