//! Compressed sparse fiber (CSF) tensor representation.
//!
//! A CSF tensor is a tree: level `d` of the tree corresponds to tensor mode
//! `dim_perm[d]`. Level 0 is the root (one node per "slice"), level
//! `nmodes - 1` is the leaf level (one node per non-zero). Internal nodes are
//! called fibers; `fptr[d]` gives, CSR-style, the range of level-`d+1`
//! children owned by each level-`d` node.

use std::fmt;

/// Tiling tag carried by a [`Csf`].
///
/// Only [`TileKind::NoTile`] is executable by this core. The remaining
/// variants exist so a caller handing this core a tiled CSF (produced by a
/// tiling layer this crate deliberately does not implement, per the
/// out-of-scope list) gets a named, diagnosable fatal error from the
/// dispatcher instead of the traversal silently reading tile metadata it
/// doesn't understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileKind {
    /// No tiling: `Csf::tiles` holds exactly one tile covering the whole
    /// tensor. The only kind this core's traversals accept.
    #[default]
    NoTile,
    /// Dense tiling over the output mode. Not implemented by this core.
    DenseTile,
    /// Tiling with synchronization barriers between tiles. Not implemented.
    SyncTile,
    /// Cooperative tiling across threads within a tile. Not implemented.
    CoopTile,
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TileKind::NoTile => "NOTILE",
            TileKind::DenseTile => "DENSETILE",
            TileKind::SyncTile => "SYNCTILE",
            TileKind::CoopTile => "COOPTILE",
        };
        f.write_str(s)
    }
}

/// One sparsity block of a CSF tensor.
///
/// With [`TileKind::NoTile`] a [`Csf`] holds exactly one `CsfTile` covering
/// every non-zero.
#[derive(Debug, Clone, Default)]
pub struct CsfTile {
    /// Count of tree nodes at each level, length `nmodes`.
    pub nfibs: Vec<usize>,
    /// `fptr[d]` has length `nfibs[d] + 1` for `d` in `0..nmodes-1` and gives
    /// CSR-style child ranges from level `d` into level `d + 1`.
    pub fptr: Vec<Vec<u64>>,
    /// `fids[d][k]` is the tensor index (in mode `dim_perm[d]`) of tree node
    /// `k` at level `d`. `fids[0]` may be `None`: node `s` at level 0 then
    /// implicitly represents index `s` of mode `dim_perm[0]`.
    pub fids: Vec<Option<Vec<u32>>>,
    /// One value per leaf (length `nfibs[nmodes - 1]`), empty for an empty
    /// tile.
    pub vals: Vec<f64>,
}

impl CsfTile {
    /// Number of non-zeros (leaves) in this tile.
    pub fn nnz(&self) -> usize {
        self.vals.len()
    }

    /// The tensor index of level-`d` node `k`, resolving the implicit
    /// level-0 identity mapping when `fids[0]` is absent.
    pub fn fid(&self, d: usize, k: usize) -> u32 {
        match &self.fids[d] {
            Some(ids) => ids[k],
            None => {
                debug_assert_eq!(d, 0, "only level 0 may omit fids");
                k as u32
            }
        }
    }

    /// The half-open range of level-`(d+1)` children owned by level-`d` node
    /// `k`.
    pub fn children(&self, d: usize, k: usize) -> std::ops::Range<usize> {
        let ptr = &self.fptr[d];
        ptr[k] as usize..ptr[k + 1] as usize
    }

    /// Validates the structural invariants from the data model: `fptr` is
    /// non-decreasing and covers every child exactly once, `fids` are within
    /// range, and siblings have strictly increasing `fids`. Intended for
    /// `debug_assert!` call sites and test fixtures, not for the hot path.
    pub fn check_invariants(&self, nmodes: usize, dims: &[usize], dim_perm: &[usize]) -> bool {
        if self.nfibs.len() != nmodes {
            return false;
        }
        for d in 0..nmodes.saturating_sub(1) {
            let ptr = &self.fptr[d];
            if ptr.len() != self.nfibs[d] + 1 {
                return false;
            }
            if !ptr.windows(2).all(|w| w[0] <= w[1]) {
                return false;
            }
            if ptr.last().copied().unwrap_or(0) as usize != self.nfibs[d + 1] {
                return false;
            }
        }
        for d in 0..nmodes {
            if let Some(ids) = &self.fids[d] {
                if ids.len() != self.nfibs[d] {
                    return false;
                }
                let mode = dim_perm[d];
                if ids.iter().any(|&i| i as usize >= dims[mode]) {
                    return false;
                }
            }
            if d > 0 {
                // siblings under the same parent must be strictly increasing
                let ptr = &self.fptr[d - 1];
                let ids = match &self.fids[d] {
                    Some(ids) => ids,
                    None => continue,
                };
                for w in ptr.windows(2) {
                    let (lo, hi) = (w[0] as usize, w[1] as usize);
                    if !ids[lo..hi].windows(2).all(|p| p[0] < p[1]) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// A read-only compressed-sparse-fiber tensor of order `nmodes`.
///
/// `Csf` is a value type the caller constructs (CSF construction from a
/// coordinate tensor is an out-of-scope collaborator) and passes by
/// reference into `ttmc`/`ttmc_stream`. It is read-only for the lifetime of
/// a kernel call.
#[derive(Debug, Clone)]
pub struct Csf {
    /// Tensor order (number of modes).
    pub nmodes: usize,
    /// Logical extent per tensor mode, length `nmodes`.
    pub dims: Vec<usize>,
    /// Permutation of mode indices: level `d` of the tree corresponds to
    /// tensor mode `dim_perm[d]`.
    pub dim_perm: Vec<usize>,
    /// Tiling tag. Only [`TileKind::NoTile`] is executable by this core.
    pub which_tile: TileKind,
    /// Per-tile sparsity payloads. With [`TileKind::NoTile`] this has
    /// exactly one element.
    pub tiles: Vec<CsfTile>,
}

impl Csf {
    /// Number of tiles (`self.tiles.len()`).
    pub fn ntiles(&self) -> usize {
        self.tiles.len()
    }

    /// Depth (tree level) at which output mode `n` sits in `dim_perm`.
    ///
    /// Returns `0` for the root, `nmodes - 1` for the leaf.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `n` does not appear in `dim_perm`; that is a
    /// precondition violation, not a recoverable configuration error.
    pub fn depth_of_mode(&self, n: usize) -> usize {
        self.dim_perm
            .iter()
            .position(|&m| m == n)
            .expect("mode n must appear in dim_perm")
    }

    /// `true` if every tile's invariants hold. Intended for `debug_assert!`
    /// and test fixtures.
    pub fn check_invariants(&self) -> bool {
        if self.dims.len() != self.nmodes || self.dim_perm.len() != self.nmodes {
            return false;
        }
        let mut seen = vec![false; self.nmodes];
        for &m in &self.dim_perm {
            if m >= self.nmodes || seen[m] {
                return false;
            }
            seen[m] = true;
        }
        self.tiles
            .iter()
            .all(|t| t.check_invariants(self.nmodes, &self.dims, &self.dim_perm))
    }
}
