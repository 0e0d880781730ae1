//! # ttmc
//!
//! Parallel sparse tensor-times-matrix-chain (TTMc) kernels over
//! compressed-sparse-fiber (CSF) tensors — the per-mode contraction at the
//! core of CP-ALS/Tucker/HOOI factorization, computed directly against a
//! sparse tensor without ever materializing it densely.
//!
//! # Quick Start
//!
//! ```no_run
//! use ttmc::{ttmc, Csf, CsfTile, MatrixView, MatrixViewMut, TileKind, TtmcOptions};
//!
//! fn main() -> ttmc::Result<()> {
//!     // A 2x2x2 tensor with a single nonzero X[0,1,0] = 3.0.
//!     let csf = Csf {
//!         nmodes: 3,
//!         dims: vec![2, 2, 2],
//!         dim_perm: vec![0, 1, 2],
//!         which_tile: TileKind::NoTile,
//!         tiles: vec![CsfTile {
//!             nfibs: vec![1, 1, 1],
//!             fptr: vec![vec![0, 1], vec![0, 1]],
//!             fids: vec![Some(vec![0]), Some(vec![1]), Some(vec![0])],
//!             vals: vec![3.0],
//!         }],
//!     };
//!     let u0 = vec![2.0, 5.0];
//!     let u1 = vec![7.0, 11.0];
//!     let u2 = vec![13.0, 17.0];
//!     let factors = vec![
//!         MatrixView::new(2, 1, &u0),
//!         MatrixView::new(2, 1, &u1),
//!         MatrixView::new(2, 1, &u2),
//!     ];
//!     let mut ybuf = vec![0.0; 2];
//!     let y = MatrixViewMut::new(2, 1, &mut ybuf);
//!
//!     ttmc(0, &[1, 1, 1], &[csf], &factors, y, &TtmcOptions::default())?;
//!     assert_eq!(ybuf[0], 429.0);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! | Concern | Crate |
//! |---------|-------|
//! | Data model: `Csf`, `CoordTensor`, matrix views, options, errors | `ttmc-core` |
//! | Traversals, locking, scratch, dispatch, streaming, cost model | `ttmc-kernel` |
//!
//! [`ttmc`] is the main entry point for CSF-backed contraction;
//! [`ttmc_stream`] computes the same result directly from a [`CoordTensor`]
//! when no CSF has been built. [`ttmc_largest_outer`] and
//! [`ttmc_fill_flop_tbl`] help a caller choose a [`CsfAllocScheme`] and size
//! buffers before either entry point runs. Neither entry point builds a CSF
//! or reorders/sorts a coordinate tensor — both are supplied by the caller.

pub use ttmc_core::{
    Csf, CsfAllocScheme, CsfTile, CoordTensor, MatrixView, MatrixViewMut, TileKind, TtmcError,
    TtmcOptions, TtmcResult as Result,
};
pub use ttmc_core::tenout_dim;
pub use ttmc_kernel::{ttmc, ttmc_fill_flop_tbl, ttmc_largest_outer, ttmc_stream, FlopTable};
