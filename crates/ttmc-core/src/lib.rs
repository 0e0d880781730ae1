//! Core types shared by the TTMc kernels
//!
//! This crate defines the data model the kernels in `ttmc-kernel` operate
//! over, and nothing else:
//!
//! - [`Csf`] / [`CsfTile`]: the compressed-sparse-fiber tensor representation
//! - [`TileKind`]: the tiling tag a `Csf` carries (only [`TileKind::NoTile`]
//!   is executable by this core; any other value is a fatal configuration
//!   error at the dispatcher)
//! - [`CoordTensor`]: the coordinate-format fallback representation used by
//!   the streaming kernel
//! - [`MatrixView`] / [`MatrixViewMut`]: borrowed row-major dense views used
//!   for factor matrices and for the output tensor
//! - [`CsfAllocScheme`] / [`TtmcOptions`]: the option bundle recognized by the
//!   kernels
//! - [`TtmcError`]: the unified error type for unsupported configurations
//!
//! None of these types own a thread pool, a lock, or scratch memory — that
//! state lives in `ttmc-kernel` and is scoped to a single call.

#![warn(missing_docs)]

pub mod coord;
pub mod csf;
pub mod error;
pub mod matrix;
pub mod options;

pub use coord::CoordTensor;
pub use csf::{Csf, CsfTile, TileKind};
pub use error::{TtmcError, TtmcResult};
pub use matrix::{MatrixView, MatrixViewMut};
pub use options::{CsfAllocScheme, TtmcOptions};

/// Returns `max over m of dims[m] * prod_{m' != m} nfactors[m']`.
///
/// Used by callers to size a single output buffer big enough to hold `Y` for
/// any choice of output mode, without knowing in advance which mode a later
/// call to `ttmc`/`ttmc_stream` will target.
///
/// # Panics
///
/// In debug builds, panics if `nfactors.len() != dims.len()` or either slice
/// is empty; both are precondition violations per the error-handling design,
/// not recoverable configuration errors.
pub fn tenout_dim(nfactors: &[usize], dims: &[usize]) -> usize {
    debug_assert_eq!(nfactors.len(), dims.len(), "nfactors/dims rank mismatch");
    debug_assert!(!dims.is_empty(), "tenout_dim requires at least one mode");

    let nmodes = dims.len();
    (0..nmodes)
        .map(|m| {
            let cols: usize = (0..nmodes).filter(|&m2| m2 != m).map(|m2| nfactors[m2]).product();
            dims[m] * cols
        })
        .max()
        .unwrap_or(0)
}
