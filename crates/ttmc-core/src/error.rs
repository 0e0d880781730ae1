//! Error types for the TTMc kernels.
//!
//! Per the error-handling design, only two categories of failure are
//! recoverable as a `Result`: an unsupported tiling/allocation configuration,
//! and scratch/thread-pool construction failure. Both are detected before
//! the parallel traversal region begins, so an `Err` here is always returned
//! with `Y` still all-zero (the caller zeroed it on entry, per the data
//! model contract, and this core never writes to `Y` before the parallel
//! region). Precondition violations (bad dims, out-of-range mode) are
//! programmer errors and are raised with `debug_assert!`, not this type.

use crate::csf::TileKind;
use thiserror::Error;

/// Result type alias for TTMc operations.
pub type TtmcResult<T> = std::result::Result<T, TtmcError>;

/// Unified error type for the TTMc kernels.
#[derive(Debug, Error)]
pub enum TtmcError {
    /// A `Csf` carried a tiling tag other than [`TileKind::NoTile`]. This
    /// core only implements the untiled path; any other tag is fatal.
    #[error("unsupported tile kind {kind}: this core only executes NOTILE")]
    FatalTiling {
        /// The unsupported tile kind encountered.
        kind: TileKind,
    },

    /// The supplied CSF handle count, or the requested output mode, is not
    /// admissible under the given allocation scheme (e.g. TWOMODE routing
    /// the leaf traversal, or a handle count that doesn't match the
    /// scheme).
    #[error("allocation scheme {scheme:?} cannot serve this request: {reason}")]
    UnsupportedAllocScheme {
        /// The allocation scheme that was requested.
        scheme: crate::options::CsfAllocScheme,
        /// Why the scheme can't serve this request.
        reason: String,
    },

    /// Scratch, lock-table, or thread-pool construction failed.
    #[error("failed to allocate kernel resources: {reason}")]
    ScratchAllocationFailed {
        /// Underlying allocation failure.
        reason: String,
    },
}
