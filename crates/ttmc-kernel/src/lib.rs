//! Parallel CSF traversal, coordinate-streaming, and cost-model kernels for
//! TTMc.
//!
//! This crate owns every piece of state scoped to a single `ttmc`/
//! `ttmc_stream` call: the scratch arenas ([`scratch`]), the striped lock
//! table serializing shared-row writes ([`locks`]), the dense micro-kernels
//! the traversals share ([`microkernel`]), the traversal algorithms
//! themselves ([`traversal`]), the CSF-allocation-scheme dispatcher
//! ([`dispatch`]), the coordinate-streaming fallback ([`stream`]), the flop
//! cost model ([`cost`]), and the top-level entry point ([`orchestrator`]).
//! The data model it operates over lives in `ttmc-core`.

#![warn(missing_docs)]

pub mod cost;
pub mod dispatch;
pub mod locks;
pub mod microkernel;
pub mod orchestrator;
pub mod scratch;
pub mod shared_rows;
pub mod stream;
pub mod traversal;

pub use cost::{ttmc_fill_flop_tbl, ttmc_largest_outer, FlopTable};
pub use orchestrator::ttmc;
pub use scratch::ScratchPool;
pub use stream::ttmc_stream;
