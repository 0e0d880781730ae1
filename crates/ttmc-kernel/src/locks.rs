//! Striped lock table serializing concurrent writes to shared output rows.
//!
//! Only the internal and leaf traversals and the coordinate-streaming kernel
//! need this: in the root traversal every slice owns a distinct output row
//! and no lock is taken at all.

use parking_lot::{Mutex, MutexGuard};
use std::sync::OnceLock;

/// Number of independent stripe locks. Fixed: a hash collision causes false
/// sharing between two output rows, never incorrectness, so growing this
/// only trades memory for less contention.
pub const LOCKS: usize = 1024;

/// One stripe lock, padded to a cache line so two adjacent stripes never
/// share a cache line (which would otherwise cause the same false-sharing
/// problem the stripe was introduced to avoid, just one level up).
#[repr(align(64))]
struct PaddedLock(Mutex<()>);

/// A fixed-size table of `LOCKS` padded locks, indexed by `key % LOCKS`.
///
/// `LockTable` is process-wide and lazily initialized on first use via
/// [`LockTable::global`]; once built it is shared by every `ttmc`/
/// `ttmc_stream` call running concurrently, the same way the original's
/// static lock array is shared across calls.
pub struct LockTable {
    stripes: Vec<PaddedLock>,
}

impl LockTable {
    fn new() -> Self {
        let mut stripes = Vec::with_capacity(LOCKS);
        stripes.resize_with(LOCKS, || PaddedLock(Mutex::new(())));
        LockTable { stripes }
    }

    /// The process-wide lock table, built on first access.
    pub fn global() -> &'static LockTable {
        static TABLE: OnceLock<LockTable> = OnceLock::new();
        TABLE.get_or_init(LockTable::new)
    }

    /// Acquires the stripe lock guarding row `key`, blocking until
    /// available. The returned guard serializes every other writer hashing
    /// to the same stripe, not just those touching the same `key`.
    pub fn lock(&self, key: usize) -> MutexGuard<'_, ()> {
        self.stripes[key % LOCKS].0.lock()
    }
}
