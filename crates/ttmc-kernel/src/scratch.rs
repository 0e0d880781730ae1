//! Per-thread scratch arenas.
//!
//! Each worker gets its own slot 0/1/2 buffers, sized once at the start of a
//! `ttmc`/`ttmc_stream` call and never resized during the parallel region.
//! Scratch is conceptually private per thread: under steady-state rayon
//! scheduling, worker `tid` only ever touches `ScratchPool` slot `tid`, so
//! contention on the per-slot mutex is negligible. The mutex exists purely
//! so slot selection (`current_thread_index() % nthreads`) can't violate
//! memory safety if rayon ever reassigns a task to a different worker
//! mid-region; it is not modeling a genuine shared resource the way the
//! stripe locks in [`crate::locks`] are.

use parking_lot::Mutex;

/// One worker's scratch arena.
pub struct ThreadScratch {
    /// Slot 0: accumulation buffer for one fiber's partial reduction, sized
    /// `max_fiber_len * k_leaf`.
    pub accum: Vec<f64>,
    /// Slot 1: gathered fiber ids for the current slice's batch, sized
    /// `max_fiber_len`.
    pub fids: Vec<u32>,
    /// Slot 2: outer-product gather buffer, sized `max_outer_count *
    /// k_root`.
    pub gather: Vec<f64>,
}

impl ThreadScratch {
    fn new(max_fiber_len: usize, k_leaf: usize, max_outer_count: usize, k_root: usize) -> Self {
        ThreadScratch {
            accum: vec![0.0; max_fiber_len * k_leaf],
            fids: vec![0; max_fiber_len],
            gather: vec![0.0; max_outer_count * k_root],
        }
    }
}

/// The full per-call scratch allocation: one [`ThreadScratch`] per worker.
pub struct ScratchPool {
    workers: Vec<Mutex<ThreadScratch>>,
}

impl ScratchPool {
    /// Allocates scratch for `nthreads` workers, sized by the largest fiber
    /// and largest output-mode column count observed in the tensor(s) this
    /// call will traverse.
    ///
    /// `max_fiber_len` bounds how many non-zeros (leaf traversal) or child
    /// fibers (root/internal traversal) any single fiber can hold;
    /// `max_outer_count` bounds how many fibers any single slice can hold.
    /// Both are typically obtained from
    /// [`crate::cost::max_fiber_and_outer_spans`].
    pub fn new(
        nthreads: usize,
        max_fiber_len: usize,
        k_leaf: usize,
        max_outer_count: usize,
        k_root: usize,
    ) -> Self {
        let mut workers = Vec::with_capacity(nthreads.max(1));
        workers.resize_with(nthreads.max(1), || {
            Mutex::new(ThreadScratch::new(max_fiber_len, k_leaf, max_outer_count, k_root))
        });
        ScratchPool { workers }
    }

    /// Number of worker slots.
    pub fn nthreads(&self) -> usize {
        self.workers.len()
    }

    /// Resolves the current rayon worker to a scratch slot index.
    pub fn current_slot(&self) -> usize {
        rayon::current_thread_index().unwrap_or(0) % self.workers.len()
    }

    /// Runs `f` against worker `tid`'s scratch arena.
    pub fn with_worker<R>(&self, tid: usize, f: impl FnOnce(&mut ThreadScratch) -> R) -> R {
        let mut guard = self.workers[tid].lock();
        f(&mut guard)
    }
}
