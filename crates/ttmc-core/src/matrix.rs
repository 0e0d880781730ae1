//! Borrowed row-major dense matrix views.
//!
//! Factor matrices and the output tensor `Y` are both flat row-major
//! buffers owned by the caller; the kernels never allocate or own them.
//! [`MatrixView`] and [`MatrixViewMut`] borrow a caller's buffer for the
//! duration of a single kernel call.

use rayon::prelude::*;

/// Row chunk size for [`MatrixViewMut::clear`]'s parallel zero-fill, matching
/// the traversal modules' `SLICE_CHUNK`.
const CLEAR_CHUNK_ROWS: usize = 16;

/// A borrowed, read-only row-major `rows x cols` dense matrix.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    rows: usize,
    cols: usize,
    data: &'a [f64],
}

impl<'a> MatrixView<'a> {
    /// Wraps `data` as a `rows x cols` row-major view.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: &'a [f64]) -> Self {
        debug_assert_eq!(data.len(), rows * cols, "matrix buffer size mismatch");
        MatrixView { rows, cols, data }
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `i` as a contiguous slice of length `cols`.
    pub fn row(&self, i: usize) -> &'a [f64] {
        let c = self.cols;
        &self.data[i * c..(i + 1) * c]
    }

    /// The full backing buffer.
    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }
}

/// A borrowed, mutable row-major `rows x cols` dense matrix.
pub struct MatrixViewMut<'a> {
    rows: usize,
    cols: usize,
    data: &'a mut [f64],
}

impl<'a> MatrixViewMut<'a> {
    /// Wraps `data` as a mutable `rows x cols` row-major view.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: &'a mut [f64]) -> Self {
        debug_assert_eq!(data.len(), rows * cols, "matrix buffer size mismatch");
        MatrixViewMut { rows, cols, data }
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `i` as a mutable contiguous slice of length `cols`.
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let c = self.cols;
        &mut self.data[i * c..(i + 1) * c]
    }

    /// Row `i` as a read-only contiguous slice of length `cols`.
    pub fn row(&self, i: usize) -> &[f64] {
        let c = self.cols;
        &self.data[i * c..(i + 1) * c]
    }

    /// Zero-fills the entire buffer in parallel. This is the only write to
    /// `Y` the kernel performs without a lock, and it must happen before the
    /// parallel traversal region begins.
    pub fn clear(&mut self) {
        self.data
            .par_chunks_mut(self.cols.max(1) * CLEAR_CHUNK_ROWS)
            .for_each(|chunk| chunk.fill(0.0));
    }

    /// The full backing buffer, immutable.
    pub fn as_slice(&self) -> &[f64] {
        self.data
    }

    /// The full backing buffer, mutable.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.data
    }

    /// Borrows this view immutably.
    pub fn as_view(&self) -> MatrixView<'_> {
        MatrixView::new(self.rows, self.cols, self.data)
    }
}
