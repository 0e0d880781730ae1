//! Coordinate-format tensor, the fallback representation for the streaming
//! kernel when no CSF is available.

/// A sparse tensor stored as parallel per-mode index arrays plus a value
/// array, all of length `nnz`.
#[derive(Debug, Clone, Default)]
pub struct CoordTensor {
    /// Tensor order (number of modes).
    pub nmodes: usize,
    /// Logical extent per mode, length `nmodes`.
    pub dims: Vec<usize>,
    /// `ind[m][k]` is the mode-`m` index of non-zero `k`. `ind.len() ==
    /// nmodes`, and every `ind[m].len() == vals.len()`.
    pub ind: Vec<Vec<u32>>,
    /// One value per non-zero.
    pub vals: Vec<f64>,
}

impl CoordTensor {
    /// Number of non-zeros.
    pub fn nnz(&self) -> usize {
        self.vals.len()
    }

    /// The full per-mode index tuple of non-zero `k`.
    pub fn indices(&self, k: usize) -> impl Iterator<Item = u32> + '_ {
        self.ind.iter().map(move |modes| modes[k])
    }

    /// `true` if the per-mode index arrays and the value array all agree on
    /// length and every index is in range. Intended for `debug_assert!` and
    /// test fixtures.
    pub fn check_invariants(&self) -> bool {
        if self.ind.len() != self.nmodes || self.dims.len() != self.nmodes {
            return false;
        }
        let nnz = self.vals.len();
        self.ind.iter().enumerate().all(|(m, col)| {
            col.len() == nnz && col.iter().all(|&i| (i as usize) < self.dims[m])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariants_hold_on_well_formed_tensor() {
        let t = CoordTensor {
            nmodes: 3,
            dims: vec![2, 2, 2],
            ind: vec![vec![0, 1], vec![1, 0], vec![0, 1]],
            vals: vec![3.0, 5.0],
        };
        assert!(t.check_invariants());
        assert_eq!(t.nnz(), 2);
        assert_eq!(t.indices(0).collect::<Vec<_>>(), vec![0, 1, 0]);
    }

    #[test]
    fn detects_out_of_range_index() {
        let t = CoordTensor {
            nmodes: 2,
            dims: vec![1, 1],
            ind: vec![vec![0], vec![5]],
            vals: vec![1.0],
        };
        assert!(!t.check_invariants());
    }
}
