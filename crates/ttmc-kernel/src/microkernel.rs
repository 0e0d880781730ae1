//! Dense micro-kernels: row-times-row outer products and the batched
//! outer-product-sum rank-update.
//!
//! Every micro-kernel here is free of side effects beyond its `out` buffer
//! and may be run concurrently on disjoint `out` buffers; none of them touch
//! a lock or scratch slab.

/// `out[i][j] <- row_a[i] * row_b[j]`, overwriting `out` (row-major,
/// `row_a.len() x row_b.len()`).
///
/// # Panics
///
/// Panics in debug builds if `out.len() != row_a.len() * row_b.len()`.
#[inline]
pub fn outer(row_a: &[f64], row_b: &[f64], out: &mut [f64]) {
    debug_assert_eq!(out.len(), row_a.len() * row_b.len());
    let kb = row_b.len();
    for (i, &a) in row_a.iter().enumerate() {
        let out_row = &mut out[i * kb..(i + 1) * kb];
        for (o, &b) in out_row.iter_mut().zip(row_b.iter()) {
            *o = a * b;
        }
    }
}

/// `out[i][j] += row_a[i] * row_b[j]` (row-major, `row_a.len() x
/// row_b.len()`).
///
/// # Panics
///
/// Panics in debug builds if `out.len() != row_a.len() * row_b.len()`.
#[inline]
pub fn outer_add(row_a: &[f64], row_b: &[f64], out: &mut [f64]) {
    debug_assert_eq!(out.len(), row_a.len() * row_b.len());
    let kb = row_b.len();
    for (i, &a) in row_a.iter().enumerate() {
        if a == 0.0 {
            continue;
        }
        let out_row = &mut out[i * kb..(i + 1) * kb];
        for (o, &b) in out_row.iter_mut().zip(row_b.iter()) {
            *o += a * b;
        }
    }
}

/// `out += a^T . b`, i.e. `out[i][j] += sum_f a[f][i] * b[f][j]`, where `a`
/// is `f_count x k_a` row-major and `b` is `f_count x k_b` row-major.
///
/// With the `gemm-backend` feature this is realized as a single blocked
/// rank-update pass; without it, as a row-at-a-time loop of [`outer_add`].
/// Both produce the same result up to floating-point associativity.
///
/// # Panics
///
/// Panics in debug builds on a shape mismatch.
pub fn batched_outer_add(a: &[f64], k_a: usize, b: &[f64], k_b: usize, out: &mut [f64]) {
    debug_assert_eq!(out.len(), k_a * k_b);
    if k_a == 0 {
        debug_assert_eq!(a.len() % k_a.max(1), 0);
    }
    let f_count = if k_a == 0 { 0 } else { a.len() / k_a };
    debug_assert_eq!(a.len(), f_count * k_a);
    debug_assert_eq!(b.len(), f_count * k_b);

    #[cfg(feature = "gemm-backend")]
    {
        batched_outer_add_blocked(a, k_a, b, k_b, out, f_count);
    }
    #[cfg(not(feature = "gemm-backend"))]
    {
        for f in 0..f_count {
            let row_a = &a[f * k_a..(f + 1) * k_a];
            let row_b = &b[f * k_b..(f + 1) * k_b];
            outer_add(row_a, row_b, out);
        }
    }
}

/// Blocked rank-update variant of [`batched_outer_add`], used when the
/// `gemm-backend` feature models a dense-GEMM-backed build. Accumulates
/// column-block-at-a-time to keep a `out`-row's working set cache resident
/// across a contiguous run of `f`, instead of `outer_add`'s row-at-a-time
/// traversal of `a`/`b`.
#[cfg(feature = "gemm-backend")]
fn batched_outer_add_blocked(a: &[f64], k_a: usize, b: &[f64], k_b: usize, out: &mut [f64], f_count: usize) {
    const BLOCK: usize = 8;
    for i in 0..k_a {
        let out_row = &mut out[i * k_b..(i + 1) * k_b];
        for jb in (0..k_b).step_by(BLOCK) {
            let jend = (jb + BLOCK).min(k_b);
            for f in 0..f_count {
                let ai = a[f * k_a + i];
                if ai == 0.0 {
                    continue;
                }
                let row_b = &b[f * k_b + jb..f * k_b + jend];
                for (o, &bv) in out_row[jb..jend].iter_mut().zip(row_b.iter()) {
                    *o += ai * bv;
                }
            }
        }
    }
}
