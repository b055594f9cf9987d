//! Typed LAPACK-style kernels over row-major slices
//!
//! Everything here works on flat `&mut [T]` payloads with an explicit
//! leading dimension, leaving shape and dtype bookkeeping to the `Matrix`
//! entry points in the parent module. The naming follows the LAPACK
//! routines each kernel mirrors: `getrf`/`getrs`/`getri` for the LU
//! family, `potrf` for Cholesky, `laswp` for column permutation.

use crate::dtype::{Complex128, Complex64, Element};
use crate::error::{Error, Result};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "rayon")]
use crate::ops::elementwise::PAR_THRESHOLD;

/// Element types the factorization kernels run on
///
/// Extends [`Element`] with the real-valued probes the pivoting and
/// convergence logic needs. `abs_val` is the modulus (so it works for
/// complex pivoting), `re_val` the real part (so positive-definiteness
/// checks do not see a magnitude), and `abs1` the `|re| + |im|` norm the
/// BLAS `asum` family uses.
pub trait LinalgElement: Element {
    /// Machine epsilon for the underlying precision
    fn epsilon_val() -> f64;
    /// Modulus
    fn abs_val(self) -> f64;
    /// Square root (principal branch for complex)
    fn sqrt_val(self) -> Self;
    /// Complex conjugate; identity for real types
    fn conj_val(self) -> Self;
    /// Real part
    fn re_val(self) -> f64;
    /// `|re| + |im|`; plain absolute value for real types
    fn abs1(self) -> f64;
}

impl LinalgElement for f32 {
    #[inline]
    fn epsilon_val() -> f64 {
        f32::EPSILON as f64
    }
    #[inline]
    fn abs_val(self) -> f64 {
        self.abs() as f64
    }
    #[inline]
    fn sqrt_val(self) -> Self {
        self.sqrt()
    }
    #[inline]
    fn conj_val(self) -> Self {
        self
    }
    #[inline]
    fn re_val(self) -> f64 {
        self as f64
    }
    #[inline]
    fn abs1(self) -> f64 {
        self.abs() as f64
    }
}

impl LinalgElement for f64 {
    #[inline]
    fn epsilon_val() -> f64 {
        f64::EPSILON
    }
    #[inline]
    fn abs_val(self) -> f64 {
        self.abs()
    }
    #[inline]
    fn sqrt_val(self) -> Self {
        self.sqrt()
    }
    #[inline]
    fn conj_val(self) -> Self {
        self
    }
    #[inline]
    fn re_val(self) -> f64 {
        self
    }
    #[inline]
    fn abs1(self) -> f64 {
        self.abs()
    }
}

impl LinalgElement for Complex64 {
    #[inline]
    fn epsilon_val() -> f64 {
        f32::EPSILON as f64
    }
    #[inline]
    fn abs_val(self) -> f64 {
        self.magnitude() as f64
    }
    #[inline]
    fn sqrt_val(self) -> Self {
        self.sqrt()
    }
    #[inline]
    fn conj_val(self) -> Self {
        self.conj()
    }
    #[inline]
    fn re_val(self) -> f64 {
        self.re as f64
    }
    #[inline]
    fn abs1(self) -> f64 {
        (self.re.abs() + self.im.abs()) as f64
    }
}

impl LinalgElement for Complex128 {
    #[inline]
    fn epsilon_val() -> f64 {
        f64::EPSILON
    }
    #[inline]
    fn abs_val(self) -> f64 {
        self.magnitude()
    }
    #[inline]
    fn sqrt_val(self) -> Self {
        self.sqrt()
    }
    #[inline]
    fn conj_val(self) -> Self {
        self.conj()
    }
    #[inline]
    fn re_val(self) -> f64 {
        self.re
    }
    #[inline]
    fn abs1(self) -> f64 {
        self.re.abs() + self.im.abs()
    }
}

/// Which triangle a Cholesky factor occupies
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Triangle {
    /// Upper-triangular factor, `A = Uᴴ·U`
    Upper,
    /// Lower-triangular factor, `A = L·Lᴴ`
    Lower,
}

/// LU factorization with partial pivoting (Doolittle), in place
///
/// On success `data` holds the unit-lower and upper factors packed
/// together and the returned pivot array records the row swapped into
/// position `i` at step `i` (LAPACK successive-swap convention).
pub fn getrf<T: LinalgElement>(
    m: usize,
    n: usize,
    data: &mut [T],
    lda: usize,
) -> Result<Vec<i64>> {
    let k = m.min(n);
    let mut pivots = vec![0i64; k];

    for col in 0..k {
        let mut pivot_row = col;
        let mut max_val = data[col * lda + col].abs_val();
        for row in (col + 1)..m {
            let val = data[row * lda + col].abs_val();
            if val > max_val {
                max_val = val;
                pivot_row = row;
            }
        }
        pivots[col] = pivot_row as i64;

        if pivot_row != col {
            for j in 0..n {
                data.swap(col * lda + j, pivot_row * lda + j);
            }
        }

        let pivot = data[col * lda + col];
        if pivot.abs_val() < T::epsilon_val() {
            return Err(Error::SingularMatrix { op: "getrf" });
        }

        for row in (col + 1)..m {
            data[row * lda + col] = data[row * lda + col] / pivot;
        }
        for row in (col + 1)..m {
            let multiplier = data[row * lda + col];
            for j in (col + 1)..n {
                let update = multiplier * data[col * lda + j];
                data[row * lda + j] = data[row * lda + j] - update;
            }
        }
    }

    Ok(pivots)
}

/// Solve `A·x = b` from a packed LU factorization, overwriting `rhs`
pub fn getrs<T: LinalgElement>(n: usize, lu: &[T], lda: usize, pivots: &[i64], rhs: &mut [T]) {
    // replay the row swaps on the right-hand side
    for (i, &p) in pivots.iter().enumerate() {
        let p = p as usize;
        if p != i {
            rhs.swap(i, p);
        }
    }

    // forward substitution against the unit-lower factor
    for i in 1..n {
        let mut sum = rhs[i];
        for j in 0..i {
            sum = sum - lu[i * lda + j] * rhs[j];
        }
        rhs[i] = sum;
    }

    // backward substitution against the upper factor
    for i in (0..n).rev() {
        let mut sum = rhs[i];
        for j in (i + 1)..n {
            sum = sum - lu[i * lda + j] * rhs[j];
        }
        rhs[i] = sum / lu[i * lda + i];
    }
}

/// Invert from a packed LU factorization, overwriting `data` with the
/// inverse
pub fn getri<T: LinalgElement>(n: usize, data: &mut [T], lda: usize, pivots: &[i64]) {
    let lu: Vec<T> = data.to_vec();
    let mut column = vec![T::zero(); n];
    for c in 0..n {
        column.fill(T::zero());
        column[c] = T::one();
        getrs(n, &lu, lda, pivots, &mut column);
        for r in 0..n {
            data[r * lda + c] = column[r];
        }
    }
}

/// Cholesky factorization (Cholesky-Banachiewicz), in place
///
/// Overwrites `data` with the factor in the requested triangle and zeros
/// the opposite one. Fails with [`Error::NotPositiveDefinite`] when a
/// diagonal update is not strictly positive.
pub fn potrf<T: LinalgElement>(
    triangle: Triangle,
    n: usize,
    data: &mut [T],
    lda: usize,
) -> Result<()> {
    let a: Vec<T> = data.to_vec();
    let mut l = vec![T::zero(); n * n];

    for i in 0..n {
        let mut sum_sq = T::zero();
        for k in 0..i {
            sum_sq = sum_sq + l[i * n + k] * l[i * n + k].conj_val();
        }
        let diag = a[i * lda + i] - sum_sq;
        if diag.re_val() <= 0.0 {
            return Err(Error::NotPositiveDefinite { op: "potrf" });
        }
        l[i * n + i] = diag.sqrt_val();

        for j in (i + 1)..n {
            let mut sum_prod = T::zero();
            for k in 0..i {
                sum_prod = sum_prod + l[j * n + k] * l[i * n + k].conj_val();
            }
            l[j * n + i] = (a[j * lda + i] - sum_prod) / l[i * n + i];
        }
    }

    for r in 0..n {
        for c in 0..n {
            data[r * lda + c] = match triangle {
                Triangle::Lower => l[r * n + c],
                // U = Lᴴ
                Triangle::Upper => l[c * n + r].conj_val(),
            };
        }
    }
    Ok(())
}

/// Gauss-Jordan elimination inverse with partial pivoting, in place
///
/// Slower than the LU path but tolerant of near-singular pivot patterns
/// that make `getrf` bail early; used as the fallback inversion.
pub fn gauss_jordan_inverse<T: LinalgElement>(n: usize, data: &mut [T], lda: usize) -> Result<()> {
    let width = 2 * n;
    let mut aug = vec![T::zero(); n * width];
    for r in 0..n {
        for c in 0..n {
            aug[r * width + c] = data[r * lda + c];
        }
        aug[r * width + n + r] = T::one();
    }

    for col in 0..n {
        let mut pivot_row = col;
        let mut max_val = aug[col * width + col].abs_val();
        for row in (col + 1)..n {
            let val = aug[row * width + col].abs_val();
            if val > max_val {
                max_val = val;
                pivot_row = row;
            }
        }
        if max_val < T::epsilon_val() {
            return Err(Error::SingularMatrix { op: "invert" });
        }
        if pivot_row != col {
            for j in 0..width {
                aug.swap(col * width + j, pivot_row * width + j);
            }
        }

        let pivot = aug[col * width + col];
        for j in 0..width {
            aug[col * width + j] = aug[col * width + j] / pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row * width + col];
            if factor == T::zero() {
                continue;
            }
            for j in 0..width {
                let update = factor * aug[col * width + j];
                aug[row * width + j] = aug[row * width + j] - update;
            }
        }
    }

    for r in 0..n {
        for c in 0..n {
            data[r * lda + c] = aug[r * width + n + c];
        }
    }
    Ok(())
}

/// Apply successive column swaps `i <-> order[i]` in increasing `i`
/// (LAPACK `laswp` transposed to columns)
pub fn laswp<T: Element>(rows: usize, data: &mut [T], lda: usize, order: &[usize]) {
    for (i, &target) in order.iter().enumerate() {
        if target == i {
            continue;
        }
        for r in 0..rows {
            data.swap(r * lda + i, r * lda + target);
        }
    }
}

/// Naive row-major matrix product: `out[m,n] = a[m,k] · b[k,n]`
///
/// `out` must arrive zeroed. Rows parallelize past the dense threshold.
pub fn gemm<T: Element>(m: usize, k: usize, n: usize, a: &[T], b: &[T], out: &mut [T]) {
    #[cfg(feature = "rayon")]
    if m * n >= PAR_THRESHOLD {
        out.par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| gemm_row(i, k, n, a, b, row));
        return;
    }
    for i in 0..m {
        gemm_row(i, k, n, a, b, &mut out[i * n..(i + 1) * n]);
    }
}

fn gemm_row<T: Element>(i: usize, k: usize, n: usize, a: &[T], b: &[T], row: &mut [T]) {
    for p in 0..k {
        let aip = a[i * k + p];
        if aip == T::zero() {
            continue;
        }
        for (j, slot) in row.iter_mut().enumerate() {
            *slot = *slot + aip * b[p * n + j];
        }
    }
}

/// Reduce a square matrix to upper Hessenberg form by Householder
/// similarity transforms, in place
pub fn hessenberg<T: LinalgElement>(n: usize, data: &mut [T], lda: usize) {
    if n < 3 {
        return;
    }
    for col in 0..(n - 2) {
        // reflector for the column below the subdiagonal
        let len = n - col - 1;
        let mut v = vec![T::zero(); len];
        for i in 0..len {
            v[i] = data[(col + 1 + i) * lda + col];
        }

        let norm = v.iter().map(|x| x.abs_val() * x.abs_val()).sum::<f64>().sqrt();
        if norm < T::epsilon_val() {
            continue;
        }
        let alpha = if v[0].re_val() >= 0.0 { -norm } else { norm };
        v[0] = v[0] - T::from_f64(alpha);

        let v_norm_sq = v.iter().map(|x| x.abs_val() * x.abs_val()).sum::<f64>();
        if v_norm_sq < T::epsilon_val() {
            continue;
        }
        let scale = T::from_f64(2.0 / v_norm_sq);

        // left: rows col+1..n across all columns
        for j in 0..n {
            let mut dot = T::zero();
            for i in 0..len {
                dot = dot + v[i].conj_val() * data[(col + 1 + i) * lda + j];
            }
            let f = scale * dot;
            for i in 0..len {
                let update = v[i] * f;
                data[(col + 1 + i) * lda + j] = data[(col + 1 + i) * lda + j] - update;
            }
        }

        // right: columns col+1..n across all rows
        for r in 0..n {
            let mut dot = T::zero();
            for i in 0..len {
                dot = dot + data[r * lda + (col + 1 + i)] * v[i];
            }
            let f = dot * scale;
            for i in 0..len {
                let update = f * v[i].conj_val();
                data[r * lda + (col + 1 + i)] = data[r * lda + (col + 1 + i)] - update;
            }
        }
    }
}

/// Strided `|re| + |im|` sum (BLAS `asum`)
pub fn asum<T: LinalgElement>(n: usize, data: &[T], incx: usize) -> f64 {
    (0..n).map(|i| data[i * incx].abs1()).sum()
}

/// Strided Euclidean norm (BLAS `nrm2`)
pub fn nrm2<T: LinalgElement>(n: usize, data: &[T], incx: usize) -> f64 {
    (0..n)
        .map(|i| {
            let v = data[i * incx].abs_val();
            v * v
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_getrf_known_factorization() {
        // [[4, 3], [6, 3]]: pivot swaps rows, L21 = 4/6
        let mut data = vec![4.0f64, 3.0, 6.0, 3.0];
        let pivots = getrf(2, 2, &mut data, 2).unwrap();
        assert_eq!(pivots, [1, 1]);
        assert!(approx(data[0], 6.0, 1e-12));
        assert!(approx(data[1], 3.0, 1e-12));
        assert!(approx(data[2], 4.0 / 6.0, 1e-12));
        assert!(approx(data[3], 1.0, 1e-12));
    }

    #[test]
    fn test_getrf_singular() {
        let mut data = vec![1.0f64, 2.0, 2.0, 4.0];
        assert!(matches!(
            getrf(2, 2, &mut data, 2),
            Err(Error::SingularMatrix { op: "getrf" })
        ));
    }

    #[test]
    fn test_getrs_solves() {
        // A = [[3, 1], [1, 2]], b = [9, 8] -> x = [2, 3]
        let mut lu = vec![3.0f64, 1.0, 1.0, 2.0];
        let pivots = getrf(2, 2, &mut lu, 2).unwrap();
        let mut rhs = vec![9.0f64, 8.0];
        getrs(2, &lu, 2, &pivots, &mut rhs);
        assert!(approx(rhs[0], 2.0, 1e-12));
        assert!(approx(rhs[1], 3.0, 1e-12));
    }

    #[test]
    fn test_getri_round_trip() {
        let a = [2.0f64, 1.0, 1.0, 3.0];
        let mut inv = a.to_vec();
        let pivots = getrf(2, 2, &mut inv, 2).unwrap();
        getri(2, &mut inv, 2, &pivots);

        let mut product = vec![0.0f64; 4];
        gemm(2, 2, 2, &a, &inv, &mut product);
        assert!(approx(product[0], 1.0, 1e-12));
        assert!(approx(product[1], 0.0, 1e-12));
        assert!(approx(product[2], 0.0, 1e-12));
        assert!(approx(product[3], 1.0, 1e-12));
    }

    #[test]
    fn test_potrf_lower_and_upper() {
        // A = [[4, 2], [2, 3]] = L·Lᵀ with L = [[2, 0], [1, sqrt(2)]]
        let mut lower = vec![4.0f64, 2.0, 2.0, 3.0];
        potrf(Triangle::Lower, 2, &mut lower, 2).unwrap();
        assert!(approx(lower[0], 2.0, 1e-12));
        assert!(approx(lower[1], 0.0, 1e-12));
        assert!(approx(lower[2], 1.0, 1e-12));
        assert!(approx(lower[3], 2.0f64.sqrt(), 1e-12));

        let mut upper = vec![4.0f64, 2.0, 2.0, 3.0];
        potrf(Triangle::Upper, 2, &mut upper, 2).unwrap();
        for (u, l) in [(0, 0), (1, 2), (2, 1), (3, 3)] {
            assert!(approx(upper[u], lower[l], 1e-12));
        }
    }

    #[test]
    fn test_potrf_rejects_indefinite() {
        let mut data = vec![1.0f64, 2.0, 2.0, 1.0];
        assert!(matches!(
            potrf(Triangle::Lower, 2, &mut data, 2),
            Err(Error::NotPositiveDefinite { op: "potrf" })
        ));
    }

    #[test]
    fn test_gauss_jordan_matches_lu_inverse() {
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let mut gj = a.to_vec();
        gauss_jordan_inverse(2, &mut gj, 2).unwrap();

        let mut lu = a.to_vec();
        let pivots = getrf(2, 2, &mut lu, 2).unwrap();
        getri(2, &mut lu, 2, &pivots);

        for i in 0..4 {
            assert!(approx(gj[i], lu[i], 1e-12));
        }
    }

    #[test]
    fn test_laswp_successive_swaps() {
        // order [1, 1]: swap cols 0<->1, then col 1 stays
        let mut data = vec![1.0f64, 2.0, 3.0, 4.0];
        laswp(2, &mut data, 2, &[1, 1]);
        assert_eq!(data, [2.0, 1.0, 4.0, 3.0]);
    }

    #[test]
    fn test_hessenberg_zeroes_below_subdiagonal() {
        let mut data = vec![
            4.0f64, 1.0, 2.0, 3.0, //
            1.0, 5.0, 1.0, 2.0, //
            2.0, 1.0, 6.0, 1.0, //
            3.0, 2.0, 1.0, 7.0,
        ];
        let before_trace: f64 = (0..4).map(|i| data[i * 4 + i]).sum();
        hessenberg(4, &mut data, 4);
        for r in 2..4 {
            for c in 0..(r - 1) {
                assert!(data[r * 4 + c].abs() < 1e-10, "({r},{c}) = {}", data[r * 4 + c]);
            }
        }
        // similarity transform preserves the trace
        let after_trace: f64 = (0..4).map(|i| data[i * 4 + i]).sum();
        assert!(approx(before_trace, after_trace, 1e-10));
    }

    #[test]
    fn test_asum_nrm2_strided() {
        let data = [3.0f64, 100.0, -4.0, 100.0];
        assert!(approx(asum(2, &data, 2), 7.0, 1e-12));
        assert!(approx(nrm2(2, &data, 2), 5.0, 1e-12));
    }

    #[test]
    fn test_complex_getrf_pivots_by_modulus() {
        let mut data = vec![
            Complex128::new(1.0, 0.0),
            Complex128::new(0.0, 0.0),
            Complex128::new(0.0, 3.0),
            Complex128::new(2.0, 0.0),
        ];
        let pivots = getrf(2, 2, &mut data, 2).unwrap();
        // |3i| > |1|, so row 1 pivots up
        assert_eq!(pivots[0], 1);
    }
}
