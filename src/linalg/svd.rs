//! Singular value decomposition kernels
//!
//! `jacobi_svd` is a one-sided Jacobi SVD: it rotates column pairs of a
//! working copy until their Gram matrix is diagonal, reading singular
//! values off the column norms. `qr_jacobi_svd` runs a thin Householder QR
//! first and applies the Jacobi pass to the square `R` factor, which
//! converges faster on tall inputs. Both handle wide matrices by
//! transposing and swapping `U` with `Vᵀ` on the way out.

use super::kernels::{gemm, LinalgElement};
use crate::dtype::Element;

/// Sweep cap for the Jacobi iteration; typical inputs converge well
/// before this
const MAX_SWEEPS: usize = 30;

/// One-sided Jacobi SVD of a row-major `[m, n]` slice
///
/// Returns `(u, s, vt)` with `u` shaped `[m, k]`, `s` holding the `k`
/// singular values in descending order, and `vt` shaped `[k, n]`, where
/// `k = min(m, n)`.
pub fn jacobi_svd<T: LinalgElement>(m: usize, n: usize, a: &[T]) -> (Vec<T>, Vec<T>, Vec<T>) {
    let k = m.min(n);

    // wide inputs: factor the transpose, swap U and Vᵀ on return
    if m < n {
        let at = transpose(m, n, a);
        let (ut, st, vtt) = jacobi_svd(n, m, &at);
        // A = (U'·S·V'ᵀ)ᵀ = V'·S·U'ᵀ
        let u = transpose(k, m, &vtt);
        let vt = transpose(n, k, &ut);
        return (u, st, vt);
    }

    let mut b: Vec<T> = a.to_vec();
    let mut v = identity(n);

    let eps = T::epsilon_val();
    let tol = n as f64 * eps;

    for _sweep in 0..MAX_SWEEPS {
        let mut off_diag_sum = 0.0f64;

        for p in 0..n {
            for q in (p + 1)..n {
                let (a_pp, a_qq, a_pq) = gram_elements(&b, m, n, p, q);
                off_diag_sum += a_pq * a_pq;

                if a_pq.abs() < tol * (a_pp * a_qq).sqrt() {
                    continue;
                }

                let (c, s) = rotation(a_pp, a_qq, a_pq);
                rotate_columns(&mut b, m, n, p, q, c, s);
                rotate_columns(&mut v, n, n, p, q, c, s);
            }
        }

        if off_diag_sum.sqrt() < tol {
            break;
        }
    }

    // singular values are the column norms; columns normalize into U
    let mut sigma = vec![0.0f64; n];
    for (j, slot) in sigma.iter_mut().enumerate() {
        let mut norm_sq = 0.0f64;
        for i in 0..m {
            let x = b[i * n + j].abs_val();
            norm_sq += x * x;
        }
        *slot = norm_sq.sqrt();
        if *slot > eps {
            let inv = T::from_f64(1.0 / *slot);
            for i in 0..m {
                b[i * n + j] = b[i * n + j] * inv;
            }
        }
    }

    let order = argsort_desc(&sigma);

    let s_sorted: Vec<T> = order
        .iter()
        .take(k)
        .map(|&j| T::from_f64(sigma[j]))
        .collect();

    let mut u_sorted = vec![T::zero(); m * k];
    for (new_j, &old_j) in order.iter().take(k).enumerate() {
        for i in 0..m {
            u_sorted[i * k + new_j] = b[i * n + old_j];
        }
    }

    // Vᵀ rows come from the permuted V columns
    let mut vt_sorted = vec![T::zero(); k * n];
    for (new_i, &old_j) in order.iter().take(k).enumerate() {
        for j in 0..n {
            vt_sorted[new_i * n + j] = v[j * n + old_j];
        }
    }

    (u_sorted, s_sorted, vt_sorted)
}

/// QR-preconditioned Jacobi SVD
///
/// Same contract as [`jacobi_svd`]; tall inputs factor as `A = Q·R` first
/// and run the Jacobi pass on the square `R`.
pub fn qr_jacobi_svd<T: LinalgElement>(m: usize, n: usize, a: &[T]) -> (Vec<T>, Vec<T>, Vec<T>) {
    let k = m.min(n);
    if m < n {
        let at = transpose(m, n, a);
        let (ut, st, vtt) = qr_jacobi_svd(n, m, &at);
        let u = transpose(k, m, &vtt);
        let vt = transpose(n, k, &ut);
        return (u, st, vt);
    }

    let (q, r) = householder_qr_thin(m, n, a);
    let (u_r, s, vt) = jacobi_svd(n, n, &r);

    // lift the small left factor back through Q
    let mut u = vec![T::zero(); m * n];
    gemm(m, n, n, &q, &u_r, &mut u);
    (u, s, vt)
}

/// Thin Householder QR of a tall row-major `[m, n]` slice (`m >= n`):
/// returns `(q, r)` with `q` shaped `[m, n]` and `r` shaped `[n, n]`
fn householder_qr_thin<T: LinalgElement>(m: usize, n: usize, a: &[T]) -> (Vec<T>, Vec<T>) {
    let mut r: Vec<T> = a.to_vec();
    let mut q = vec![T::zero(); m * n];
    for i in 0..n {
        q[i * n + i] = T::one();
    }

    for col in 0..n {
        let len = m - col;
        let mut x = vec![T::zero(); len];
        for i in 0..len {
            x[i] = r[(col + i) * n + col];
        }

        let norm = x.iter().map(|v| v.abs_val() * v.abs_val()).sum::<f64>().sqrt();
        if norm < T::epsilon_val() {
            continue;
        }
        let alpha = if x[0].re_val() >= 0.0 { -norm } else { norm };

        let mut v = x;
        v[0] = v[0] - T::from_f64(alpha);

        let v_norm = v.iter().map(|e| e.abs_val() * e.abs_val()).sum::<f64>().sqrt();
        if v_norm < T::epsilon_val() {
            continue;
        }
        let inv = T::from_f64(1.0 / v_norm);
        for e in v.iter_mut() {
            *e = *e * inv;
        }

        let two = T::from_f64(2.0);

        // reflect the trailing block of R
        for j in 0..(n - col) {
            let mut dot = T::zero();
            for i in 0..len {
                dot = dot + v[i].conj_val() * r[(col + i) * n + (col + j)];
            }
            let f = two * dot;
            for i in 0..len {
                let update = v[i] * f;
                r[(col + i) * n + (col + j)] = r[(col + i) * n + (col + j)] - update;
            }
        }

        // accumulate the reflection into Q from the right
        for row in 0..m {
            let mut dot = T::zero();
            for i in 0..len {
                if col + i < n {
                    dot = dot + q[row * n + (col + i)] * v[i];
                }
            }
            let f = two * dot;
            for i in 0..len {
                if col + i < n {
                    let update = f * v[i].conj_val();
                    q[row * n + (col + i)] = q[row * n + (col + i)] - update;
                }
            }
        }
    }

    let mut r_out = vec![T::zero(); n * n];
    for i in 0..n {
        for j in 0..n {
            r_out[i * n + j] = r[i * n + j];
        }
    }
    (q, r_out)
}

/// Gram matrix probes for columns `p` and `q`
fn gram_elements<T: LinalgElement>(
    b: &[T],
    m: usize,
    n: usize,
    p: usize,
    q: usize,
) -> (f64, f64, f64) {
    let mut a_pp = 0.0f64;
    let mut a_qq = 0.0f64;
    let mut a_pq = 0.0f64;
    for i in 0..m {
        let bp = b[i * n + p].re_val();
        let bq = b[i * n + q].re_val();
        a_pp += bp * bp;
        a_qq += bq * bq;
        a_pq += bp * bq;
    }
    (a_pp, a_qq, a_pq)
}

/// Rotation zeroing the off-diagonal of a symmetric 2x2 block, in the
/// numerically stable LAPACK formulation
fn rotation(a_pp: f64, a_qq: f64, a_pq: f64) -> (f64, f64) {
    let denom = 2.0 * a_pq;
    if denom.abs() < 1e-300 {
        return (1.0, 0.0);
    }
    let tau = (a_qq - a_pp) / denom;
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };
    let c = 1.0 / (1.0 + t * t).sqrt();
    (c, t * c)
}

fn rotate_columns<T: LinalgElement>(
    data: &mut [T],
    rows: usize,
    cols: usize,
    p: usize,
    q: usize,
    c: f64,
    s: f64,
) {
    let c = T::from_f64(c);
    let s = T::from_f64(s);
    for i in 0..rows {
        let xp = data[i * cols + p];
        let xq = data[i * cols + q];
        data[i * cols + p] = c * xp - s * xq;
        data[i * cols + q] = s * xp + c * xq;
    }
}

fn identity<T: Element>(n: usize) -> Vec<T> {
    let mut out = vec![T::zero(); n * n];
    for i in 0..n {
        out[i * n + i] = T::one();
    }
    out
}

fn transpose<T: Element>(rows: usize, cols: usize, data: &[T]) -> Vec<T> {
    let mut out = vec![T::zero(); rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = data[r * cols + c];
        }
    }
    out
}

fn argsort_desc(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}
