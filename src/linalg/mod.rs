//! Factorization suite: LU, Cholesky, inversion, determinant, solve, SVD,
//! and the supporting BLAS-flavored operations
//!
//! Entry points live on [`Matrix`] and follow one pattern: validate shape
//! and storage, normalize the dtype (integer and rational receivers promote
//! to F64 where a kernel needs a field), then hand a flat row-major slice
//! to the typed kernels in [`kernels`]. Non-destructive forms clone before
//! factoring; `_in_place` forms take `self` by move and require the kernel
//! dtype up front.

pub mod kernels;
pub mod statistics;
pub mod svd;

pub use kernels::{LinalgElement, Triangle};
pub use statistics::Denominator;

use crate::dispatch_dtype;
use crate::dtype::{upcast, Complex128, Complex64, DType, Element, Scalar, StorageKind};
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::ops::elementwise::map_stored;

/// Dispatch over the dtypes the factorization kernels accept (floats and
/// complex); everything else reports `UnsupportedDType`
macro_rules! dispatch_linalg {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            DType::F32 => {
                type $T = f32;
                $body
            }
            DType::F64 => {
                type $T = f64;
                $body
            }
            DType::Complex64 => {
                type $T = Complex64;
                $body
            }
            DType::Complex128 => {
                type $T = Complex128;
                $body
            }
            other => Err(Error::unsupported_dtype(other, $error_op)),
        }
    };
}

/// Column-order array convention for [`Matrix::permute_columns`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Convention {
    /// LAPACK successive-swap form: entry `i` names the column swapped
    /// with column `i`, applied in increasing `i`
    Lapack,
    /// Direct form: entry `i` names the source column that ends up at
    /// position `i`
    Intuitive,
}

/// The dtype a factorization runs in: floats and complex keep their tag,
/// everything else promotes to F64
fn linalg_dtype(dtype: DType) -> DType {
    if dtype.is_float() || dtype.is_complex() {
        dtype
    } else {
        DType::F64
    }
}

/// Resolve LAPACK successive-swap pivots into a direct column-order array
/// by replaying the swaps against an identity ordering
pub fn permutation_array_for(pivots: &[i64], n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    for (i, &p) in pivots.iter().enumerate() {
        let p = p as usize;
        if p != i && p < n {
            order.swap(i, p);
        }
    }
    order
}

/// Materialize the permutation matrix `P` of an LU factorization's pivots
/// (`P·A = L·U`), dense U8
pub fn permutation_matrix_from(pivots: &[i64], n: usize) -> Matrix {
    let order = permutation_array_for(pivots, n);
    let mut values = vec![0u8; n * n];
    for (i, &j) in order.iter().enumerate() {
        values[i * n + j] = 1;
    }
    Matrix::from_slice(&values, &[n, n])
}

/// Validate a direct column-order array and convert it to LAPACK
/// successive-swap form
fn intuitive_to_lapack(order: &[usize], cols: usize) -> Result<Vec<usize>> {
    if order.len() != cols {
        return Err(Error::invalid_argument(
            "order",
            format!("expected {cols} entries, got {}", order.len()),
        ));
    }
    let mut seen = vec![false; cols];
    for &c in order {
        if c >= cols {
            return Err(Error::invalid_argument(
                "order",
                format!("column index {c} out of range for {cols} columns"),
            ));
        }
        if seen[c] {
            return Err(Error::invalid_argument(
                "order",
                format!("duplicate column index {c}"),
            ));
        }
        seen[c] = true;
    }

    // replay against an identity ordering: work[pos] is the source column
    // currently sitting at pos
    let mut work: Vec<usize> = (0..cols).collect();
    let mut lapack = vec![0usize; cols];
    for i in 0..cols {
        let j = work[i..]
            .iter()
            .position(|&c| c == order[i])
            .map(|off| i + off)
            .unwrap_or(i);
        lapack[i] = j;
        work.swap(i, j);
    }
    Ok(lapack)
}

impl Matrix {
    fn square_dim(&self, op: &'static str) -> Result<usize> {
        let (rows, cols) = self.dims2(op)?;
        if rows != cols {
            return Err(Error::shape_mismatch(&[rows, rows], self.shape()));
        }
        Ok(rows)
    }

    /// LU-factor a copy with partial pivoting
    ///
    /// Dense rank-2 receivers only; integer, Bool, and rational dtypes
    /// promote to F64, floats and complex keep their tag. Returns the
    /// packed LU matrix and the successive-swap pivot array.
    pub fn getrf(&self) -> Result<(Matrix, Vec<i64>)> {
        let (m, n) = self.dims2("getrf")?;
        self.dense_store("getrf")?;
        let dtype = linalg_dtype(self.dtype());
        let mut work = self.cast(StorageKind::Dense, dtype)?;
        let pivots = dispatch_linalg!(dtype, T => {
            let data = work.dense_store_mut("getrf")?.as_mut_slice::<T>();
            kernels::getrf(m, n, data, n)
        }, "getrf")?;
        Ok((work, pivots))
    }

    /// LU-factor by move; the receiver must already hold a kernel dtype
    /// since the store cannot change its tag in place
    pub fn getrf_in_place(mut self) -> Result<(Matrix, Vec<i64>)> {
        let (m, n) = self.dims2("getrf")?;
        self.dense_store("getrf")?;
        let dtype = self.dtype();
        let pivots = dispatch_linalg!(dtype, T => {
            let data = self.dense_store_mut("getrf")?.as_mut_slice::<T>();
            kernels::getrf(m, n, data, n)
        }, "getrf")?;
        Ok((self, pivots))
    }

    /// The packed LU factorization of a copy
    pub fn factorize_lu(&self) -> Result<Matrix> {
        Ok(self.getrf()?.0)
    }

    /// The packed LU factorization plus the materialized permutation
    /// matrix `P` with `P·A = L·U`
    pub fn factorize_lu_with_permutation(&self) -> Result<(Matrix, Matrix)> {
        let (m, _) = self.dims2("getrf")?;
        let (lu, pivots) = self.getrf()?;
        Ok((lu, permutation_matrix_from(&pivots, m)))
    }

    /// Cholesky-factor a copy into the requested triangle
    ///
    /// Dense square receivers; integer and rational dtypes promote to F64.
    /// Fails with [`Error::NotPositiveDefinite`] when the input is not
    /// positive definite.
    pub fn potrf(&self, triangle: Triangle) -> Result<Matrix> {
        let n = self.square_dim("potrf")?;
        self.dense_store("potrf")?;
        let dtype = linalg_dtype(self.dtype());
        let mut work = self.cast(StorageKind::Dense, dtype)?;
        dispatch_linalg!(dtype, T => {
            kernels::potrf(triangle, n, work.dense_store_mut("potrf")?.as_mut_slice::<T>(), n)
        }, "potrf")?;
        Ok(work)
    }

    /// Cholesky-factor by move; kernel dtypes only
    pub fn potrf_in_place(mut self, triangle: Triangle) -> Result<Matrix> {
        let n = self.square_dim("potrf")?;
        self.dense_store("potrf")?;
        let dtype = self.dtype();
        dispatch_linalg!(dtype, T => {
            kernels::potrf(triangle, n, self.dense_store_mut("potrf")?.as_mut_slice::<T>(), n)
        }, "potrf")?;
        Ok(self)
    }

    /// Both Cholesky factors of a copy as `(U, L)` with `U == Lᴴ` and
    /// `L·Lᴴ ≈ A`
    pub fn factorize_cholesky(&self) -> Result<(Matrix, Matrix)> {
        let upper = self.potrf(Triangle::Upper)?;
        let lower = self.potrf(Triangle::Lower)?;
        Ok((upper, lower))
    }

    /// Invert a copy
    ///
    /// Accepts any storage kind (sparse receivers densify) and promotes
    /// non-kernel dtypes to F64. Tries the LU path first; any failure
    /// there retries with Gauss-Jordan elimination on a fresh copy, and
    /// only a Gauss-Jordan failure (a genuinely singular matrix)
    /// propagates.
    pub fn invert(&self) -> Result<Matrix> {
        let n = self.square_dim("invert")?;
        let dtype = linalg_dtype(self.dtype());
        let work = self.cast(StorageKind::Dense, dtype)?;
        match lu_inverse(work.clone(), n) {
            Ok(inverse) => Ok(inverse),
            Err(_) => gauss_jordan(work, n),
        }
    }

    /// Invert by move; dense receivers with a kernel dtype only. The same
    /// LU-then-Gauss-Jordan retry applies, restoring the original payload
    /// between attempts.
    pub fn invert_in_place(mut self) -> Result<Matrix> {
        let n = self.square_dim("invert")?;
        self.dense_store("invert")?;
        let dtype = self.dtype();
        dispatch_linalg!(dtype, T => {
            let data = self.dense_store_mut("invert")?.as_mut_slice::<T>();
            let backup: Vec<T> = data.to_vec();
            match kernels::getrf(n, n, data, n) {
                Ok(pivots) => kernels::getri(n, data, n, &pivots),
                Err(_) => {
                    data.copy_from_slice(&backup);
                    kernels::gauss_jordan_inverse(n, data, n)?;
                }
            }
            Ok(())
        }, "invert")?;
        Ok(self)
    }

    /// Determinant via the LU diagonal
    ///
    /// Integer and Bool receivers compute in F64 and cast the result back
    /// to an integer scalar. A singular matrix yields determinant zero
    /// rather than an error.
    pub fn det(&self) -> Result<Scalar> {
        let n = self.square_dim("det")?;
        let src_dtype = self.dtype();
        let was_int = src_dtype.is_int() || src_dtype == DType::Bool;
        let dtype = linalg_dtype(src_dtype);
        let mut work = self.cast(StorageKind::Dense, dtype)?;
        dispatch_linalg!(dtype, T => {
            let data = work.dense_store_mut("det")?.as_mut_slice::<T>();
            let pivots = match kernels::getrf(n, n, data, n) {
                Ok(pivots) => pivots,
                Err(Error::SingularMatrix { .. }) => {
                    return Ok(if was_int {
                        Scalar::I64(0)
                    } else {
                        T::zero().into_scalar()
                    });
                }
                Err(e) => return Err(e),
            };
            let mut odd = false;
            for (i, &p) in pivots.iter().enumerate() {
                if p as usize != i {
                    odd = !odd;
                }
            }
            let mut product = T::one();
            for i in 0..n {
                product = product * data[i * n + i];
            }
            if odd {
                product = product.neg_value();
            }
            if was_int {
                Ok(Scalar::I64(product.to_f64().round() as i64))
            } else {
                Ok(product.into_scalar())
            }
        }, "det")
    }

    /// Solve `self · x = b` for a single-column `b`
    ///
    /// Both operands dense, neither integer/Bool; the system factors in
    /// `upcast(self.dtype, b.dtype)` and the solution comes back as a
    /// dense `[n, 1]` matrix of that dtype.
    pub fn solve(&self, b: &Matrix) -> Result<Matrix> {
        let n = self.square_dim("solve")?;
        let (b_rows, b_cols) = b.dims2("solve")?;
        if b_cols != 1 || b_rows != n {
            return Err(Error::shape_mismatch(&[n, 1], b.shape()));
        }
        self.dense_store("solve")?;
        b.dense_store("solve")?;
        for dtype in [self.dtype(), b.dtype()] {
            if dtype.is_int() || dtype == DType::Bool {
                return Err(Error::unsupported_dtype(dtype, "solve"));
            }
        }
        let dtype = upcast(self.dtype(), b.dtype());
        let mut lu = self.cast(StorageKind::Dense, dtype)?;
        let rhs_matrix = b.cast(StorageKind::Dense, dtype)?;
        dispatch_linalg!(dtype, T => {
            let data = lu.dense_store_mut("solve")?.as_mut_slice::<T>();
            let pivots = kernels::getrf(n, n, data, n)?;
            let mut rhs: Vec<T> = rhs_matrix.dense_store("solve")?.as_slice::<T>().to_vec();
            kernels::getrs(n, data, n, &pivots, &mut rhs);
            Ok(Matrix::from_slice(&rhs, &[n, 1]))
        }, "solve")
    }

    /// Matrix power by exponentiation-by-squaring
    ///
    /// `pow(0)` is the identity in the receiver's dtype and storage kind,
    /// `pow(1)` a clone; negative exponents invert first. Signed integer
    /// receivers widen to I64 and unsigned to U64 before multiplying.
    pub fn pow(&self, exponent: i64) -> Result<Matrix> {
        let n = self.square_dim("pow")?;
        match exponent {
            0 => Matrix::identity_of_kind(n, self.dtype(), self.kind()),
            1 => Ok(self.clone()),
            e if e < 0 => self.invert()?.pow_abs(e.unsigned_abs()),
            e => self.pow_abs(e as u64),
        }
    }

    fn pow_abs(&self, mut exponent: u64) -> Result<Matrix> {
        let n = self.square_dim("pow")?;
        let dtype = self.dtype();
        let work_dtype = if dtype.is_signed_int() {
            DType::I64
        } else if dtype.is_unsigned_int() {
            DType::U64
        } else {
            dtype
        };
        let mut sequence = self.cast_dtype(work_dtype)?;
        let mut product = Matrix::identity_of_kind(n, work_dtype, self.kind())?;
        while exponent > 0 {
            if exponent & 1 == 1 {
                product = product.matmul(&sequence)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                sequence = sequence.matmul(&sequence)?;
            }
        }
        Ok(product)
    }

    /// Kronecker product, dense result shaped `[m₁·m₂, n₁·n₂]`
    ///
    /// Works across storage kinds: rows materialize through the row
    /// accessor and each `(i₁, i₂)` pair contributes the flattened outer
    /// product of the two rows as one result row.
    pub fn kron_prod(&self, other: &Matrix) -> Result<Matrix> {
        let (m1, n1) = self.dims2("kron_prod")?;
        let (m2, n2) = other.dims2("kron_prod")?;
        let dtype = upcast(self.dtype(), other.dtype());
        if dtype == DType::Bool {
            return Err(Error::unsupported_dtype(dtype, "kron_prod"));
        }
        let mut right_rows = Vec::with_capacity(m2);
        for i2 in 0..m2 {
            right_rows.push(other.row_copy(i2)?.cast_dtype(dtype)?);
        }
        dispatch_dtype!(dtype, T => {
            let row_len = n1 * n2;
            let mut out = vec![T::zero(); (m1 * m2) * row_len];
            for i1 in 0..m1 {
                let left = self.row_copy(i1)?.cast_dtype(dtype)?.transpose()?;
                for (i2, right) in right_rows.iter().enumerate() {
                    let block = left.matmul(right)?;
                    let values = block.dense_store("kron_prod")?.as_slice::<T>();
                    let dest = (i1 * m2 + i2) * row_len;
                    out[dest..dest + row_len].copy_from_slice(values);
                }
            }
            Ok(Matrix::from_slice(&out, &[m1 * m2, n1 * n2]))
        }, "kron_prod")
    }

    /// Permute the columns of a copy by a Column-Order Array
    ///
    /// The `convention` says how to read `order`: LAPACK successive-swap
    /// form applies as-is, the direct form is validated (full length, in
    /// range, no duplicates) and converted first.
    pub fn permute_columns(&self, order: &[usize], convention: Convention) -> Result<Matrix> {
        self.clone().permute_columns_in_place(order, convention)
    }

    /// Permute columns by move; dense receivers only
    pub fn permute_columns_in_place(
        mut self,
        order: &[usize],
        convention: Convention,
    ) -> Result<Matrix> {
        let (rows, cols) = self.dims2("permute_columns")?;
        self.dense_store("permute_columns")?;
        let swaps = match convention {
            Convention::Lapack => {
                if order.len() > cols || order.iter().any(|&c| c >= cols) {
                    return Err(Error::invalid_argument(
                        "order",
                        format!("swap targets must stay within {cols} columns"),
                    ));
                }
                order.to_vec()
            }
            Convention::Intuitive => intuitive_to_lapack(order, cols)?,
        };
        dispatch_dtype!(self.dtype(), T => {
            let data = self.dense_store_mut("permute_columns")?.as_mut_slice::<T>();
            kernels::laswp(rows, data, cols, &swaps);
            Ok(())
        }, "permute_columns")?;
        Ok(self)
    }

    /// Householder reduction of a copy to upper Hessenberg form;
    /// F32/F64 only
    pub fn hessenberg(&self) -> Result<Matrix> {
        self.square_dim("hessenberg")?;
        self.dense_store("hessenberg")?;
        self.clone().hessenberg_in_place()
    }

    /// Hessenberg reduction by move
    pub fn hessenberg_in_place(mut self) -> Result<Matrix> {
        let n = self.square_dim("hessenberg")?;
        self.dense_store("hessenberg")?;
        match self.dtype() {
            DType::F32 => {
                kernels::hessenberg(n, self.dense_store_mut("hessenberg")?.as_mut_slice::<f32>(), n)
            }
            DType::F64 => {
                kernels::hessenberg(n, self.dense_store_mut("hessenberg")?.as_mut_slice::<f64>(), n)
            }
            dtype => return Err(Error::unsupported_dtype(dtype, "hessenberg")),
        }
        Ok(self)
    }

    /// One-sided Jacobi SVD: `(u, s, vt)` with `u` `[m, k]`, `s` `[k]`,
    /// `vt` `[k, n]`, singular values descending; F32/F64 dense only
    ///
    /// The workspace hint is accepted for interface compatibility and
    /// ignored; the kernels size their own scratch space.
    pub fn gesvd(&self, workspace: Option<usize>) -> Result<(Matrix, Matrix, Matrix)> {
        self.svd_impl("gesvd", workspace, false)
    }

    /// QR-preconditioned Jacobi SVD, same contract as [`Matrix::gesvd`]
    pub fn gesdd(&self, workspace: Option<usize>) -> Result<(Matrix, Matrix, Matrix)> {
        self.svd_impl("gesdd", workspace, true)
    }

    fn svd_impl(
        &self,
        op: &'static str,
        _workspace: Option<usize>,
        preconditioned: bool,
    ) -> Result<(Matrix, Matrix, Matrix)> {
        let (m, n) = self.dims2(op)?;
        let store = self.dense_store(op)?;
        let k = m.min(n);

        fn pack<T: LinalgElement>(
            m: usize,
            n: usize,
            k: usize,
            a: &[T],
            preconditioned: bool,
        ) -> (Matrix, Matrix, Matrix) {
            let (u, s, vt) = if preconditioned {
                svd::qr_jacobi_svd(m, n, a)
            } else {
                svd::jacobi_svd(m, n, a)
            };
            (
                Matrix::from_slice(&u, &[m, k]),
                Matrix::from_slice(&s, &[k]),
                Matrix::from_slice(&vt, &[k, n]),
            )
        }

        match self.dtype() {
            DType::F32 => Ok(pack(m, n, k, store.as_slice::<f32>(), preconditioned)),
            DType::F64 => Ok(pack(m, n, k, store.as_slice::<f64>(), preconditioned)),
            dtype => Err(Error::unsupported_dtype(dtype, op)),
        }
    }

    /// Sum of the diagonal as a scalar of the receiver's dtype family
    pub fn trace(&self) -> Result<Scalar> {
        let n = self.square_dim("trace")?;
        dispatch_dtype!(self.dtype(), T => {
            let mut total = T::zero();
            for i in 0..n {
                total = total + T::from_scalar(self.get(&[i, i])?);
            }
            Ok(total.into_scalar())
        }, "trace")
    }

    /// Conjugate a copy in the requested storage kind
    ///
    /// The result dtype is `upcast(dtype, Complex64)`, so real receivers
    /// come back complex with zero imaginary parts conjugated to zero.
    pub fn complex_conjugate(&self, kind: StorageKind) -> Result<Matrix> {
        let dtype = upcast(self.dtype(), DType::Complex64);
        let work = self.cast(kind, dtype)?;
        match dtype {
            DType::Complex64 => map_stored::<Complex64, Complex64>(&work, dtype, Complex64::conj),
            DType::Complex128 => {
                map_stored::<Complex128, Complex128>(&work, dtype, Complex128::conj)
            }
            other => Err(Error::unsupported_dtype(other, "conjugate")),
        }
    }

    /// Conjugate stored elements by move; complex receivers only
    pub fn conjugate_in_place(mut self) -> Result<Matrix> {
        match self.dtype() {
            DType::Complex64 => conjugate_stored::<Complex64>(&mut self),
            DType::Complex128 => conjugate_stored::<Complex128>(&mut self),
            dtype => return Err(Error::unsupported_dtype(dtype, "conjugate")),
        }
        Ok(self)
    }

    /// Conjugate transpose; real receivers transpose unchanged
    pub fn conjugate_transpose(&self) -> Result<Matrix> {
        let transposed = self.transpose()?;
        if transposed.dtype().is_complex() {
            transposed.conjugate_in_place()
        } else {
            Ok(transposed)
        }
    }

    /// Strided magnitude sum (BLAS `asum`: `|re| + |im|` per complex
    /// element) over a dense vector, returned as an F64 scalar
    ///
    /// `count` defaults to every strided position. A one-element receiver
    /// short-circuits without touching the kernel.
    pub fn asum(&self, count: Option<usize>, incx: usize) -> Result<Scalar> {
        self.dense_store("asum")?;
        if !self.is_vector() {
            return Err(Error::invalid_argument(
                "self",
                "asum requires a vector shape",
            ));
        }
        if self.numel() == 1 {
            let value = self.get(&vec![0usize; self.rank()])?;
            let total = match value {
                Scalar::C128(z) => z.re.abs() + z.im.abs(),
                other => other.to_f64().abs(),
            };
            return Ok(Scalar::F64(total));
        }
        let count = self.strided_count("asum", count, incx)?;
        let dtype = linalg_dtype(self.dtype());
        let work = self.cast(StorageKind::Dense, dtype)?;
        dispatch_linalg!(dtype, T => {
            let data = work.dense_store("asum")?.as_slice::<T>();
            Ok(Scalar::F64(kernels::asum(count, data, incx)))
        }, "asum")
    }

    /// Strided Euclidean norm (BLAS `nrm2`) over a dense real vector,
    /// returned as an F64 scalar; complex receivers are rejected
    pub fn nrm2(&self, count: Option<usize>, incx: usize) -> Result<Scalar> {
        self.dense_store("nrm2")?;
        if !self.is_vector() {
            return Err(Error::invalid_argument(
                "self",
                "nrm2 requires a vector shape",
            ));
        }
        if self.dtype().is_complex() {
            return Err(Error::unsupported_dtype(self.dtype(), "nrm2"));
        }
        let count = self.strided_count("nrm2", count, incx)?;
        let dtype = linalg_dtype(self.dtype());
        let work = self.cast(StorageKind::Dense, dtype)?;
        dispatch_linalg!(dtype, T => {
            let data = work.dense_store("nrm2")?.as_slice::<T>();
            Ok(Scalar::F64(kernels::nrm2(count, data, incx)))
        }, "nrm2")
    }

    fn strided_count(
        &self,
        op: &'static str,
        count: Option<usize>,
        incx: usize,
    ) -> Result<usize> {
        if incx == 0 {
            return Err(Error::invalid_argument("incx", "stride must be non-zero"));
        }
        let len = self.numel();
        let count = count.unwrap_or((len - 1) / incx + 1);
        if count > 0 && (count - 1) * incx >= len {
            return Err(Error::invalid_argument(
                op,
                format!("count {count} with stride {incx} overruns {len} elements"),
            ));
        }
        Ok(count)
    }

    /// Matrix product; sparse operands densify and the result is dense
    ///
    /// The result dtype is the upcast of the operand dtypes; Bool operands
    /// are rejected like the elementwise forms.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        let (m, inner) = self.dims2("matmul")?;
        let (other_rows, n) = other.dims2("matmul")?;
        if inner != other_rows {
            return Err(Error::shape_mismatch(&[inner, n], other.shape()));
        }
        let dtype = upcast(self.dtype(), other.dtype());
        if dtype == DType::Bool {
            return Err(Error::unsupported_dtype(dtype, "matmul"));
        }
        let lhs = self.cast(StorageKind::Dense, dtype)?;
        let rhs = other.cast(StorageKind::Dense, dtype)?;
        dispatch_dtype!(dtype, T => {
            let a = lhs.dense_store("matmul")?.as_slice::<T>();
            let b = rhs.dense_store("matmul")?.as_slice::<T>();
            let mut out = vec![T::zero(); m * n];
            kernels::gemm(m, inner, n, a, b, &mut out);
            Ok(Matrix::from_slice(&out, &[m, n]))
        }, "matmul")
    }
}

fn lu_inverse(mut work: Matrix, n: usize) -> Result<Matrix> {
    let dtype = work.dtype();
    dispatch_linalg!(dtype, T => {
        let data = work.dense_store_mut("invert")?.as_mut_slice::<T>();
        let pivots = kernels::getrf(n, n, data, n)?;
        kernels::getri(n, data, n, &pivots);
        Ok(())
    }, "invert")?;
    Ok(work)
}

fn gauss_jordan(mut work: Matrix, n: usize) -> Result<Matrix> {
    let dtype = work.dtype();
    dispatch_linalg!(dtype, T => {
        kernels::gauss_jordan_inverse(n, work.dense_store_mut("invert")?.as_mut_slice::<T>(), n)
    }, "invert")?;
    Ok(work)
}

fn conjugate_stored<T: Element>(m: &mut Matrix) where T: LinalgElement {
    use crate::matrix::Store;
    let slice = match m.store_mut() {
        Store::Dense(store) => store.as_mut_slice::<T>(),
        Store::List(store) => store.values_mut().as_mut_slice::<T>(),
        Store::Yale(store) => store.values_mut().as_mut_slice::<T>(),
    };
    for v in slice.iter_mut() {
        *v = v.conj_val();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_factorize_lu_with_permutation() {
        let a = Matrix::from_slice(&[0.0f64, 1.0, 2.0, 0.0], &[2, 2]);
        let (lu, p) = a.factorize_lu_with_permutation().unwrap();
        assert_eq!(lu.shape(), &[2, 2]);
        // P·A = L·U; here P swaps the rows
        assert_eq!(p.to_vec::<u8>().unwrap(), [0, 1, 1, 0]);
    }

    #[test]
    fn test_getrf_promotes_integers() {
        let a = Matrix::from_slice(&[2i32, 1, 1, 3], &[2, 2]);
        let (lu, _) = a.getrf().unwrap();
        assert_eq!(lu.dtype(), DType::F64);
    }

    #[test]
    fn test_getrf_in_place_rejects_integers() {
        let a = Matrix::from_slice(&[2i32, 1, 1, 3], &[2, 2]);
        assert!(matches!(
            a.getrf_in_place(),
            Err(Error::UnsupportedDType { .. })
        ));
    }

    #[test]
    fn test_invert_round_trip() {
        let a = Matrix::from_slice(&[4.0f64, 7.0, 2.0, 6.0], &[2, 2]);
        let inv = a.invert().unwrap();
        let eye = a.matmul(&inv).unwrap();
        let v = eye.to_vec::<f64>().unwrap();
        assert!(approx(v[0], 1.0, 1e-12) && approx(v[3], 1.0, 1e-12));
        assert!(approx(v[1], 0.0, 1e-12) && approx(v[2], 0.0, 1e-12));
    }

    #[test]
    fn test_invert_singular_propagates() {
        let a = Matrix::from_slice(&[1.0f64, 2.0, 2.0, 4.0], &[2, 2]);
        assert!(matches!(a.invert(), Err(Error::SingularMatrix { .. })));
    }

    #[test]
    fn test_det_values_and_int_cast_back() {
        let a = Matrix::from_slice(&[3i64, 8, 4, 6], &[2, 2]);
        assert_eq!(a.det().unwrap(), Scalar::I64(-14));

        let f = Matrix::from_slice(&[2.0f64, 0.0, 0.0, 3.0], &[2, 2]);
        assert_eq!(f.det().unwrap(), Scalar::F64(6.0));

        let singular = Matrix::from_slice(&[1.0f64, 2.0, 2.0, 4.0], &[2, 2]);
        assert_eq!(singular.det().unwrap(), Scalar::F64(0.0));
    }

    #[test]
    fn test_solve_known_system() {
        let a = Matrix::from_slice(&[3.0f64, 1.0, 1.0, 2.0], &[2, 2]);
        let b = Matrix::from_slice(&[9.0f64, 8.0], &[2, 1]);
        let x = a.solve(&b).unwrap();
        let v = x.to_vec::<f64>().unwrap();
        assert!(approx(v[0], 2.0, 1e-12) && approx(v[1], 3.0, 1e-12));
    }

    #[test]
    fn test_solve_rejects_integer_operands() {
        let a = Matrix::from_slice(&[3i64, 1, 1, 2], &[2, 2]);
        let b = Matrix::from_slice(&[9.0f64, 8.0], &[2, 1]);
        assert!(matches!(a.solve(&b), Err(Error::UnsupportedDType { .. })));
    }

    #[test]
    fn test_pow_identities() {
        let a = Matrix::from_slice(&[1.0f64, 1.0, 0.0, 1.0], &[2, 2]);
        let p0 = a.pow(0).unwrap();
        assert_eq!(p0.to_vec::<f64>().unwrap(), [1.0, 0.0, 0.0, 1.0]);

        let p1 = a.pow(1).unwrap();
        assert_eq!(p1.to_vec::<f64>().unwrap(), a.to_vec::<f64>().unwrap());

        let p3 = a.pow(3).unwrap();
        assert_eq!(p3.to_vec::<f64>().unwrap(), [1.0, 3.0, 0.0, 1.0]);

        let pm1 = a.pow(-1).unwrap();
        let eye = a.matmul(&pm1).unwrap().to_vec::<f64>().unwrap();
        assert!(approx(eye[0], 1.0, 1e-12) && approx(eye[1], 0.0, 1e-12));
    }

    #[test]
    fn test_pow_widens_integers() {
        let a = Matrix::from_slice(&[2i8, 0, 0, 2], &[2, 2]);
        let p = a.pow(10).unwrap();
        assert_eq!(p.dtype(), DType::I64);
        assert_eq!(p.to_vec::<i64>().unwrap(), [1024, 0, 0, 1024]);
    }

    #[test]
    fn test_kron_prod_block_layout() {
        let a = Matrix::from_slice(&[1i64, 2, 3, 4], &[2, 2]);
        let ones = Matrix::ones(&[2, 3], DType::I64);
        let k = a.kron_prod(&ones).unwrap();
        assert_eq!(k.shape(), &[4, 6]);
        let v = k.to_vec::<i64>().unwrap();
        assert_eq!(&v[0..6], &[1, 1, 1, 2, 2, 2]);
        assert_eq!(&v[18..24], &[3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn test_permute_columns_conventions_agree() {
        let a = Matrix::from_slice(&[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        // result column i = source column order[i]
        let order = [2usize, 0, 1];
        let direct = a.permute_columns(&order, Convention::Intuitive).unwrap();
        assert_eq!(direct.to_vec::<f64>().unwrap(), [3.0, 1.0, 2.0, 6.0, 4.0, 5.0]);

        let swaps = intuitive_to_lapack(&order, 3).unwrap();
        let via_lapack = a.permute_columns(&swaps, Convention::Lapack).unwrap();
        assert_eq!(
            via_lapack.to_vec::<f64>().unwrap(),
            direct.to_vec::<f64>().unwrap()
        );
    }

    #[test]
    fn test_permute_columns_validates_intuitive_order() {
        let a = Matrix::zeros(&[2, 3], DType::F64);
        assert!(a.permute_columns(&[0, 1], Convention::Intuitive).is_err());
        assert!(a.permute_columns(&[0, 1, 1], Convention::Intuitive).is_err());
        assert!(a.permute_columns(&[0, 1, 3], Convention::Intuitive).is_err());
    }

    #[test]
    fn test_hessenberg_shape_and_dtype_gate() {
        let a = Matrix::from_slice(
            &[4.0f64, 1.0, 2.0, 1.0, 5.0, 1.0, 2.0, 1.0, 6.0],
            &[3, 3],
        );
        let h = a.hessenberg().unwrap();
        let v = h.to_vec::<f64>().unwrap();
        assert!(v[6].abs() < 1e-10, "below-subdiagonal survived: {}", v[6]);

        let c = Matrix::zeros(&[2, 2], DType::Complex128);
        assert!(matches!(
            c.hessenberg(),
            Err(Error::UnsupportedDType { .. })
        ));
    }

    #[test]
    fn test_gesvd_shapes_and_order() {
        let a = Matrix::from_slice(&[3.0f64, 0.0, 0.0, 0.0, 2.0, 0.0], &[2, 3]);
        let (u, s, vt) = a.gesvd(None).unwrap();
        assert_eq!(u.shape(), &[2, 2]);
        assert_eq!(s.shape(), &[2]);
        assert_eq!(vt.shape(), &[2, 3]);
        let sv = s.to_vec::<f64>().unwrap();
        assert!(approx(sv[0], 3.0, 1e-10) && approx(sv[1], 2.0, 1e-10));

        // workspace hint is accepted and ignored
        let (_, s2, _) = a.gesdd(Some(1)).unwrap();
        assert!(approx(s2.to_vec::<f64>().unwrap()[0], 3.0, 1e-9));
    }

    #[test]
    fn test_trace_across_kinds() {
        let dense = Matrix::from_slice(&[1i64, 9, 9, 2], &[2, 2]);
        assert_eq!(dense.trace().unwrap(), Scalar::I64(3));

        let yale = dense.cast(StorageKind::Yale, DType::I64).unwrap();
        assert_eq!(yale.trace().unwrap(), Scalar::I64(3));
    }

    #[test]
    fn test_conjugate_family() {
        let z = Matrix::from_slice(&[Complex128::new(1.0, 2.0)], &[1, 1]);
        let c = z.complex_conjugate(StorageKind::Dense).unwrap();
        assert_eq!(
            c.to_vec::<Complex128>().unwrap()[0],
            Complex128::new(1.0, -2.0)
        );

        let real = Matrix::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]);
        let promoted = real.complex_conjugate(StorageKind::Dense).unwrap();
        assert_eq!(promoted.dtype(), DType::Complex128);

        let ct = z.conjugate_transpose().unwrap();
        assert_eq!(
            ct.to_vec::<Complex128>().unwrap()[0],
            Complex128::new(1.0, -2.0)
        );

        assert!(real.clone().conjugate_in_place().is_err());
    }

    #[test]
    fn test_asum_and_nrm2() {
        let v = Matrix::from_slice(&[3.0f64, -4.0], &[1, 2]);
        assert_eq!(v.asum(None, 1).unwrap(), Scalar::F64(7.0));
        assert_eq!(v.nrm2(None, 1).unwrap(), Scalar::F64(5.0));

        let single = Matrix::from_slice(&[Complex128::new(-3.0, 4.0)], &[1, 1]);
        assert_eq!(single.asum(None, 1).unwrap(), Scalar::F64(7.0));

        assert!(matches!(
            v.asum(None, 0),
            Err(Error::InvalidArgument { .. })
        ));
        let m = Matrix::zeros(&[2, 2], DType::F64);
        assert!(m.asum(None, 1).is_err());

        let z = Matrix::from_slice(&[Complex128::ONE, Complex128::I], &[1, 2]);
        assert!(matches!(z.nrm2(None, 1), Err(Error::UnsupportedDType { .. })));
    }

    #[test]
    fn test_matmul_densifies_sparse() {
        let a = Matrix::yale_from_triplets(&[(0usize, 0usize, 2.0f64), (1, 1, 3.0)], &[2, 2])
            .unwrap();
        let b = Matrix::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.kind(), StorageKind::Dense);
        assert_eq!(c.to_vec::<f64>().unwrap(), [2.0, 4.0, 9.0, 12.0]);
    }

    #[test]
    fn test_cholesky_orientation() {
        let a = Matrix::from_slice(&[4.0f64, 2.0, 2.0, 3.0], &[2, 2]);
        let (u, l) = a.factorize_cholesky().unwrap();
        let lt = l.transpose().unwrap();
        assert_eq!(u.to_vec::<f64>().unwrap(), lt.to_vec::<f64>().unwrap());

        let back = l.matmul(&lt).unwrap().to_vec::<f64>().unwrap();
        let orig = a.to_vec::<f64>().unwrap();
        for i in 0..4 {
            assert!(approx(back[i], orig[i], 1e-12));
        }
    }

    #[test]
    fn test_potrf_not_positive_definite() {
        let a = Matrix::from_slice(&[1.0f64, 2.0, 2.0, 1.0], &[2, 2]);
        assert!(matches!(
            a.potrf(Triangle::Lower),
            Err(Error::NotPositiveDefinite { .. })
        ));
    }

    #[test]
    fn test_permutation_array_round_trip() {
        // pivots from a factorization that swapped rows 0<->1
        let order = permutation_array_for(&[1, 1], 2);
        assert_eq!(order, [1, 0]);
    }
}
