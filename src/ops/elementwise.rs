//! Elementwise arithmetic over the three storage layouts
//!
//! Matrix×matrix forms require both operands to share shape and storage
//! kind (the caller normalizes storage first); the result dtype is the
//! upcast of the operand dtypes and both operands are cast to it before the
//! kernel runs. Matrix×scalar forms feed `Scalar::min_dtype` into the same
//! upcast. Sparse kernels evaluate at stored positions only: list and yale
//! binary forms merge the two stores (absent positions read as zero) and
//! scalar forms touch stored entries alone.

use crate::dispatch_dtype;
use crate::dtype::{upcast, DType, Element, Scalar, StorageKind};
use crate::error::{Error, Result};
use crate::matrix::{build_sparse, list, typed_buffer, yale, DenseStore, Matrix, Store};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Dense element count below which kernels stay single-threaded
#[cfg(feature = "rayon")]
pub(crate) const PAR_THRESHOLD: usize = 4096;

/// Arithmetic operation tag for the elementwise operation matrix
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithOp {
    /// Elementwise addition
    Add,
    /// Elementwise subtraction
    Sub,
    /// Elementwise multiplication
    Mul,
    /// Elementwise division
    Div,
    /// Elementwise power
    Pow,
    /// Elementwise remainder (truncating toward zero)
    Rem,
}

impl ArithOp {
    /// Operation name for error reporting
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Pow => "pow",
            Self::Rem => "rem",
        }
    }

    /// True for the ops whose divisor must be screened for zero over exact
    /// (integer/rational) dtypes
    #[inline]
    const fn divides(self) -> bool {
        matches!(self, Self::Div | Self::Rem)
    }

    #[inline]
    fn apply<T: Element>(self, a: T, b: T) -> T {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Pow => a.pow_value(b),
            Self::Rem => a.rem_value(b),
        }
    }
}

/// True for dtypes where division by zero is an error rather than IEEE
#[inline]
fn exact_dtype(dtype: DType) -> bool {
    dtype.is_int() || dtype.is_rational()
}

fn check_arith_dtype(dtype: DType, op: ArithOp) -> Result<()> {
    if dtype == DType::Bool {
        return Err(Error::unsupported_dtype(dtype, op.name()));
    }
    Ok(())
}

impl Matrix {
    /// Elementwise binary arithmetic against another matrix
    ///
    /// Preconditions: same shape, same storage kind. The result dtype is
    /// `upcast(self.dtype(), other.dtype())` and the result keeps the
    /// operands' storage kind.
    pub fn arith(&self, op: ArithOp, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        if self.kind() != other.kind() {
            return Err(Error::storage_mismatch(self.kind(), other.kind()));
        }
        let dtype = upcast(self.dtype(), other.dtype());
        check_arith_dtype(dtype, op)?;
        let lhs = self.cast(self.kind(), dtype)?;
        let rhs = other.cast(other.kind(), dtype)?;
        dispatch_dtype!(dtype, T => {
            arith_kernel::<T>(op, &lhs, &rhs, dtype)
        }, op.name())
    }

    /// Elementwise arithmetic against a scalar operand
    ///
    /// The result dtype is `upcast(self.dtype(), value.min_dtype())`.
    /// Sparse receivers apply the operation to stored entries only.
    pub fn arith_scalar(&self, op: ArithOp, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar_ordered(op, value, false)
    }

    /// Reverse-dispatched scalar arithmetic: the scalar is the left-hand
    /// operand (`value - self`, `value / self`, ...)
    pub fn arith_scalar_reversed(&self, op: ArithOp, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar_ordered(op, value, true)
    }

    fn arith_scalar_ordered(
        &self,
        op: ArithOp,
        value: impl Into<Scalar>,
        reversed: bool,
    ) -> Result<Matrix> {
        let value = value.into();
        let dtype = upcast(self.dtype(), value.min_dtype());
        check_arith_dtype(dtype, op)?;
        if op.divides() && exact_dtype(dtype) && !reversed && value.is_zero() {
            return Err(Error::DivisionByZero { op: op.name() });
        }
        let work = self.cast(self.kind(), dtype)?;
        dispatch_dtype!(dtype, T => {
            let s = T::from_scalar(value);
            let f = move |v: T| -> T {
                if reversed {
                    op.apply(s, v)
                } else {
                    op.apply(v, s)
                }
            };
            if op.divides() && exact_dtype(dtype) && reversed {
                // the matrix elements are the divisors
                let has_zero = match work.store() {
                    Store::Dense(store) => store.as_slice::<T>().contains(&T::zero()),
                    Store::List(store) => store.values().as_slice::<T>().contains(&T::zero()),
                    Store::Yale(store) => store.values().as_slice::<T>().contains(&T::zero()),
                };
                if has_zero {
                    return Err(Error::DivisionByZero { op: op.name() });
                }
            }
            map_stored::<T, T>(&work, dtype, f)
        }, op.name())
    }

    /// Elementwise arithmetic by move, writing through the receiver's store
    ///
    /// The computation runs in the receiver's dtype (the other operand is
    /// cast to it); dense only, since a sparse result structure can differ
    /// from the receiver's.
    pub fn arith_in_place(mut self, op: ArithOp, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        let dtype = self.dtype();
        check_arith_dtype(dtype, op)?;
        let rhs = other.cast(StorageKind::Dense, dtype)?;
        dispatch_dtype!(dtype, T => {
            let b = rhs.dense_store(op.name())?.as_slice::<T>();
            if op.divides() && exact_dtype(dtype) && b.contains(&T::zero()) {
                return Err(Error::DivisionByZero { op: op.name() });
            }
            let a = self.dense_store_mut(op.name())?.as_mut_slice::<T>();
            zip_assign(a, b, |x, y| op.apply(x, y));
            Ok(self)
        }, op.name())
    }

    /// Scalar arithmetic by move, writing through the receiver's store
    ///
    /// Runs in the receiver's dtype; sparse receivers update stored entries
    /// only.
    pub fn arith_scalar_in_place(mut self, op: ArithOp, value: impl Into<Scalar>) -> Result<Matrix> {
        let value = value.into();
        let dtype = self.dtype();
        check_arith_dtype(dtype, op)?;
        if op.divides() && exact_dtype(dtype) && value.is_zero() {
            return Err(Error::DivisionByZero { op: op.name() });
        }
        dispatch_dtype!(dtype, T => {
            let s = T::from_scalar(value);
            let slice = match self.store_mut() {
                Store::Dense(store) => store.as_mut_slice::<T>(),
                Store::List(store) => store.values_mut().as_mut_slice::<T>(),
                Store::Yale(store) => store.values_mut().as_mut_slice::<T>(),
            };
            for v in slice.iter_mut() {
                *v = op.apply(*v, s);
            }
            Ok(self)
        }, op.name())
    }

    /// Elementwise sum
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.arith(ArithOp::Add, other)
    }

    /// Elementwise difference
    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        self.arith(ArithOp::Sub, other)
    }

    /// Elementwise product (Hadamard); see [`Matrix::matmul`] for the
    /// matrix product
    pub fn mul(&self, other: &Matrix) -> Result<Matrix> {
        self.arith(ArithOp::Mul, other)
    }

    /// Elementwise quotient
    pub fn div(&self, other: &Matrix) -> Result<Matrix> {
        self.arith(ArithOp::Div, other)
    }

    /// Elementwise power; see [`Matrix::pow`] for the matrix power
    pub fn pow_elem(&self, other: &Matrix) -> Result<Matrix> {
        self.arith(ArithOp::Pow, other)
    }

    /// Elementwise remainder, truncating toward zero
    pub fn rem(&self, other: &Matrix) -> Result<Matrix> {
        self.arith(ArithOp::Rem, other)
    }

    /// Add a scalar to every element (stored entries only on sparse kinds)
    pub fn add_scalar(&self, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar(ArithOp::Add, value)
    }

    /// Subtract a scalar from every element
    pub fn sub_scalar(&self, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar(ArithOp::Sub, value)
    }

    /// Subtract every element from a scalar (`value - self`)
    pub fn rsub_scalar(&self, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar_reversed(ArithOp::Sub, value)
    }

    /// Multiply every element by a scalar
    pub fn mul_scalar(&self, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar(ArithOp::Mul, value)
    }

    /// Divide every element by a scalar
    pub fn div_scalar(&self, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar(ArithOp::Div, value)
    }

    /// Divide a scalar by every element (`value / self`)
    pub fn rdiv_scalar(&self, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar_reversed(ArithOp::Div, value)
    }

    /// Raise every element to a scalar power
    pub fn pow_scalar(&self, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar(ArithOp::Pow, value)
    }

    /// Remainder of every element by a scalar
    pub fn rem_scalar(&self, value: impl Into<Scalar>) -> Result<Matrix> {
        self.arith_scalar(ArithOp::Rem, value)
    }
}

fn arith_kernel<T: Element>(
    op: ArithOp,
    lhs: &Matrix,
    rhs: &Matrix,
    dtype: DType,
) -> Result<Matrix> {
    let (shape, kind) = (lhs.shape().to_vec(), lhs.kind());
    let store = match (lhs.store(), rhs.store()) {
        (Store::Dense(a), Store::Dense(b)) => {
            let a = a.as_slice::<T>();
            let b = b.as_slice::<T>();
            if op.divides() && exact_dtype(dtype) && b.contains(&T::zero()) {
                return Err(Error::DivisionByZero { op: op.name() });
            }
            let mut out = vec![T::zero(); a.len()];
            zip_into(a, b, &mut out, |x, y| op.apply(x, y));
            Store::Dense(DenseStore::from_buffer(typed_buffer(dtype, &out)))
        }
        (Store::List(a), Store::List(b)) => {
            let mut entries: Vec<(usize, usize, T)> = Vec::new();
            let mut zero_divisor = false;
            list::merge_stored::<T>(a, b, |r, c, x, y| {
                if op.divides() && exact_dtype(dtype) && y == T::zero() {
                    zero_divisor = true;
                    return;
                }
                entries.push((r, c, op.apply(x, y)));
            });
            if zero_divisor {
                return Err(Error::DivisionByZero { op: op.name() });
            }
            sparse_result(kind, entries, lhs.dims2(op.name())?, dtype)?
        }
        (Store::Yale(a), Store::Yale(b)) => {
            let mut entries: Vec<(usize, usize, T)> = Vec::new();
            let mut zero_divisor = false;
            yale::merge_stored::<T>(a, b, |r, c, x, y| {
                if op.divides() && exact_dtype(dtype) && y == T::zero() {
                    zero_divisor = true;
                    return;
                }
                entries.push((r, c, op.apply(x, y)));
            });
            if zero_divisor {
                return Err(Error::DivisionByZero { op: op.name() });
            }
            sparse_result(kind, entries, lhs.dims2(op.name())?, dtype)?
        }
        _ => unreachable!("storage kinds checked by caller"),
    };
    Ok(Matrix::from_parts(
        shape.iter().copied().collect(),
        dtype,
        store,
    ))
}

/// Map every stored element, keeping the coordinate structure
///
/// Used by the scalar arithmetic forms here and the unary layer; the output
/// dtype may differ from the input's (`U` must match `out_dtype`).
pub(crate) fn map_stored<T: Element, U: Element>(
    m: &Matrix,
    out_dtype: DType,
    f: impl Fn(T) -> U,
) -> Result<Matrix> {
    let store = match m.store() {
        Store::Dense(src) => {
            let out: Vec<U> = src.as_slice::<T>().iter().map(|&v| f(v)).collect();
            Store::Dense(DenseStore::from_buffer(typed_buffer(out_dtype, &out)))
        }
        Store::List(src) => {
            let out: Vec<U> = src.values().as_slice::<T>().iter().map(|&v| f(v)).collect();
            Store::List(crate::matrix::ListStore::from_parts(
                src.row_indices.clone(),
                src.col_indices.clone(),
                typed_buffer(out_dtype, &out),
                dims_of(m)?,
            )?)
        }
        Store::Yale(src) => {
            let out: Vec<U> = src.values().as_slice::<T>().iter().map(|&v| f(v)).collect();
            Store::Yale(crate::matrix::YaleStore::from_parts(
                src.row_ptrs.clone(),
                src.col_indices.clone(),
                typed_buffer(out_dtype, &out),
                dims_of(m)?,
            )?)
        }
    };
    Ok(Matrix::from_parts(
        m.shape().iter().copied().collect(),
        out_dtype,
        store,
    ))
}

fn dims_of(m: &Matrix) -> Result<[usize; 2]> {
    let (rows, cols) = m.dims2("map_stored")?;
    Ok([rows, cols])
}

/// Build a sparse store from merge output, dropping zero results
pub(crate) fn sparse_result<T: Element>(
    kind: StorageKind,
    entries: Vec<(usize, usize, T)>,
    dims: (usize, usize),
    dtype: DType,
) -> Result<Store> {
    let mut rows = Vec::with_capacity(entries.len());
    let mut cols = Vec::with_capacity(entries.len());
    let mut values = Vec::with_capacity(entries.len());
    for (r, c, v) in entries {
        if v != T::zero() {
            rows.push(r);
            cols.push(c);
            values.push(v);
        }
    }
    build_sparse(kind, rows, cols, values, [dims.0, dims.1], dtype)
}

fn zip_into<T: Element>(a: &[T], b: &[T], out: &mut [T], f: impl Fn(T, T) -> T + Sync + Send) {
    #[cfg(feature = "rayon")]
    if a.len() >= PAR_THRESHOLD {
        out.par_iter_mut()
            .enumerate()
            .for_each(|(i, slot)| *slot = f(a[i], b[i]));
        return;
    }
    for i in 0..a.len() {
        out[i] = f(a[i], b[i]);
    }
}

fn zip_assign<T: Element>(a: &mut [T], b: &[T], f: impl Fn(T, T) -> T + Sync + Send) {
    #[cfg(feature = "rayon")]
    if a.len() >= PAR_THRESHOLD {
        a.par_iter_mut()
            .enumerate()
            .for_each(|(i, slot)| *slot = f(*slot, b[i]));
        return;
    }
    for i in 0..a.len() {
        a[i] = f(a[i], b[i]);
    }
}
