//! Elementwise comparisons producing Bool matrices
//!
//! Comparisons never upcast their result: the output dtype is always
//! `Bool`, u8-backed. Operands of differing dtype are compared by value
//! after casting both to their upcast tag. Sparse receivers evaluate only
//! at the union of stored positions; unstored result positions read as
//! false.

use crate::dispatch_dtype;
use crate::dtype::{upcast, DType, Element, Scalar};
use crate::error::{Error, Result};
use crate::matrix::{list, typed_buffer, yale, DenseStore, Matrix, Store};

use super::elementwise::sparse_result;

/// Comparison operation tag
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Greater than
    Gt,
    /// Less than or equal
    Le,
    /// Greater than or equal
    Ge,
}

impl CompareOp {
    /// Operation name for error reporting
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Le => "le",
            Self::Ge => "ge",
        }
    }

    /// Complex dtypes order by magnitude through their `PartialOrd`;
    /// NaN comparisons are false except `Ne`.
    #[inline]
    fn apply<T: Element>(self, a: T, b: T) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Lt => a < b,
            Self::Gt => a > b,
            Self::Le => a <= b,
            Self::Ge => a >= b,
        }
    }
}

impl Matrix {
    /// Elementwise comparison against another matrix
    ///
    /// Same shape and storage kind required; the result is a Bool matrix
    /// of the operands' storage kind.
    pub fn compare(&self, op: CompareOp, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        if self.kind() != other.kind() {
            return Err(Error::storage_mismatch(self.kind(), other.kind()));
        }
        let work_dtype = upcast(self.dtype(), other.dtype());
        let lhs = self.cast(self.kind(), work_dtype)?;
        let rhs = other.cast(other.kind(), work_dtype)?;
        dispatch_dtype!(work_dtype, T => {
            compare_kernel::<T>(op, &lhs, &rhs)
        }, op.name())
    }

    /// Elementwise comparison against a scalar
    ///
    /// Sparse receivers compare stored entries only.
    pub fn compare_scalar(&self, op: CompareOp, value: impl Into<Scalar>) -> Result<Matrix> {
        let value = value.into();
        let work_dtype = upcast(self.dtype(), value.min_dtype());
        let work = self.cast(self.kind(), work_dtype)?;
        dispatch_dtype!(work_dtype, T => {
            let s = T::from_scalar(value);
            super::elementwise::map_stored::<T, u8>(&work, DType::Bool, |v| {
                op.apply(v, s) as u8
            })
        }, op.name())
    }

    /// Elementwise equality
    pub fn eq_elem(&self, other: &Matrix) -> Result<Matrix> {
        self.compare(CompareOp::Eq, other)
    }

    /// Elementwise inequality
    pub fn ne_elem(&self, other: &Matrix) -> Result<Matrix> {
        self.compare(CompareOp::Ne, other)
    }

    /// Elementwise less-than
    pub fn lt(&self, other: &Matrix) -> Result<Matrix> {
        self.compare(CompareOp::Lt, other)
    }

    /// Elementwise greater-than
    pub fn gt(&self, other: &Matrix) -> Result<Matrix> {
        self.compare(CompareOp::Gt, other)
    }

    /// Elementwise less-than-or-equal
    pub fn le(&self, other: &Matrix) -> Result<Matrix> {
        self.compare(CompareOp::Le, other)
    }

    /// Elementwise greater-than-or-equal
    pub fn ge(&self, other: &Matrix) -> Result<Matrix> {
        self.compare(CompareOp::Ge, other)
    }
}

fn compare_kernel<T: Element>(op: CompareOp, lhs: &Matrix, rhs: &Matrix) -> Result<Matrix> {
    let store = match (lhs.store(), rhs.store()) {
        (Store::Dense(a), Store::Dense(b)) => {
            let a = a.as_slice::<T>();
            let b = b.as_slice::<T>();
            let out: Vec<u8> = a
                .iter()
                .zip(b.iter())
                .map(|(&x, &y)| op.apply(x, y) as u8)
                .collect();
            Store::Dense(DenseStore::from_buffer(typed_buffer(DType::Bool, &out)))
        }
        (Store::List(a), Store::List(b)) => {
            let mut entries: Vec<(usize, usize, u8)> = Vec::new();
            list::merge_stored::<T>(a, b, |r, c, x, y| {
                entries.push((r, c, op.apply(x, y) as u8));
            });
            sparse_result(lhs.kind(), entries, lhs.dims2(op.name())?, DType::Bool)?
        }
        (Store::Yale(a), Store::Yale(b)) => {
            let mut entries: Vec<(usize, usize, u8)> = Vec::new();
            yale::merge_stored::<T>(a, b, |r, c, x, y| {
                entries.push((r, c, op.apply(x, y) as u8));
            });
            sparse_result(lhs.kind(), entries, lhs.dims2(op.name())?, DType::Bool)?
        }
        _ => unreachable!("storage kinds checked by caller"),
    };
    Ok(Matrix::from_parts(
        lhs.shape().iter().copied().collect(),
        DType::Bool,
        store,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::StorageKind;

    #[test]
    fn test_dense_compare() {
        let a = Matrix::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]);
        let b = Matrix::from_slice(&[2.0f64, 2.0, 2.0, 2.0], &[2, 2]);
        let lt = a.lt(&b).unwrap();
        assert_eq!(lt.dtype(), DType::Bool);
        assert_eq!(lt.to_vec::<u8>().unwrap(), [1, 0, 0, 0]);
        let ge = a.ge(&b).unwrap();
        assert_eq!(ge.to_vec::<u8>().unwrap(), [0, 1, 1, 1]);
    }

    #[test]
    fn test_compare_mixed_dtypes_by_value() {
        let a = Matrix::from_slice(&[1i32, 2], &[1, 2]);
        let b = Matrix::from_slice(&[1.0f64, 2.5], &[1, 2]);
        let eq = a.eq_elem(&b).unwrap();
        assert_eq!(eq.to_vec::<u8>().unwrap(), [1, 0]);
    }

    #[test]
    fn test_compare_scalar() {
        let a = Matrix::from_slice(&[1i64, 5, 9], &[1, 3]);
        let m = a.compare_scalar(CompareOp::Gt, 4i64).unwrap();
        assert_eq!(m.to_vec::<u8>().unwrap(), [0, 1, 1]);
    }

    #[test]
    fn test_sparse_compare_union_only() {
        let a = Matrix::yale_from_triplets(&[(0usize, 0usize, 5.0f64), (1, 1, 1.0)], &[2, 2])
            .unwrap();
        let b = Matrix::yale_from_triplets(&[(0usize, 0usize, 5.0f64), (0, 1, 2.0)], &[2, 2])
            .unwrap();
        let eq = a.eq_elem(&b).unwrap();
        assert_eq!(eq.kind(), StorageKind::Yale);
        // (0,0): 5 == 5 -> stored true; (0,1): 0 == 2 -> false (dropped);
        // (1,1): 1 == 0 -> false; (1,0) unstored on both sides -> untouched
        assert_eq!(eq.to_vec::<u8>().unwrap(), [1, 0, 0, 0]);
        assert_eq!(eq.stored_len(), 1);
    }

    #[test]
    fn test_nan_comparisons() {
        let a = Matrix::from_slice(&[f64::NAN], &[1, 1]);
        let b = Matrix::from_slice(&[f64::NAN], &[1, 1]);
        assert_eq!(a.eq_elem(&b).unwrap().to_vec::<u8>().unwrap(), [0]);
        assert_eq!(a.ne_elem(&b).unwrap().to_vec::<u8>().unwrap(), [1]);
        assert_eq!(a.lt(&b).unwrap().to_vec::<u8>().unwrap(), [0]);
    }
}
