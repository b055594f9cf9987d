//! Axis reductions built on a shared fold
//!
//! `fold_axis` walks one axis of a matrix, pairing an accumulator with each
//! slice taken along that axis, and is the spine under `sum`, `mean`,
//! `min`, `max`, `variance`, and `std`. Rank-2 reductions keep a unit
//! dimension in the collapsed position (`[1, cols]` for axis 0, `[rows, 1]`
//! for axis 1); higher ranks drop the axis. Slices materialize densely, so
//! sparse receivers reduce into dense results.

use crate::dispatch_dtype;
use crate::dtype::{upcast, DType, Element, Scalar};
use crate::error::{Error, Result};
use crate::matrix::{typed_buffer, DenseStore, Matrix, Shape, Store};

use super::compare::CompareOp;

impl Matrix {
    /// Reduce along `axis` by folding sub-matrices into an accumulator
    ///
    /// With a `seed`, the accumulator starts as a filled matrix of the
    /// collapsed shape (in `forced` dtype when given, the receiver's
    /// otherwise) and every slice folds into it. Without a seed the first
    /// slice is the starting accumulator. The result is cast to `forced`
    /// when the fold lands elsewhere.
    pub fn fold_axis(
        &self,
        axis: usize,
        seed: Option<Scalar>,
        forced: Option<DType>,
        mut combine: impl FnMut(Matrix, Matrix) -> Result<Matrix>,
    ) -> Result<Matrix> {
        if axis >= self.rank() {
            return Err(Error::InvalidAxis {
                axis,
                rank: self.rank(),
            });
        }
        let len = self.shape()[axis];
        let collapsed = self.collapsed_shape(axis);
        let (mut acc, start) = match seed {
            Some(value) => {
                let dtype = forced.unwrap_or(self.dtype());
                (Matrix::try_filled(&collapsed, dtype, value)?, 0)
            }
            None => {
                let first = self.axis_slice(axis, 0)?;
                let first = match forced {
                    Some(dtype) if dtype != first.dtype() => first.cast_dtype(dtype)?,
                    _ => first,
                };
                (first, 1)
            }
        };
        for i in start..len {
            acc = combine(acc, self.axis_slice(axis, i)?)?;
        }
        match forced {
            Some(dtype) if acc.dtype() != dtype => acc.cast_dtype(dtype),
            _ => Ok(acc),
        }
    }

    /// Sum along an axis
    ///
    /// `Bool` receivers count their set positions into a U64 result; every
    /// other dtype keeps its own tag.
    pub fn sum(&self, axis: usize) -> Result<Matrix> {
        let forced = if self.dtype() == DType::Bool {
            Some(DType::U64)
        } else {
            None
        };
        self.fold_axis(axis, Some(Scalar::I64(0)), forced, |acc, sub| acc.add(&sub))
    }

    /// Arithmetic mean along an axis
    ///
    /// Integer and `Bool` receivers land in F64; float, complex, and
    /// rational receivers keep their dtype (rational means stay exact).
    pub fn mean(&self, axis: usize) -> Result<Matrix> {
        if axis >= self.rank() {
            return Err(Error::InvalidAxis {
                axis,
                rank: self.rank(),
            });
        }
        let count = self.shape()[axis] as u64;
        let total = self.sum(axis)?;
        let total = if total.dtype().is_int() {
            total.cast_dtype(DType::F64)?
        } else {
            total
        };
        total.div_scalar(Scalar::U64(count))
    }

    /// Minimum along an axis, keeping the receiver's dtype
    pub fn min(&self, axis: usize) -> Result<Matrix> {
        self.extremum(axis, CompareOp::Le)
    }

    /// Maximum along an axis, keeping the receiver's dtype
    pub fn max(&self, axis: usize) -> Result<Matrix> {
        self.extremum(axis, CompareOp::Ge)
    }

    /// Seedless select-fold: keep the accumulator where `keep_op` holds,
    /// take the slice elsewhere
    fn extremum(&self, axis: usize, keep_op: CompareOp) -> Result<Matrix> {
        // Bool would reject the mask multiply; fold in u8 and restore
        if self.dtype() == DType::Bool {
            let result = self.cast_dtype(DType::U8)?.extremum(axis, keep_op)?;
            return result.cast_dtype(DType::Bool);
        }
        let take_op = match keep_op {
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Ge => CompareOp::Lt,
            _ => unreachable!(),
        };
        self.fold_axis(axis, None, None, |acc, sub| {
            let work = upcast(acc.dtype(), sub.dtype());
            let keep = acc.compare(keep_op, &sub)?.cast_dtype(work)?;
            let take = acc.compare(take_op, &sub)?.cast_dtype(work)?;
            acc.mul(&keep)?.add(&sub.mul(&take)?)
        })
    }

    /// Sample variance along an axis (the `n - 1` denominator)
    ///
    /// Requires at least two entries along the axis. Integer and `Bool`
    /// receivers land in F64 through the mean.
    pub fn variance(&self, axis: usize) -> Result<Matrix> {
        if axis >= self.rank() {
            return Err(Error::InvalidAxis {
                axis,
                rank: self.rank(),
            });
        }
        let count = self.shape()[axis];
        if count < 2 {
            return Err(Error::invalid_argument(
                "axis",
                "variance requires at least two entries along the axis",
            ));
        }
        let mean = self.mean(axis)?;
        let work = upcast(mean.dtype(), self.dtype());
        let squares = self.fold_axis(axis, Some(Scalar::I64(0)), Some(work), |acc, sub| {
            let dev = sub.sub(&mean)?;
            acc.add(&dev.mul(&dev)?)
        })?;
        squares.div_scalar(Scalar::U64((count - 1) as u64))
    }

    /// Sample standard deviation along an axis: the square root of
    /// [`Matrix::variance`], landing in F64 (real dtypes only, since the
    /// root goes through the transcendental family)
    pub fn std(&self, axis: usize) -> Result<Matrix> {
        self.variance(axis)?.sqrt()
    }

    /// Collapsed result shape: rank-2 keeps a unit dimension, higher ranks
    /// drop the axis
    fn collapsed_shape(&self, axis: usize) -> Vec<usize> {
        let mut shape = self.shape().to_vec();
        if self.rank() == 2 {
            shape[axis] = 1;
        } else {
            shape.remove(axis);
        }
        shape
    }

    /// Dense copy of the `index`-th slice along `axis`, shaped like the
    /// collapsed result
    fn axis_slice(&self, axis: usize, index: usize) -> Result<Matrix> {
        match (self.rank(), axis) {
            (2, 0) => self.row_copy(index),
            (2, 1) => self.col_copy(index),
            _ => self.dense_axis_slice(axis, index),
        }
    }

    /// Copy one column of a rank-2 matrix into a dense `[rows, 1]` matrix
    pub fn col_copy(&self, col: usize) -> Result<Matrix> {
        let (rows, cols) = self.dims2("col_copy")?;
        if col >= cols {
            return Err(Error::IndexOutOfBounds {
                index: col,
                size: cols,
            });
        }
        dispatch_dtype!(self.dtype(), T => {
            let mut values = vec![T::zero(); rows];
            match self.store() {
                Store::Dense(store) => {
                    let data = store.as_slice::<T>();
                    for (r, slot) in values.iter_mut().enumerate() {
                        *slot = data[r * cols + col];
                    }
                }
                Store::List(store) => {
                    store.for_each_stored::<T>(|r, c, v| {
                        if c == col {
                            values[r] = v;
                        }
                    });
                }
                Store::Yale(store) => {
                    store.for_each_stored::<T>(|r, c, v| {
                        if c == col {
                            values[r] = v;
                        }
                    });
                }
            }
            let shape: Shape = [rows, 1].iter().copied().collect();
            Ok(Matrix::from_parts(
                shape,
                self.dtype(),
                Store::Dense(DenseStore::from_buffer(typed_buffer(self.dtype(), &values))),
            ))
        }, "col_copy")
    }

    fn dense_axis_slice(&self, axis: usize, index: usize) -> Result<Matrix> {
        let store = self.dense_store("fold_axis")?;
        let shape = self.shape();
        let outer: usize = shape[..axis].iter().product();
        let len = shape[axis];
        let inner: usize = shape[axis + 1..].iter().product();
        let collapsed = self.collapsed_shape(axis);
        dispatch_dtype!(self.dtype(), T => {
            let data = store.as_slice::<T>();
            let mut values = vec![T::zero(); outer * inner];
            for o in 0..outer {
                let src = (o * len + index) * inner;
                values[o * inner..(o + 1) * inner].copy_from_slice(&data[src..src + inner]);
            }
            let shape: Shape = collapsed.iter().copied().collect();
            Ok(Matrix::from_parts(
                shape,
                self.dtype(),
                Store::Dense(DenseStore::from_buffer(typed_buffer(self.dtype(), &values))),
            ))
        }, "fold_axis")
    }
}
