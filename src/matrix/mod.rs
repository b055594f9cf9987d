//! Matrix type and storage layouts
//!
//! This module provides the core `Matrix` type, an n-dimensional numeric
//! array whose element type is carried at runtime as a [`DType`] and whose
//! payload lives in one of three layouts:
//!
//! - **Dense**: contiguous row-major buffer ([`DenseStore`])
//! - **List**: sorted coordinate triples, rank-2 only ([`ListStore`])
//! - **Yale**: compressed sparse row, rank-2 only ([`YaleStore`])
//!
//! Typed kernels are reached through the `dispatch_dtype!` macro; the sparse
//! layouts treat unstored positions as zero.

mod buffer;
pub(crate) mod dense;
pub(crate) mod list;
pub(crate) mod yale;

pub use buffer::ElemBuffer;
pub use dense::DenseStore;
pub use list::ListStore;
pub use yale::YaleStore;

use crate::dispatch_dtype;
use crate::dtype::{DType, Element, Scalar, StorageKind};
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Stack allocation threshold for dimensions
/// Most matrices have 4 or fewer dimensions, so we stack-allocate up to 4
const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a matrix
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Storage payload of a matrix, one variant per layout
#[derive(Debug, Clone)]
pub enum Store {
    /// Contiguous row-major buffer
    Dense(DenseStore),
    /// Sorted coordinate triples (rank-2 only)
    List(ListStore),
    /// Compressed sparse row (rank-2 only)
    Yale(YaleStore),
}

impl Store {
    /// The storage kind tag for this payload
    #[inline]
    pub fn kind(&self) -> StorageKind {
        match self {
            Store::Dense(_) => StorageKind::Dense,
            Store::List(_) => StorageKind::List,
            Store::Yale(_) => StorageKind::Yale,
        }
    }
}

/// N-dimensional numeric array with runtime element type and storage layout
///
/// `Matrix` pairs a shape with a [`DType`] tag and a [`Store`] payload.
/// Operations resolve their result dtype through the promotion rules in
/// [`crate::dtype::upcast`] and their kernels through `dispatch_dtype!`.
///
/// Sparse layouts (list and yale) are restricted to rank-2 shapes; unstored
/// positions read as zero.
///
/// # Example
///
/// ```
/// use numat::matrix::Matrix;
/// use numat::dtype::DType;
///
/// let a = Matrix::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]);
/// assert_eq!(a.shape(), &[2, 2]);
/// assert_eq!(a.dtype(), DType::F64);
/// ```
#[derive(Clone)]
pub struct Matrix {
    /// Size along each dimension
    shape: Shape,
    /// Element type tag
    dtype: DType,
    /// Storage payload
    store: Store,
}

impl Matrix {
    /// Assemble a matrix from a shape, dtype tag, and storage payload
    ///
    /// Callers are responsible for consistency: a dense payload must hold
    /// exactly `shape.iter().product()` elements and a sparse payload
    /// requires a rank-2 shape.
    pub(crate) fn from_parts(shape: Shape, dtype: DType, store: Store) -> Self {
        match &store {
            Store::Dense(values) => {
                debug_assert_eq!(values.len(), shape.iter().product::<usize>());
            }
            Store::List(_) | Store::Yale(_) => debug_assert_eq!(shape.len(), 2),
        }
        Self {
            shape,
            dtype,
            store,
        }
    }

    /// Decompose into shape, dtype, and storage payload
    #[inline]
    pub(crate) fn into_parts(self) -> (Shape, DType, Store) {
        (self.shape, self.dtype, self.store)
    }

    /// Create a dense matrix from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape`
    /// dimensions. For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape).expect("Matrix::from_slice failed")
    }

    /// Create a dense matrix from a slice of data (fallible version)
    ///
    /// Returns an error if the shape has a zero dimension or `data.len()`
    /// does not equal the product of the `shape` dimensions.
    pub fn try_from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        validate_shape(shape)?;
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self {
            shape: shape.iter().copied().collect(),
            dtype: T::DTYPE,
            store: Store::Dense(DenseStore::from_buffer(ElemBuffer::from_slice(data))),
        })
    }

    /// Create a dense matrix filled with zeros
    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        Self::try_zeros(shape, dtype).expect("Matrix::zeros failed")
    }

    /// Create a dense matrix filled with zeros (fallible version)
    pub fn try_zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        validate_shape(shape)?;
        if !dtype.is_storable() {
            return Err(Error::unsupported_dtype(dtype, "zeros"));
        }
        let numel: usize = shape.iter().product();
        Ok(Self {
            shape: shape.iter().copied().collect(),
            dtype,
            store: Store::Dense(DenseStore::new_zeroed(dtype, numel)),
        })
    }

    /// Create a dense matrix filled with ones
    pub fn ones(shape: &[usize], dtype: DType) -> Self {
        Self::try_ones(shape, dtype).expect("Matrix::ones failed")
    }

    /// Create a dense matrix filled with ones (fallible version)
    pub fn try_ones(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::try_filled(shape, dtype, 1i64)
    }

    /// Create a dense matrix filled with a scalar value
    ///
    /// The value is converted to the target dtype, truncating where the
    /// target cannot represent it exactly. A `Bool` target stores 1 for any
    /// non-zero value.
    pub fn filled(shape: &[usize], dtype: DType, value: impl Into<Scalar>) -> Self {
        Self::try_filled(shape, dtype, value).expect("Matrix::filled failed")
    }

    /// Create a dense matrix filled with a scalar value (fallible version)
    pub fn try_filled(shape: &[usize], dtype: DType, value: impl Into<Scalar>) -> Result<Self> {
        validate_shape(shape)?;
        if !dtype.is_storable() {
            return Err(Error::unsupported_dtype(dtype, "filled"));
        }
        let value = value.into();
        let numel: usize = shape.iter().product();
        dispatch_dtype!(dtype, T => {
            let elem: T = element_from_scalar(value, dtype == DType::Bool);
            let mut buffer = ElemBuffer::new_zeroed(dtype, numel);
            buffer.fill(elem);
            Ok(Self {
                shape: shape.iter().copied().collect(),
                dtype,
                store: Store::Dense(DenseStore::from_buffer(buffer)),
            })
        }, "filled")
    }

    /// Create a dense identity matrix of size `n` by `n`
    pub fn identity(n: usize, dtype: DType) -> Self {
        Self::identity_of_kind(n, dtype, StorageKind::Dense).expect("Matrix::identity failed")
    }

    /// Create an identity matrix of size `n` by `n` in the given layout
    pub fn identity_of_kind(n: usize, dtype: DType, kind: StorageKind) -> Result<Self> {
        if n == 0 {
            return Err(Error::invalid_argument("n", "identity requires n >= 1"));
        }
        if !dtype.is_storable() {
            return Err(Error::unsupported_dtype(dtype, "identity"));
        }
        let shape: Shape = [n, n].iter().copied().collect();
        dispatch_dtype!(dtype, T => {
            let store = match kind {
                StorageKind::Dense => {
                    let mut values = vec![T::zero(); n * n];
                    for i in 0..n {
                        values[i * n + i] = T::one();
                    }
                    Store::Dense(DenseStore::from_buffer(typed_buffer(dtype, &values)))
                }
                StorageKind::List | StorageKind::Yale => {
                    let rows: Vec<usize> = (0..n).collect();
                    let cols: Vec<usize> = (0..n).collect();
                    let values = vec![T::one(); n];
                    build_sparse(kind, rows, cols, values, [n, n], dtype)?
                }
            };
            Ok(Self {
                shape,
                dtype,
                store,
            })
        }, "identity")
    }

    /// Create a list-of-lists matrix from coordinate triples
    ///
    /// Triples may arrive in any order; they are sorted into row-major
    /// position order. Duplicate positions are rejected and zero values are
    /// dropped rather than stored.
    pub fn list_from_triplets<T: Element>(
        triplets: &[(usize, usize, T)],
        shape: &[usize],
    ) -> Result<Self> {
        Self::sparse_from_triplets(triplets, shape, StorageKind::List)
    }

    /// Create a yale (CSR) matrix from coordinate triples
    ///
    /// Same input contract as [`Self::list_from_triplets`].
    pub fn yale_from_triplets<T: Element>(
        triplets: &[(usize, usize, T)],
        shape: &[usize],
    ) -> Result<Self> {
        Self::sparse_from_triplets(triplets, shape, StorageKind::Yale)
    }

    fn sparse_from_triplets<T: Element>(
        triplets: &[(usize, usize, T)],
        shape: &[usize],
        kind: StorageKind,
    ) -> Result<Self> {
        validate_shape(shape)?;
        let dims = match *shape {
            [rows, cols] => [rows, cols],
            _ => {
                return Err(Error::invalid_argument(
                    "shape",
                    format!("{kind} storage requires a rank-2 shape, got {shape:?}"),
                ))
            }
        };
        let (rows, cols, values) = sorted_triplets(triplets, dims)?;
        let store = build_sparse(kind, rows, cols, values, dims, T::DTYPE)?;
        Ok(Self {
            shape: shape.iter().copied().collect(),
            dtype: T::DTYPE,
            store,
        })
    }

    // ===== Accessors =====

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of dimensions
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Get the storage kind
    #[inline]
    pub fn kind(&self) -> StorageKind {
        self.store.kind()
    }

    /// Get the storage payload
    #[inline]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get the storage payload mutably
    #[inline]
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Check if this is a square rank-2 matrix
    #[inline]
    pub fn is_square(&self) -> bool {
        matches!(*self.shape.as_slice(), [rows, cols] if rows == cols)
    }

    /// Check if this is a vector (rank 1, or rank 2 with a unit dimension)
    #[inline]
    pub fn is_vector(&self) -> bool {
        match *self.shape.as_slice() {
            [_] => true,
            [rows, cols] => rows == 1 || cols == 1,
            _ => false,
        }
    }

    /// Number of stored elements: `numel` for dense, `nnz` for sparse
    #[inline]
    pub fn stored_len(&self) -> usize {
        match &self.store {
            Store::Dense(_) => self.numel(),
            Store::List(store) => store.nnz(),
            Store::Yale(store) => store.nnz(),
        }
    }

    /// Get the rank-2 dimensions, or an error naming `op`
    pub fn dims2(&self, op: &'static str) -> Result<(usize, usize)> {
        match *self.shape.as_slice() {
            [rows, cols] => Ok((rows, cols)),
            _ => Err(Error::invalid_argument(
                "shape",
                format!("{op} requires a rank-2 matrix, got shape {:?}", self.shape),
            )),
        }
    }

    /// Borrow the dense payload, or an error naming `op`
    pub(crate) fn dense_store(&self, op: &'static str) -> Result<&DenseStore> {
        match &self.store {
            Store::Dense(store) => Ok(store),
            _ => Err(Error::storage_unsupported(self.kind(), op)),
        }
    }

    /// Borrow the dense payload mutably, or an error naming `op`
    pub(crate) fn dense_store_mut(&mut self, op: &'static str) -> Result<&mut DenseStore> {
        match &mut self.store {
            Store::Dense(store) => Ok(store),
            kind => Err(Error::storage_unsupported(kind.kind(), op)),
        }
    }

    // ===== Element Access =====

    /// Read the element at `index` as a [`Scalar`]
    ///
    /// Unstored sparse positions read as zero. `Bool` matrices produce
    /// `Scalar::Bool`.
    pub fn get(&self, index: &[usize]) -> Result<Scalar> {
        self.check_index(index)?;
        let raw = match &self.store {
            Store::Dense(values) => {
                let offset = dense::flat_offset(&self.shape, index);
                dispatch_dtype!(self.dtype, T => {
                    values.as_slice::<T>()[offset].into_scalar()
                }, "get")
            }
            Store::List(store) => {
                dispatch_dtype!(self.dtype, T => {
                    match store.find(index[0], index[1]) {
                        Some(pos) => store.values().as_slice::<T>()[pos].into_scalar(),
                        None => T::zero().into_scalar(),
                    }
                }, "get")
            }
            Store::Yale(store) => {
                dispatch_dtype!(self.dtype, T => {
                    match store.find(index[0], index[1]) {
                        Some(pos) => store.values().as_slice::<T>()[pos].into_scalar(),
                        None => T::zero().into_scalar(),
                    }
                }, "get")
            }
        };
        if self.dtype == DType::Bool {
            return Ok(Scalar::Bool(!raw.is_zero()));
        }
        Ok(raw)
    }

    /// Write the element at `index`
    ///
    /// The value is converted to the matrix dtype, truncating where needed.
    /// Writing to an unstored sparse position inserts an entry; writing a
    /// zero keeps the entry as an explicit zero.
    pub fn set(&mut self, index: &[usize], value: impl Into<Scalar>) -> Result<()> {
        self.check_index(index)?;
        let value = value.into();
        let bool_target = self.dtype == DType::Bool;
        match &mut self.store {
            Store::Dense(values) => {
                let offset = dense::flat_offset(&self.shape, index);
                dispatch_dtype!(self.dtype, T => {
                    values.as_mut_slice::<T>()[offset] = element_from_scalar(value, bool_target);
                }, "set")
            }
            Store::List(store) => {
                dispatch_dtype!(self.dtype, T => {
                    let elem: T = element_from_scalar(value, bool_target);
                    match store.find(index[0], index[1]) {
                        Some(pos) => store.values_mut().as_mut_slice::<T>()[pos] = elem,
                        None => insert_list_entry(store, index[0], index[1], elem),
                    }
                }, "set")
            }
            Store::Yale(store) => {
                dispatch_dtype!(self.dtype, T => {
                    let elem: T = element_from_scalar(value, bool_target);
                    match store.find(index[0], index[1]) {
                        Some(pos) => store.values_mut().as_mut_slice::<T>()[pos] = elem,
                        None => insert_yale_entry(store, index[0], index[1], elem),
                    }
                }, "set")
            }
        }
        Ok(())
    }

    /// Extract the scalar value from a single-element matrix
    pub fn item(&self) -> Result<Scalar> {
        if self.numel() != 1 {
            return Err(Error::shape_mismatch(&[1], &self.shape));
        }
        let index = vec![0usize; self.rank()];
        self.get(&index)
    }

    /// Copy the elements to a `Vec` in row-major order
    ///
    /// `T` must match the matrix dtype (`u8` for `Bool`). Works for every
    /// storage kind; sparse matrices densify into the result.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype && !(self.dtype == DType::Bool && T::DTYPE == DType::U8) {
            return Err(Error::invalid_argument(
                "T",
                format!("matrix holds {}, requested {}", self.dtype, T::DTYPE),
            ));
        }
        match &self.store {
            Store::Dense(store) => Ok(store.as_slice::<T>().to_vec()),
            Store::List(store) => {
                let (_, cols) = self.dims2("to_vec")?;
                let mut out = vec![T::zero(); self.numel()];
                store.for_each_stored::<T>(|r, c, v| out[r * cols + c] = v);
                Ok(out)
            }
            Store::Yale(store) => {
                let (_, cols) = self.dims2("to_vec")?;
                let mut out = vec![T::zero(); self.numel()];
                store.for_each_stored::<T>(|r, c, v| out[r * cols + c] = v);
                Ok(out)
            }
        }
    }

    fn check_index(&self, index: &[usize]) -> Result<()> {
        if index.len() != self.rank() {
            return Err(Error::shape_mismatch(&self.shape, index));
        }
        for (&i, &dim) in index.iter().zip(self.shape.iter()) {
            if i >= dim {
                return Err(Error::IndexOutOfBounds { index: i, size: dim });
            }
        }
        Ok(())
    }

    // ===== Casting =====

    /// Convert to another storage kind and element type
    ///
    /// Values travel through [`Scalar`], so complex components and rational
    /// exactness survive whenever the target dtype can hold them; narrowing
    /// conversions truncate. Casting to `Bool` stores 1 for any non-zero
    /// value. When a sparse layout is the target, entries that convert to
    /// zero are dropped.
    pub fn cast(&self, kind: StorageKind, dtype: DType) -> Result<Matrix> {
        if !dtype.is_storable() {
            return Err(Error::unsupported_dtype(dtype, "cast"));
        }
        if kind.is_sparse() && self.rank() != 2 {
            return Err(Error::invalid_argument(
                "kind",
                format!(
                    "{kind} storage requires a rank-2 matrix, got shape {:?}",
                    self.shape
                ),
            ));
        }
        if kind == self.kind() && dtype == self.dtype {
            return Ok(self.clone());
        }
        dispatch_dtype!(self.dtype, T => {
            dispatch_dtype!(dtype, U => {
                self.cast_typed::<T, U>(kind, dtype)
            }, "cast")
        }, "cast")
    }

    /// Convert the element type, keeping the storage kind
    pub fn cast_dtype(&self, dtype: DType) -> Result<Matrix> {
        self.cast(self.kind(), dtype)
    }

    /// Convert to dense storage, keeping the element type
    pub fn to_dense(&self) -> Result<Matrix> {
        self.cast(StorageKind::Dense, self.dtype)
    }

    fn cast_typed<T: Element, U: Element>(&self, kind: StorageKind, dtype: DType) -> Result<Matrix> {
        let bool_target = dtype == DType::Bool;
        let convert = |v: T| -> U { element_from_scalar(v.into_scalar(), bool_target) };

        let store = match &self.store {
            Store::Dense(src) if kind == StorageKind::Dense => {
                let values: Vec<U> = src.as_slice::<T>().iter().map(|&v| convert(v)).collect();
                Store::Dense(DenseStore::from_buffer(typed_buffer(dtype, &values)))
            }
            Store::Dense(src) => {
                let (rows, cols) = self.dims2("cast")?;
                let data = src.as_slice::<T>();
                let mut out_rows = Vec::new();
                let mut out_cols = Vec::new();
                let mut out_vals: Vec<U> = Vec::new();
                for r in 0..rows {
                    for c in 0..cols {
                        let v = convert(data[r * cols + c]);
                        if v != U::zero() {
                            out_rows.push(r);
                            out_cols.push(c);
                            out_vals.push(v);
                        }
                    }
                }
                build_sparse(kind, out_rows, out_cols, out_vals, [rows, cols], dtype)?
            }
            Store::List(_) | Store::Yale(_) => {
                let (rows, cols) = self.dims2("cast")?;
                let mut trip_rows = Vec::new();
                let mut trip_cols = Vec::new();
                let mut trip_vals: Vec<U> = Vec::new();
                {
                    let mut push = |r: usize, c: usize, v: T| {
                        trip_rows.push(r);
                        trip_cols.push(c);
                        trip_vals.push(convert(v));
                    };
                    match &self.store {
                        Store::List(src) => src.for_each_stored::<T>(&mut push),
                        Store::Yale(src) => src.for_each_stored::<T>(&mut push),
                        Store::Dense(_) => unreachable!(),
                    }
                }
                match kind {
                    StorageKind::Dense => {
                        let mut values = vec![U::zero(); rows * cols];
                        for i in 0..trip_vals.len() {
                            values[trip_rows[i] * cols + trip_cols[i]] = trip_vals[i];
                        }
                        Store::Dense(DenseStore::from_buffer(typed_buffer(dtype, &values)))
                    }
                    _ => {
                        let mut keep_rows = Vec::with_capacity(trip_vals.len());
                        let mut keep_cols = Vec::with_capacity(trip_vals.len());
                        let mut keep_vals = Vec::with_capacity(trip_vals.len());
                        for i in 0..trip_vals.len() {
                            if trip_vals[i] != U::zero() {
                                keep_rows.push(trip_rows[i]);
                                keep_cols.push(trip_cols[i]);
                                keep_vals.push(trip_vals[i]);
                            }
                        }
                        build_sparse(kind, keep_rows, keep_cols, keep_vals, [rows, cols], dtype)?
                    }
                }
            }
        };
        Ok(Matrix {
            shape: self.shape.clone(),
            dtype,
            store,
        })
    }

    // ===== Structural Operations =====

    /// Create a matrix with the same shape, dtype, and storage kind, but
    /// all elements zero (sparse kinds start with no stored entries)
    pub fn clone_structure(&self) -> Matrix {
        let store = match &self.store {
            Store::Dense(_) => Store::Dense(DenseStore::new_zeroed(self.dtype, self.numel())),
            Store::List(_) => Store::List(ListStore::new_empty(self.dtype)),
            Store::Yale(_) => Store::Yale(YaleStore::new_empty(self.dtype, self.shape[0])),
        };
        Matrix {
            shape: self.shape.clone(),
            dtype: self.dtype,
            store,
        }
    }

    /// Copy one row of a rank-2 matrix into a dense `[1, cols]` matrix
    pub fn row_copy(&self, row: usize) -> Result<Matrix> {
        let (rows, cols) = self.dims2("row_copy")?;
        if row >= rows {
            return Err(Error::IndexOutOfBounds {
                index: row,
                size: rows,
            });
        }
        dispatch_dtype!(self.dtype, T => {
            let mut values = vec![T::zero(); cols];
            match &self.store {
                Store::Dense(store) => {
                    values.copy_from_slice(&store.as_slice::<T>()[row * cols..(row + 1) * cols]);
                }
                Store::List(store) => {
                    store.for_each_stored::<T>(|r, c, v| {
                        if r == row {
                            values[c] = v;
                        }
                    });
                }
                Store::Yale(store) => {
                    let vals = store.values().as_slice::<T>();
                    for pos in store.row_range(row) {
                        values[store.col_indices[pos]] = vals[pos];
                    }
                }
            }
            Ok(Matrix {
                shape: [1, cols].iter().copied().collect(),
                dtype: self.dtype,
                store: Store::Dense(DenseStore::from_buffer(typed_buffer(self.dtype, &values))),
            })
        }, "row_copy")
    }

    /// Transpose a rank-2 matrix, materializing the result in the same
    /// storage kind
    pub fn transpose(&self) -> Result<Matrix> {
        let (rows, cols) = self.dims2("transpose")?;
        let shape: Shape = [cols, rows].iter().copied().collect();
        dispatch_dtype!(self.dtype, T => {
            let store = match &self.store {
                Store::Dense(src) => {
                    let data = src.as_slice::<T>();
                    let mut values = vec![T::zero(); data.len()];
                    for r in 0..rows {
                        for c in 0..cols {
                            values[c * rows + r] = data[r * cols + c];
                        }
                    }
                    Store::Dense(DenseStore::from_buffer(typed_buffer(self.dtype, &values)))
                }
                Store::List(src) => {
                    let mut triplets: Vec<(usize, usize, T)> = Vec::with_capacity(src.nnz());
                    src.for_each_stored::<T>(|r, c, v| triplets.push((c, r, v)));
                    triplets.sort_by_key(|&(r, c, _)| (r, c));
                    let t_rows: Vec<usize> = triplets.iter().map(|t| t.0).collect();
                    let t_cols: Vec<usize> = triplets.iter().map(|t| t.1).collect();
                    let t_vals: Vec<T> = triplets.iter().map(|t| t.2).collect();
                    build_sparse(StorageKind::List, t_rows, t_cols, t_vals, [cols, rows], self.dtype)?
                }
                Store::Yale(src) => {
                    let nnz = src.nnz();
                    let vals = src.values().as_slice::<T>();
                    let mut row_ptrs = vec![0usize; cols + 1];
                    for &c in &src.col_indices {
                        row_ptrs[c + 1] += 1;
                    }
                    for i in 0..cols {
                        row_ptrs[i + 1] += row_ptrs[i];
                    }
                    let mut next = row_ptrs.clone();
                    let mut out_cols = vec![0usize; nnz];
                    let mut out_vals = vec![T::zero(); nnz];
                    for r in 0..rows {
                        for pos in src.row_range(r) {
                            let c = src.col_indices[pos];
                            let slot = next[c];
                            next[c] += 1;
                            out_cols[slot] = r;
                            out_vals[slot] = vals[pos];
                        }
                    }
                    Store::Yale(YaleStore::from_parts(
                        row_ptrs,
                        out_cols,
                        typed_buffer(self.dtype, &out_vals),
                        [cols, rows],
                    )?)
                }
            };
            Ok(Matrix {
                shape,
                dtype: self.dtype,
                store,
            })
        }, "transpose")
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype)
            .field("kind", &self.kind())
            .finish()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matrix({:?}, dtype={}, kind={})",
            self.shape(),
            self.dtype,
            self.kind()
        )
    }
}

/// Convert a scalar into a concrete element, normalizing non-zero values to
/// one when the destination dtype is `Bool`
#[inline]
pub(crate) fn element_from_scalar<T: Element>(value: Scalar, bool_target: bool) -> T {
    if bool_target {
        if value.is_zero() {
            T::zero()
        } else {
            T::one()
        }
    } else {
        T::from_scalar(value)
    }
}

/// Build an element buffer tagged with `dtype` from a typed slice
///
/// Unlike `ElemBuffer::from_slice`, this keeps a `Bool` tag when the
/// elements arrive as `u8`.
pub(crate) fn typed_buffer<T: Element>(dtype: DType, values: &[T]) -> ElemBuffer {
    debug_assert!(dtype == T::DTYPE || (dtype == DType::Bool && T::DTYPE == DType::U8));
    let mut buffer = ElemBuffer::new_zeroed(dtype, values.len());
    buffer.as_mut_slice::<T>().copy_from_slice(values);
    buffer
}

/// Build a sparse storage payload from sorted, deduplicated triplet arrays
pub(crate) fn build_sparse<T: Element>(
    kind: StorageKind,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<T>,
    dims: [usize; 2],
    dtype: DType,
) -> Result<Store> {
    let buffer = typed_buffer(dtype, &values);
    match kind {
        StorageKind::List => Ok(Store::List(ListStore::from_parts(rows, cols, buffer, dims)?)),
        StorageKind::Yale => {
            let mut row_ptrs = vec![0usize; dims[0] + 1];
            for &r in &rows {
                row_ptrs[r + 1] += 1;
            }
            for i in 0..dims[0] {
                row_ptrs[i + 1] += row_ptrs[i];
            }
            Ok(Store::Yale(YaleStore::from_parts(
                row_ptrs, cols, buffer, dims,
            )?))
        }
        StorageKind::Dense => unreachable!("build_sparse called with dense kind"),
    }
}

fn validate_shape(shape: &[usize]) -> Result<()> {
    if shape.is_empty() || shape.contains(&0) {
        return Err(Error::invalid_argument(
            "shape",
            format!("dimensions must be positive, got {shape:?}"),
        ));
    }
    Ok(())
}

fn sorted_triplets<T: Element>(
    triplets: &[(usize, usize, T)],
    dims: [usize; 2],
) -> Result<(Vec<usize>, Vec<usize>, Vec<T>)> {
    let mut order: Vec<usize> = (0..triplets.len()).collect();
    order.sort_by_key(|&i| (triplets[i].0, triplets[i].1));

    let mut rows = Vec::with_capacity(triplets.len());
    let mut cols = Vec::with_capacity(triplets.len());
    let mut values = Vec::with_capacity(triplets.len());
    let mut prev: Option<(usize, usize)> = None;
    for &i in &order {
        let (r, c, v) = triplets[i];
        if r >= dims[0] || c >= dims[1] {
            return Err(Error::invalid_sparse(format!(
                "position ({r}, {c}) out of bounds for shape {dims:?}"
            )));
        }
        if prev == Some((r, c)) {
            return Err(Error::invalid_sparse(format!("duplicate position ({r}, {c})")));
        }
        prev = Some((r, c));
        if v == T::zero() {
            continue;
        }
        rows.push(r);
        cols.push(c);
        values.push(v);
    }
    Ok((rows, cols, values))
}

fn insert_list_entry<T: Element>(store: &mut ListStore, row: usize, col: usize, value: T) {
    let pos = (0..store.nnz())
        .find(|&i| (store.row_indices[i], store.col_indices[i]) > (row, col))
        .unwrap_or(store.nnz());
    let dtype = store.dtype();
    store.row_indices.insert(pos, row);
    store.col_indices.insert(pos, col);
    let mut values: Vec<T> = store.values.as_slice::<T>().to_vec();
    values.insert(pos, value);
    store.values = typed_buffer(dtype, &values);
}

fn insert_yale_entry<T: Element>(store: &mut YaleStore, row: usize, col: usize, value: T) {
    let range = store.row_range(row);
    let mut pos = range.end;
    for i in range {
        if store.col_indices[i] > col {
            pos = i;
            break;
        }
    }
    let dtype = store.dtype();
    store.col_indices.insert(pos, col);
    for p in store.row_ptrs.iter_mut().skip(row + 1) {
        *p += 1;
    }
    let mut values: Vec<T> = store.values.as_slice::<T>().to_vec();
    values.insert(pos, value);
    store.values = typed_buffer(dtype, &values);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Complex128;

    #[test]
    fn test_from_slice() {
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let m = Matrix::from_slice(&data, &[2, 3]);

        assert_eq!(m.shape(), &[2, 3]);
        assert_eq!(m.dtype(), DType::F64);
        assert_eq!(m.kind(), StorageKind::Dense);
        assert_eq!(m.numel(), 6);
        assert_eq!(m.to_vec::<f64>().unwrap(), data);
    }

    #[test]
    fn test_from_slice_shape_mismatch() {
        let result = Matrix::try_from_slice(&[1.0f64, 2.0, 3.0], &[2, 2]);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_rejects_zero_dimension() {
        assert!(Matrix::try_zeros(&[2, 0], DType::F64).is_err());
        assert!(Matrix::try_zeros(&[], DType::F64).is_err());
    }

    #[test]
    fn test_zeros_and_ones() {
        let z = Matrix::zeros(&[2, 2], DType::I32);
        assert_eq!(z.to_vec::<i32>().unwrap(), [0, 0, 0, 0]);

        let o = Matrix::ones(&[2, 2], DType::Rational64);
        assert_eq!(
            o.get(&[0, 0]).unwrap(),
            Scalar::R64(crate::dtype::Rational64::ONE)
        );
    }

    #[test]
    fn test_filled_bool_normalizes() {
        let m = Matrix::filled(&[2, 2], DType::Bool, 3.5f64);
        assert_eq!(m.get(&[1, 1]).unwrap(), Scalar::Bool(true));
        assert_eq!(m.to_vec::<u8>().unwrap(), [1, 1, 1, 1]);
    }

    #[test]
    fn test_identity_kinds() {
        for kind in [StorageKind::Dense, StorageKind::List, StorageKind::Yale] {
            let eye = Matrix::identity_of_kind(3, DType::F64, kind).unwrap();
            assert_eq!(eye.kind(), kind);
            for r in 0..3 {
                for c in 0..3 {
                    let expected = if r == c { 1.0 } else { 0.0 };
                    assert_eq!(eye.get(&[r, c]).unwrap(), Scalar::F64(expected));
                }
            }
        }
    }

    #[test]
    fn test_from_triplets_sorts_and_drops_zeros() {
        let triplets = [(1usize, 1usize, 5.0f64), (0, 2, 3.0), (1, 0, 0.0)];
        let m = Matrix::yale_from_triplets(&triplets, &[2, 3]).unwrap();

        assert_eq!(m.stored_len(), 2);
        assert_eq!(m.get(&[0, 2]).unwrap(), Scalar::F64(3.0));
        assert_eq!(m.get(&[1, 1]).unwrap(), Scalar::F64(5.0));
        assert_eq!(m.get(&[1, 0]).unwrap(), Scalar::F64(0.0));
    }

    #[test]
    fn test_from_triplets_rejects_duplicates() {
        let triplets = [(0usize, 0usize, 1.0f64), (0, 0, 2.0)];
        let result = Matrix::list_from_triplets(&triplets, &[2, 2]);
        assert!(matches!(result, Err(Error::InvalidSparse { .. })));
    }

    #[test]
    fn test_get_out_of_bounds() {
        let m = Matrix::zeros(&[2, 3], DType::F64);
        assert!(matches!(
            m.get(&[2, 0]),
            Err(Error::IndexOutOfBounds { index: 2, size: 2 })
        ));
        assert!(m.get(&[0]).is_err());
    }

    #[test]
    fn test_set_dense() {
        let mut m = Matrix::zeros(&[2, 2], DType::I64);
        m.set(&[0, 1], 7i64).unwrap();
        assert_eq!(m.get(&[0, 1]).unwrap(), Scalar::I64(7));
    }

    #[test]
    fn test_set_inserts_sparse_entry() {
        let mut m = Matrix::yale_from_triplets(&[(0usize, 0usize, 1.0f64)], &[2, 2]).unwrap();
        m.set(&[1, 1], 4.0f64).unwrap();
        m.set(&[0, 1], 2.0f64).unwrap();

        assert_eq!(m.stored_len(), 3);
        assert_eq!(m.get(&[0, 1]).unwrap(), Scalar::F64(2.0));
        assert_eq!(m.get(&[1, 1]).unwrap(), Scalar::F64(4.0));

        let mut l = Matrix::list_from_triplets(&[(1usize, 1usize, 1.0f64)], &[2, 2]).unwrap();
        l.set(&[0, 1], 9.0f64).unwrap();
        assert_eq!(l.get(&[0, 1]).unwrap(), Scalar::F64(9.0));
        assert_eq!(l.get(&[1, 1]).unwrap(), Scalar::F64(1.0));
    }

    #[test]
    fn test_cast_dense_to_yale_drops_zeros() {
        let m = Matrix::from_slice(&[0.0f64, 1.0, 2.0, 0.0], &[2, 2]);
        let y = m.cast(StorageKind::Yale, DType::F64).unwrap();

        assert_eq!(y.kind(), StorageKind::Yale);
        assert_eq!(y.stored_len(), 2);
        assert_eq!(y.to_vec::<f64>().unwrap(), [0.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_cast_preserves_complex_components() {
        let m = Matrix::from_slice(&[Complex128::new(1.0, 2.0)], &[1, 1]);
        let narrowed = m.cast(StorageKind::Dense, DType::Complex64).unwrap();
        let v = narrowed.to_vec::<crate::dtype::Complex64>().unwrap();
        assert_eq!(v[0].re, 1.0);
        assert_eq!(v[0].im, 2.0);
    }

    #[test]
    fn test_cast_to_bool() {
        let m = Matrix::from_slice(&[0.0f64, 2.5, -1.0, 0.0], &[2, 2]);
        let b = m.cast(StorageKind::Dense, DType::Bool).unwrap();
        assert_eq!(b.dtype(), DType::Bool);
        assert_eq!(b.to_vec::<u8>().unwrap(), [0, 1, 1, 0]);
    }

    #[test]
    fn test_cast_sparse_round_trip() {
        let data = [0.0f64, 3.0, 0.0, 0.0, 0.0, 4.0];
        let dense = Matrix::from_slice(&data, &[2, 3]);
        let list = dense.cast(StorageKind::List, DType::F64).unwrap();
        let yale = list.cast(StorageKind::Yale, DType::F32).unwrap();
        let back = yale.to_dense().unwrap();

        assert_eq!(back.dtype(), DType::F32);
        assert_eq!(back.to_vec::<f32>().unwrap(), [0.0, 3.0, 0.0, 0.0, 0.0, 4.0]);
    }

    #[test]
    fn test_transpose_dense() {
        let m = Matrix::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3]);
        let t = m.transpose().unwrap();

        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.to_vec::<i32>().unwrap(), [1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_transpose_yale() {
        let m =
            Matrix::yale_from_triplets(&[(0usize, 1usize, 2.0f64), (1, 0, 3.0), (1, 2, 4.0)], &[2, 3])
                .unwrap();
        let t = m.transpose().unwrap();

        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.kind(), StorageKind::Yale);
        assert_eq!(t.get(&[1, 0]).unwrap(), Scalar::F64(2.0));
        assert_eq!(t.get(&[0, 1]).unwrap(), Scalar::F64(3.0));
        assert_eq!(t.get(&[2, 1]).unwrap(), Scalar::F64(4.0));
    }

    #[test]
    fn test_row_copy() {
        let dense = Matrix::from_slice(&[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let row = dense.row_copy(1).unwrap();
        assert_eq!(row.shape(), &[1, 3]);
        assert_eq!(row.to_vec::<f64>().unwrap(), [4.0, 5.0, 6.0]);

        let yale = dense.cast(StorageKind::Yale, DType::F64).unwrap();
        let row = yale.row_copy(0).unwrap();
        assert_eq!(row.kind(), StorageKind::Dense);
        assert_eq!(row.to_vec::<f64>().unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_item() {
        let m = Matrix::from_slice(&[42i64], &[1, 1]);
        assert_eq!(m.item().unwrap(), Scalar::I64(42));

        let m = Matrix::zeros(&[2, 2], DType::F64);
        assert!(m.item().is_err());
    }

    #[test]
    fn test_clone_structure() {
        let m = Matrix::yale_from_triplets(&[(0usize, 0usize, 1.0f64)], &[2, 2]).unwrap();
        let empty = m.clone_structure();
        assert_eq!(empty.kind(), StorageKind::Yale);
        assert_eq!(empty.shape(), m.shape());
        assert_eq!(empty.stored_len(), 0);
    }
}
