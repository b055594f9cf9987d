//! Dense storage: every position materialized in row-major order

use super::buffer::ElemBuffer;
use crate::dtype::{DType, Element};
use crate::matrix::Shape;

/// Dense backing store, a contiguous row-major buffer
#[derive(Debug, Clone)]
pub struct DenseStore {
    values: ElemBuffer,
}

impl DenseStore {
    /// Allocate a zeroed dense store for `len` elements
    pub fn new_zeroed(dtype: DType, len: usize) -> Self {
        Self {
            values: ElemBuffer::new_zeroed(dtype, len),
        }
    }

    /// Wrap an existing buffer
    pub fn from_buffer(values: ElemBuffer) -> Self {
        Self { values }
    }

    /// Number of stored elements
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no elements are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The underlying buffer
    #[inline]
    pub fn buffer(&self) -> &ElemBuffer {
        &self.values
    }

    /// The underlying buffer, mutably
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut ElemBuffer {
        &mut self.values
    }

    /// Typed view of the whole store
    #[inline]
    pub fn as_slice<T: Element>(&self) -> &[T] {
        self.values.as_slice()
    }

    /// Typed mutable view of the whole store
    #[inline]
    pub fn as_mut_slice<T: Element>(&mut self) -> &mut [T] {
        self.values.as_mut_slice()
    }
}

/// Row-major contiguous strides for a shape
pub fn contiguous_strides(shape: &[usize]) -> Shape {
    let mut strides: Shape = Shape::with_capacity(shape.len());
    let mut acc = 1usize;
    for _ in shape {
        strides.push(0);
    }
    for (i, &dim) in shape.iter().enumerate().rev() {
        strides[i] = acc;
        acc *= dim;
    }
    strides
}

/// Flat row-major offset of a multi-index
#[inline]
pub fn flat_offset(shape: &[usize], index: &[usize]) -> usize {
    debug_assert_eq!(shape.len(), index.len());
    let mut offset = 0usize;
    let mut stride = 1usize;
    for i in (0..shape.len()).rev() {
        offset += index[i] * stride;
        stride *= shape[i];
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_strides() {
        let strides = contiguous_strides(&[2, 3, 4]);
        assert_eq!(strides.as_slice(), &[12, 4, 1]);
        let flat = contiguous_strides(&[5]);
        assert_eq!(flat.as_slice(), &[1]);
    }

    #[test]
    fn test_flat_offset() {
        assert_eq!(flat_offset(&[2, 3], &[0, 0]), 0);
        assert_eq!(flat_offset(&[2, 3], &[1, 2]), 5);
        assert_eq!(flat_offset(&[2, 3, 4], &[1, 2, 3]), 23);
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = DenseStore::new_zeroed(DType::I64, 6);
        store.as_mut_slice::<i64>().copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(store.as_slice::<i64>()[4], 5);
        assert_eq!(store.len(), 6);
    }
}
