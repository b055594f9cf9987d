//! Aligned element storage shared by the three storage kinds

use crate::dtype::{DType, Element, Rational64};
use std::alloc::{alloc_zeroed, dealloc, Layout as AllocLayout};

/// Buffer alignment, wide enough for SIMD loads of any element type
const BUFFER_ALIGN: usize = 64;

/// A zero-initialized, 64-byte-aligned allocation of `len` elements of one
/// dtype. The buffer is exclusively owned and freed on drop; typed views are
/// handed out as plain slices.
///
/// The dispatch layer guarantees that a buffer tagged with a dtype is only
/// viewed as the matching Rust type (with `DType::Bool` viewed as `u8`).
pub struct ElemBuffer {
    ptr: *mut u8,
    len: usize,
    dtype: DType,
}

// The buffer is the sole owner of its allocation.
unsafe impl Send for ElemBuffer {}
unsafe impl Sync for ElemBuffer {}

impl ElemBuffer {
    /// Allocate a zeroed buffer of `len` elements.
    ///
    /// Rational storage is filled with the normalized zero value, since the
    /// all-zero bit pattern is not a normalized rational.
    pub fn new_zeroed(dtype: DType, len: usize) -> Self {
        debug_assert!(dtype.is_storable(), "cannot allocate {dtype} storage");
        let size_bytes = len * dtype.size_in_bytes();
        let ptr = if size_bytes == 0 {
            std::ptr::null_mut()
        } else {
            let layout = AllocLayout::from_size_align(size_bytes, BUFFER_ALIGN)
                .expect("Invalid allocation layout");
            let ptr = unsafe { alloc_zeroed(layout) };
            if ptr.is_null() {
                panic!("Failed to allocate {} bytes", size_bytes);
            }
            ptr
        };

        let mut buf = Self { ptr, len, dtype };
        if dtype == DType::Rational64 {
            buf.fill(Rational64::ZERO);
        }
        buf
    }

    /// Build a buffer from a typed slice
    pub fn from_slice<T: Element>(data: &[T]) -> Self {
        let mut buf = Self::new_zeroed(T::DTYPE, data.len());
        buf.as_mut_slice::<T>().copy_from_slice(data);
        buf
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the buffer holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element type tag of the stored data
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Size of the allocation in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.len * self.dtype.size_in_bytes()
    }

    #[inline]
    fn check_view<T: Element>(&self) {
        debug_assert!(
            T::DTYPE == self.dtype || (self.dtype == DType::Bool && T::DTYPE == DType::U8),
            "viewing {} buffer as {}",
            self.dtype,
            T::DTYPE
        );
    }

    /// Typed read-only view of the whole buffer
    #[inline]
    pub fn as_slice<T: Element>(&self) -> &[T] {
        self.check_view::<T>();
        if self.len == 0 {
            return &[];
        }
        // Allocation is 64-byte aligned and sized for len elements of T
        unsafe { std::slice::from_raw_parts(self.ptr as *const T, self.len) }
    }

    /// Typed mutable view of the whole buffer
    #[inline]
    pub fn as_mut_slice<T: Element>(&mut self) -> &mut [T] {
        self.check_view::<T>();
        if self.len == 0 {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.ptr as *mut T, self.len) }
    }

    /// Raw byte view, used by the dtype-erased copy paths
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.size_in_bytes()) }
    }

    /// Raw mutable byte view
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        if self.len == 0 {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size_in_bytes()) }
    }

    /// Fill every element with one value
    pub fn fill<T: Element>(&mut self, value: T) {
        for slot in self.as_mut_slice::<T>() {
            *slot = value;
        }
    }
}

impl Clone for ElemBuffer {
    fn clone(&self) -> Self {
        let mut out = Self::new_zeroed(self.dtype, self.len);
        out.as_bytes_mut().copy_from_slice(self.as_bytes());
        out
    }
}

impl Drop for ElemBuffer {
    fn drop(&mut self) {
        let size_bytes = self.size_in_bytes();
        if self.ptr.is_null() || size_bytes == 0 {
            return;
        }
        let layout = AllocLayout::from_size_align(size_bytes, BUFFER_ALIGN)
            .expect("Invalid allocation layout");
        unsafe {
            dealloc(self.ptr, layout);
        }
    }
}

impl std::fmt::Debug for ElemBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElemBuffer")
            .field("dtype", &self.dtype)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Complex128;

    #[test]
    fn test_zeroed_allocation() {
        let buf = ElemBuffer::new_zeroed(DType::F64, 16);
        assert_eq!(buf.len(), 16);
        assert!(buf.as_slice::<f64>().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rational_zeroed_is_normalized() {
        let buf = ElemBuffer::new_zeroed(DType::Rational64, 4);
        assert!(buf
            .as_slice::<Rational64>()
            .iter()
            .all(|&r| r == Rational64::ZERO));
    }

    #[test]
    fn test_from_slice_round_trip() {
        let data = [1i32, -2, 3, -4];
        let buf = ElemBuffer::from_slice(&data);
        assert_eq!(buf.dtype(), DType::I32);
        assert_eq!(buf.as_slice::<i32>(), &data);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = ElemBuffer::from_slice(&[1.0f64, 2.0]);
        let b = a.clone();
        a.as_mut_slice::<f64>()[0] = 9.0;
        assert_eq!(b.as_slice::<f64>()[0], 1.0);
    }

    #[test]
    fn test_empty_buffer() {
        let buf = ElemBuffer::new_zeroed(DType::Complex128, 0);
        assert!(buf.is_empty());
        assert!(buf.as_slice::<Complex128>().is_empty());
    }

    #[test]
    fn test_alignment() {
        let buf = ElemBuffer::new_zeroed(DType::F32, 3);
        assert_eq!(buf.as_slice::<f32>().as_ptr() as usize % 64, 0);
    }
}
