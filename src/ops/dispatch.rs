//! DType dispatch utilities
//!
//! This module provides the `dispatch_dtype!` macro for runtime type dispatch.
//! It is used by the elementwise, reduction and linear-algebra layers to
//! convert from a `DType` enum value to a concrete generic type.
//!
//! # Usage
//!
//! ```ignore
//! fn my_operation(dtype: DType) -> Result<()> {
//!     dispatch_dtype!(dtype, T => {
//!         // T is now a concrete type (f32, f64, i32, etc.)
//!         let size = std::mem::size_of::<T>();
//!         Ok(())
//!     }, "my_operation")
//! }
//! ```
//!
//! # Macro Details
//!
//! The `dispatch_dtype!` macro takes a `DType` value and executes a code block
//! with `T` bound to the corresponding Rust type.
//!
//! ## Arguments
//!
//! * `$dtype` - Expression evaluating to a `DType` value
//! * `$T` - Identifier to bind to the concrete type in the body
//! * `$body` - Code block to execute with `T` bound
//! * `$error_op` - Operation name for error messages (used when dtype is unsupported)
//!
//! ## Supported Types
//!
//! - `F64` -> `f64`
//! - `F32` -> `f32`
//! - `I64` -> `i64`
//! - `I32` -> `i32`
//! - `I16` -> `i16`
//! - `I8` -> `i8`
//! - `U64` -> `u64`
//! - `U32` -> `u32`
//! - `U16` -> `u16`
//! - `U8` -> `u8`
//! - `Bool` -> `u8` (booleans are stored as bytes holding 0 or 1)
//! - `Complex64` -> `crate::dtype::Complex64`
//! - `Complex128` -> `crate::dtype::Complex128`
//! - `Rational64` -> `crate::dtype::Rational64`
//! - `Object` -> Returns `UnsupportedDType` error

/// Macro for runtime dtype dispatch to typed operations.
///
/// This macro takes a `DType` value and executes a code block with `T` bound
/// to the corresponding Rust type. `Bool` dispatches to `u8`; the storage
/// layer guarantees boolean buffers only ever hold 0 or 1. `Object` has no
/// in-memory representation and always produces an `UnsupportedDType` error.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Bool => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Complex64 => {
                type $T = $crate::dtype::Complex64;
                $body
            }
            $crate::dtype::DType::Complex128 => {
                type $T = $crate::dtype::Complex128;
                $body
            }
            $crate::dtype::DType::Rational64 => {
                type $T = $crate::dtype::Rational64;
                $body
            }
            $crate::dtype::DType::Object => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: $dtype,
                    op: $error_op,
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::dtype::DType;
    use crate::error::Result;

    fn dispatched_size(dtype: DType) -> Result<usize> {
        dispatch_dtype!(dtype, T => {
            Ok(std::mem::size_of::<T>())
        }, "dispatched_size")
    }

    #[test]
    fn test_dispatch_sizes_match_dtype() {
        for dtype in DType::STORABLE {
            assert_eq!(dispatched_size(dtype).unwrap(), dtype.size_in_bytes(), "{dtype}");
        }
    }

    #[test]
    fn test_dispatch_rejects_object() {
        assert!(dispatched_size(DType::Object).is_err());
    }

    #[test]
    fn test_nested_dispatch() {
        fn pair_size(a: DType, b: DType) -> Result<usize> {
            dispatch_dtype!(a, T => {
                dispatch_dtype!(b, U => {
                    Ok(std::mem::size_of::<T>() + std::mem::size_of::<U>())
                }, "pair_size")
            }, "pair_size")
        }

        assert_eq!(pair_size(DType::F32, DType::Complex128).unwrap(), 4 + 16);
        assert!(pair_size(DType::F32, DType::Object).is_err());
    }
}
