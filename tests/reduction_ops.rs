//! Tests for axis reductions: sum, mean, min, max, variance, std

mod common;

use common::{approx_eq, assert_matrix_close};
use numat::dtype::{DType, StorageKind};
use numat::error::Error;
use numat::matrix::Matrix;

// ============================================================================
// Sum and Mean
// ============================================================================

#[test]
fn test_sum_both_axes() {
    let a = Matrix::from_slice(&[1i64, 2, 3, 4, 5, 6], &[2, 3]);

    let cols = a.sum(0).unwrap();
    assert_eq!(cols.shape(), &[1, 3]);
    assert_eq!(cols.to_vec::<i64>().unwrap(), [5, 7, 9]);

    let rows = a.sum(1).unwrap();
    assert_eq!(rows.shape(), &[2, 1]);
    assert_eq!(rows.to_vec::<i64>().unwrap(), [6, 15]);
}

#[test]
fn test_sum_bool_counts_in_u64() {
    let a = Matrix::from_slice(&[1.0f64, 3.0, 2.0, 0.0], &[2, 2]);
    let mask = a.compare_scalar(numat::ops::CompareOp::Gt, 1.5f64).unwrap();
    let counts = mask.sum(0).unwrap();
    assert_eq!(counts.dtype(), DType::U64);
    assert_eq!(counts.to_vec::<u64>().unwrap(), [1, 1]);
}

#[test]
fn test_sum_sparse_matches_dense() {
    let dense = Matrix::from_slice(&[1.0f64, 0.0, 0.0, 2.0, 3.0, 0.0], &[3, 2]);
    let yale = dense.cast(StorageKind::Yale, DType::F64).unwrap();
    assert_eq!(
        dense.sum(0).unwrap().to_dense().unwrap().to_vec::<f64>().unwrap(),
        yale.sum(0).unwrap().to_dense().unwrap().to_vec::<f64>().unwrap()
    );
}

#[test]
fn test_sum_axis_out_of_range() {
    let a = Matrix::ones(&[2, 2], DType::F64);
    assert!(matches!(a.sum(2), Err(Error::InvalidAxis { .. })));
}

#[test]
fn test_sum_of_sequence() {
    let n = 10usize;
    let seq: Vec<i64> = (0..n as i64).collect();
    let a = Matrix::from_slice(&seq, &[n, 1]);
    let total = a.sum(0).unwrap();
    // 0 + 1 + ... + (n-1) = n(n-1)/2
    assert_eq!(
        total.to_vec::<i64>().unwrap(),
        [(n * (n - 1) / 2) as i64]
    );
}

#[test]
fn test_constant_column_mean_and_variance() {
    let a = Matrix::try_filled(&[4, 2], DType::F64, 3.5f64).unwrap();
    let m = a.mean(0).unwrap();
    assert_matrix_close(&m, &[3.5, 3.5], 0.0, "mean of a constant column");

    let v = a.variance(0).unwrap();
    assert_matrix_close(&v, &[0.0, 0.0], 0.0, "variance of a constant column");
}

#[test]
fn test_mean_promotes_integers() {
    let a = Matrix::from_slice(&[1i64, 2, 3, 4], &[2, 2]);
    let m = a.mean(0).unwrap();
    assert_eq!(m.dtype(), DType::F64);
    assert_matrix_close(&m, &[2.0, 3.0], 0.0, "column means");
}

#[test]
fn test_mean_keeps_float_precision() {
    let a = Matrix::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2]);
    let m = a.mean(1).unwrap();
    assert_eq!(m.dtype(), DType::F32);
    assert_eq!(m.to_vec::<f32>().unwrap(), [1.5, 3.5]);
}

// ============================================================================
// Min and Max
// ============================================================================

#[test]
fn test_min_max_along_axes() {
    let a = Matrix::from_slice(&[3i64, -1, 2, 0, 5, -4], &[2, 3]);
    assert_eq!(a.min(0).unwrap().to_vec::<i64>().unwrap(), [0, -1, -4]);
    assert_eq!(a.max(0).unwrap().to_vec::<i64>().unwrap(), [3, 5, 2]);
    assert_eq!(a.min(1).unwrap().to_vec::<i64>().unwrap(), [-1, -4]);
    assert_eq!(a.max(1).unwrap().to_vec::<i64>().unwrap(), [3, 5]);
}

#[test]
fn test_extremum_keeps_dtype() {
    let a = Matrix::from_slice(&[2.5f32, 1.5, -0.5, 3.5], &[2, 2]);
    let m = a.max(0).unwrap();
    assert_eq!(m.dtype(), DType::F32);
    assert_eq!(m.to_vec::<f32>().unwrap(), [2.5, 3.5]);
}

// ============================================================================
// Variance and Std
// ============================================================================

#[test]
fn test_variance_sample_divisor() {
    // column [1, 2, 3]: mean 2, squared deviations 1 + 0 + 1, / (n-1) = 1
    let a = Matrix::from_slice(&[1.0f64, 4.0, 2.0, 5.0, 3.0, 6.0], &[3, 2]);
    let v = a.variance(0).unwrap();
    assert_matrix_close(&v, &[1.0, 1.0], 1e-12, "sample variance");

    let s = a.std(0).unwrap();
    assert_matrix_close(&s, &[1.0, 1.0], 1e-12, "sample std");
}

#[test]
fn test_variance_needs_two_observations() {
    let a = Matrix::from_slice(&[1.0f64, 2.0], &[1, 2]);
    assert!(matches!(a.variance(0), Err(Error::InvalidArgument { .. })));
}

#[test]
fn test_std_known_values() {
    let a = Matrix::from_slice(&[2.0f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], &[8, 1]);
    let s = a.std(0).unwrap().to_vec::<f64>().unwrap();
    // sample std of the classic 8-point set
    assert!(approx_eq(s[0], (32.0f64 / 7.0).sqrt(), 1e-12));
}

// ============================================================================
// Higher-Rank Reductions
// ============================================================================

#[test]
fn test_rank3_reduction_removes_axis() {
    let a = Matrix::from_slice(&[1i64, 2, 3, 4, 5, 6, 7, 8], &[2, 2, 2]);
    let s = a.sum(0).unwrap();
    assert_eq!(s.shape(), &[2, 2]);
    assert_eq!(s.to_vec::<i64>().unwrap(), [6, 8, 10, 12]);

    let s2 = a.sum(2).unwrap();
    assert_eq!(s2.shape(), &[2, 2]);
    assert_eq!(s2.to_vec::<i64>().unwrap(), [3, 7, 11, 15]);
}
