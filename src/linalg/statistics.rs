//! Covariance and correlation over the columns of a rank-2 matrix
//!
//! Each column is a variable and each row an observation. Both statistics
//! are built from the matrix algebra the crate already has: the column
//! means come from a ones-matrix product, the deviations from an
//! elementwise subtraction, and the cross products from `matmul`.

use crate::dtype::{DType, Scalar};
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Divisor choice for [`Matrix::cov`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Denominator {
    /// Divide by `rows - 1` (Bessel's correction)
    Sample,
    /// Divide by `rows`
    Population,
}

impl Matrix {
    /// Covariance matrix of the columns, `[cols, cols]`
    ///
    /// Integer and Bool receivers are rejected; floats, complex, and
    /// rational all compute in their own dtype, so a rational input
    /// yields an exact rational covariance.
    pub fn cov(&self, denominator: Denominator) -> Result<Matrix> {
        let (rows, _cols) = self.dims2("cov")?;
        let dtype = self.dtype();
        if dtype.is_int() || dtype.is_bool() || dtype == DType::Object {
            return Err(Error::unsupported_dtype(dtype, "cov"));
        }
        let divisor = match denominator {
            Denominator::Sample => rows.saturating_sub(1),
            Denominator::Population => rows,
        };
        if divisor == 0 {
            return Err(Error::invalid_argument(
                "denominator",
                "covariance needs at least one observation past the divisor correction",
            ));
        }

        let x = self.to_dense()?;
        // column means replicated down the rows: (1·1ᵀ·X) / rows
        let ones = Matrix::try_filled(&[rows, rows], dtype, 1i64)?;
        let means = ones.matmul(&x)?.div_scalar(Scalar::U64(rows as u64))?;
        let dev = x.sub(&means)?;
        dev.transpose()?
            .matmul(&dev)?
            .div_scalar(Scalar::U64(divisor as u64))
    }

    /// Pearson correlation matrix of the columns, `[cols, cols]`
    ///
    /// Sample covariance scaled by the outer product of the column
    /// standard deviations. Complex receivers are rejected; a constant
    /// column divides by zero and propagates that error.
    pub fn corr(&self) -> Result<Matrix> {
        if self.dtype().is_complex() {
            return Err(Error::unsupported_dtype(self.dtype(), "corr"));
        }
        let c = self.cov(Denominator::Sample)?;
        let sigma = self.to_dense()?.std(0)?;
        let scale = sigma.transpose()?.matmul(&sigma)?;
        c.div(&scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::StorageKind;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_cov_sample_known_values() {
        // two perfectly correlated columns
        let x = Matrix::from_slice(&[1.0f64, 2.0, 2.0, 4.0, 3.0, 6.0], &[3, 2]);
        let c = x.cov(Denominator::Sample).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        let v = c.to_vec::<f64>().unwrap();
        assert!(approx(v[0], 1.0, 1e-12));
        assert!(approx(v[1], 2.0, 1e-12));
        assert!(approx(v[2], 2.0, 1e-12));
        assert!(approx(v[3], 4.0, 1e-12));
    }

    #[test]
    fn test_cov_population_scales_down() {
        let x = Matrix::from_slice(&[1.0f64, 2.0, 2.0, 4.0, 3.0, 6.0], &[3, 2]);
        let sample = x.cov(Denominator::Sample).unwrap().to_vec::<f64>().unwrap();
        let population = x
            .cov(Denominator::Population)
            .unwrap()
            .to_vec::<f64>()
            .unwrap();
        for i in 0..4 {
            assert!(approx(population[i] * 3.0, sample[i] * 2.0, 1e-12));
        }
    }

    #[test]
    fn test_cov_rejects_integers_and_short_input() {
        let ints = Matrix::from_slice(&[1i64, 2, 3, 4], &[2, 2]);
        assert!(matches!(
            ints.cov(Denominator::Sample),
            Err(Error::UnsupportedDType { .. })
        ));

        let one_row = Matrix::from_slice(&[1.0f64, 2.0], &[1, 2]);
        assert!(matches!(
            one_row.cov(Denominator::Sample),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_cov_accepts_sparse_receiver() {
        let dense = Matrix::from_slice(&[1.0f64, 0.0, 0.0, 4.0, 2.0, 0.0], &[3, 2]);
        let yale = dense.cast(StorageKind::Yale, DType::F64).unwrap();
        let from_dense = dense.cov(Denominator::Sample).unwrap().to_vec::<f64>().unwrap();
        let from_yale = yale.cov(Denominator::Sample).unwrap().to_vec::<f64>().unwrap();
        for i in 0..4 {
            assert!(approx(from_dense[i], from_yale[i], 1e-12));
        }
    }

    #[test]
    fn test_corr_diagonal_is_unit() {
        let x = Matrix::from_slice(
            &[1.0f64, 5.0, 2.0, 3.0, 3.0, 8.0, 4.0, 1.0],
            &[4, 2],
        );
        let r = x.corr().unwrap();
        let v = r.to_vec::<f64>().unwrap();
        assert!(approx(v[0], 1.0, 1e-12));
        assert!(approx(v[3], 1.0, 1e-12));
        // off-diagonals symmetric and inside [-1, 1]
        assert!(approx(v[1], v[2], 1e-12));
        assert!(v[1].abs() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_corr_perfectly_correlated() {
        let x = Matrix::from_slice(&[1.0f64, 2.0, 2.0, 4.0, 3.0, 6.0], &[3, 2]);
        let r = x.corr().unwrap().to_vec::<f64>().unwrap();
        assert!(approx(r[1], 1.0, 1e-12));
    }

    #[test]
    fn test_corr_rejects_complex() {
        let z = Matrix::zeros(&[3, 2], DType::Complex128);
        assert!(matches!(z.corr(), Err(Error::UnsupportedDType { .. })));
    }
}
