//! Covariance matrix inversion.
//!
//! The supernova statistic needs `C⁻¹` for a ~1600×1600 symmetric
//! positive-definite matrix. We invert through a Cholesky factorization, which
//! returns `None` for singular or otherwise non-positive-definite input.
//!
//! The result is wrapped in [`InverseCovariance`] so the statistic engine can
//! only ever receive a matrix that came out of a successful inversion.

use nalgebra::DMatrix;

use crate::error::{CosmoError, Evaluation};

/// Relative asymmetry tolerated before a matrix is rejected as non-symmetric.
const SYMMETRY_TOL: f64 = 1e-8;

/// The inverse of a validated covariance matrix.
#[derive(Debug, Clone)]
pub struct InverseCovariance(DMatrix<f64>);

impl InverseCovariance {
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.nrows()
    }
}

/// Invert a symmetric positive-definite covariance matrix.
pub fn invert_covariance(cov: &DMatrix<f64>) -> Result<InverseCovariance, CosmoError> {
    if cov.nrows() != cov.ncols() {
        return Err(CosmoError::InvalidInput(format!(
            "covariance must be square, got {}x{}",
            cov.nrows(),
            cov.ncols()
        )));
    }
    if cov.is_empty() {
        return Err(CosmoError::InvalidInput("covariance is empty".to_string()));
    }
    if cov.iter().any(|v| !v.is_finite()) {
        return Err(CosmoError::domain(
            Evaluation::CovarianceInversion,
            "matrix contains non-finite entries",
        ));
    }

    let scale = cov.amax().max(f64::MIN_POSITIVE);
    let n = cov.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            if (cov[(i, j)] - cov[(j, i)]).abs() > SYMMETRY_TOL * scale {
                return Err(CosmoError::domain(
                    Evaluation::CovarianceInversion,
                    format!("matrix is not symmetric at ({i}, {j})"),
                ));
            }
        }
    }

    let chol = cov.clone().cholesky().ok_or_else(|| {
        CosmoError::domain(
            Evaluation::CovarianceInversion,
            "matrix is singular or not positive-definite",
        )
    })?;
    let inverse = chol.inverse();

    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(CosmoError::domain(
            Evaluation::CovarianceInversion,
            "inverse contains non-finite entries",
        ));
    }

    log::debug!("inverted {n}x{n} covariance matrix");
    Ok(InverseCovariance(inverse))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverts_positive_definite_matrix() {
        let cov = DMatrix::from_row_slice(3, 3, &[4.0, 2.0, 0.6, 2.0, 2.0, 0.4, 0.6, 0.4, 1.0]);
        let inv = invert_covariance(&cov).unwrap();
        let product = &cov * inv.matrix();
        let identity = DMatrix::<f64>::identity(3, 3);
        assert!((product - identity).amax() < 1e-12);
        assert_eq!(inv.dim(), 3);
    }

    #[test]
    fn singular_matrix_is_a_domain_error() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let err = invert_covariance(&cov).unwrap_err();
        assert!(matches!(
            err,
            CosmoError::Domain {
                evaluation: Evaluation::CovarianceInversion,
                ..
            }
        ));
    }

    #[test]
    fn asymmetric_matrix_is_rejected() {
        let cov = DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.1, 2.0]);
        assert!(invert_covariance(&cov).is_err());
    }

    #[test]
    fn non_square_matrix_is_invalid_input() {
        let cov = DMatrix::<f64>::zeros(2, 3);
        assert!(matches!(
            invert_covariance(&cov),
            Err(CosmoError::InvalidInput(_))
        ));
    }
}
