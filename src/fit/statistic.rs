//! Chi-squared statistics.
//!
//! Two flavours:
//!
//! - diagonal: independent per-point errors, `Σ ((o - p) / σ)²`
//! - covariance: correlated errors, `dᵗ C⁻¹ d` with `d = o - p`
//!
//! and the reduction to chi²/dof.

use nalgebra::DVector;

use crate::domain::{FitStatistic, ModelParameters};
use crate::error::CosmoError;
use crate::math::InverseCovariance;

/// Default number of fitted parameters subtracted from the point count.
pub const DEFAULT_N_PARAMETERS: usize = ModelParameters::COUNT;

/// `Σ ((observed_i - predicted_i) / sigma_i)²`.
pub fn chi_squared_diagonal(
    observed: &[f64],
    predicted: &[f64],
    sigma: &[f64],
) -> Result<f64, CosmoError> {
    let n = observed.len();
    if n == 0 {
        return Err(CosmoError::InvalidInput(
            "chi-squared needs at least one point".to_string(),
        ));
    }
    if predicted.len() != n || sigma.len() != n {
        return Err(CosmoError::InvalidInput(format!(
            "length mismatch: observed={n}, predicted={}, sigma={}",
            predicted.len(),
            sigma.len()
        )));
    }
    if let Some(i) = sigma.iter().position(|s| !(s.is_finite() && *s > 0.0)) {
        return Err(CosmoError::InvalidInput(format!(
            "sigma[{i}]={} must be finite and > 0",
            sigma[i]
        )));
    }

    let chi2: f64 = observed
        .iter()
        .zip(predicted)
        .zip(sigma)
        .map(|((o, p), s)| {
            let r = (o - p) / s;
            r * r
        })
        .sum();

    if !chi2.is_finite() {
        return Err(CosmoError::InvalidInput(
            "chi-squared is not finite (non-finite observed or predicted values)".to_string(),
        ));
    }
    Ok(chi2)
}

/// `(observed - predicted)ᵗ · C⁻¹ · (observed - predicted)`.
pub fn chi_squared_covariance(
    observed: &[f64],
    predicted: &[f64],
    inv_cov: &InverseCovariance,
) -> Result<f64, CosmoError> {
    let n = observed.len();
    if n == 0 {
        return Err(CosmoError::InvalidInput(
            "chi-squared needs at least one point".to_string(),
        ));
    }
    if predicted.len() != n {
        return Err(CosmoError::InvalidInput(format!(
            "length mismatch: observed={n}, predicted={}",
            predicted.len()
        )));
    }
    if inv_cov.dim() != n {
        return Err(CosmoError::InvalidInput(format!(
            "inverse covariance is {0}x{0}, expected {n}x{n}",
            inv_cov.dim()
        )));
    }

    let diff = DVector::from_iterator(n, observed.iter().zip(predicted).map(|(o, p)| o - p));
    let chi2 = diff.dot(&(inv_cov.matrix() * &diff));

    if !chi2.is_finite() {
        return Err(CosmoError::InvalidInput(
            "chi-squared is not finite (non-finite observed or predicted values)".to_string(),
        ));
    }
    Ok(chi2)
}

/// Reduce `chi2` to chi²/dof with `dof = n_points - n_parameters`.
pub fn reduced_chi_squared(
    chi2: f64,
    n_points: usize,
    n_parameters: usize,
) -> Result<FitStatistic, CosmoError> {
    if n_points <= n_parameters {
        return Err(CosmoError::DegreesOfFreedom {
            n_points,
            n_parameters,
        });
    }
    if !(chi2.is_finite() && chi2 >= 0.0) {
        return Err(CosmoError::InvalidInput(format!(
            "chi-squared must be finite and >= 0 (got {chi2})"
        )));
    }
    let dof = n_points - n_parameters;
    Ok(FitStatistic {
        chi2,
        dof,
        chi2_per_dof: chi2 / dof as f64,
    })
}

/// Distance between a prediction and a measurement in units of its error.
pub fn tension_sigma(model: f64, observed: f64, sigma: f64) -> f64 {
    (model - observed).abs() / sigma
}
