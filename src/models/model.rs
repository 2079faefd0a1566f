//! Dynamic Fractal Model evaluation.
//!
//! The model replaces the constant matter/dark-energy exponents of flat ΛCDM
//! with a redshift-dependent fractal dimension `φ(z)`:
//!
//! ```text
//! φ(z) = φ∞ + (φ0 - φ∞) e^{-Γz} + A1 g(z; 0.4, 0.3) + A2 g(z; 1.5, 0.4)
//! H(z) = H0 sqrt(Ωm (1+z)^{3φ} + (1-Ωm) (1+z)^{3(2-φ)})
//! ```
//!
//! where `g(z; μ, w) = exp(-½((z-μ)/w)²)` models a localized BAO feature.
//! Distances follow from `D_C(z) = ∫₀^z c / H(z') dz'` and are in Mpc because
//! `H0` is in km/s/Mpc and `c` in km/s.
//!
//! Everything here is a pure function. Integrals are recomputed on every call.

use crate::domain::{ModelParameters, Observable};
use crate::error::{CosmoError, Evaluation};
use crate::math::{QuadratureOptions, integrate};
use crate::models::constants::*;

fn gaussian_bump(z: f64, center: f64, width: f64) -> f64 {
    let u = (z - center) / width;
    (-0.5 * u * u).exp()
}

/// Fractal dimension `φ(z)`. Defined for every real `z`.
pub fn fractal_dimension(z: f64, gamma: f64, a1: f64, a2: f64) -> f64 {
    let base = PHI_INF + (PHI_0 - PHI_INF) * (-gamma * z).exp();
    base + a1 * gaussian_bump(z, BAO_BUMP_1_CENTER, BAO_BUMP_1_WIDTH)
        + a2 * gaussian_bump(z, BAO_BUMP_2_CENTER, BAO_BUMP_2_WIDTH)
}

/// Expansion rate `H(z)` in km/s/Mpc.
///
/// Fails if the radicand is negative, which only happens for parameters outside
/// the documented ranges (e.g. `Ωm > 1` with a strongly negative bump).
pub fn hubble_rate(z: f64, params: &ModelParameters) -> Result<f64, CosmoError> {
    let phi = fractal_dimension(z, params.gamma, params.a1, params.a2);
    let x = 1.0 + z;
    let matter = params.om * x.powf(3.0 * phi);
    let dark_energy = params.omega_lambda() * x.powf(3.0 * (2.0 - phi));
    let radicand = matter + dark_energy;

    // `!(r >= 0)` also catches NaN.
    if !(radicand >= 0.0) {
        return Err(CosmoError::domain(
            Evaluation::HubbleRate,
            format!("negative radicand {radicand:.6e} at z={z} (phi={phi:.6})"),
        ));
    }
    let h = params.h0 * radicand.sqrt();
    if !h.is_finite() {
        return Err(CosmoError::domain(
            Evaluation::HubbleRate,
            format!("non-finite H(z) at z={z}"),
        ));
    }
    Ok(h)
}

/// Flat ΛCDM expansion rate with the same `H0` and `Ωm`, used as a reference.
pub fn hubble_rate_lcdm(z: f64, h0: f64, om: f64) -> Result<f64, CosmoError> {
    let radicand = om * (1.0 + z).powi(3) + (1.0 - om);
    if !(radicand >= 0.0) {
        return Err(CosmoError::domain(
            Evaluation::HubbleRate,
            format!("negative LCDM radicand {radicand:.6e} at z={z}"),
        ));
    }
    Ok(h0 * radicand.sqrt())
}

/// Comoving distance `D_C(z)` in Mpc for the fractal model.
pub fn comoving_distance(z: f64, params: &ModelParameters) -> Result<f64, CosmoError> {
    comoving_distance_with(z, |x| hubble_rate(x, params))
}

/// Comoving distance for an arbitrary expansion history.
///
/// Fails if `z` is negative or if `H` is non-positive anywhere on `[0, z]`.
pub fn comoving_distance_with<H>(z: f64, hubble: H) -> Result<f64, CosmoError>
where
    H: Fn(f64) -> Result<f64, CosmoError>,
{
    if !(z.is_finite() && z >= 0.0) {
        return Err(CosmoError::domain(
            Evaluation::ComovingDistance,
            format!("redshift must be finite and >= 0 (got {z})"),
        ));
    }

    let integrand = |x: f64| -> Result<f64, CosmoError> {
        let h = hubble(x)?;
        if h <= 0.0 {
            return Err(CosmoError::domain(
                Evaluation::ComovingDistance,
                format!("H(z)={h} is not positive at z={x}"),
            ));
        }
        Ok(SPEED_OF_LIGHT / h)
    };

    let q = integrate(
        integrand,
        0.0,
        z,
        QuadratureOptions::default(),
        Evaluation::ComovingDistance,
    )?;
    log::debug!(
        "D_C(z={z}) = {:.6} Mpc over {} segments",
        q.value,
        q.segments
    );
    if !q.converged {
        log::warn!(
            "comoving distance at z={z} did not reach tolerance ({} segments, error estimate {:.3e})",
            q.segments,
            q.error_estimate
        );
    }
    Ok(q.value)
}

/// Luminosity distance `D_L = (1+z) D_C` in Mpc.
pub fn luminosity_distance(z: f64, params: &ModelParameters) -> Result<f64, CosmoError> {
    Ok((1.0 + z) * comoving_distance(z, params)?)
}

/// BAO volume-averaged distance `D_V = (c z D_C² / H)^{1/3}` in Mpc.
///
/// Returns `+∞` when `H(z) = 0`.
pub fn volume_averaged_distance(z: f64, params: &ModelParameters) -> Result<f64, CosmoError> {
    let h = hubble_rate(z, params)?;
    if h == 0.0 {
        return Ok(f64::INFINITY);
    }
    let dc = comoving_distance(z, params)?;
    let cubed = SPEED_OF_LIGHT * z * dc * dc / h;
    if !(cubed >= 0.0) {
        return Err(CosmoError::domain(
            Evaluation::VolumeAveragedDistance,
            format!("negative D_V^3 {cubed:.6e} at z={z}"),
        ));
    }
    Ok(cubed.cbrt())
}

/// Sound horizon at the drag epoch `r_d` in Mpc.
///
/// Scales the ΛCDM fiducial 147 Mpc by `(φ(z_drag)/φ∞)^{-3/4}`.
pub fn sound_horizon(gamma: f64, a1: f64, a2: f64, z_drag: f64) -> f64 {
    let phi = fractal_dimension(z_drag, gamma, a1, a2);
    FIDUCIAL_SOUND_HORIZON * (phi / SOUND_HORIZON_REFERENCE_PHI).powf(SOUND_HORIZON_EXPONENT)
}

/// Sound horizon at the default drag redshift.
pub fn sound_horizon_for(params: &ModelParameters) -> f64 {
    sound_horizon(params.gamma, params.a1, params.a2, Z_DRAG)
}

/// Distance modulus `μ = 5 log10(D_L / Mpc) + 25`.
pub fn distance_modulus(z: f64, params: &ModelParameters) -> Result<f64, CosmoError> {
    let dl = luminosity_distance(z, params)?;
    if !(dl > 0.0) {
        return Err(CosmoError::domain(
            Evaluation::DistanceModulus,
            format!("luminosity distance {dl} is not positive at z={z}"),
        ));
    }
    Ok(5.0 * dl.log10() + 25.0)
}

/// Acoustic angular scale `θ* = r_d / D_C(z)` in radians.
pub fn acoustic_angular_scale(z: f64, params: &ModelParameters) -> Result<f64, CosmoError> {
    let dc = comoving_distance(z, params)?;
    if !(dc > 0.0) {
        return Err(CosmoError::domain(
            Evaluation::ComovingDistance,
            format!("comoving distance {dc} is not positive at z={z}"),
        ));
    }
    Ok(sound_horizon_for(params) / dc)
}

/// Predicted abundance deficit of massive clusters at `z`, in percent.
pub fn cluster_deficit_percent(z: f64, gamma: f64, a1: f64, a2: f64) -> f64 {
    let phi = fractal_dimension(z, gamma, a1, a2);
    100.0 * (1.0 - (phi / PHI_INF).powf(CLUSTER_DEFICIT_EXPONENT))
}

/// Galaxy two-point correlation slope `γ(z)`.
pub fn correlation_slope(z: f64) -> f64 {
    GAMMA_SLOPE_INF + (GAMMA_SLOPE_0 - GAMMA_SLOPE_INF) * (-GAMMA_SLOPE_RATE * z).exp()
}

/// Predict the value of `observable` at redshift `z`.
///
/// `sound_horizon` is only used by the BAO ratios; pass the model's `r_d`.
pub fn predict(
    observable: Observable,
    z: f64,
    params: &ModelParameters,
    sound_horizon: f64,
) -> Result<f64, CosmoError> {
    match observable {
        Observable::HubbleRate => hubble_rate(z, params),
        Observable::DvOverRd => Ok(volume_averaged_distance(z, params)? / sound_horizon),
        Observable::DhOverRd => Ok(SPEED_OF_LIGHT / hubble_rate(z, params)? / sound_horizon),
        Observable::DistanceModulus => distance_modulus(z, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: ModelParameters = ModelParameters::GLOBAL_BEST_FIT;

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        ((a - b) / b).abs() < tol
    }

    #[test]
    fn fractal_dimension_today_includes_bump_tails() {
        let expected = PHI_0
            + P.a1 * (-0.5 * (0.4f64 / 0.3).powi(2)).exp()
            + P.a2 * (-0.5 * (1.5f64 / 0.4).powi(2)).exp();
        let phi = fractal_dimension(0.0, P.gamma, P.a1, P.a2);
        assert!((phi - expected).abs() < 1e-12, "phi(0)={phi}, expected {expected}");
    }

    #[test]
    fn fractal_dimension_tends_to_golden_ratio() {
        let phi = fractal_dimension(500.0, P.gamma, P.a1, P.a2);
        assert!((phi - PHI_INF).abs() < 1e-12);
    }

    #[test]
    fn hubble_rate_today_is_h0() {
        let h = hubble_rate(0.0, &P).unwrap();
        assert!((h - P.h0).abs() < 1e-9);
    }

    #[test]
    fn negative_radicand_is_a_domain_error() {
        let contrived = ModelParameters {
            h0: 70.0,
            om: 1.5,
            gamma: 0.433,
            a1: -3.0,
            a2: 0.019,
        };
        let err = hubble_rate(0.4, &contrived).unwrap_err();
        assert!(matches!(
            err,
            CosmoError::Domain {
                evaluation: Evaluation::HubbleRate,
                ..
            }
        ));
    }

    #[test]
    fn integrand_domain_errors_propagate_through_distances() {
        let contrived = ModelParameters {
            h0: 70.0,
            om: 1.5,
            gamma: 0.433,
            a1: -3.0,
            a2: 0.019,
        };
        assert!(comoving_distance(1.0, &contrived).is_err());
        assert!(distance_modulus(1.0, &contrived).is_err());
    }

    #[test]
    fn comoving_distance_reference_value() {
        let dc = comoving_distance(0.5, &P).unwrap();
        assert!(rel_close(dc, 1378.896_463_790_9, 1e-8), "D_C(0.5)={dc}");
    }

    #[test]
    fn comoving_distance_is_strictly_increasing() {
        let zs = [0.0, 0.05, 0.3, 0.7, 1.2, 2.5, 10.0, 1090.0];
        let dcs: Vec<f64> = zs.iter().map(|&z| comoving_distance(z, &P).unwrap()).collect();
        assert_eq!(dcs[0], 0.0);
        for w in dcs.windows(2) {
            assert!(w[1] > w[0], "not increasing: {w:?}");
        }
    }

    #[test]
    fn comoving_distance_rejects_negative_redshift() {
        assert!(comoving_distance(-0.1, &P).is_err());
        assert!(comoving_distance(f64::NAN, &P).is_err());
    }

    #[test]
    fn luminosity_distance_is_one_plus_z_times_comoving() {
        for &z in &[0.01, 0.5, 1.3, 2.33] {
            let dl = luminosity_distance(z, &P).unwrap();
            let dc = comoving_distance(z, &P).unwrap();
            assert_eq!(dl, (1.0 + z) * dc);
        }
    }

    #[test]
    fn volume_averaged_distance_reference_value() {
        let dv = volume_averaged_distance(0.51, &P).unwrap();
        assert!(rel_close(dv, 1126.124_608_972, 1e-8), "D_V(0.51)={dv}");
    }

    #[test]
    fn volume_averaged_distance_is_infinite_when_expansion_stops() {
        let frozen = ModelParameters { h0: 0.0, ..P };
        assert_eq!(volume_averaged_distance(0.5, &frozen).unwrap(), f64::INFINITY);
    }

    #[test]
    fn sound_horizon_matches_fiducial_at_drag_epoch() {
        let rd = sound_horizon_for(&P);
        assert!((rd - 147.0).abs() < 1e-9, "r_d={rd}");

        // A larger dimension at the drag epoch shrinks the horizon.
        let rd_bumped = sound_horizon(P.gamma, P.a1, P.a2, 1.5);
        assert!(rd_bumped < 147.0);
    }

    #[test]
    fn distance_modulus_reference_value() {
        let mu = distance_modulus(0.5, &P).unwrap();
        assert!((mu - 41.578_114_584_49).abs() < 1e-7, "mu(0.5)={mu}");
    }

    #[test]
    fn distance_modulus_at_zero_is_a_domain_error() {
        let err = distance_modulus(0.0, &P).unwrap_err();
        assert!(matches!(
            err,
            CosmoError::Domain {
                evaluation: Evaluation::DistanceModulus,
                ..
            }
        ));
    }

    #[test]
    fn vanishing_expansion_rate_is_a_comoving_distance_error() {
        let stalled = ModelParameters { h0: 0.0, ..P };
        let err = comoving_distance(0.5, &stalled).unwrap_err();
        assert!(matches!(
            err,
            CosmoError::Domain {
                evaluation: Evaluation::ComovingDistance,
                ..
            }
        ));
    }

    #[test]
    fn acoustic_scale_at_recombination() {
        let theta = acoustic_angular_scale(PLANCK_THETA_STAR.z, &P).unwrap();
        assert!(rel_close(theta, 0.050_466_980_675, 1e-7), "theta*={theta}");
    }

    #[test]
    fn lcdm_reference_distance() {
        let dc = comoving_distance_with(0.6, |z| hubble_rate_lcdm(z, P.h0, P.om)).unwrap();
        assert!(rel_close(dc, 2110.987_330_997_6, 1e-8), "D_C,LCDM(0.6)={dc}");
    }

    #[test]
    fn cluster_deficit_and_correlation_slope() {
        let deficit = cluster_deficit_percent(Z_CLUSTER_ERA, P.gamma, P.a1, P.a2);
        assert!((deficit - (-26.629_308_485)).abs() < 1e-6, "deficit={deficit}");

        assert!((correlation_slope(0.0) - GAMMA_SLOPE_0).abs() < 1e-15);
        assert!((correlation_slope(0.1) - 1.177_083_894_7).abs() < 1e-9);
        assert!((correlation_slope(4.0) - 0.558_594_137_9).abs() < 1e-9);
    }

    #[test]
    fn predict_dispatches_on_observable() {
        let rd = sound_horizon_for(&P);
        let h = predict(Observable::HubbleRate, 0.71, &P, rd).unwrap();
        let dh = predict(Observable::DhOverRd, 0.71, &P, rd).unwrap();
        assert!((dh - SPEED_OF_LIGHT / h / rd).abs() < 1e-12);
        assert!((dh - 6.533_782_140_457).abs() < 1e-8);
    }
}
