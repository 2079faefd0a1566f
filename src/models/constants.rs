//! Named constants shared by every analysis.
//!
//! Changing a value here changes every dependent computation identically.

/// Speed of light (km/s).
pub const SPEED_OF_LIGHT: f64 = 299_792.458;

/// Asymptotic fractal dimension at high redshift (golden ratio, 4 s.f.).
pub const PHI_INF: f64 = 1.618;
/// Fractal dimension today, before BAO bumps.
pub const PHI_0: f64 = 2.85;

/// Center and width of the low-redshift BAO bump.
pub const BAO_BUMP_1_CENTER: f64 = 0.4;
pub const BAO_BUMP_1_WIDTH: f64 = 0.3;
/// Center and width of the high-redshift BAO bump.
pub const BAO_BUMP_2_CENTER: f64 = 1.5;
pub const BAO_BUMP_2_WIDTH: f64 = 0.4;

/// ΛCDM fiducial sound horizon at the drag epoch (Mpc).
pub const FIDUCIAL_SOUND_HORIZON: f64 = 147.0;
/// Reference dimension the sound horizon is scaled against.
pub const SOUND_HORIZON_REFERENCE_PHI: f64 = PHI_INF;
/// Scaling exponent of the sound horizon with `φ(z_drag)`.
pub const SOUND_HORIZON_EXPONENT: f64 = -0.75;
/// Drag-epoch redshift.
pub const Z_DRAG: f64 = 1060.0;

/// Exponent of the cluster abundance deficit proxy `1 - (φ/φ∞)^k`.
pub const CLUSTER_DEFICIT_EXPONENT: f64 = 0.5;
/// Redshift of the cluster comparison.
pub const Z_CLUSTER_ERA: f64 = 0.6;

/// Galaxy correlation slope `γ(z) = γ∞ + (γ0 - γ∞) exp(-k z)`.
pub const GAMMA_SLOPE_INF: f64 = 0.55;
pub const GAMMA_SLOPE_0: f64 = 1.25;
pub const GAMMA_SLOPE_RATE: f64 = 1.1;
/// Redshifts at which the correlation slope is reported.
pub const GAMMA_SLOPE_REDSHIFTS: [f64; 3] = [0.1, 1.5, 4.0];

/// A single reference measurement of the acoustic angular scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaStarReference {
    pub label: &'static str,
    pub z: f64,
    pub theta: f64,
    pub sigma: f64,
}

/// Planck 2018 `θ*` evaluated at recombination.
pub const PLANCK_THETA_STAR: ThetaStarReference = ThetaStarReference {
    label: "Planck 2018",
    z: 1090.0,
    theta: 0.010_408_5,
    sigma: 0.000_004,
};

/// Compressed Planck `θ*` used by the combined summary.
pub const PLANCK_THETA_STAR_COMPRESSED: ThetaStarReference = ThetaStarReference {
    label: "Planck (compressed)",
    z: 1100.0,
    theta: 0.010_411,
    sigma: 0.000_05,
};

/// Local distance-ladder H0 (SH0ES), km/s/Mpc.
pub const SHOES_H0: f64 = 73.24;
pub const SHOES_H0_SIGMA: f64 = 0.42;
