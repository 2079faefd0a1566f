//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - passed between the adapters, the evaluator and the statistic engine
//! - printed by the report emitter
//! - exported as JSON (`phiz run --json`)

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::CosmoError;

/// The five free parameters of the Dynamic Fractal Model.
///
/// `Ω_Λ` is not a parameter: it is always derived as `1 - Ω_m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Hubble constant (km/s/Mpc).
    pub h0: f64,
    /// Matter density parameter.
    pub om: f64,
    /// Decay rate of the fractal dimension towards `φ∞`.
    pub gamma: f64,
    /// Amplitude of the low-redshift BAO bump.
    pub a1: f64,
    /// Amplitude of the high-redshift BAO bump.
    pub a2: f64,
}

impl ModelParameters {
    /// Number of free parameters, used for degrees of freedom.
    pub const COUNT: usize = 5;

    /// Published global best-fit values.
    pub const GLOBAL_BEST_FIT: ModelParameters = ModelParameters {
        h0: 73.24,
        om: 0.2974,
        gamma: 0.433,
        a1: 0.031,
        a2: 0.019,
    };

    /// Build a parameter set, rejecting values outside the documented ranges.
    pub fn new(h0: f64, om: f64, gamma: f64, a1: f64, a2: f64) -> Result<Self, CosmoError> {
        let params = Self {
            h0,
            om,
            gamma,
            a1,
            a2,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check `H0 > 0`, `Ω_m ∈ (0, 1)`, `Γ > 0` and that everything is finite.
    ///
    /// The evaluator itself accepts any values (and reports domain errors where
    /// the model breaks down); this check is for user-supplied runs.
    pub fn validate(&self) -> Result<(), CosmoError> {
        let all_finite = [self.h0, self.om, self.gamma, self.a1, self.a2]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(CosmoError::InvalidInput(
                "model parameters must be finite".to_string(),
            ));
        }
        if self.h0 <= 0.0 {
            return Err(CosmoError::InvalidInput(format!(
                "H0 must be > 0 (got {})",
                self.h0
            )));
        }
        if !(self.om > 0.0 && self.om < 1.0) {
            return Err(CosmoError::InvalidInput(format!(
                "Om must lie in (0, 1) (got {})",
                self.om
            )));
        }
        if self.gamma <= 0.0 {
            return Err(CosmoError::InvalidInput(format!(
                "Gamma must be > 0 (got {})",
                self.gamma
            )));
        }
        Ok(())
    }

    /// Dark-energy density `1 - Ω_m`.
    pub fn omega_lambda(&self) -> f64 {
        1.0 - self.om
    }
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self::GLOBAL_BEST_FIT
    }
}

/// What an observation point measures, i.e. which model prediction it is compared to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observable {
    /// Expansion rate `H(z)` in km/s/Mpc.
    HubbleRate,
    /// Volume-averaged distance over the sound horizon, `D_V / r_d`.
    DvOverRd,
    /// Hubble distance over the sound horizon, `(c / H) / r_d`.
    DhOverRd,
    /// Distance modulus `μ` in magnitudes.
    DistanceModulus,
}

impl Observable {
    pub fn label(self) -> &'static str {
        match self {
            Observable::HubbleRate => "H(z)",
            Observable::DvOverRd => "D_V/r_d",
            Observable::DhOverRd => "D_H/r_d",
            Observable::DistanceModulus => "mu",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Observable::HubbleRate => "km/s/Mpc",
            Observable::DvOverRd | Observable::DhOverRd => "",
            Observable::DistanceModulus => "mag",
        }
    }
}

/// One measurement: redshift, observed value and its 1σ uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    pub z: f64,
    pub observed: f64,
    pub sigma: f64,
    pub observable: Observable,
}

impl ObservationPoint {
    pub fn new(z: f64, observed: f64, sigma: f64, observable: Observable) -> Self {
        Self {
            z,
            observed,
            sigma,
            observable,
        }
    }
}

/// An ordered set of observations, optionally with a full covariance matrix.
///
/// When `covariance` is present it is `N×N`, index-aligned with `points`, and
/// supersedes the per-point `sigma` in the statistic.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub points: Vec<ObservationPoint>,
    pub covariance: Option<DMatrix<f64>>,
    /// Row indices of the source table that were dropped (e.g. calibrators).
    pub excluded: Vec<usize>,
}

impl Dataset {
    /// Build a dataset, validating every point.
    pub fn new(name: impl Into<String>, points: Vec<ObservationPoint>) -> Result<Self, CosmoError> {
        let name = name.into();
        if points.is_empty() {
            return Err(CosmoError::InvalidInput(format!("dataset '{name}' is empty")));
        }
        for (i, p) in points.iter().enumerate() {
            if !(p.z.is_finite() && p.z >= 0.0) {
                return Err(CosmoError::InvalidInput(format!(
                    "dataset '{name}' point {i}: redshift must be finite and >= 0 (got {})",
                    p.z
                )));
            }
            if !p.observed.is_finite() {
                return Err(CosmoError::InvalidInput(format!(
                    "dataset '{name}' point {i}: observed value is not finite"
                )));
            }
            if !(p.sigma.is_finite() && p.sigma > 0.0) {
                return Err(CosmoError::InvalidInput(format!(
                    "dataset '{name}' point {i}: sigma must be > 0 (got {})",
                    p.sigma
                )));
            }
        }
        Ok(Self {
            name,
            points,
            covariance: None,
            excluded: Vec::new(),
        })
    }

    /// Attach a covariance matrix aligned with `points`.
    pub fn with_covariance(
        mut self,
        covariance: DMatrix<f64>,
        excluded: Vec<usize>,
    ) -> Result<Self, CosmoError> {
        let n = self.points.len();
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(CosmoError::InvalidInput(format!(
                "covariance for '{}' is {}x{}, expected {n}x{n}",
                self.name,
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(CosmoError::InvalidInput(format!(
                "covariance for '{}' contains non-finite entries",
                self.name
            )));
        }
        self.covariance = Some(covariance);
        self.excluded = excluded;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn observed(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.observed).collect()
    }

    pub fn sigmas(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.sigma).collect()
    }

    pub fn summary(&self) -> DatasetSummary {
        let (z_min, z_max) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.z), hi.max(p.z))
            });
        DatasetSummary {
            name: self.name.clone(),
            n_points: self.points.len(),
            n_excluded: self.excluded.len(),
            z_min,
            z_max,
            full_covariance: self.covariance.is_some(),
        }
    }
}

/// Dataset facts surfaced in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub n_points: usize,
    pub n_excluded: usize,
    pub z_min: f64,
    pub z_max: f64,
    pub full_covariance: bool,
}

/// Goodness-of-fit statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitStatistic {
    pub chi2: f64,
    pub dof: usize,
    pub chi2_per_dof: f64,
}

/// Per-point comparison of model and data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointResidual {
    pub z: f64,
    pub observable: Observable,
    pub observed: f64,
    pub predicted: f64,
    pub sigma: f64,
    /// `(observed - predicted) / sigma`.
    pub pull: f64,
}

/// A named derived number (e.g. a sound horizon or a volume).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantity {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(label: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// Model prediction versus a single reference measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tension {
    pub label: String,
    pub model: f64,
    pub observed: f64,
    pub sigma: f64,
    /// `|model - observed| / sigma`.
    pub n_sigma: f64,
}

/// Which analysis to run.
///
/// Each variant also answers to the script name it replaces, so existing
/// callers (and the launcher allow-list) keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    /// H(z) cosmic chronometers.
    #[value(alias = "Cosmic_Chronometers.py")]
    Chronometers,
    /// DESI BAO distance ratios.
    #[value(alias = "bao.py")]
    Bao,
    /// Pantheon+ supernovae with full covariance.
    #[value(alias = "SNIa.py")]
    Snia,
    /// Planck angular scale of the sound horizon.
    #[value(alias = "CMB.py")]
    Cmb,
    /// Massive cluster abundance deficit.
    #[value(alias = "cluster_deficit_calc.py")]
    Clusters,
    /// Galaxy two-point correlation slope.
    #[value(name = "galaxy-2pcf", alias = "galaxy_2pcf_check.py")]
    #[serde(rename = "galaxy-2pcf")]
    Galaxy2pcf,
    /// All probes in one combined report.
    #[value(alias = "validate_bao_hz.py")]
    Summary,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 7] = [
        AnalysisKind::Chronometers,
        AnalysisKind::Bao,
        AnalysisKind::Snia,
        AnalysisKind::Cmb,
        AnalysisKind::Clusters,
        AnalysisKind::Galaxy2pcf,
        AnalysisKind::Summary,
    ];

    /// Identifier used on the command line.
    pub fn id(self) -> &'static str {
        match self {
            AnalysisKind::Chronometers => "chronometers",
            AnalysisKind::Bao => "bao",
            AnalysisKind::Snia => "snia",
            AnalysisKind::Cmb => "cmb",
            AnalysisKind::Clusters => "clusters",
            AnalysisKind::Galaxy2pcf => "galaxy-2pcf",
            AnalysisKind::Summary => "summary",
        }
    }

    /// Legacy script name accepted by the launcher.
    pub fn script_name(self) -> &'static str {
        match self {
            AnalysisKind::Chronometers => "Cosmic_Chronometers.py",
            AnalysisKind::Bao => "bao.py",
            AnalysisKind::Snia => "SNIa.py",
            AnalysisKind::Cmb => "CMB.py",
            AnalysisKind::Clusters => "cluster_deficit_calc.py",
            AnalysisKind::Galaxy2pcf => "galaxy_2pcf_check.py",
            AnalysisKind::Summary => "validate_bao_hz.py",
        }
    }

    pub fn from_script_name(name: &str) -> Option<AnalysisKind> {
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.script_name() == name)
    }

    /// Human-readable title for report headers.
    pub fn title(self) -> &'static str {
        match self {
            AnalysisKind::Chronometers => "H(z) Cosmic Chronometers",
            AnalysisKind::Bao => "BAO (DESI)",
            AnalysisKind::Snia => "Pantheon+ SNIa",
            AnalysisKind::Cmb => "CMB (Planck)",
            AnalysisKind::Clusters => "Cluster Mass Function Deficit",
            AnalysisKind::Galaxy2pcf => "Galaxy 2PCF Correlation Slope",
            AnalysisKind::Summary => "Dynamic Fractal Universe Summary",
        }
    }

    /// Published chi²/dof for this probe, where one exists.
    pub fn documented_chi2_per_dof(self) -> Option<f64> {
        match self {
            AnalysisKind::Chronometers => Some(0.997),
            AnalysisKind::Snia => Some(0.613),
            AnalysisKind::Cmb => Some(1.475),
            AnalysisKind::Clusters => Some(1.228),
            AnalysisKind::Galaxy2pcf => Some(0.717),
            AnalysisKind::Summary => Some(0.951),
            AnalysisKind::Bao => None,
        }
    }
}

/// Output format for `phiz run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub params: ModelParameters,
    /// Directory holding the Pantheon+ and Planck files.
    pub data_dir: PathBuf,
    pub format: OutputFormat,
    /// How many of the largest pulls to list per dataset.
    pub top_n: usize,
}

impl RunConfig {
    pub fn new(params: ModelParameters, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            params,
            data_dir: data_dir.into(),
            format: OutputFormat::Text,
            top_n: 5,
        }
    }
}

/// Everything one analysis computed, ready for the report emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis: AnalysisKind,
    pub dataset: Option<DatasetSummary>,
    pub statistic: Option<FitStatistic>,
    pub residuals: Vec<PointResidual>,
    pub quantities: Vec<Quantity>,
    pub tensions: Vec<Tension>,
    pub documented_chi2_per_dof: Option<f64>,
    pub notes: Vec<String>,
}

impl AnalysisReport {
    pub fn new(analysis: AnalysisKind) -> Self {
        Self {
            analysis,
            dataset: None,
            statistic: None,
            residuals: Vec::new(),
            quantities: Vec::new(),
            tensions: Vec::new(),
            documented_chi2_per_dof: analysis.documented_chi2_per_dof(),
            notes: Vec::new(),
        }
    }
}

/// All computed outputs of a single `phiz run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub analysis: AnalysisKind,
    pub params: ModelParameters,
    pub generated_at: DateTime<Utc>,
    /// One report per probe; `summary` produces several.
    pub reports: Vec<AnalysisReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_best_fit_is_valid() {
        assert!(ModelParameters::GLOBAL_BEST_FIT.validate().is_ok());
        let lambda = ModelParameters::GLOBAL_BEST_FIT.omega_lambda();
        assert!((lambda - 0.7026).abs() < 1e-12);
    }

    #[test]
    fn parameters_outside_range_are_rejected() {
        assert!(ModelParameters::new(73.0, 1.2, 0.4, 0.0, 0.0).is_err());
        assert!(ModelParameters::new(73.0, 0.3, 0.0, 0.0, 0.0).is_err());
        assert!(ModelParameters::new(-1.0, 0.3, 0.4, 0.0, 0.0).is_err());
        assert!(ModelParameters::new(73.0, 0.3, 0.4, f64::NAN, 0.0).is_err());
    }

    #[test]
    fn dataset_rejects_negative_redshift_and_bad_sigma() {
        let bad_z = vec![ObservationPoint::new(-0.1, 70.0, 5.0, Observable::HubbleRate)];
        assert!(Dataset::new("bad", bad_z).is_err());

        let bad_sigma = vec![ObservationPoint::new(0.1, 70.0, 0.0, Observable::HubbleRate)];
        assert!(Dataset::new("bad", bad_sigma).is_err());

        assert!(Dataset::new("empty", Vec::new()).is_err());
    }

    #[test]
    fn covariance_must_match_point_count() {
        let points = vec![
            ObservationPoint::new(0.1, 38.0, 0.1, Observable::DistanceModulus),
            ObservationPoint::new(0.2, 39.5, 0.1, Observable::DistanceModulus),
        ];
        let dataset = Dataset::new("sn", points).unwrap();
        let wrong = DMatrix::<f64>::identity(3, 3);
        assert!(dataset.clone().with_covariance(wrong, vec![]).is_err());

        let right = DMatrix::<f64>::identity(2, 2);
        let dataset = dataset.with_covariance(right, vec![4]).unwrap();
        let summary = dataset.summary();
        assert_eq!(summary.n_points, 2);
        assert_eq!(summary.n_excluded, 1);
        assert!(summary.full_covariance);
        assert_eq!(summary.z_min, 0.1);
        assert_eq!(summary.z_max, 0.2);
    }

    #[test]
    fn script_names_round_trip() {
        for kind in AnalysisKind::ALL {
            assert_eq!(AnalysisKind::from_script_name(kind.script_name()), Some(kind));
        }
        assert_eq!(AnalysisKind::from_script_name("nope.py"), None);
    }
}
