//! Error types.
//!
//! Two layers:
//!
//! - [`CosmoError`]: typed failures raised by the library core (model evaluation,
//!   statistics, dataset adapters). Callers can match on the variant.
//! - [`AppError`]: what the binary reports. It carries the process exit code and a
//!   printable message, so `main` stays a two-liner.
//!
//! Exit codes:
//! - `2`: bad input, configuration or missing data source
//! - `3`: not enough data points for the requested degrees of freedom
//! - `4`: model evaluated outside its valid domain
//! - `5`: network, launcher or service failure

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which model evaluation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    HubbleRate,
    ComovingDistance,
    VolumeAveragedDistance,
    DistanceModulus,
    CovarianceInversion,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Evaluation::HubbleRate => "hubble_rate",
            Evaluation::ComovingDistance => "comoving_distance",
            Evaluation::VolumeAveragedDistance => "volume_averaged_distance",
            Evaluation::DistanceModulus => "distance_modulus",
            Evaluation::CovarianceInversion => "covariance inversion",
        };
        f.write_str(name)
    }
}

/// Failures raised by the computational core.
#[derive(Debug, Error)]
pub enum CosmoError {
    /// A required input file is absent or malformed.
    #[error("data source '{}' unavailable: {reason}", path.display())]
    DataSource { path: PathBuf, reason: String },

    /// The model was evaluated outside its valid range.
    #[error("domain error in {evaluation}: {detail}")]
    Domain {
        evaluation: Evaluation,
        detail: String,
    },

    /// `n_points - n_parameters` is not positive.
    #[error(
        "degrees of freedom must be positive: n_points={n_points}, n_parameters={n_parameters}"
    )]
    DegreesOfFreedom {
        n_points: usize,
        n_parameters: usize,
    },

    /// Malformed arguments to a statistic or dataset constructor.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CosmoError {
    pub fn domain(evaluation: Evaluation, detail: impl Into<String>) -> Self {
        CosmoError::Domain {
            evaluation,
            detail: detail.into(),
        }
    }

    pub fn data_source(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CosmoError::DataSource {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CosmoError> for AppError {
    fn from(err: CosmoError) -> Self {
        let exit_code = match &err {
            CosmoError::DataSource { .. } | CosmoError::InvalidInput(_) => 2,
            CosmoError::DegreesOfFreedom { .. } => 3,
            CosmoError::Domain { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
