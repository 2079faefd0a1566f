//! Command-line parsing for the fractal cosmology toolkit.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AnalysisKind, ModelParameters};
use crate::server::DEFAULT_TIMEOUT;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "phiz",
    version,
    about = "Goodness-of-fit checks for the Dynamic Fractal Model"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one analysis and print its report.
    Run(RunArgs),
    /// List the available analyses.
    List,
    /// Download the Pantheon+ and Planck input files.
    Fetch(FetchArgs),
    /// Start the HTTP launcher.
    ///
    /// Each accepted request re-invokes this binary as `phiz run <analysis>`
    /// in a separate process with a wall-clock timeout.
    Serve(ServeArgs),
}

/// The five model parameters. Defaults are the published global best fit.
#[derive(Debug, Args, Clone)]
pub struct ParamArgs {
    /// Hubble constant H0 (km/s/Mpc).
    #[arg(long, default_value_t = ModelParameters::GLOBAL_BEST_FIT.h0)]
    pub h0: f64,

    /// Matter density Om, in (0, 1).
    #[arg(long, default_value_t = ModelParameters::GLOBAL_BEST_FIT.om)]
    pub om: f64,

    /// Decay rate Gamma of the fractal dimension.
    #[arg(long, default_value_t = ModelParameters::GLOBAL_BEST_FIT.gamma)]
    pub gamma: f64,

    /// Amplitude of the z=0.4 BAO bump.
    #[arg(long, default_value_t = ModelParameters::GLOBAL_BEST_FIT.a1, allow_hyphen_values = true)]
    pub a1: f64,

    /// Amplitude of the z=1.5 BAO bump.
    #[arg(long, default_value_t = ModelParameters::GLOBAL_BEST_FIT.a2, allow_hyphen_values = true)]
    pub a2: f64,
}

impl ParamArgs {
    /// Unvalidated parameters; the pipeline validates before running.
    pub fn to_params(&self) -> ModelParameters {
        ModelParameters {
            h0: self.h0,
            om: self.om,
            gamma: self.gamma,
            a1: self.a1,
            a2: self.a2,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DataDirArgs {
    /// Directory holding the Pantheon+ and Planck files.
    #[arg(long, env = "PHIZ_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Analysis id (or its legacy script name, e.g. `SNIa.py`).
    #[arg(value_enum)]
    pub analysis: AnalysisKind,

    #[command(flatten)]
    pub params: ParamArgs,

    #[command(flatten)]
    pub data: DataDirArgs,

    /// Print structured results as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// How many of the largest pulls to list per dataset.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub data: DataDirArgs,

    /// Download even if the files already exist.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PHIZ_BIND", default_value = "127.0.0.1:8787")]
    pub bind: String,

    /// Wall-clock limit for one analysis subprocess.
    #[arg(long, env = "PHIZ_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    #[command(flatten)]
    pub data: DataDirArgs,
}
