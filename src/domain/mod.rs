//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - model inputs (`ModelParameters`)
//! - observations and datasets (`ObservationPoint`, `Observable`, `Dataset`)
//! - statistic and report records (`FitStatistic`, `AnalysisReport`, `RunOutput`)
//! - run configuration (`AnalysisKind`, `RunConfig`)

pub mod types;

pub use types::*;
