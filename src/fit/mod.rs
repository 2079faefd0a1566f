//! Statistic engine.
//!
//! Responsibilities:
//!
//! - chi-squared with independent errors or a full covariance matrix
//! - reduction to chi²/dof with a hard degrees-of-freedom guard
//! - single-measurement tensions in σ

pub mod statistic;

pub use statistic::*;
