//! Numerical utilities: adaptive quadrature and covariance inversion.

pub mod covariance;
pub mod quadrature;

pub use covariance::*;
pub use quadrature::*;
