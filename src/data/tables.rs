//! Embedded reference datasets.
//!
//! These tables are versioned with the code: editing a row changes every
//! golden value that depends on it.

use crate::domain::{Dataset, ObservationPoint, Observable};
use crate::error::CosmoError;

/// Cosmic chronometer `H(z)` measurements: `(z, H [km/s/Mpc], σ)`.
pub const COSMIC_CHRONOMETERS: [(f64, f64, f64); 32] = [
    (0.07, 69.0, 19.6),
    (0.09, 69.0, 12.0),
    (0.12, 68.6, 26.2),
    (0.17, 83.0, 8.0),
    (0.179, 75.0, 4.0),
    (0.199, 75.0, 5.0),
    (0.20, 72.9, 29.6),
    (0.27, 77.0, 14.0),
    (0.28, 88.8, 36.6),
    (0.352, 83.0, 14.0),
    (0.38, 83.0, 13.5),
    (0.4, 95.0, 17.0),
    (0.4004, 77.0, 10.2),
    (0.425, 87.1, 11.2),
    (0.445, 92.8, 12.9),
    (0.47, 89.0, 49.6),
    (0.4783, 80.9, 9.0),
    (0.48, 97.0, 62.0),
    (0.593, 104.0, 13.0),
    (0.68, 92.0, 8.0),
    (0.75, 98.8, 33.6),
    (0.781, 105.0, 12.0),
    (0.875, 125.0, 17.0),
    (0.88, 90.0, 40.0),
    (0.9, 117.0, 23.0),
    (1.037, 154.0, 20.0),
    (1.3, 168.0, 17.0),
    (1.363, 160.0, 33.6),
    (1.43, 177.0, 18.0),
    (1.53, 140.0, 14.0),
    (1.75, 202.0, 40.0),
    (1.965, 186.5, 50.4),
];

/// DESI BAO ratios: `(z, value, σ)`. The first row is `D_V/r_d`, the others `D_H/r_d`.
pub const DESI_BAO: [(f64, f64, f64); 3] = [(0.51, 13.09, 0.10), (0.71, 20.29, 0.30), (2.33, 32.18, 0.85)];

pub fn cosmic_chronometers() -> Result<Dataset, CosmoError> {
    let points = COSMIC_CHRONOMETERS
        .iter()
        .map(|&(z, h, sigma)| ObservationPoint::new(z, h, sigma, Observable::HubbleRate))
        .collect();
    Dataset::new("Cosmic Chronometers H(z)", points)
}

pub fn desi_bao() -> Result<Dataset, CosmoError> {
    let points = DESI_BAO
        .iter()
        .enumerate()
        .map(|(i, &(z, ratio, sigma))| {
            let observable = if i == 0 {
                Observable::DvOverRd
            } else {
                Observable::DhOverRd
            };
            ObservationPoint::new(z, ratio, sigma, observable)
        })
        .collect();
    Dataset::new("DESI BAO", points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chronometer_table_is_sorted_and_complete() {
        let ds = cosmic_chronometers().unwrap();
        assert_eq!(ds.len(), 32);
        assert!(ds.points.windows(2).all(|w| w[0].z <= w[1].z));
        assert!(ds.points.iter().all(|p| p.observable == Observable::HubbleRate));
    }

    #[test]
    fn bao_table_tags_observables() {
        let ds = desi_bao().unwrap();
        let kinds: Vec<Observable> = ds.points.iter().map(|p| p.observable).collect();
        assert_eq!(
            kinds,
            vec![Observable::DvOverRd, Observable::DhOverRd, Observable::DhOverRd]
        );
    }
}
