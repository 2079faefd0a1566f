//! Planck 2018 TT power spectrum reader.
//!
//! The file is whitespace-delimited with `#` comment lines and columns
//! `ell  D_ell  -dD_ell  +dD_ell`. No statistic consumes it yet; the CMB
//! analysis only reports its extent next to the θ* check.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CosmoError;

pub const SPECTRUM_FILE: &str = "COM_PowerSpect_CMB-TT-full_R3.01.txt";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub ell: f64,
    /// `D_ℓ = ℓ(ℓ+1)C_ℓ/2π` in μK².
    pub dl: f64,
    pub err_minus: f64,
    pub err_plus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerSpectrum {
    pub points: Vec<SpectrumPoint>,
}

impl PowerSpectrum {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(ℓ_min, ℓ_max)` of the multipole range.
    pub fn ell_range(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some((first.ell, last.ell))
    }

    /// Highest `D_ℓ` and the multipole it sits at (the first acoustic peak).
    pub fn peak(&self) -> Option<SpectrumPoint> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.dl.total_cmp(&b.dl))
    }
}

/// `Ok(None)` when the file is absent; unreadable or malformed files are errors.
pub fn load_spectrum(data_dir: &Path) -> Result<Option<PowerSpectrum>, CosmoError> {
    let path = data_dir.join(SPECTRUM_FILE);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CosmoError::data_source(&path, e.to_string())),
    };
    let spectrum = parse_spectrum(&text, &path)?;
    log::debug!("loaded {} spectrum multipoles", spectrum.len());
    Ok(Some(spectrum))
}

pub fn parse_spectrum(text: &str, path: &Path) -> Result<PowerSpectrum, CosmoError> {
    let mut points = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| CosmoError::data_source(path, format!("line {}: {e}", i + 1)))?;
        if values.len() < 4 {
            return Err(CosmoError::data_source(
                path,
                format!("line {}: expected 4 columns, found {}", i + 1, values.len()),
            ));
        }
        points.push(SpectrumPoint {
            ell: values[0],
            dl: values[1],
            err_minus: values[2],
            err_plus: values[3],
        });
    }
    if points.is_empty() {
        return Err(CosmoError::data_source(path, "spectrum has no data rows"));
    }
    Ok(PowerSpectrum { points })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_finds_first_peak() {
        let text = "\
#    l        Dl      -dDl      +dDl
  2   225.9    535.0   2713.1
 30  1001.2     78.4     83.1
220  5733.1     59.2     59.3
540  2588.0     33.0     33.0
";
        let s = parse_spectrum(text, Path::new("tt.txt")).unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s.ell_range(), Some((2.0, 540.0)));
        assert_eq!(s.peak().unwrap().ell, 220.0);
    }

    #[test]
    fn short_rows_and_garbage_are_rejected() {
        assert!(parse_spectrum("2 225.9 535.0\n", Path::new("tt.txt")).is_err());
        assert!(parse_spectrum("2 abc 1 1\n", Path::new("tt.txt")).is_err());
        assert!(parse_spectrum("# only comments\n", Path::new("tt.txt")).is_err());
    }

    #[test]
    fn missing_file_is_none() {
        let dir = std::env::temp_dir().join("phiz-no-such-dir");
        assert!(load_spectrum(&dir).unwrap().is_none());
    }
}
