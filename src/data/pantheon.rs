//! Pantheon+ supernova catalogue and covariance.
//!
//! Inputs (both whitespace-delimited text):
//!
//! - `Pantheon+SH0ES.dat`: a header row of column names followed by one row per
//!   supernova. We need `zHD`, `MU_SH0ES` and `IS_CALIBRATOR`. Lines starting
//!   with `#` are comments.
//! - `Pantheon+SH0ES_STAT+SYS.cov`: a first line holding `N`, then `N²` values of
//!   the full covariance in row-major order, index-aligned with the catalogue.
//!
//! Cepheid-host calibrators (`IS_CALIBRATOR == 1`) are dropped from both the
//! observations and the covariance before the statistic is computed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;

use crate::domain::{Dataset, ObservationPoint, Observable};
use crate::error::CosmoError;

pub const CATALOG_FILE: &str = "Pantheon+SH0ES.dat";
pub const COVARIANCE_FILE: &str = "Pantheon+SH0ES_STAT+SYS.cov";

const COL_Z: &str = "zHD";
const COL_MU: &str = "MU_SH0ES";
const COL_CALIBRATOR: &str = "IS_CALIBRATOR";

/// One catalogue row, before calibrator filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupernovaRow {
    pub z: f64,
    pub mu: f64,
    pub is_calibrator: bool,
}

/// Load the catalogue and covariance from `data_dir` into a covariance dataset.
pub fn load_pantheon(data_dir: &Path) -> Result<Dataset, CosmoError> {
    let catalog_path = data_dir.join(CATALOG_FILE);
    let cov_path = data_dir.join(COVARIANCE_FILE);

    let catalog_text = read_source(&catalog_path)?;
    let rows = parse_catalog(&catalog_text, &catalog_path)?;

    let cov_text = read_source(&cov_path)?;
    let full_cov = parse_covariance(&cov_text, rows.len(), &cov_path)?;

    let dataset = build_dataset(&rows, &full_cov, &cov_path)?;
    log::debug!(
        "loaded {} supernovae ({} calibrators excluded)",
        dataset.len(),
        dataset.excluded.len()
    );
    Ok(dataset)
}

fn read_source(path: &Path) -> Result<String, CosmoError> {
    std::fs::read_to_string(path).map_err(|e| CosmoError::data_source(path, e.to_string()))
}

/// Parse the whitespace-delimited catalogue.
pub fn parse_catalog(text: &str, path: &Path) -> Result<Vec<SupernovaRow>, CosmoError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let Some((_, header)) = lines.next() else {
        return Err(CosmoError::data_source(path, "catalogue has no header row"));
    };
    let columns: HashMap<&str, usize> = header
        .split_whitespace()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();
    let n_columns = columns.len();

    let column = |name: &str| -> Result<usize, CosmoError> {
        columns
            .get(name)
            .copied()
            .ok_or_else(|| CosmoError::data_source(path, format!("missing column '{name}'")))
    };
    let i_z = column(COL_Z)?;
    let i_mu = column(COL_MU)?;
    let i_cal = column(COL_CALIBRATOR)?;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != n_columns {
            return Err(CosmoError::data_source(
                path,
                format!(
                    "line {line_no}: expected {n_columns} fields, found {}",
                    fields.len()
                ),
            ));
        }
        let number = |idx: usize, name: &str| -> Result<f64, CosmoError> {
            fields[idx].parse::<f64>().map_err(|_| {
                CosmoError::data_source(
                    path,
                    format!("line {line_no}: invalid {name} value '{}'", fields[idx]),
                )
            })
        };
        rows.push(SupernovaRow {
            z: number(i_z, COL_Z)?,
            mu: number(i_mu, COL_MU)?,
            is_calibrator: number(i_cal, COL_CALIBRATOR)? == 1.0,
        });
    }

    if rows.is_empty() {
        return Err(CosmoError::data_source(path, "catalogue has no data rows"));
    }
    Ok(rows)
}

/// Parse a flattened `N×N` covariance, checking `N` against the catalogue size.
pub fn parse_covariance(
    text: &str,
    expected_n: usize,
    path: &Path,
) -> Result<DMatrix<f64>, CosmoError> {
    let mut tokens = text.split_whitespace();

    let header = tokens
        .next()
        .ok_or_else(|| CosmoError::data_source(path, "covariance file is empty"))?;
    let n: usize = header.parse().map_err(|_| {
        CosmoError::data_source(path, format!("invalid size header '{header}'"))
    })?;
    if n != expected_n {
        return Err(CosmoError::data_source(
            path,
            format!("covariance is for {n} supernovae, catalogue has {expected_n}"),
        ));
    }

    let mut values = Vec::with_capacity(n * n);
    for (i, token) in tokens.enumerate() {
        let v: f64 = token.parse().map_err(|_| {
            CosmoError::data_source(path, format!("invalid value '{token}' at entry {i}"))
        })?;
        values.push(v);
    }
    if values.len() != n * n {
        return Err(CosmoError::data_source(
            path,
            format!("expected {} covariance entries, found {}", n * n, values.len()),
        ));
    }

    Ok(DMatrix::from_row_slice(n, n, &values))
}

/// Drop calibrators and assemble the dataset.
pub fn build_dataset(
    rows: &[SupernovaRow],
    full_cov: &DMatrix<f64>,
    cov_path: &Path,
) -> Result<Dataset, CosmoError> {
    let (kept, excluded): (Vec<usize>, Vec<usize>) =
        (0..rows.len()).partition(|&i| !rows[i].is_calibrator);
    if kept.is_empty() {
        return Err(CosmoError::data_source(
            PathBuf::from(cov_path),
            "every supernova is flagged as a calibrator",
        ));
    }

    let cov = full_cov.select_rows(&kept).select_columns(&kept);

    let mut points = Vec::with_capacity(kept.len());
    for (k, &i) in kept.iter().enumerate() {
        let variance = cov[(k, k)];
        if !(variance > 0.0) {
            return Err(CosmoError::data_source(
                PathBuf::from(cov_path),
                format!("non-positive variance {variance} for row {i}"),
            ));
        }
        points.push(ObservationPoint::new(
            rows[i].z,
            rows[i].mu,
            variance.sqrt(),
            Observable::DistanceModulus,
        ));
    }

    Dataset::new("Pantheon+ SNIa", points)?.with_covariance(cov, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "\
# synthetic Pantheon+ excerpt
CID zHD MU_SH0ES IS_CALIBRATOR
a 0.0100 33.10 1
b 0.0500 36.60 0
c 0.1000 38.30 0
";

    const COV: &str = "3\n0.05\n0.01\n0.00\n0.01\n0.04\n0.02\n0.00\n0.02\n0.09\n";

    fn path() -> PathBuf {
        PathBuf::from("synthetic")
    }

    #[test]
    fn catalogue_rows_are_parsed_by_column_name() {
        let rows = parse_catalog(CATALOG, &path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_calibrator);
        assert_eq!(rows[1].z, 0.05);
        assert_eq!(rows[2].mu, 38.30);
    }

    #[test]
    fn calibrators_are_sliced_out_of_the_covariance() {
        let rows = parse_catalog(CATALOG, &path()).unwrap();
        let cov = parse_covariance(COV, rows.len(), &path()).unwrap();
        let ds = build_dataset(&rows, &cov, &path()).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.excluded, vec![0]);
        let sub = ds.covariance.as_ref().unwrap();
        assert_eq!(sub[(0, 0)], 0.04);
        assert_eq!(sub[(0, 1)], 0.02);
        assert_eq!(sub[(1, 1)], 0.09);
        assert!((ds.points[1].sigma - 0.3).abs() < 1e-15);
    }

    #[test]
    fn missing_column_is_a_data_source_error() {
        let text = "CID zHD IS_CALIBRATOR\na 0.1 0\n";
        let err = parse_catalog(text, &path()).unwrap_err();
        assert!(matches!(err, CosmoError::DataSource { .. }));
        assert!(err.to_string().contains("MU_SH0ES"));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = "CID zHD MU_SH0ES IS_CALIBRATOR\na 0.1 38.0\n";
        assert!(parse_catalog(text, &path()).is_err());
    }

    #[test]
    fn covariance_size_must_match_catalogue() {
        assert!(parse_covariance(COV, 4, &path()).is_err());
        assert!(parse_covariance("2\n1.0\n0.0\n0.0\n", 2, &path()).is_err());
    }

    #[test]
    fn missing_files_are_data_source_errors() {
        let dir = std::env::temp_dir().join("phiz-no-such-dir");
        let err = load_pantheon(&dir).unwrap_err();
        assert!(matches!(err, CosmoError::DataSource { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let dir = std::env::temp_dir().join(format!("phiz-pantheon-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CATALOG_FILE), CATALOG).unwrap();
        std::fs::write(dir.join(COVARIANCE_FILE), COV).unwrap();

        let ds = load_pantheon(&dir).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.covariance.is_some());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
