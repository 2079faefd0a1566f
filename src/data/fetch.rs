//! Download the file-backed datasets into the data directory.
//!
//! Only the supernova catalogue, its covariance and the Planck spectrum live on
//! disk; the chronometer and BAO tables are compiled in.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;

use crate::data::{pantheon, planck};
use crate::error::AppError;

const PANTHEON_BASE_URL: &str = "https://raw.githubusercontent.com/PantheonPlusSH0ES/DataRelease/main/Pantheon%2B_Data/4_DISTANCES_AND_COVAR";
const PLANCK_URL: &str = "https://irsa.ipac.caltech.edu/data/Planck/release_3/ancillary-data/cosmoparams/COM_PowerSpect_CMB-TT-full_R3.01.txt";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// A remote file and the name it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub url: String,
    pub file_name: &'static str,
}

/// Everything `phiz fetch` downloads.
pub fn remote_files() -> Vec<RemoteFile> {
    vec![
        RemoteFile {
            url: format!("{PANTHEON_BASE_URL}/Pantheon%2BSH0ES.dat"),
            file_name: pantheon::CATALOG_FILE,
        },
        RemoteFile {
            url: format!("{PANTHEON_BASE_URL}/Pantheon%2BSH0ES_STAT%2BSYS.cov"),
            file_name: pantheon::COVARIANCE_FILE,
        },
        RemoteFile {
            url: PLANCK_URL.to_string(),
            file_name: planck::SPECTRUM_FILE,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Downloaded { bytes: usize },
    Skipped,
}

pub struct DataFetcher {
    client: Client,
    data_dir: PathBuf,
}

impl DataFetcher {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::new(5, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            data_dir: data_dir.into(),
        })
    }

    /// Download every remote file. Existing files are kept unless `force` is set.
    pub fn fetch_all(&self, force: bool) -> Result<Vec<(RemoteFile, FetchStatus)>, AppError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            AppError::new(
                2,
                format!("Cannot create data directory {}: {e}", self.data_dir.display()),
            )
        })?;

        let mut out = Vec::new();
        for file in remote_files() {
            let target = self.data_dir.join(file.file_name);
            let status = if target.exists() && !force {
                log::info!("{} already present, skipping", target.display());
                FetchStatus::Skipped
            } else {
                let bytes = self.download(&file.url, &target)?;
                FetchStatus::Downloaded { bytes }
            };
            out.push((file, status));
        }
        Ok(out)
    }

    fn download(&self, url: &str, target: &Path) -> Result<usize, AppError> {
        log::info!("downloading {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::new(5, format!("Request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                5,
                format!("Request to {url} failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .bytes()
            .map_err(|e| AppError::new(5, format!("Failed to read response from {url}: {e}")))?;

        // Stage in a sibling `.part` file; the rename publishes it.
        let partial = target.with_extension("part");
        std::fs::write(&partial, &body)
            .and_then(|()| std::fs::rename(&partial, target))
            .map_err(|e| AppError::new(2, format!("Cannot write {}: {e}", target.display())))?;

        Ok(body.len())
    }
}
