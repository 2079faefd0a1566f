//! Dataset adapters.
//!
//! - `tables`: chronometer and BAO measurements compiled into the binary
//! - `pantheon`: supernova catalogue + covariance from the data directory
//! - `planck`: CMB TT spectrum from the data directory
//! - `fetch`: downloads the file-backed inputs

pub mod fetch;
pub mod pantheon;
pub mod planck;
pub mod tables;

pub use fetch::{DataFetcher, FetchStatus, RemoteFile};
pub use pantheon::load_pantheon;
pub use planck::{PowerSpectrum, SPECTRUM_FILE, SpectrumPoint, load_spectrum};
pub use tables::{cosmic_chronometers, desi_bao};
