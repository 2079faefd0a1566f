//! `phiz` library crate.
//!
//! The binary (`phiz`) is a thin wrapper around this library so that:
//!
//! - every analysis can be called in-process and tested without spawning processes
//! - the HTTP launcher stays an optional outer shell around the same binary
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod report;
pub mod server;
