//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments
//! - runs analyses and prints reports
//! - downloads input files
//! - starts the launcher service

use std::time::Duration;

use clap::Parser;

use crate::cli::{Command, FetchArgs, RunArgs, ServeArgs};
use crate::data::{DataFetcher, FetchStatus};
use crate::domain::{OutputFormat, RunConfig};
use crate::error::AppError;
use crate::server::LauncherConfig;

pub mod pipeline;

/// Entry point for the `phiz` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    // We want `phiz` and `phiz --h0 70` to behave like `phiz run summary ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::List => {
            print!("{}", crate::report::format_catalog());
            Ok(())
        }
        Command::Fetch(args) => handle_fetch(args),
        Command::Serve(args) => handle_serve(args),
    }
}

/// Logs go to stderr; stdout carries only the report.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_analysis(args.analysis, &config)?;

    match config.format {
        OutputFormat::Text => print!("{}", crate::report::format_run_output(&run)),
        OutputFormat::Json => println!("{}", crate::report::format_json(&run)?),
    }
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    RunConfig {
        params: args.params.to_params(),
        data_dir: args.data.data_dir.clone(),
        format: if args.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        },
        top_n: args.top,
    }
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let fetcher = DataFetcher::new(&args.data.data_dir)?;
    for (file, status) in fetcher.fetch_all(args.force)? {
        match status {
            FetchStatus::Downloaded { bytes } => {
                println!("downloaded {} ({bytes} bytes)", file.file_name)
            }
            FetchStatus::Skipped => println!("kept existing {}", file.file_name),
        }
    }
    Ok(())
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let program = std::env::current_exe()
        .map_err(|e| AppError::new(5, format!("Cannot locate the phiz executable: {e}")))?;
    let config = LauncherConfig {
        program,
        base_args: vec!["run".to_string()],
        data_dir: Some(args.data.data_dir),
        timeout: Duration::from_secs(args.timeout_secs),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(5, format!("Failed to start async runtime: {e}")))?;
    runtime.block_on(crate::server::serve(&args.bind, config))
}

/// Rewrite argv so `phiz` defaults to `phiz run summary`.
///
/// Rules:
/// - `phiz`                       -> `phiz run summary`
/// - `phiz --h0 70 ...`           -> `phiz run summary --h0 70 ...`
/// - `phiz --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.extend(["run".to_string(), "summary".to_string()]);
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "list" | "fetch" | "serve");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run summary flags".
    if arg1.starts_with('-') {
        argv.splice(1..1, ["run".to_string(), "summary".to_string()]);
        return argv;
    }

    argv
}
