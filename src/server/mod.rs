//! HTTP launcher.
//!
//! An optional outer shell around the CLI: each request runs the analysis as
//! a separate `phiz run` process under a wall-clock timeout.

pub mod launcher;
pub mod routes;

pub use launcher::{
    ALLOWED_SCRIPTS, DEFAULT_TIMEOUT, InvocationError, LauncherConfig, ScriptOutcome,
};

use crate::error::AppError;

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, config: LauncherConfig) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(5, format!("Cannot bind {addr}: {e}")))?;

    log::info!(
        "phiz launcher listening on {addr} (timeout {:?}, program {})",
        config.timeout,
        config.program.display()
    );
    eprintln!("phiz launcher listening on http://{addr}");

    axum::serve(listener, routes::router(config))
        .await
        .map_err(|e| AppError::new(5, format!("Launcher stopped: {e}")))
}
