//! HTTP routes for the launcher.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::server::launcher::{LauncherConfig, run_script};

pub type SharedConfig = Arc<LauncherConfig>;

pub fn router(config: LauncherConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/run_script",
            post(run_script_handler).options(preflight_handler),
        )
        .route("/", post(run_script_handler).options(preflight_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(Arc::new(config))
}

async fn run_script_handler(
    State(config): State<SharedConfig>,
    body: Bytes,
) -> impl IntoResponse {
    let (status, body) = run_script(&config, &body).await;
    (status, Json(body))
}

/// OPTIONS that reaches the router gets an empty 200.
async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
