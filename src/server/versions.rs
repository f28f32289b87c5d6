//! Version endpoint, doubling as the worker's connectivity probe.

use axum::routing::get;
use axum::{Json, Router};

use crate::server::AppState;

/// GET /versions
async fn versions() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "candidates-api": env!("CARGO_PKG_VERSION") }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/versions", get(versions))
}
