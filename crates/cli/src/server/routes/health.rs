//! Health / heartbeat endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use neta_core::db::now_timestamp;
use serde_json::{json, Value};

use crate::server::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Returns `{"status": "healthy", ...}` with HTTP 200.
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "NETA API is running",
        "project": state.project_name,
        "version": neta_core::version(),
        "timestamp": now_timestamp(),
    }))
}
