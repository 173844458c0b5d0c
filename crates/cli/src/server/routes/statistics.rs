use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use neta_core::db::CatalogStatistics;

use crate::server::{AppState, ServerError};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/statistics/overview", get(overview))
}

/// Catalog-wide totals and group counts.
async fn overview(State(state): State<Arc<AppState>>) -> Result<Json<CatalogStatistics>, ServerError> {
    Ok(Json(state.db.statistics()?))
}
