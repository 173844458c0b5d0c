use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use neta_core::db::GeneRecord;
use serde::Deserialize;

use crate::server::{AppState, ServerError};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/genes/search", get(search_genes))
}

#[derive(Debug, Deserialize)]
struct GeneSearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<u32>,
}

/// Substring search over gene symbol and name. An empty query matches every gene.
async fn search_genes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeneSearchQuery>,
) -> Result<Json<Vec<GeneRecord>>, ServerError> {
    Ok(Json(state.db.search_genes(&query.q, query.limit)?))
}
