//! Dataset listing, detail, filter and search endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use neta_core::db::{
    CatalogStatistics, DatasetFilter, DatasetPage, DatasetRecord, DatasetSummary, PageRequest,
};
use serde::Deserialize;

use crate::server::{AppState, ServerError};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/datasets", get(list_datasets))
        .route("/datasets/filter", get(filter_datasets))
        .route("/datasets/search", get(search_datasets))
        .route("/datasets/statistics", get(dataset_statistics))
        .route("/datasets/{id}", get(get_dataset))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

/// Filter fields plus paging; kept flat because query strings do not nest.
#[derive(Debug, Deserialize)]
struct FilterQuery {
    tissue_type: Option<String>,
    tumor_type: Option<String>,
    platform: Option<String>,
    data_source: Option<String>,
    year_from: Option<i64>,
    year_to: Option<i64>,
    min_samples: Option<i64>,
    page: Option<u32>,
    per_page: Option<u32>,
}

impl FilterQuery {
    fn split(self) -> (DatasetFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.per_page);
        let filter = DatasetFilter {
            tissue_type: self.tissue_type,
            tumor_type: self.tumor_type,
            platform: self.platform,
            data_source: self.data_source,
            year_from: self.year_from,
            year_to: self.year_to,
            min_samples: self.min_samples,
        };
        (filter, page)
    }
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<u32>,
}

async fn list_datasets(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PageQuery>,
) -> Result<Json<DatasetPage>, ServerError> {
    let page = PageRequest::new(q.page, q.per_page);
    Ok(Json(state.db.list_datasets(page)?))
}

async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DatasetRecord>, ServerError> {
    state
        .db
        .get_dataset(id)?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Dataset {id} not found")))
}

async fn filter_datasets(
    State(state): State<Arc<AppState>>,
    Query(q): Query<FilterQuery>,
) -> Result<Json<DatasetPage>, ServerError> {
    let (filter, page) = q.split();
    Ok(Json(state.db.filter_datasets(&filter, page)?))
}

async fn search_datasets(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<DatasetSummary>>, ServerError> {
    if q.q.trim().is_empty() {
        return Err(ServerError::BadRequest("query parameter 'q' is required".into()));
    }
    Ok(Json(state.db.search_datasets(&q.q, q.limit)?))
}

/// Aggregates restricted to datasets that carry expression rows.
async fn dataset_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogStatistics>, ServerError> {
    Ok(Json(state.db.expression_statistics()?))
}
