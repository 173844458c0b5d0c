//! Route tables, one module per resource.

mod analysis;
mod datasets;
mod genes;
mod health;
mod statistics;
mod tasks;

use std::sync::Arc;

use axum::Router;

use crate::server::AppState;

/// Routes mounted under `/api`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(datasets::router())
        .merge(statistics::router())
        .merge(genes::router())
        .merge(analysis::router())
        .merge(tasks::router())
}
