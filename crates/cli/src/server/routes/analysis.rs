//! Analysis dispatch endpoints.
//!
//! Each request runs the whole task lifecycle on a blocking worker: the
//! external process is awaited synchronously, so it must stay off the async
//! executor.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use neta_core::services::analysis::AnalysisKind;
use neta_core::services::dispatch::{BatchReport, BatchRequest, DispatchOutcome, TaskDispatcher};
use serde_json::Value;

use crate::server::{AppState, ServerError};

pub fn router() -> Router<Arc<AppState>> {
    let mut router = Router::new().route("/analysis/batch", post(run_batch));
    for kind in AnalysisKind::ALL {
        let path = format!("/analysis/{}", kind.task_type());
        router = router.route(
            &path,
            post(move |state: State<Arc<AppState>>, body: Result<Json<Value>, JsonRejection>| {
                run_analysis(kind, state, body)
            }),
        );
    }
    router
}

/// Dispatch one analysis. A failed task is reported with HTTP 500 and the
/// outcome body, so the caller still learns the task id.
async fn run_analysis(
    kind: AnalysisKind,
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DispatchOutcome>), ServerError> {
    let Json(input) = body?;
    let outcome = tokio::task::spawn_blocking(move || {
        TaskDispatcher::new(&state.db, state.runtime.as_ref()).dispatch(kind, &input)
    })
    .await??;

    let status =
        if outcome.is_success() { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
    Ok((status, Json(outcome)))
}

async fn run_batch(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, ServerError> {
    let Json(request) = body?;
    let report = tokio::task::spawn_blocking(move || {
        TaskDispatcher::new(&state.db, state.runtime.as_ref()).dispatch_batch(&request)
    })
    .await??;
    Ok(Json(report))
}
