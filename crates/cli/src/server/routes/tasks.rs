use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use neta_core::db::{TaskFilter, TaskStatus};
use neta_core::services::analysis::AnalysisKind;
use serde::Deserialize;

use crate::commands::TaskView;
use crate::server::{AppState, ServerError};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tasks", get(list_tasks)).route("/tasks/{id}", get(get_task))
}

#[derive(Debug, Deserialize)]
struct TaskQuery {
    status: Option<String>,
    task_type: Option<String>,
    dataset_id: Option<i64>,
    limit: Option<u32>,
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TaskQuery>,
) -> Result<Json<Vec<TaskView>>, ServerError> {
    let filter = TaskFilter {
        status: q
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()
            .map_err(ServerError::BadRequest)?,
        task_type: q
            .task_type
            .as_deref()
            .map(str::parse::<AnalysisKind>)
            .transpose()
            .map_err(|e| ServerError::BadRequest(e.to_string()))?,
        dataset_id: q.dataset_id,
        limit: q.limit,
    };
    let tasks = state.db.list_tasks(&filter)?;
    Ok(Json(tasks.into_iter().map(TaskView::try_from).collect::<Result<_, _>>()?))
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TaskView>, ServerError> {
    let task = state
        .db
        .get_task(id)?
        .ok_or_else(|| ServerError::NotFound(format!("Analysis task {id} not found")))?;
    Ok(Json(task.try_into()?))
}
