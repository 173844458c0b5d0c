//! Task dispatch: ties one task record to one runtime invocation.
//!
//! Every dispatch creates a `pending` task, promotes it to `running`, invokes
//! the runtime synchronously and closes the task as `completed` or `failed`.
//! Validation errors are raised before any task exists; runtime errors are
//! recorded on the task and returned as a failed outcome; store errors
//! propagate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{CatalogDb, DbError, NewTask, TaskStatus};
use crate::services::analysis::{AnalysisKind, AnalysisRequest, AnalysisRuntime};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Caller input is malformed; no task was created.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] DbError),
}

/// Result of a single dispatch, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub task_id: i64,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Batch input: one analysis kind applied to many datasets.
///
/// Each item runs with `parameters` plus its own `dataset_id`. The item id
/// wins over any `dataset_id` key inside `parameters`, so the task record and
/// the runtime input always name the same dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub analysis_type: String,
    #[serde(default)]
    pub dataset_ids: Vec<Value>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Per-dataset entry of a batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemOutcome {
    /// The id exactly as supplied by the caller.
    pub dataset_id: Value,
    /// Absent when the id was rejected before a task could be created.
    pub task_id: Option<i64>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub analysis_type: AnalysisKind,
    pub total_datasets: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BatchItemOutcome>,
}

/// Coordinator that ties the catalog store and a runtime together.
pub struct TaskDispatcher<'a> {
    pub db: &'a CatalogDb,
    pub runtime: &'a dyn AnalysisRuntime,
}

impl<'a> TaskDispatcher<'a> {
    pub fn new(db: &'a CatalogDb, runtime: &'a dyn AnalysisRuntime) -> Self {
        Self { db, runtime }
    }

    /// Dispatch one analysis. `input` must be a JSON object carrying a
    /// `dataset_id`; it is stored as the task parameters and forwarded to the
    /// runtime unchanged.
    pub fn dispatch(
        &self,
        kind: AnalysisKind,
        input: &Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        let object = input
            .as_object()
            .ok_or_else(|| DispatchError::Validation("Request body must be a JSON object".into()))?;
        let raw_id = object
            .get("dataset_id")
            .ok_or_else(|| DispatchError::Validation("dataset_id is required".into()))?;
        let dataset_id = parse_dataset_id(raw_id)
            .ok_or_else(|| DispatchError::Validation(format!("Invalid dataset_id: {raw_id}")))?;
        self.run_task(kind, dataset_id, input.clone())
    }

    /// Dispatch one analysis per dataset id, sequentially and in input order.
    ///
    /// Individual failures are reported per item and never abort the batch.
    pub fn dispatch_batch(&self, request: &BatchRequest) -> Result<BatchReport, DispatchError> {
        if request.dataset_ids.is_empty() {
            return Err(DispatchError::Validation("dataset_ids must not be empty".into()));
        }
        let kind = request
            .analysis_type
            .parse::<AnalysisKind>()
            .map_err(|err| DispatchError::Validation(err.to_string()))?;

        info!(kind = %kind, items = request.dataset_ids.len(), "starting batch dispatch");
        let mut results = Vec::with_capacity(request.dataset_ids.len());
        for raw_id in &request.dataset_ids {
            let Some(dataset_id) = parse_dataset_id(raw_id) else {
                results.push(BatchItemOutcome {
                    dataset_id: raw_id.clone(),
                    task_id: None,
                    status: TaskStatus::Failed,
                    results: None,
                    error: Some(format!("Invalid dataset_id: {raw_id}")),
                });
                continue;
            };

            let mut parameters = request.parameters.clone();
            parameters.insert("dataset_id".to_string(), Value::from(dataset_id));
            let outcome = self.run_task(kind, dataset_id, Value::Object(parameters))?;
            results.push(BatchItemOutcome {
                dataset_id: raw_id.clone(),
                task_id: Some(outcome.task_id),
                status: outcome.status,
                results: outcome.results,
                error: outcome.error,
            });
        }

        let successful = results.iter().filter(|r| r.status == TaskStatus::Completed).count();
        let failed = results.len() - successful;
        info!(kind = %kind, successful, failed, "batch dispatch finished");
        Ok(BatchReport {
            analysis_type: kind,
            total_datasets: request.dataset_ids.len(),
            successful,
            failed,
            results,
        })
    }

    fn run_task(
        &self,
        kind: AnalysisKind,
        dataset_id: i64,
        parameters: Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        let task_id = self.db.create_task(&NewTask {
            task_type: kind,
            dataset_id,
            parameters: parameters.clone(),
        })?;
        debug!(task_id, kind = %kind, dataset_id, "task created");
        self.db.mark_task_running(task_id)?;
        info!(task_id, kind = %kind, dataset_id, runtime = self.runtime.name(), "task running");

        let request = AnalysisRequest { task_id, kind, parameters };
        match self.runtime.run(&request) {
            Ok(results) => {
                self.db.complete_task(task_id, &results)?;
                info!(task_id, kind = %kind, dataset_id, "task completed");
                Ok(DispatchOutcome {
                    task_id,
                    status: TaskStatus::Completed,
                    results: Some(results),
                    error: None,
                })
            }
            Err(err) => {
                let message = err.to_string();
                self.db.fail_task(task_id, &message)?;
                warn!(
                    task_id,
                    kind = %kind,
                    dataset_id,
                    configuration = err.is_configuration(),
                    error = %message,
                    "task failed"
                );
                Ok(DispatchOutcome {
                    task_id,
                    status: TaskStatus::Failed,
                    results: None,
                    error: Some(message),
                })
            }
        }
    }
}

/// Accept integers, integral floats and numeric strings as dataset ids.
pub fn parse_dataset_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
