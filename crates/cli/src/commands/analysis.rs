use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use neta_core::db::{AnalysisTaskRecord, TaskFilter, TaskStatus};
use neta_core::services::analysis::AnalysisKind;
use neta_core::services::dispatch::{BatchRequest, DispatchError, TaskDispatcher};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::commands::{layout_for, open_context, print_json, project_runtime};

/// Parse `--params` input: inline JSON, or `@path` to read JSON from a file.
pub fn parse_params(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    let body = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameters file {path}"))?,
        None => raw.to_string(),
    };
    match serde_json::from_str::<Value>(&body).context("Failed to parse parameters JSON")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Parameters must be a JSON object, got {other}")),
    }
}

/// Validate a task status filter string.
pub fn validate_task_status(raw: &str) -> Result<TaskStatus> {
    raw.parse::<TaskStatus>().map_err(|e| anyhow!(e))
}

fn parse_kind(raw: &str) -> Result<AnalysisKind> {
    raw.parse::<AnalysisKind>().map_err(|e| anyhow!(e))
}

fn dispatch_error(err: DispatchError) -> anyhow::Error {
    match err {
        DispatchError::Validation(msg) => anyhow!("Invalid analysis request: {msg}"),
        DispatchError::Store(e) => anyhow!(e).context("Failed to record analysis task"),
    }
}

/// Run one analysis for a dataset and record it as a task.
pub fn run_analysis_command(
    root: &str,
    kind: &str,
    dataset_id: i64,
    params: Option<&str>,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let ctx = open_context(root)?;
    let runtime = project_runtime(&ctx);

    let mut input = parse_params(params)?;
    input.insert("dataset_id".into(), Value::from(dataset_id));
    let dispatcher = TaskDispatcher::new(&ctx.db, &runtime);
    let outcome = dispatcher.dispatch(kind, &Value::Object(input)).map_err(dispatch_error)?;

    if json {
        print_json(&outcome)?;
    } else {
        println!("Task {}: {} ({})", outcome.task_id, outcome.status, kind);
        if let Some(results) = &outcome.results {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
    }
    if let Some(error) = outcome.error {
        bail!("Analysis task {} failed: {}", outcome.task_id, error);
    }
    Ok(())
}

/// Run one analysis kind over several datasets, continuing past failures.
pub fn run_batch_command(
    root: &str,
    kind: &str,
    datasets: &[String],
    params: Option<&str>,
    json: bool,
) -> Result<()> {
    let ctx = open_context(root)?;
    let runtime = project_runtime(&ctx);

    let request = BatchRequest {
        analysis_type: kind.to_string(),
        dataset_ids: datasets.iter().map(|d| Value::String(d.clone())).collect(),
        parameters: parse_params(params)?,
    };
    let dispatcher = TaskDispatcher::new(&ctx.db, &runtime);
    let report = dispatcher.dispatch_batch(&request).map_err(dispatch_error)?;

    if json {
        return print_json(&report);
    }
    println!(
        "Batch {}: {} datasets, {} successful, {} failed",
        report.analysis_type, report.total_datasets, report.successful, report.failed
    );
    for item in &report.results {
        let task = item.task_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
        match &item.error {
            Some(err) => println!("- dataset {} task {}: {} ({})", item.dataset_id, task, item.status, err),
            None => println!("- dataset {} task {}: {}", item.dataset_id, task, item.status),
        }
    }
    Ok(())
}

/// List recorded analysis tasks.
pub fn list_tasks_command(
    root: &str,
    status: Option<&str>,
    kind: Option<&str>,
    dataset_id: Option<i64>,
    limit: Option<u32>,
    json: bool,
) -> Result<()> {
    let filter = TaskFilter {
        status: status.map(validate_task_status).transpose()?,
        task_type: kind.map(parse_kind).transpose()?,
        dataset_id,
        limit,
    };
    let ctx = open_context(root)?;
    let tasks = ctx.db.list_tasks(&filter).context("Failed to list analysis tasks")?;

    if json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("Analysis tasks: (none)");
        return Ok(());
    }
    println!("Analysis tasks:");
    for t in tasks {
        println!(
            "- #{} {} dataset {} [{}] created {}",
            t.id, t.task_type, t.dataset_id, t.status, t.created_at
        );
    }
    Ok(())
}

/// Task record with parameters and results decoded back to JSON.
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: i64,
    pub task_type: AnalysisKind,
    pub dataset_id: i64,
    pub status: TaskStatus,
    pub parameters: Value,
    pub results: Option<Value>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl TryFrom<AnalysisTaskRecord> for TaskView {
    type Error = anyhow::Error;

    fn try_from(task: AnalysisTaskRecord) -> Result<Self> {
        let parameters = task
            .parameters_json()
            .with_context(|| format!("Task {} holds invalid parameters JSON", task.id))?;
        let results = task
            .results_json()
            .with_context(|| format!("Task {} holds invalid results JSON", task.id))?;
        Ok(Self {
            id: task.id,
            task_type: task.task_type,
            dataset_id: task.dataset_id,
            status: task.status,
            parameters,
            results,
            created_at: task.created_at,
            completed_at: task.completed_at,
        })
    }
}

/// Show one task with parameters and results parsed back to JSON.
pub fn show_task_command(root: &str, id: i64, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let task = ctx
        .db
        .get_task(id)
        .context("Failed to load analysis task")?
        .ok_or_else(|| anyhow!("Analysis task {id} not found"))?;
    let view = TaskView::try_from(task)?;

    if json {
        return print_json(&view);
    }
    println!("Task #{}", view.id);
    println!("  Type: {}", view.task_type);
    println!("  Dataset: {}", view.dataset_id);
    println!("  Status: {}", view.status);
    println!("  Created: {}", view.created_at);
    println!("  Completed: {}", view.completed_at.as_deref().unwrap_or("-"));
    println!("  Parameters: {}", view.parameters);
    if let Some(results) = &view.results {
        println!("  Results: {}", serde_json::to_string_pretty(results)?);
    }
    Ok(())
}

#[derive(Serialize)]
struct RuntimeCheck {
    probe: neta_core::services::runtimes::RuntimeProbe,
    scripts: Vec<ScriptCheck>,
}

#[derive(Serialize)]
struct ScriptCheck {
    kind: AnalysisKind,
    path: String,
    present: bool,
}

/// Report whether the interpreter runs and which analysis scripts are present.
pub fn check_runtime_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let runtime = project_runtime(&ctx);
    let check = RuntimeCheck {
        probe: runtime.probe(),
        scripts: AnalysisKind::ALL
            .into_iter()
            .map(|kind| {
                let path = runtime.script_path(kind);
                ScriptCheck { kind, present: path.is_file(), path: path.display().to_string() }
            })
            .collect(),
    };

    if json {
        return print_json(&check);
    }
    println!("Runtime check:");
    if check.probe.available {
        println!(
            "- Interpreter: OK ({}) {}",
            check.probe.interpreter,
            check.probe.version.as_deref().unwrap_or("")
        );
    } else {
        println!(
            "- Interpreter: MISSING ({}) {}",
            check.probe.interpreter,
            check.probe.error.as_deref().unwrap_or("")
        );
    }
    for s in &check.scripts {
        println!("- {}: {} ({})", s.kind, if s.present { "OK" } else { "MISSING" }, s.path);
    }
    Ok(())
}

/// Delete per-task scratch directories.
pub fn clean_results_command(root: &str, task: Option<i64>, all: bool, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to delete analysis results without --yes");
    }
    if task.is_none() && !all {
        bail!("Specify --task or use --all to clean all analysis results");
    }

    let layout = layout_for(root)?;
    let config = neta_core::db::load_project_config(&layout)?;
    let results_dir = layout.resolve(&config.runtime.results_dir);

    let targets: Vec<std::path::PathBuf> = match task {
        Some(id) if !all => vec![results_dir.join(format!("task-{id}"))],
        _ => {
            if !results_dir.is_dir() {
                println!("Nothing to remove ({} not found)", results_dir.display());
                return Ok(());
            }
            let mut dirs = Vec::new();
            for entry in fs::read_dir(&results_dir)
                .with_context(|| format!("Failed to read {}", results_dir.display()))?
            {
                let entry = entry?;
                let is_task_dir = entry.file_type()?.is_dir()
                    && entry.file_name().to_string_lossy().starts_with("task-");
                if is_task_dir {
                    dirs.push(entry.path());
                }
            }
            dirs.sort();
            dirs
        }
    };

    if targets.is_empty() {
        println!("Nothing to remove in {}", results_dir.display());
    }
    for path in targets {
        if path.exists() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            println!("Removed results: {}", path.display());
        } else {
            println!("Nothing to remove ({} not found)", path.display());
        }
    }
    Ok(())
}
