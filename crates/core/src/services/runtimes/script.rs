use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::db::{ProjectLayout, RuntimeConfig};
use crate::services::analysis::{AnalysisKind, AnalysisRequest, AnalysisRuntime, RuntimeError};

/// Environment variable that overrides the configured interpreter.
pub const INTERPRETER_ENV: &str = "NETA_RSCRIPT";

/// Runs analysis scripts as child processes exchanging JSON files.
///
/// Each invocation gets its own scratch directory `<results_dir>/task-<id>/`
/// holding `<kind>_input.json` and `<kind>_output.json`. The script is called
/// as `<interpreter> <script> --input <in> --output <out>` and waited on
/// without a timeout.
#[derive(Debug, Clone)]
pub struct ScriptRuntime {
    interpreter: PathBuf,
    scripts_dir: PathBuf,
    results_dir: PathBuf,
}

/// Outcome of checking whether the interpreter can be launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeProbe {
    pub interpreter: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScriptRuntime {
    /// Build a runtime and create `results_dir`.
    ///
    /// If the results directory cannot be created, the current working
    /// directory is used instead.
    pub fn new(
        interpreter: impl Into<PathBuf>,
        scripts_dir: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
    ) -> Self {
        let results_dir = results_dir.into();
        let results_dir = match fs::create_dir_all(&results_dir) {
            Ok(()) => results_dir,
            Err(err) => {
                let fallback = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                warn!(
                    results_dir = %results_dir.display(),
                    fallback = %fallback.display(),
                    error = %err,
                    "cannot create results directory, using current directory"
                );
                fallback
            }
        };
        Self { interpreter: interpreter.into(), scripts_dir: scripts_dir.into(), results_dir }
    }

    /// Build a runtime from project config, resolving relative directories
    /// against the project root. `NETA_RSCRIPT` overrides the interpreter.
    pub fn from_config(layout: &ProjectLayout, config: &RuntimeConfig) -> Self {
        let interpreter = env::var_os(INTERPRETER_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&config.interpreter));
        Self::new(
            interpreter,
            layout.resolve(&config.scripts_dir),
            layout.resolve(&config.results_dir),
        )
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Full path of the script for a kind.
    pub fn script_path(&self, kind: AnalysisKind) -> PathBuf {
        self.scripts_dir.join(kind.script_name())
    }

    /// Scratch directory used by one task.
    pub fn task_dir(&self, task_id: i64) -> PathBuf {
        self.results_dir.join(format!("task-{task_id}"))
    }

    /// Run an analysis by name (`pca`, `pca_analysis`, ...).
    ///
    /// Unknown names fail before any file is written.
    pub fn run_analysis(
        &self,
        kind_name: &str,
        task_id: i64,
        parameters: Value,
    ) -> Result<Value, RuntimeError> {
        let kind: AnalysisKind = kind_name.parse()?;
        self.run(&AnalysisRequest { task_id, kind, parameters })
    }

    /// Launch `<interpreter> --version` and report what came back.
    pub fn probe(&self) -> RuntimeProbe {
        let interpreter = self.interpreter.display().to_string();
        match Command::new(&self.interpreter).arg("--version").output() {
            Ok(output) if output.status.success() => {
                // Rscript prints its version banner on stderr.
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                let text = if stdout.is_empty() {
                    String::from_utf8_lossy(&output.stderr).trim().to_string()
                } else {
                    stdout
                };
                RuntimeProbe {
                    interpreter,
                    available: true,
                    version: text.lines().next().map(str::to_string),
                    error: None,
                }
            }
            Ok(output) => RuntimeProbe {
                interpreter,
                available: false,
                version: None,
                error: Some(format!("--version exited with {}", output.status)),
            },
            Err(err) => RuntimeProbe {
                interpreter,
                available: false,
                version: None,
                error: Some(format!("failed to spawn interpreter: {err}")),
            },
        }
    }
}

impl AnalysisRuntime for ScriptRuntime {
    fn run(&self, request: &AnalysisRequest) -> Result<Value, RuntimeError> {
        let script = self.script_path(request.kind);
        if !script.is_file() {
            return Err(RuntimeError::ScriptNotFound(script));
        }

        let task_dir = self.task_dir(request.task_id);
        fs::create_dir_all(&task_dir).map_err(|e| {
            RuntimeError::Execution(format!("failed to create {}: {e}", task_dir.display()))
        })?;
        let name = request.kind.runtime_name();
        let input_path = task_dir.join(format!("{name}_input.json"));
        let output_path = task_dir.join(format!("{name}_output.json"));

        let body = serde_json::to_string_pretty(&request.parameters)
            .map_err(|e| RuntimeError::Execution(format!("failed to encode parameters: {e}")))?;
        fs::write(&input_path, body).map_err(|e| {
            RuntimeError::Execution(format!("failed to write {}: {e}", input_path.display()))
        })?;
        if output_path.exists() {
            fs::remove_file(&output_path).map_err(|e| {
                RuntimeError::Execution(format!(
                    "failed to remove stale {}: {e}",
                    output_path.display()
                ))
            })?;
        }

        debug!(
            task_id = request.task_id,
            interpreter = %self.interpreter.display(),
            script = %script.display(),
            input = %input_path.display(),
            output = %output_path.display(),
            "launching analysis script"
        );
        let output = Command::new(&self.interpreter)
            .arg(&script)
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&output_path)
            .output()
            .map_err(|e| {
                RuntimeError::Execution(format!(
                    "failed to spawn {}: {e}",
                    self.interpreter.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            warn!(
                task_id = request.task_id,
                status = ?output.status.code(),
                "analysis script exited with failure"
            );
            return Err(RuntimeError::ScriptFailed { status: output.status.code(), stderr });
        }

        if !output_path.exists() {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            return Ok(json!({
                "status": "completed",
                "message": "Analysis completed successfully",
                "stdout": stdout,
            }));
        }

        let body = fs::read_to_string(&output_path).map_err(|e| RuntimeError::InvalidOutput {
            path: output_path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|e| RuntimeError::InvalidOutput {
            path: output_path,
            message: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "script"
    }
}
