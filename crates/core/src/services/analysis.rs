use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Statistical analyses the external runtime knows how to perform.
///
/// Each kind has two names: the `task_type` stored on task records and used
/// in HTTP routes, and the runtime name the process wrapper keys scripts and
/// scratch files on. Parsing accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    DifferentialExpression,
    #[serde(alias = "pca_analysis")]
    Pca,
    #[serde(alias = "enrichment_analysis")]
    Enrichment,
    #[serde(alias = "survival_analysis")]
    Survival,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::DifferentialExpression,
        AnalysisKind::Pca,
        AnalysisKind::Enrichment,
        AnalysisKind::Survival,
    ];

    /// Name stored in `analysis_tasks.task_type`.
    pub fn task_type(&self) -> &'static str {
        match self {
            AnalysisKind::DifferentialExpression => "differential_expression",
            AnalysisKind::Pca => "pca",
            AnalysisKind::Enrichment => "enrichment",
            AnalysisKind::Survival => "survival",
        }
    }

    /// Name used for runtime scratch files.
    pub fn runtime_name(&self) -> &'static str {
        match self {
            AnalysisKind::DifferentialExpression => "differential_expression",
            AnalysisKind::Pca => "pca_analysis",
            AnalysisKind::Enrichment => "enrichment_analysis",
            AnalysisKind::Survival => "survival_analysis",
        }
    }

    /// Script file (relative to the scripts directory) implementing this kind.
    pub fn script_name(&self) -> &'static str {
        match self {
            AnalysisKind::DifferentialExpression => "deseq2_analysis.R",
            AnalysisKind::Pca => "pca_analysis.R",
            AnalysisKind::Enrichment => "enrichment_analysis.R",
            AnalysisKind::Survival => "survival_analysis.R",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.task_type())
    }
}

impl FromStr for AnalysisKind {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.task_type() == s || kind.runtime_name() == s)
            .ok_or_else(|| RuntimeError::UnknownKind(s.to_string()))
    }
}

/// Failures raised by an analysis runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Unknown analysis type: {0}")]
    UnknownKind(String),
    #[error("R script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),
    #[error("R script failed ({}): {stderr}", exit_label(*.status))]
    ScriptFailed { status: Option<i32>, stderr: String },
    #[error("Invalid analysis output at {}: {message}", path.display())]
    InvalidOutput { path: PathBuf, message: String },
    #[error("Analysis execution error: {0}")]
    Execution(String),
}

impl RuntimeError {
    /// True for deployment problems (bad kind, missing script) as opposed to
    /// failures of the analysis itself.
    pub fn is_configuration(&self) -> bool {
        matches!(self, RuntimeError::UnknownKind(_) | RuntimeError::ScriptNotFound(_))
    }
}

fn exit_label(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// One invocation of the runtime on behalf of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub task_id: i64,
    pub kind: AnalysisKind,
    /// Full request object, forwarded to the runtime unchanged.
    pub parameters: Value,
}

/// Trait implemented by analysis runtimes (e.g., the external script runner).
pub trait AnalysisRuntime: Send + Sync {
    fn run(&self, request: &AnalysisRequest) -> Result<Value, RuntimeError>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_name_forms() {
        assert_eq!("pca".parse::<AnalysisKind>().unwrap(), AnalysisKind::Pca);
        assert_eq!("pca_analysis".parse::<AnalysisKind>().unwrap(), AnalysisKind::Pca);
        assert_eq!(
            "differential_expression".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::DifferentialExpression
        );
        assert_eq!("survival_analysis".parse::<AnalysisKind>().unwrap(), AnalysisKind::Survival);
    }

    #[test]
    fn unknown_kind_is_configuration_error() {
        let err = "clustering".parse::<AnalysisKind>().unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownKind(ref k) if k == "clustering"));
        assert!(err.is_configuration());
        assert!(err.to_string().contains("clustering"));
    }

    #[test]
    fn script_names_match_kinds() {
        assert_eq!(AnalysisKind::DifferentialExpression.script_name(), "deseq2_analysis.R");
        assert_eq!(AnalysisKind::Enrichment.script_name(), "enrichment_analysis.R");
    }

    #[test]
    fn serde_uses_task_type_and_accepts_runtime_alias() {
        assert_eq!(serde_json::to_string(&AnalysisKind::Pca).unwrap(), "\"pca\"");
        let kind: AnalysisKind = serde_json::from_str("\"enrichment_analysis\"").unwrap();
        assert_eq!(kind, AnalysisKind::Enrichment);
    }

    #[test]
    fn script_failure_message_carries_stderr() {
        let err = RuntimeError::ScriptFailed { status: Some(2), stderr: "boom\n".into() };
        let msg = err.to_string();
        assert!(msg.contains("boom\n"));
        assert!(msg.contains("exit code 2"));
        assert!(!err.is_configuration());
    }
}
