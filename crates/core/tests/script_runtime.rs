#![cfg(unix)]

use std::fs;
use std::path::Path;

use neta_core::services::analysis::{
    AnalysisKind, AnalysisRequest, AnalysisRuntime, RuntimeError,
};
use neta_core::services::runtimes::ScriptRuntime;
use serde_json::{json, Value};

/// Write a POSIX shell "analysis script" under the R script name for `kind`.
fn write_script(dir: &Path, kind: AnalysisKind, body: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(kind.script_name()), body).unwrap();
}

fn runtime(root: &Path) -> ScriptRuntime {
    ScriptRuntime::new("sh", root.join("scripts"), root.join("results"))
}

fn request(task_id: i64, kind: AnalysisKind, parameters: Value) -> AnalysisRequest {
    AnalysisRequest { task_id, kind, parameters }
}

#[test]
fn returns_exact_output_json() {
    let temp = tempfile::tempdir().unwrap();
    let expected = json!({"genes": ["TP53", "MYCN"], "log2fc": [1.5, -2.25], "padj": null});
    write_script(
        &temp.path().join("scripts"),
        AnalysisKind::DifferentialExpression,
        &format!("printf '%s' '{expected}' > \"$4\"\n"),
    );
    let rt = runtime(temp.path());

    let out = rt
        .run(&request(7, AnalysisKind::DifferentialExpression, json!({"dataset_id": 1})))
        .expect("script succeeds");
    assert_eq!(out, expected);

    let task_dir = rt.task_dir(7);
    assert!(task_dir.ends_with("results/task-7"));
    let written = fs::read_to_string(task_dir.join("differential_expression_output.json")).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), out);
}

#[test]
fn input_file_holds_parameters_and_flags_are_passed() {
    let temp = tempfile::tempdir().unwrap();
    // Check the flag layout, then copy the input through as output.
    write_script(
        &temp.path().join("scripts"),
        AnalysisKind::Pca,
        "[ \"$1\" = --input ] && [ \"$3\" = --output ] || exit 3\ncp \"$2\" \"$4\"\n",
    );
    let rt = runtime(temp.path());
    let params = json!({"dataset_id": 4, "n_components": 3});

    let out = rt.run(&request(11, AnalysisKind::Pca, params.clone())).unwrap();
    assert_eq!(out, params);
    assert!(rt.task_dir(11).join("pca_analysis_input.json").is_file());
}

#[test]
fn non_zero_exit_carries_stderr_verbatim() {
    let temp = tempfile::tempdir().unwrap();
    write_script(
        &temp.path().join("scripts"),
        AnalysisKind::Survival,
        "echo 'Error in coxph(): singular matrix' >&2\nexit 2\n",
    );
    let rt = runtime(temp.path());

    let err = rt.run(&request(1, AnalysisKind::Survival, json!({"dataset_id": 1}))).unwrap_err();
    match &err {
        RuntimeError::ScriptFailed { status, stderr } => {
            assert_eq!(*status, Some(2));
            assert_eq!(stderr, "Error in coxph(): singular matrix\n");
        }
        other => panic!("expected ScriptFailed, got {other:?}"),
    }
    assert!(err.to_string().contains("Error in coxph(): singular matrix\n"));
}

#[test]
fn missing_output_file_yields_stdout_fallback() {
    let temp = tempfile::tempdir().unwrap();
    write_script(&temp.path().join("scripts"), AnalysisKind::Enrichment, "echo done\n");
    let rt = runtime(temp.path());

    let out = rt.run(&request(2, AnalysisKind::Enrichment, json!({"dataset_id": 1}))).unwrap();
    assert_eq!(
        out,
        json!({
            "status": "completed",
            "message": "Analysis completed successfully",
            "stdout": "done\n",
        })
    );
}

#[test]
fn stale_output_is_not_reused() {
    let temp = tempfile::tempdir().unwrap();
    write_script(&temp.path().join("scripts"), AnalysisKind::Pca, "true\n");
    let rt = runtime(temp.path());
    let task_dir = rt.task_dir(5);
    fs::create_dir_all(&task_dir).unwrap();
    fs::write(task_dir.join("pca_analysis_output.json"), r#"{"stale": true}"#).unwrap();

    let out = rt.run(&request(5, AnalysisKind::Pca, json!({"dataset_id": 1}))).unwrap();
    assert_eq!(out["status"], "completed");
    assert!(out.get("stale").is_none());
}

#[test]
fn unparseable_output_is_invalid_output() {
    let temp = tempfile::tempdir().unwrap();
    write_script(&temp.path().join("scripts"), AnalysisKind::Pca, "echo 'not json' > \"$4\"\n");
    let rt = runtime(temp.path());

    let err = rt.run(&request(3, AnalysisKind::Pca, json!({"dataset_id": 1}))).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidOutput { .. }), "got {err:?}");
    assert!(!err.is_configuration());
}

#[test]
fn missing_script_fails_before_writing_files() {
    let temp = tempfile::tempdir().unwrap();
    let rt = runtime(temp.path());

    let err = rt.run(&request(9, AnalysisKind::Survival, json!({"dataset_id": 1}))).unwrap_err();
    assert!(matches!(err, RuntimeError::ScriptNotFound(ref p) if p.ends_with("survival_analysis.R")));
    assert!(err.is_configuration());
    assert!(!rt.task_dir(9).exists());
}

#[test]
fn unknown_kind_creates_no_output_file() {
    let temp = tempfile::tempdir().unwrap();
    let rt = runtime(temp.path());

    let err = rt.run_analysis("clustering", 4, json!({"dataset_id": 1})).unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownKind(ref k) if k == "clustering"));
    assert_eq!(fs::read_dir(rt.results_dir()).unwrap().count(), 0);
}

#[test]
fn run_analysis_accepts_runtime_names() {
    let temp = tempfile::tempdir().unwrap();
    write_script(&temp.path().join("scripts"), AnalysisKind::Pca, "echo '{\"ok\":1}' > \"$4\"\n");
    let rt = runtime(temp.path());
    assert_eq!(rt.run_analysis("pca_analysis", 1, json!({})).unwrap(), json!({"ok": 1}));
}

#[test]
fn missing_interpreter_is_execution_error() {
    let temp = tempfile::tempdir().unwrap();
    write_script(&temp.path().join("scripts"), AnalysisKind::Pca, "true\n");
    let rt = ScriptRuntime::new(
        temp.path().join("no-such-interpreter"),
        temp.path().join("scripts"),
        temp.path().join("results"),
    );

    let err = rt.run(&request(1, AnalysisKind::Pca, json!({}))).unwrap_err();
    assert!(matches!(err, RuntimeError::Execution(_)), "got {err:?}");

    let probe = rt.probe();
    assert!(!probe.available);
    assert!(probe.error.is_some());
}

#[test]
fn results_dir_falls_back_to_current_dir() {
    let temp = tempfile::tempdir().unwrap();
    let blocker = temp.path().join("file");
    fs::write(&blocker, "x").unwrap();

    // A path below a regular file can never be created.
    let rt = ScriptRuntime::new("sh", temp.path(), blocker.join("results"));
    assert_eq!(rt.results_dir(), std::env::current_dir().unwrap());
}
