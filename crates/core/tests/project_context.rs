use neta_core::db::{ProjectConfig, ProjectContext, ProjectLayout};

#[test]
fn project_context_loads_config_and_db() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();

    let config = ProjectConfig::new("CtxProject", layout.db_path_relative_string());
    std::fs::write(&layout.project_config_path, serde_json::to_string_pretty(&config).unwrap())
        .unwrap();

    let ctx = ProjectContext::from_root(temp.path()).expect("context");
    assert_eq!(ctx.config.name, "CtxProject");
    assert!(ctx.db_path.is_file());
    assert_eq!(ctx.config.runtime.interpreter, "Rscript");

    // DB should be initialized and usable.
    assert_eq!(ctx.db.count_tasks().expect("count tasks"), 0);
}

#[test]
fn project_context_reports_missing_config() {
    let temp = tempfile::tempdir().unwrap();
    let err = ProjectContext::from_root(temp.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read project config"));
}

#[test]
fn project_context_reports_malformed_config() {
    let temp = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    std::fs::write(&layout.project_config_path, "{ not json").unwrap();

    let err = ProjectContext::from_root(temp.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse project config JSON"));
}

#[test]
fn layout_paths_are_rooted() {
    let root = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());
    assert!(layout.db_path_relative_string().starts_with(".neta"));
    assert!(layout.results_dir.ends_with("data/processed/analysis_results"));
    assert_eq!(layout.resolve("R_scripts"), layout.scripts_dir);
    let abs = root.path().join("elsewhere");
    assert_eq!(layout.resolve(abs.to_str().unwrap()), abs);
}
