use std::fs;

use anyhow::{Context, Result};
use neta_core::db::{CatalogDb, ProjectConfig, ProjectLayout};
use serde::Serialize;

use crate::commands::{open_context, print_dir_status, print_json, project_runtime};
use crate::{canonicalize_or_current, infer_project_name};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub runtime: neta_core::db::RuntimeConfig,
    pub server: neta_core::db::ServerConfig,
    pub layout: ProjectInfoLayout,
    pub datasets: i64,
    pub tasks: i64,
}

#[derive(Serialize)]
pub struct ProjectInfoLayout {
    pub meta_dir: String,
    pub scripts_dir: String,
    pub results_dir: String,
    pub export_dir: String,
}

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    // Derive project name if not provided.
    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    for (label, dir) in [
        ("meta dir", &layout.meta_dir),
        ("scripts dir", &layout.scripts_dir),
        ("results dir", &layout.results_dir),
    ] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {label}: {}", dir.display()))?;
    }

    let config = ProjectConfig::new(&project_name, layout.db_path_relative_string());
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the catalog database immediately so follow-on commands (and tests)
    // can rely on its presence.
    CatalogDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize catalog database at {}", layout.db_path.display())
    })?;

    println!("Initialized NETA project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Scripts dir: {}", layout.scripts_dir.display());
    println!("  Results dir: {}", layout.results_dir.display());

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let runtime = project_runtime(&ctx);
    let stats = ctx.db.statistics().context("Failed to read catalog statistics")?;
    let tasks = ctx.db.count_tasks().context("Failed to count analysis tasks")?;

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: ctx.config.name.clone(),
            root: ctx.layout.root.display().to_string(),
            config_file: ctx.layout.project_config_path.display().to_string(),
            config_version: ctx.config.config_version.clone(),
            db_path: ctx.config.db.path.clone(),
            runtime: ctx.config.runtime.clone(),
            server: ctx.config.server.clone(),
            layout: ProjectInfoLayout {
                meta_dir: ctx.layout.meta_dir.display().to_string(),
                scripts_dir: runtime.scripts_dir().display().to_string(),
                results_dir: runtime.results_dir().display().to_string(),
                export_dir: ctx.layout.export_dir.display().to_string(),
            },
            datasets: stats.total_datasets,
            tasks,
        };
        return print_json(&snapshot);
    }

    println!("NETA Project Info");
    println!("=================");
    println!("Name: {}", ctx.config.name);
    println!("Root: {}", ctx.layout.root.display());
    println!("Config file: {}", ctx.layout.project_config_path.display());
    println!("Config version: {}", ctx.config.config_version);
    println!("DB path (config): {}", ctx.config.db.path);
    println!("Interpreter: {}", runtime.interpreter().display());
    println!("Bind address: {}", ctx.config.server.bind_address);
    println!();

    // Basic directory existence checks.
    println!("Directories:");
    print_dir_status("Meta dir (.neta)", &ctx.layout.meta_dir);
    print_dir_status("Scripts dir", runtime.scripts_dir());
    print_dir_status("Results dir", runtime.results_dir());
    println!();
    println!("Datasets: {}", stats.total_datasets);
    println!("Samples: {}", stats.total_samples);
    println!("Genes: {}", stats.total_genes);
    println!("Analysis tasks: {}", tasks);

    Ok(())
}
