use std::path::Path;

use anyhow::Result;
use neta_core::db::{ProjectContext, ProjectLayout};
use neta_core::services::runtimes::ScriptRuntime;
use serde::Serialize;

use crate::canonicalize_or_current;

/// Resolve `root` and open the project config and database.
pub fn open_context(root: &str) -> Result<ProjectContext> {
    let root_path = canonicalize_or_current(root)?;
    ProjectContext::from_root(root_path)
}

/// Build the script runtime described by the project config.
pub fn project_runtime(ctx: &ProjectContext) -> ScriptRuntime {
    ScriptRuntime::from_config(&ctx.layout, &ctx.config.runtime)
}

/// Layout for `root` without reading any config.
pub fn layout_for(root: &str) -> Result<ProjectLayout> {
    Ok(ProjectLayout::new(canonicalize_or_current(root)?))
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    println!("{}", serialized);
    Ok(())
}

/// Render an optional field for human-readable output.
pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
