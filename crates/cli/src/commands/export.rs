use std::path::PathBuf;

use anyhow::Result;
use neta_core::services::export::export_static;

use crate::commands::{open_context, print_json};

/// Write the static-site snapshot (`datasets.json`, `stats.json`).
///
/// Defaults to the project's export directory when `out` is not given.
pub fn export_static_command(root: &str, out: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let out_dir = match out {
        Some(dir) => PathBuf::from(dir),
        None => ctx.layout.export_dir.clone(),
    };
    let summary = export_static(&ctx.db, &out_dir)?;

    if json {
        return print_json(&summary);
    }
    println!("Exported {} datasets:", summary.datasets);
    println!("  {}", summary.datasets_path.display());
    println!("  {}", summary.stats_path.display());
    Ok(())
}
