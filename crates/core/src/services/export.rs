use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::db::{CatalogDb, DatasetRecord};

pub const DATASETS_FILE: &str = "datasets.json";
pub const STATS_FILE: &str = "stats.json";

/// Static snapshot of exportable datasets, shaped like a single listing page.
#[derive(Debug, Serialize)]
struct DatasetSnapshot<'a> {
    datasets: &'a [DatasetRecord],
    total: usize,
    pages: u32,
    current_page: u32,
}

/// Files written by [`export_static`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub datasets_path: PathBuf,
    pub stats_path: PathBuf,
    pub datasets: usize,
}

/// Write `datasets.json` and `stats.json` for a static frontend.
///
/// Only active (or unlabelled) datasets with expression rows are included, and
/// the statistics are restricted the same way.
pub fn export_static(db: &CatalogDb, out_dir: &Path) -> Result<ExportSummary> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create export directory {}", out_dir.display()))?;

    let datasets = db.exportable_datasets().context("Failed to load exportable datasets")?;
    let stats = db.expression_statistics().context("Failed to compute catalog statistics")?;

    let snapshot =
        DatasetSnapshot { datasets: &datasets, total: datasets.len(), pages: 1, current_page: 1 };
    let datasets_path = out_dir.join(DATASETS_FILE);
    write_json(&datasets_path, &snapshot)?;

    let stats_path = out_dir.join(STATS_FILE);
    write_json(&stats_path, &stats)?;

    info!(datasets = datasets.len(), out_dir = %out_dir.display(), "exported static catalog");
    Ok(ExportSummary { datasets_path, stats_path, datasets: datasets.len() })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
