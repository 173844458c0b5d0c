use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};

use crate::db::{CatalogDb, ProjectConfig, ProjectLayout};

/// Load the project config JSON from disk for a given layout.
pub fn load_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    let config_json = std::fs::read_to_string(&layout.project_config_path).with_context(|| {
        format!("Failed to read project config at {}", layout.project_config_path.display())
    })?;
    let config: ProjectConfig =
        serde_json::from_str(&config_json).context("Failed to parse project config JSON")?;
    Ok(config)
}

/// Resolve the DB path (respecting relative/absolute config) and open a CatalogDb.
pub fn open_project_db(layout: &ProjectLayout) -> Result<(ProjectConfig, PathBuf, CatalogDb)> {
    let config = load_project_config(layout)?;
    let db_path = layout.resolve(&config.db.path);
    let db = CatalogDb::open(&db_path)
        .with_context(|| format!("Failed to open catalog database at {}", db_path.display()))?;
    Ok((config, db_path, db))
}

/// Current UTC time as an RFC 3339 string with microsecond precision.
///
/// All timestamps stored in the catalog use this format so they sort
/// lexicographically.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
