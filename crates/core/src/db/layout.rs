use std::path::{Path, PathBuf};

/// Logical layout of a project on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
/// The CLI or other frontends are responsible for actually creating directories
/// and files based on this layout.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Root directory of the project.
    pub root: PathBuf,
    /// Directory for internal metadata (.neta).
    pub meta_dir: PathBuf,
    /// Path to the project config file (JSON).
    pub project_config_path: PathBuf,
    /// Path to the catalog database file.
    pub db_path: PathBuf,
    /// Default directory for analysis scripts.
    pub scripts_dir: PathBuf,
    /// Directory for raw and processed data.
    pub data_dir: PathBuf,
    /// Default directory for per-task analysis input/output files.
    pub results_dir: PathBuf,
    /// Default directory for static JSON exports.
    pub export_dir: PathBuf,
}

impl ProjectLayout {
    /// Compute the default layout for a project rooted at `root`.
    ///
    /// This does *not* touch the filesystem.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".neta");
        let project_config_path = meta_dir.join("project.json");
        let db_path = meta_dir.join("neta_data.sqlite");
        let scripts_dir = root.join("R_scripts");
        let data_dir = root.join("data");
        let results_dir = data_dir.join("processed").join("analysis_results");
        let export_dir = root.join("export");

        Self {
            root,
            meta_dir,
            project_config_path,
            db_path,
            scripts_dir,
            data_dir,
            results_dir,
            export_dir,
        }
    }

    /// Compute a database path string suitable for storing in `ProjectConfig`,
    /// typically as a path relative to `root`.
    pub fn db_path_relative_string(&self) -> String {
        match self.db_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.db_path.to_string_lossy().to_string(),
        }
    }

    /// Resolve a configured path against the project root (absolute paths pass through).
    pub fn resolve(&self, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
