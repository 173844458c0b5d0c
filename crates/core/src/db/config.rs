use serde::{Deserialize, Serialize};

/// Interpreter used to execute analysis scripts when none is configured.
pub const DEFAULT_INTERPRETER: &str = "Rscript";

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the catalog database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Settings for the external statistical runtime.
///
/// Directory paths are interpreted relative to the project root unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Executable used to run analysis scripts (e.g. `Rscript`).
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Directory holding the per-kind analysis scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,
    /// Directory where per-task input/output files are written.
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            scripts_dir: default_scripts_dir(),
            results_dir: default_results_dir(),
        }
    }
}

fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}

fn default_scripts_dir() -> String {
    "R_scripts".to_string()
}

fn default_results_dir() -> String {
    "data/processed/analysis_results".to_string()
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Tracing filter used when `NETA_LOG`/`RUST_LOG` are unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Serializable configuration describing a NETA project.
///
/// This lives at `.neta/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Config format version.
    pub config_version: String,
    /// Database configuration (path is typically relative to project root).
    pub db: DbConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            runtime: RuntimeConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
