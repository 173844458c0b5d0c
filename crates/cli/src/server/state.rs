//! Shared application state injected into every axum handler.

use neta_core::db::CatalogDb;
use neta_core::services::analysis::AnalysisRuntime;

pub struct AppState {
    pub project_name: String,
    pub db: CatalogDb,
    pub runtime: Box<dyn AnalysisRuntime>,
}

impl AppState {
    pub fn new(
        project_name: impl Into<String>,
        db: CatalogDb,
        runtime: Box<dyn AnalysisRuntime>,
    ) -> Self {
        Self { project_name: project_name.into(), db, runtime }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("project_name", &self.project_name)
            .field("runtime", &self.runtime.name())
            .finish_non_exhaustive()
    }
}
