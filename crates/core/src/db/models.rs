use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::analysis::AnalysisKind;

/// Lifecycle status of an analysis task.
///
/// Tasks are inserted as `Pending`, promoted to `Running` right before the
/// runtime is invoked, and finish exactly once as `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] =
        [TaskStatus::Pending, TaskStatus::Running, TaskStatus::Completed, TaskStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Terminal states are never left once reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!(
                "Invalid task status '{other}'. Allowed: pending, running, completed, failed"
            )),
        }
    }
}

/// Values needed to create a new analysis task record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub task_type: AnalysisKind,
    pub dataset_id: i64,
    /// Request parameters, stored as serialized JSON text.
    pub parameters: Value,
}

/// Persisted audit entry for one analysis invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisTaskRecord {
    pub id: i64,
    pub task_type: AnalysisKind,
    /// Referenced dataset; the dataset is not required to exist.
    pub dataset_id: i64,
    pub parameters: String,
    pub status: TaskStatus,
    pub results: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl AnalysisTaskRecord {
    /// Parse the stored `results` text back into JSON, if present.
    pub fn results_json(&self) -> serde_json::Result<Option<Value>> {
        self.results.as_deref().map(serde_json::from_str).transpose()
    }

    /// Parse the stored `parameters` text back into JSON.
    pub fn parameters_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.parameters)
    }
}

/// Optional filters for listing task records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub task_type: Option<AnalysisKind>,
    pub dataset_id: Option<i64>,
    pub limit: Option<u32>,
}

/// Full dataset metadata record.
///
/// `id` is optional on import so manifests may either pin ids (to let samples
/// and expression rows reference them) or let SQLite assign them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DatasetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub geo_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tissue_type: Option<String>,
    #[serde(default)]
    pub tumor_type: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub n_samples: Option<i64>,
    #[serde(default)]
    pub n_genes: Option<i64>,
    #[serde(default)]
    pub publication_year: Option<i64>,
    #[serde(default)]
    pub reference_pmid: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl DatasetRecord {
    pub fn new(geo_id: impl Into<String>) -> Self {
        Self { geo_id: geo_id.into(), ..Default::default() }
    }
}

/// Subset of dataset fields used in listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSummary {
    pub id: i64,
    pub geo_id: String,
    pub title: Option<String>,
    pub tissue_type: Option<String>,
    pub tumor_type: Option<String>,
    pub n_samples: Option<i64>,
    pub n_genes: Option<i64>,
    pub publication_year: Option<i64>,
}

/// One page of dataset summaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetPage {
    pub datasets: Vec<DatasetSummary>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

/// Clinical and technical annotation for one sample of a dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SampleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub dataset_id: i64,
    pub sample_id: String,
    #[serde(default)]
    pub sample_name: Option<String>,
    #[serde(default)]
    pub tissue_type: Option<String>,
    #[serde(default)]
    pub tumor_type: Option<String>,
    #[serde(default)]
    pub tumor_subtype: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub survival_status: Option<String>,
    #[serde(default)]
    pub survival_time: Option<i64>,
    #[serde(default)]
    pub treatment_type: Option<String>,
    #[serde(default)]
    pub metastasis_status: Option<String>,
    #[serde(default)]
    pub primary_site: Option<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
}

/// Gene annotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub gene_id: String,
    #[serde(default)]
    pub gene_symbol: Option<String>,
    #[serde(default)]
    pub gene_name: Option<String>,
    #[serde(default)]
    pub chromosome: Option<String>,
    #[serde(default)]
    pub gene_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub entrez_id: Option<String>,
    #[serde(default)]
    pub ensembl_id: Option<String>,
}

impl GeneRecord {
    pub fn new(gene_id: impl Into<String>, gene_symbol: Option<&str>) -> Self {
        Self {
            gene_id: gene_id.into(),
            gene_symbol: gene_symbol.map(str::to_string),
            ..Default::default()
        }
    }
}

/// Expression measurement of one gene in one sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneExpressionRecord {
    pub dataset_id: i64,
    pub sample_id: String,
    pub gene_id: String,
    #[serde(default)]
    pub gene_symbol: Option<String>,
    #[serde(default)]
    pub expression_value: Option<f64>,
    #[serde(default)]
    pub log2_expression: Option<f64>,
    #[serde(default)]
    pub normalized_value: Option<f64>,
    #[serde(default)]
    pub percentile_rank: Option<f64>,
    #[serde(default)]
    pub is_expressed: Option<bool>,
}

/// Bulk catalog content loaded from a manifest file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogManifest {
    #[serde(default)]
    pub datasets: Vec<DatasetRecord>,
    #[serde(default)]
    pub samples: Vec<SampleRecord>,
    #[serde(default)]
    pub genes: Vec<GeneRecord>,
    #[serde(default)]
    pub expressions: Vec<GeneExpressionRecord>,
}

/// Row counts written by a catalog import.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub datasets: usize,
    pub samples: usize,
    pub genes: usize,
    pub expressions: usize,
}

/// A named group with its row count (e.g. datasets per tissue type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountBucket {
    pub name: Option<String>,
    pub count: i64,
}

/// Aggregate counts over the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CatalogStatistics {
    pub total_datasets: i64,
    pub total_samples: i64,
    pub total_genes: i64,
    pub total_expressions: i64,
    pub tissue_types: Vec<CountBucket>,
    pub tumor_types: Vec<CountBucket>,
    pub publication_years: Vec<CountBucket>,
}
