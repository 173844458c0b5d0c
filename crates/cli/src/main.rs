use anyhow::Result;
use clap::{Parser, Subcommand};
use neta::commands::*;
use neta::logging;
use neta_core::db::{DatasetFilter, PageRequest};

/// Transcriptomic dataset catalog and analysis task dispatcher.
///
/// This CLI is a thin wrapper around `neta-core` (exposed in code as `neta_core`).
/// Catalog queries, task bookkeeping and the script runtime live in the
/// library; this binary parses arguments, prints results and hosts the HTTP API.
#[derive(Parser, Debug)]
#[command(
    name = "neta",
    version,
    about = "Transcriptomic catalog and analysis task dispatcher",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new NETA project at the given root.
    ///
    /// This will:
    /// - Create a `.neta` metadata directory holding the catalog database.
    /// - Create the analysis scripts and results directories.
    /// - Write a `.neta/project.json` config file.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show basic information about an existing project.
    ProjectInfo {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },

    /// Load datasets, samples, genes and expression rows from a YAML or JSON manifest.
    ImportCatalog {
        #[arg(long, default_value = ".")]
        root: String,

        /// Manifest file; `.json` is parsed as JSON, anything else as YAML.
        #[arg(long)]
        file: String,

        #[arg(long)]
        json: bool,
    },

    /// List datasets page by page, optionally filtered or searched.
    ListDatasets {
        #[arg(long, default_value = ".")]
        root: String,

        /// 1-based page number.
        #[arg(long)]
        page: Option<u32>,

        /// Page size (clamped to 1..=100).
        #[arg(long)]
        per_page: Option<u32>,

        #[arg(long)]
        tissue_type: Option<String>,

        #[arg(long)]
        tumor_type: Option<String>,

        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        data_source: Option<String>,

        /// Earliest publication year (inclusive).
        #[arg(long)]
        year_from: Option<i64>,

        /// Latest publication year (inclusive).
        #[arg(long)]
        year_to: Option<i64>,

        #[arg(long)]
        min_samples: Option<i64>,

        /// Case-insensitive search over GEO id, title and description.
        /// Filters are ignored when searching.
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Search genes by symbol or name.
    SearchGenes {
        #[arg(long, default_value = ".")]
        root: String,

        query: String,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Show catalog statistics.
    Stats {
        #[arg(long, default_value = ".")]
        root: String,

        /// Only count datasets that have expression rows.
        #[arg(long)]
        expression_only: bool,

        #[arg(long)]
        json: bool,
    },

    /// Run one analysis for a dataset and record it as a task.
    ///
    /// Exits non-zero when the task fails; the task is still recorded.
    RunAnalysis {
        #[arg(long, default_value = ".")]
        root: String,

        /// Analysis kind (differential_expression, pca, enrichment, survival).
        #[arg(long)]
        kind: String,

        #[arg(long)]
        dataset: i64,

        /// Extra parameters as a JSON object, or `@path` to a JSON file.
        #[arg(long)]
        params: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Run one analysis kind over several datasets, continuing past failures.
    RunBatch {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        kind: String,

        /// Dataset ids (repeat the flag or separate with commas).
        #[arg(long = "dataset", value_delimiter = ',')]
        datasets: Vec<String>,

        #[arg(long)]
        params: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List recorded analysis tasks, newest first.
    ListTasks {
        #[arg(long, default_value = ".")]
        root: String,

        /// Filter by status (pending, running, completed, failed).
        #[arg(long)]
        status: Option<String>,

        /// Filter by analysis kind.
        #[arg(long)]
        kind: Option<String>,

        #[arg(long)]
        dataset: Option<i64>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Show one analysis task with its parameters and results.
    ShowTask {
        #[arg(long, default_value = ".")]
        root: String,

        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Check that the interpreter runs and the analysis scripts are present.
    CheckRuntime {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        json: bool,
    },

    /// Delete per-task scratch directories under the results dir.
    CleanResults {
        #[arg(long, default_value = ".")]
        root: String,

        /// Only remove the scratch directory of this task.
        #[arg(long)]
        task: Option<i64>,

        /// Remove every task scratch directory.
        #[arg(long)]
        all: bool,

        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Write `datasets.json` and `stats.json` for a static frontend.
    ExportStatic {
        #[arg(long, default_value = ".")]
        root: String,

        /// Output directory. Defaults to the project's export directory.
        #[arg(long)]
        out: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP API until interrupted.
    Serve {
        #[arg(long, default_value = ".")]
        root: String,

        /// Listen address; overrides the configured `bind_address`.
        #[arg(long, env = "NETA_BIND")]
        bind: Option<String>,

        /// Emit JSON log lines.
        #[arg(long)]
        log_json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Command::Serve { .. }) {
        logging::init("warn", false);
    }

    match cli.command {
        Command::InitProject { root, name } => init_project_command(&root, name)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::ImportCatalog { root, file, json } => import_catalog_command(&root, &file, json)?,
        Command::ListDatasets {
            root,
            page,
            per_page,
            tissue_type,
            tumor_type,
            platform,
            data_source,
            year_from,
            year_to,
            min_samples,
            search,
            json,
        } => {
            let filter = DatasetFilter {
                tissue_type,
                tumor_type,
                platform,
                data_source,
                year_from,
                year_to,
                min_samples,
            };
            let page = PageRequest::new(page, per_page);
            list_datasets_command(&root, page, &filter, search.as_deref(), json)?
        }
        Command::SearchGenes { root, query, limit, json } => {
            search_genes_command(&root, &query, limit, json)?
        }
        Command::Stats { root, expression_only, json } => {
            stats_command(&root, expression_only, json)?
        }
        Command::RunAnalysis { root, kind, dataset, params, json } => {
            run_analysis_command(&root, &kind, dataset, params.as_deref(), json)?
        }
        Command::RunBatch { root, kind, datasets, params, json } => {
            run_batch_command(&root, &kind, &datasets, params.as_deref(), json)?
        }
        Command::ListTasks { root, status, kind, dataset, limit, json } => list_tasks_command(
            &root,
            status.as_deref(),
            kind.as_deref(),
            dataset,
            limit,
            json,
        )?,
        Command::ShowTask { root, id, json } => show_task_command(&root, id, json)?,
        Command::CheckRuntime { root, json } => check_runtime_command(&root, json)?,
        Command::CleanResults { root, task, all, yes } => {
            clean_results_command(&root, task, all, yes)?
        }
        Command::ExportStatic { root, out, json } => {
            export_static_command(&root, out.as_deref(), json)?
        }
        Command::Serve { root, bind, log_json } => {
            serve_command(&root, bind.as_deref(), log_json)?
        }
    }

    Ok(())
}
