use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, Transaction};
use thiserror::Error;

use crate::db::{
    CatalogManifest, DatasetRecord, GeneExpressionRecord, GeneRecord, ImportSummary,
    SampleRecord, TaskStatus,
};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Error type for catalog database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// A previous holder of the connection panicked mid-operation.
    #[error("Catalog database lock poisoned")]
    Poisoned,

    /// The referenced analysis task does not exist.
    #[error("Analysis task {0} not found")]
    TaskNotFound(i64),

    /// The task is not in a state that allows the requested transition.
    #[error("Analysis task {id} cannot move from {from} to {to}")]
    InvalidTransition { id: i64, from: TaskStatus, to: TaskStatus },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed catalog database.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Providing small, testable helpers for querying and updating records.
///
/// The connection sits behind a mutex so one handle can be shared by request
/// handlers. Each helper holds the lock for the duration of its own statements
/// only.
#[derive(Debug)]
pub struct CatalogDb {
    conn: Mutex<Connection>,
}

impl CatalogDb {
    /// Open (or create) a catalog database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open a private in-memory database with the current schema.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Lock and expose the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Insert a dataset record and return its row id.
    pub fn insert_dataset(&self, record: &DatasetRecord) -> DbResult<i64> {
        let conn = self.connection()?;
        insert_dataset_row(&conn, record)?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert a sample record and return its row id.
    pub fn insert_sample(&self, record: &SampleRecord) -> DbResult<i64> {
        let conn = self.connection()?;
        insert_sample_row(&conn, record)?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert a gene record and return its row id.
    pub fn insert_gene(&self, record: &GeneRecord) -> DbResult<i64> {
        let conn = self.connection()?;
        insert_gene_row(&conn, record)?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert one expression measurement and return its row id.
    pub fn insert_expression(&self, record: &GeneExpressionRecord) -> DbResult<i64> {
        let conn = self.connection()?;
        insert_expression_row(&conn, record)?;
        Ok(conn.last_insert_rowid())
    }

    /// Load a full catalog manifest in a single transaction.
    ///
    /// Either every row is written or none is.
    pub fn import_manifest(&self, manifest: &CatalogManifest) -> DbResult<ImportSummary> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let summary = import_rows(&tx, manifest)?;
        tx.commit()?;
        Ok(summary)
    }
}

fn import_rows(tx: &Transaction<'_>, manifest: &CatalogManifest) -> DbResult<ImportSummary> {
    for dataset in &manifest.datasets {
        insert_dataset_row(tx, dataset)?;
    }
    for sample in &manifest.samples {
        insert_sample_row(tx, sample)?;
    }
    for gene in &manifest.genes {
        insert_gene_row(tx, gene)?;
    }
    for expression in &manifest.expressions {
        insert_expression_row(tx, expression)?;
    }
    Ok(ImportSummary {
        datasets: manifest.datasets.len(),
        samples: manifest.samples.len(),
        genes: manifest.genes.len(),
        expressions: manifest.expressions.len(),
    })
}

fn insert_dataset_row(conn: &Connection, record: &DatasetRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO datasets (id, geo_id, title, description, tissue_type, tumor_type, platform,
                              n_samples, n_genes, publication_year, reference_pmid, data_source,
                              status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, COALESCE(?13, 'active'), ?14)
        "#,
        params![
            record.id,
            record.geo_id,
            record.title,
            record.description,
            record.tissue_type,
            record.tumor_type,
            record.platform,
            record.n_samples,
            record.n_genes,
            record.publication_year,
            record.reference_pmid,
            record.data_source,
            record.status,
            crate::db::now_timestamp(),
        ],
    )?;
    Ok(())
}

fn insert_sample_row(conn: &Connection, record: &SampleRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO samples (id, dataset_id, sample_id, sample_name, tissue_type, tumor_type,
                             tumor_subtype, grade, stage, age, gender, survival_status,
                             survival_time, treatment_type, metastasis_status, primary_site,
                             quality_score)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
        params![
            record.id,
            record.dataset_id,
            record.sample_id,
            record.sample_name,
            record.tissue_type,
            record.tumor_type,
            record.tumor_subtype,
            record.grade,
            record.stage,
            record.age,
            record.gender,
            record.survival_status,
            record.survival_time,
            record.treatment_type,
            record.metastasis_status,
            record.primary_site,
            record.quality_score,
        ],
    )?;
    Ok(())
}

fn insert_gene_row(conn: &Connection, record: &GeneRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO genes (id, gene_id, gene_symbol, gene_name, chromosome, gene_type,
                           description, entrez_id, ensembl_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            record.id,
            record.gene_id,
            record.gene_symbol,
            record.gene_name,
            record.chromosome,
            record.gene_type,
            record.description,
            record.entrez_id,
            record.ensembl_id,
        ],
    )?;
    Ok(())
}

fn insert_expression_row(conn: &Connection, record: &GeneExpressionRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO gene_expression (dataset_id, sample_id, gene_id, gene_symbol,
                                     expression_value, log2_expression, normalized_value,
                                     percentile_rank, is_expressed)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            record.dataset_id,
            record.sample_id,
            record.gene_id,
            record.gene_symbol,
            record.expression_value,
            record.log2_expression,
            record.normalized_value,
            record.percentile_rank,
            record.is_expressed,
        ],
    )?;
    Ok(())
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: catalog tables (datasets, samples, genes, gene_expression)
/// - 2: add analysis_tasks table
/// - 3: add lookup indexes for expression and task queries
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS datasets (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                geo_id           TEXT NOT NULL UNIQUE,
                title            TEXT,
                description      TEXT,
                tissue_type      TEXT,
                tumor_type       TEXT,
                platform         TEXT,
                n_samples        INTEGER,
                n_genes          INTEGER,
                publication_year INTEGER,
                reference_pmid   TEXT,
                data_source      TEXT,
                status           TEXT DEFAULT 'active',
                created_at       TEXT
            );

            CREATE TABLE IF NOT EXISTS samples (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                dataset_id        INTEGER REFERENCES datasets(id),
                sample_id         TEXT NOT NULL,
                sample_name       TEXT,
                tissue_type       TEXT,
                tumor_type        TEXT,
                tumor_subtype     TEXT,
                grade             TEXT,
                stage             TEXT,
                age               INTEGER,
                gender            TEXT,
                survival_status   TEXT,
                survival_time     INTEGER,
                treatment_type    TEXT,
                metastasis_status TEXT,
                primary_site      TEXT,
                quality_score     REAL
            );

            CREATE TABLE IF NOT EXISTS genes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                gene_id     TEXT NOT NULL UNIQUE,
                gene_symbol TEXT,
                gene_name   TEXT,
                chromosome  TEXT,
                gene_type   TEXT,
                description TEXT,
                entrez_id   TEXT,
                ensembl_id  TEXT
            );

            CREATE TABLE IF NOT EXISTS gene_expression (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                dataset_id       INTEGER REFERENCES datasets(id),
                sample_id        TEXT NOT NULL,
                gene_id          TEXT NOT NULL,
                gene_symbol      TEXT,
                expression_value REAL,
                log2_expression  REAL,
                normalized_value REAL,
                percentile_rank  REAL,
                is_expressed     INTEGER
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        // dataset_id is deliberately not a foreign key: tasks may reference
        // datasets that are not (yet) in the catalog.
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS analysis_tasks (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                task_type    TEXT NOT NULL,
                dataset_id   INTEGER NOT NULL,
                parameters   TEXT NOT NULL,
                status       TEXT NOT NULL DEFAULT 'pending',
                results      TEXT,
                created_at   TEXT NOT NULL,
                completed_at TEXT
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
        current_version = 2;
    }

    if current_version < 3 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE INDEX IF NOT EXISTS idx_gene_expression_dataset ON gene_expression(dataset_id);
            CREATE INDEX IF NOT EXISTS idx_samples_dataset ON samples(dataset_id);
            CREATE INDEX IF NOT EXISTS idx_analysis_tasks_status ON analysis_tasks(status);
            PRAGMA user_version = 3;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
