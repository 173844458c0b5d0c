//! Read-only catalog queries: paging, filtering, search and aggregate counts.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{
    CatalogDb, CatalogStatistics, CountBucket, DatasetPage, DatasetRecord, DatasetSummary,
    DbResult, GeneRecord,
};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_DATASET_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_GENE_SEARCH_LIMIT: u32 = 50;

const SUMMARY_COLUMNS: &str =
    "id, geo_id, title, tissue_type, tumor_type, n_samples, n_genes, publication_year";
const DATASET_COLUMNS: &str = "id, geo_id, title, description, tissue_type, tumor_type, platform, \
     n_samples, n_genes, publication_year, reference_pmid, data_source, status";
const GENE_COLUMNS: &str =
    "id, gene_id, gene_symbol, gene_name, chromosome, gene_type, description, entrez_id, ensembl_id";
const HAS_EXPRESSION: &str =
    "EXISTS (SELECT 1 FROM gene_expression ge WHERE ge.dataset_id = datasets.id)";

/// Optional dataset filters. Every populated field narrows the result (AND).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFilter {
    #[serde(default)]
    pub tissue_type: Option<String>,
    #[serde(default)]
    pub tumor_type: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    /// Inclusive lower bound on publication year.
    #[serde(default)]
    pub year_from: Option<i64>,
    /// Inclusive upper bound on publication year.
    #[serde(default)]
    pub year_to: Option<i64>,
    #[serde(default)]
    pub min_samples: Option<i64>,
}

impl DatasetFilter {
    fn where_clause(&self) -> (String, Vec<SqlValue>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values = Vec::new();

        let text_filters = [
            ("tissue_type = ?", &self.tissue_type),
            ("tumor_type = ?", &self.tumor_type),
            ("platform = ?", &self.platform),
            ("data_source = ?", &self.data_source),
        ];
        for (clause, value) in text_filters {
            if let Some(v) = value {
                clauses.push(clause);
                values.push(SqlValue::Text(v.clone()));
            }
        }

        let int_filters = [
            ("publication_year >= ?", self.year_from),
            ("publication_year <= ?", self.year_to),
            ("n_samples >= ?", self.min_samples),
        ];
        for (clause, value) in int_filters {
            if let Some(v) = value {
                clauses.push(clause);
                values.push(SqlValue::Integer(v));
            }
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

/// Normalized paging parameters: 1-based page, per_page within `1..=MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    fn page_count(&self, total: i64) -> i64 {
        let per_page = i64::from(self.per_page);
        (total + per_page - 1) / per_page
    }
}

impl CatalogDb {
    /// One page of datasets ordered by id. Pages past the end are empty.
    pub fn list_datasets(&self, page: PageRequest) -> DbResult<DatasetPage> {
        self.filter_datasets(&DatasetFilter::default(), page)
    }

    /// One page of datasets matching every populated field of `filter`.
    pub fn filter_datasets(&self, filter: &DatasetFilter, page: PageRequest) -> DbResult<DatasetPage> {
        let (where_sql, mut values) = filter.where_clause();
        let conn = self.connection()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM datasets{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        values.push(SqlValue::Integer(i64::from(page.per_page)));
        values.push(SqlValue::Integer(page.offset()));
        let sql =
            format!("SELECT {SUMMARY_COLUMNS} FROM datasets{where_sql} ORDER BY id LIMIT ? OFFSET ?");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), map_summary)?;
        let mut datasets = Vec::new();
        for row in rows {
            datasets.push(row?);
        }

        Ok(DatasetPage {
            datasets,
            total,
            pages: page.page_count(total),
            current_page: i64::from(page.page),
        })
    }

    /// Full metadata for one dataset.
    pub fn get_dataset(&self, id: i64) -> DbResult<Option<DatasetRecord>> {
        let conn = self.connection()?;
        let sql = format!("SELECT {DATASET_COLUMNS} FROM datasets WHERE id = ?1");
        let record = conn.query_row(&sql, params![id], map_dataset).optional()?;
        Ok(record)
    }

    /// Case-insensitive substring search over geo_id, title and description.
    pub fn search_datasets(&self, query: &str, limit: Option<u32>) -> DbResult<Vec<DatasetSummary>> {
        let pattern = like_pattern(query);
        let limit = limit.unwrap_or(DEFAULT_DATASET_SEARCH_LIMIT).clamp(1, MAX_PER_PAGE);
        let conn = self.connection()?;
        let sql = format!(
            r#"
            SELECT {SUMMARY_COLUMNS} FROM datasets
            WHERE geo_id LIKE ?1 ESCAPE '\' OR title LIKE ?1 ESCAPE '\'
               OR description LIKE ?1 ESCAPE '\'
            ORDER BY id
            LIMIT ?2
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern, limit], map_summary)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Case-insensitive substring search over gene symbol and name.
    ///
    /// `limit` is honored as given; `Some(0)` returns no rows.
    pub fn search_genes(&self, query: &str, limit: Option<u32>) -> DbResult<Vec<GeneRecord>> {
        let pattern = like_pattern(query);
        let limit = limit.unwrap_or(DEFAULT_GENE_SEARCH_LIMIT);
        let conn = self.connection()?;
        let sql = format!(
            r#"
            SELECT {GENE_COLUMNS} FROM genes
            WHERE gene_symbol LIKE ?1 ESCAPE '\' OR gene_name LIKE ?1 ESCAPE '\'
            ORDER BY gene_symbol, id
            LIMIT ?2
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern, limit], map_gene)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Catalog-wide totals and group counts.
    pub fn statistics(&self) -> DbResult<CatalogStatistics> {
        let conn = self.connection()?;
        Ok(CatalogStatistics {
            total_datasets: count(&conn, "SELECT COUNT(*) FROM datasets")?,
            total_samples: count(&conn, "SELECT COUNT(*) FROM samples")?,
            total_genes: count(&conn, "SELECT COUNT(*) FROM genes")?,
            total_expressions: count(&conn, "SELECT COUNT(*) FROM gene_expression")?,
            tissue_types: group_counts(&conn, "tissue_type", None)?,
            tumor_types: group_counts(&conn, "tumor_type", None)?,
            publication_years: group_counts(&conn, "CAST(publication_year AS TEXT)", None)?,
        })
    }

    /// Like [`CatalogDb::statistics`], but dataset counts and groups only
    /// consider datasets that have at least one expression row.
    pub fn expression_statistics(&self) -> DbResult<CatalogStatistics> {
        let conn = self.connection()?;
        Ok(CatalogStatistics {
            total_datasets: count(
                &conn,
                &format!("SELECT COUNT(*) FROM datasets WHERE {HAS_EXPRESSION}"),
            )?,
            total_samples: count(&conn, "SELECT COUNT(*) FROM samples")?,
            total_genes: count(&conn, "SELECT COUNT(*) FROM genes")?,
            total_expressions: count(&conn, "SELECT COUNT(*) FROM gene_expression")?,
            tissue_types: group_counts(&conn, "tissue_type", Some(HAS_EXPRESSION))?,
            tumor_types: group_counts(&conn, "tumor_type", Some(HAS_EXPRESSION))?,
            publication_years: group_counts(
                &conn,
                "CAST(publication_year AS TEXT)",
                Some(HAS_EXPRESSION),
            )?,
        })
    }

    /// Active (or unlabelled) datasets that carry expression data, ordered by id.
    pub fn exportable_datasets(&self) -> DbResult<Vec<DatasetRecord>> {
        let conn = self.connection()?;
        let sql = format!(
            r#"
            SELECT {DATASET_COLUMNS} FROM datasets
            WHERE {HAS_EXPRESSION} AND (status IS NULL OR status = 'active')
            ORDER BY id
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_dataset)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn like_pattern(query: &str) -> String {
    let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn count(conn: &Connection, sql: &str) -> DbResult<i64> {
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}

/// Count datasets grouped by `expr`, largest group first.
///
/// Publication years skip the null group; other columns keep it.
fn group_counts(
    conn: &Connection,
    expr: &str,
    restrict: Option<&str>,
) -> DbResult<Vec<CountBucket>> {
    let mut conditions = Vec::new();
    if let Some(r) = restrict {
        conditions.push(r.to_string());
    }
    if expr.contains("publication_year") {
        conditions.push("publication_year IS NOT NULL".to_string());
    }
    let where_sql = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let sql = format!(
        "SELECT {expr} AS name, COUNT(*) AS n FROM datasets{where_sql} \
         GROUP BY name ORDER BY n DESC, name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows =
        stmt.query_map([], |row| Ok(CountBucket { name: row.get(0)?, count: row.get(1)? }))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<DatasetSummary> {
    Ok(DatasetSummary {
        id: row.get(0)?,
        geo_id: row.get(1)?,
        title: row.get(2)?,
        tissue_type: row.get(3)?,
        tumor_type: row.get(4)?,
        n_samples: row.get(5)?,
        n_genes: row.get(6)?,
        publication_year: row.get(7)?,
    })
}

fn map_dataset(row: &Row<'_>) -> rusqlite::Result<DatasetRecord> {
    Ok(DatasetRecord {
        id: row.get(0)?,
        geo_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        tissue_type: row.get(4)?,
        tumor_type: row.get(5)?,
        platform: row.get(6)?,
        n_samples: row.get(7)?,
        n_genes: row.get(8)?,
        publication_year: row.get(9)?,
        reference_pmid: row.get(10)?,
        data_source: row.get(11)?,
        status: row.get(12)?,
    })
}

fn map_gene(row: &Row<'_>) -> rusqlite::Result<GeneRecord> {
    Ok(GeneRecord {
        id: row.get(0)?,
        gene_id: row.get(1)?,
        gene_symbol: row.get(2)?,
        gene_name: row.get(3)?,
        chromosome: row.get(4)?,
        gene_type: row.get(5)?,
        description: row.get(6)?,
        entrez_id: row.get(7)?,
        ensembl_id: row.get(8)?,
    })
}
