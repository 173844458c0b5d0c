use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::{json, Value};

use crate::db::{
    now_timestamp, AnalysisTaskRecord, CatalogDb, DbError, DbResult, NewTask, TaskFilter,
    TaskStatus,
};
use crate::services::analysis::AnalysisKind;

const TASK_COLUMNS: &str =
    "id, task_type, dataset_id, parameters, status, results, created_at, completed_at";

impl CatalogDb {
    /// Insert a new task in the `pending` state and return its id.
    pub fn create_task(&self, task: &NewTask) -> DbResult<i64> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO analysis_tasks (task_type, dataset_id, parameters, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                task.task_type.task_type(),
                task.dataset_id,
                task.parameters.to_string(),
                TaskStatus::Pending.as_str(),
                now_timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Promote a pending task to `running`.
    pub fn mark_task_running(&self, id: i64) -> DbResult<()> {
        let conn = self.connection()?;
        let affected = conn.execute(
            "UPDATE analysis_tasks SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![TaskStatus::Running.as_str(), id, TaskStatus::Pending.as_str()],
        )?;
        if affected == 0 {
            return Err(transition_error(&conn, id, TaskStatus::Running)?);
        }
        Ok(())
    }

    /// Record a successful runtime result and close the task.
    pub fn complete_task(&self, id: i64, results: &Value) -> DbResult<()> {
        self.finish_task(id, TaskStatus::Completed, results)
    }

    /// Record a failure message as `{"error": message}` and close the task.
    pub fn fail_task(&self, id: i64, message: &str) -> DbResult<()> {
        self.finish_task(id, TaskStatus::Failed, &json!({ "error": message }))
    }

    fn finish_task(&self, id: i64, status: TaskStatus, results: &Value) -> DbResult<()> {
        let open: Vec<&str> =
            TaskStatus::ALL.into_iter().filter(|s| !s.is_terminal()).map(|s| s.as_str()).collect();
        let placeholders = vec!["?"; open.len()].join(", ");
        let sql = format!(
            "UPDATE analysis_tasks SET status = ?, results = ?, completed_at = ? \
             WHERE id = ? AND status IN ({placeholders})"
        );
        let mut values = vec![
            SqlValue::Text(status.as_str().to_string()),
            SqlValue::Text(results.to_string()),
            SqlValue::Text(now_timestamp()),
            SqlValue::Integer(id),
        ];
        values.extend(open.into_iter().map(|s| SqlValue::Text(s.to_string())));

        let conn = self.connection()?;
        let affected = conn.execute(&sql, params_from_iter(values))?;
        if affected == 0 {
            return Err(transition_error(&conn, id, status)?);
        }
        Ok(())
    }

    /// Load one task record by id.
    pub fn get_task(&self, id: i64) -> DbResult<Option<AnalysisTaskRecord>> {
        let conn = self.connection()?;
        let sql = format!("SELECT {TASK_COLUMNS} FROM analysis_tasks WHERE id = ?1");
        let record = conn.query_row(&sql, params![id], map_task).optional()?;
        Ok(record)
    }

    /// List task records, newest first, narrowed by the given filter.
    pub fn list_tasks(&self, filter: &TaskFilter) -> DbResult<Vec<AnalysisTaskRecord>> {
        let mut clauses = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(SqlValue::Text(status.as_str().to_string()));
        }
        if let Some(kind) = filter.task_type {
            clauses.push("task_type = ?");
            values.push(SqlValue::Text(kind.task_type().to_string()));
        }
        if let Some(dataset_id) = filter.dataset_id {
            clauses.push("dataset_id = ?");
            values.push(SqlValue::Integer(dataset_id));
        }

        let mut sql = format!("SELECT {TASK_COLUMNS} FROM analysis_tasks");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(SqlValue::Integer(i64::from(limit)));
        }

        let conn = self.connection()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), map_task)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Total number of task records.
    pub fn count_tasks(&self) -> DbResult<i64> {
        let conn = self.connection()?;
        let count = conn.query_row("SELECT COUNT(*) FROM analysis_tasks", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Explain why an UPDATE guarded on status touched no row.
fn transition_error(conn: &Connection, id: i64, to: TaskStatus) -> DbResult<DbError> {
    let current: Option<String> = conn
        .query_row("SELECT status FROM analysis_tasks WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    match current {
        None => Ok(DbError::TaskNotFound(id)),
        Some(raw) => {
            let from = raw.parse::<TaskStatus>().map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, err.into())
            })?;
            Ok(DbError::InvalidTransition { id, from, to })
        }
    }
}

fn map_task(row: &Row<'_>) -> rusqlite::Result<AnalysisTaskRecord> {
    let task_type: String = row.get(1)?;
    let status: String = row.get(4)?;
    Ok(AnalysisTaskRecord {
        id: row.get(0)?,
        task_type: task_type.parse::<AnalysisKind>().map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(err))
        })?,
        dataset_id: row.get(2)?,
        parameters: row.get(3)?,
        status: status.parse::<TaskStatus>().map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, err.into())
        })?,
        results: row.get(5)?,
        created_at: row.get(6)?,
        completed_at: row.get(7)?,
    })
}
