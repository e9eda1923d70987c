use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Statement, ToSql};

use super::params::sqlite_value_to_row_value;
use crate::error::EasySqlError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `EasySqlError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, EasySqlError> {
    let value: Value = row.get(idx).map_err(EasySqlError::SqliteError)?;
    Ok(sqlite_value_to_row_value(value))
}

/// Run a prepared statement and materialize its rows.
///
/// Statements without result columns (DDL/DML) are executed instead, and the change count is
/// recorded in `rows_affected`.
///
/// # Errors
/// Returns `EasySqlError::SqliteError` if execution or row extraction fails.
pub fn build_result_set(stmt: &mut Statement, params: &[Value]) -> Result<ResultSet, EasySqlError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();

    if stmt.column_count() == 0 {
        let affected = stmt.execute(&param_refs[..])?;
        let mut result_set = ResultSet::default();
        result_set.rows_affected = affected;
        return Ok(result_set);
    }

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut rows_iter = stmt.query(&param_refs[..])?;
    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Execute a statement for its side effects, draining any rows it returns.
///
/// # Errors
/// Returns `EasySqlError::SqliteError` if execution fails.
pub fn execute_statement(stmt: &mut Statement, params: &[Value]) -> Result<usize, EasySqlError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    if stmt.column_count() == 0 {
        return Ok(stmt.execute(&param_refs[..])?);
    }
    let mut rows = stmt.query(&param_refs[..])?;
    while rows.next()?.is_some() {}
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_and_dml_paths() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a INTEGER, b TEXT)").unwrap();

        let mut insert = conn.prepare("INSERT INTO t VALUES (?1, ?2)").unwrap();
        let rs = build_result_set(
            &mut insert,
            &[Value::Integer(1), Value::Text("x".into())],
        )
        .unwrap();
        assert_eq!(rs.rows_affected, 1);
        assert!(rs.get_column_names().is_none());

        let mut select = conn.prepare("SELECT a, b FROM t").unwrap();
        let rs = build_result_set(&mut select, &[]).unwrap();
        assert_eq!(rs.len(), 1);
        assert_eq!(rs.results[0].get("b"), Some(&RowValues::Text("x".into())));
    }

    #[test]
    fn execute_statement_drains_rows() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT 1").unwrap();
        assert_eq!(execute_statement(&mut stmt, &[]).unwrap(), 0);
    }
}
