use lazy_static::lazy_static;
use regex::Regex;

use crate::error::EasySqlError;
use crate::executor::{SqlExecutor, run_many};
use crate::results::NonQueryResult;
use crate::types::RowValues;

lazy_static! {
    static ref COLUMN_LIST: Regex =
        Regex::new(r"^\s*[^\s(]+\s*\((?P<columns>[^()]*)\)\s*$").expect("valid column-list pattern");
}

/// Builder for `INSERT INTO <table> VALUES (?, ..)` with one or more rows.
///
/// `table` may carry a column list, e.g. `"people (name, age)"`. Every row is bound
/// positionally and the rows run as one batch on a single cached statement.
pub struct InsertQuery<'a, E> {
    executor: &'a E,
    table: String,
    rows: Vec<Vec<RowValues>>,
}

impl<'a, E: SqlExecutor> InsertQuery<'a, E> {
    pub(crate) fn new(executor: &'a E, table: &str) -> Self {
        Self {
            executor,
            table: table.trim().to_string(),
            rows: Vec::new(),
        }
    }

    /// Queue one row of values.
    #[must_use]
    pub fn values(mut self, row: Vec<RowValues>) -> Self {
        self.rows.push(row);
        self
    }

    /// Column names listed in the insert target, if any.
    #[must_use]
    pub fn columns(&self) -> Option<Vec<String>> {
        target_columns(&self.table)
    }

    /// Rows queued so far.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The statement `exec` would run.
    ///
    /// # Errors
    /// Returns `EasySqlError::ExecutionError` when no rows are queued or rows disagree on
    /// their number of values.
    pub fn sql(&self) -> Result<String, EasySqlError> {
        let arity = self.arity()?;
        let placeholders = vec!["?"; arity].join(",");
        Ok(format!("INSERT INTO {} VALUES ({placeholders})", self.table))
    }

    fn arity(&self) -> Result<usize, EasySqlError> {
        let arity = match self.rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => {
                return Err(EasySqlError::ExecutionError(format!(
                    "insert into {} has no values",
                    self.table
                )));
            }
        };
        if let Some((idx, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != arity)
        {
            return Err(EasySqlError::ExecutionError(format!(
                "insert into {}: row {idx} has {} values, expected {arity}",
                self.table,
                row.len()
            )));
        }
        if let Some(columns) = self.columns() {
            if columns.len() != arity {
                return Err(EasySqlError::ExecutionError(format!(
                    "insert into {} names {} columns but rows carry {arity} values",
                    self.table,
                    columns.len()
                )));
            }
        }
        Ok(arity)
    }

    /// Run the insert for every queued row.
    ///
    /// # Errors
    /// Returns `EasySqlError::ExecutionError` for an empty or ragged insert and
    /// `EasySqlError::QueryError` if the database rejects a row.
    pub async fn exec(self) -> Result<NonQueryResult, EasySqlError> {
        let sql = self.sql()?;
        let conn = self.executor.connection_handle()?;
        run_many(conn, sql, self.rows).await
    }
}

fn target_columns(table: &str) -> Option<Vec<String>> {
    let caps = COLUMN_LIST.captures(table)?;
    let columns: Vec<String> = caps["columns"]
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
        .collect();
    (!columns.is_empty()).then_some(columns)
}
