use std::collections::BTreeMap;

use crate::error::EasySqlError;
use crate::executor::{SqlExecutor, run_non_query};
use crate::results::NonQueryResult;
use crate::types::RowValues;

/// Builder for `UPDATE <table> SET a=?, b=? [WHERE ..]`.
///
/// Fields are kept ordered by name; setting a field twice keeps the later value.
pub struct UpdateQuery<'a, E> {
    executor: &'a E,
    table: String,
    fields: BTreeMap<String, RowValues>,
}

impl<'a, E: SqlExecutor> UpdateQuery<'a, E> {
    pub(crate) fn new(executor: &'a E, table: &str) -> Self {
        Self {
            executor,
            table: table.trim().to_string(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<RowValues>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Set several fields at once.
    #[must_use]
    pub fn set_map<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RowValues>,
    {
        for (field, value) in fields {
            self.fields.insert(field.into(), value.into());
        }
        self
    }

    fn render(&self, where_expr: Option<&str>) -> Result<String, EasySqlError> {
        if self.fields.is_empty() {
            return Err(EasySqlError::ExecutionError(format!(
                "update of {} sets no fields",
                self.table
            )));
        }
        let assignments: Vec<String> = self.fields.keys().map(|f| format!("{f}=?")).collect();
        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(","));
        if let Some(expr) = where_expr.map(str::trim).filter(|e| !e.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(expr);
        }
        Ok(sql)
    }

    /// The statement `exec` would run.
    ///
    /// # Errors
    /// Returns `EasySqlError::ExecutionError` when no fields are set.
    pub fn sql(&self) -> Result<String, EasySqlError> {
        self.render(None)
    }

    async fn run(
        self,
        where_expr: Option<&str>,
        params: Vec<RowValues>,
    ) -> Result<NonQueryResult, EasySqlError> {
        let sql = self.render(where_expr)?;
        let conn = self.executor.connection_handle()?;
        let mut values: Vec<RowValues> = self.fields.into_values().collect();
        values.extend(params);
        run_non_query(conn, sql, values).await
    }

    /// Update every row of the table.
    ///
    /// # Errors
    /// Returns `EasySqlError::ExecutionError` when no fields are set and
    /// `EasySqlError::QueryError` if the statement fails.
    pub async fn exec(self) -> Result<NonQueryResult, EasySqlError> {
        self.run(None, Vec::new()).await
    }

    /// Update the rows matching `expr`; `params` bind after the SET values.
    ///
    /// # Errors
    /// Returns `EasySqlError::ExecutionError` when no fields are set and
    /// `EasySqlError::QueryError` if the statement fails.
    pub async fn where_(
        self,
        expr: &str,
        params: Vec<RowValues>,
    ) -> Result<NonQueryResult, EasySqlError> {
        self.run(Some(expr), params).await
    }
}
