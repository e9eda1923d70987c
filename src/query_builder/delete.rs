use crate::error::EasySqlError;
use crate::executor::{SqlExecutor, run_non_query};
use crate::results::NonQueryResult;
use crate::types::RowValues;

/// Builder for `DELETE FROM <table> WHERE ..`.
pub struct DeleteQuery<'a, E> {
    executor: &'a E,
    table: String,
}

impl<'a, E: SqlExecutor> DeleteQuery<'a, E> {
    pub(crate) fn new(executor: &'a E, table: &str) -> Self {
        Self {
            executor,
            table: table.trim().to_string(),
        }
    }

    /// Statement text for the condition `expr`.
    #[must_use]
    pub fn sql(&self, expr: &str) -> String {
        format!("DELETE FROM {} WHERE {expr}", self.table)
    }

    /// Delete every row.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the statement fails.
    pub async fn exec(self) -> Result<NonQueryResult, EasySqlError> {
        self.where_("1=1", Vec::new()).await
    }

    /// Delete the rows matching `expr`, binding `params` positionally.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the statement fails.
    pub async fn where_(
        self,
        expr: &str,
        params: Vec<RowValues>,
    ) -> Result<NonQueryResult, EasySqlError> {
        let sql = self.sql(expr);
        run_non_query(self.executor.connection_handle()?, sql, params).await
    }
}
