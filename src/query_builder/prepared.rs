use crate::error::EasySqlError;
use crate::executor::{SqlExecutor, run_non_query, run_query};
use crate::params::BoundParam;
use crate::results::{NonQueryResult, QueryResult};

/// A statement compiled once and executed with fresh parameters each time.
///
/// Parameters bind positionally. Aliases given through [`In`](crate::In), [`Out`](crate::Out)
/// and [`InOut`](crate::InOut) apply to the execution they were passed to only.
pub struct PreparedQuery<'a, E> {
    executor: &'a E,
    sql: String,
    forward_only: bool,
}

impl<'a, E: SqlExecutor> PreparedQuery<'a, E> {
    pub(crate) fn new(executor: &'a E, sql: &str, forward_only: bool) -> Self {
        Self {
            executor,
            sql: sql.to_string(),
            forward_only,
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn is_forward_only(&self) -> bool {
        self.forward_only
    }

    /// Execute with `params` and return a cursor over the rows.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if binding or execution fails.
    pub async fn exec(&self, params: Vec<BoundParam>) -> Result<QueryResult, EasySqlError> {
        run_query(
            self.executor.connection_handle()?,
            self.sql.clone(),
            params,
            self.forward_only,
        )
        .await
    }

    /// Execute with `params`, discarding any rows.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if binding or execution fails.
    pub async fn exec_non_query(
        &self,
        params: Vec<BoundParam>,
    ) -> Result<NonQueryResult, EasySqlError> {
        let values = params.into_iter().map(|p| p.value).collect();
        run_non_query(self.executor.connection_handle()?, self.sql.clone(), values).await
    }
}
