use async_trait::async_trait;
use rusqlite::types::Value;

use crate::conversion::FromRowValue;
use crate::error::EasySqlError;
use crate::params::BoundParam;
use crate::query_builder::{DeleteQuery, InsertQuery, PreparedQuery, UpdateQuery};
use crate::results::{NonQueryResult, QueryResult};
use crate::sqlite::connection::{
    execute_blocking, execute_many_blocking, prepare_blocking, run_blocking,
};
use crate::sqlite::params::{Params, row_value_to_sqlite_value};
use crate::sqlite::SharedSqliteConnection;
use crate::types::RowValues;
use crate::util::Util;

/// Operations shared by [`Database`](crate::Database) and [`Transaction`](crate::Transaction).
///
/// Implementors only provide the connection statements run on; everything else is built on
/// top of it.
///
/// ```rust,no_run
/// use easy_sql::prelude::*;
///
/// # async fn demo() -> Result<(), EasySqlError> {
/// let db = Database::open_in_memory().await?;
/// db.exec_non_query("CREATE TABLE t (a INTEGER, b TEXT)").await?;
/// db.insert_into("t (a, b)")
///     .values(row_values![1, "one"])
///     .values(row_values![2, "two"])
///     .exec()
///     .await?;
/// let total: i64 = db.scalar("SELECT SUM(a) FROM t").await?;
/// assert_eq!(total, 3);
/// # Ok(()) }
/// ```
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Connection that statements issued through this executor run on.
    ///
    /// # Errors
    /// Returns an error when the executor can no longer run statements (for example a
    /// finished transaction).
    fn connection_handle(&self) -> Result<SharedSqliteConnection, EasySqlError>;

    /// Run one or more `;`-separated statements without parameters or results.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if any statement fails.
    async fn execute_batch(&self, sql: &str) -> Result<(), EasySqlError> {
        let conn = self.connection_handle()?;
        let owned = sql.to_string();
        run_blocking(conn, move |c| {
            c.execute_batch(&owned)
                .map_err(|e| EasySqlError::query(owned.as_str(), e))
        })
        .await
    }

    /// Execute a statement that returns no rows (DDL, INSERT, UPDATE, DELETE).
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the statement fails.
    async fn exec_non_query(&self, sql: &str) -> Result<NonQueryResult, EasySqlError> {
        run_non_query(self.connection_handle()?, sql.to_string(), Vec::new()).await
    }

    /// Execute a query and return a scrollable result.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the statement fails.
    async fn exec_query(&self, sql: &str) -> Result<QueryResult, EasySqlError> {
        run_query(self.connection_handle()?, sql.to_string(), Vec::new(), false).await
    }

    /// Start an INSERT into `table`, optionally with a column list: `"t (a, b)"`.
    fn insert_into(&self, table: &str) -> InsertQuery<'_, Self>
    where
        Self: Sized,
    {
        InsertQuery::new(self, table)
    }

    fn update(&self, table: &str) -> UpdateQuery<'_, Self>
    where
        Self: Sized,
    {
        UpdateQuery::new(self, table)
    }

    fn delete_from(&self, table: &str) -> DeleteQuery<'_, Self>
    where
        Self: Sized,
    {
        DeleteQuery::new(self, table)
    }

    /// Prepare a reusable statement whose results are forward-only.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the statement does not compile.
    async fn prepare(&self, sql: &str) -> Result<PreparedQuery<'_, Self>, EasySqlError>
    where
        Self: Sized,
    {
        self.prepare_with(sql, true).await
    }

    /// Prepare a reusable statement, choosing whether its results can scroll backwards.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the statement does not compile.
    async fn prepare_with(
        &self,
        sql: &str,
        forward_only: bool,
    ) -> Result<PreparedQuery<'_, Self>, EasySqlError>
    where
        Self: Sized,
    {
        let conn = self.connection_handle()?;
        let owned = sql.to_string();
        run_blocking(conn, move |c| prepare_blocking(c, &owned)).await?;
        Ok(PreparedQuery::new(self, sql, forward_only))
    }

    /// Run `sql` and call `f` for every row. Returns the number of rows handled.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the query fails.
    async fn each<F>(&self, sql: &str, f: F) -> Result<usize, EasySqlError>
    where
        F: FnMut(&QueryResult) + Send,
    {
        let mut res = self.exec_query(sql).await?;
        Ok(Util::each(&mut res, f))
    }

    /// Run `sql` and call `f` for the first row only.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the query fails.
    async fn first<F>(&self, sql: &str, f: F) -> Result<usize, EasySqlError>
    where
        F: FnMut(&QueryResult) + Send,
    {
        let mut res = self.exec_query(sql).await?;
        Ok(Util::first(&mut res, f))
    }

    /// Run `sql` and call `f` for up to `count` rows after skipping `start`.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the query fails.
    async fn range<F>(&self, sql: &str, start: usize, count: usize, f: F) -> Result<usize, EasySqlError>
    where
        F: FnMut(&QueryResult) + Send,
    {
        let mut res = self.exec_query(sql).await?;
        Ok(Util::range(&mut res, start, count, f))
    }

    /// Run `sql` and call `f` for up to `count` leading rows.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the query fails.
    async fn top<F>(&self, sql: &str, count: usize, f: F) -> Result<usize, EasySqlError>
    where
        F: FnMut(&QueryResult) + Send,
    {
        let mut res = self.exec_query(sql).await?;
        Ok(Util::top(&mut res, count, f))
    }

    /// First column of the first row, or `RowValues::Null` when the query returns no rows.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if the query fails.
    async fn scalar_value(&self, sql: &str) -> Result<RowValues, EasySqlError> {
        let mut res = self.exec_query(sql).await?;
        res.next();
        Ok(res.scalar_value().cloned().unwrap_or(RowValues::Null))
    }

    /// First column of the first row converted to `T`. An empty result converts like NULL.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConversionError` if the value does not convert to `T`.
    async fn scalar<T>(&self, sql: &str) -> Result<T, EasySqlError>
    where
        T: FromRowValue + Send,
    {
        let value = self.scalar_value(sql).await?;
        T::from_row_value(&value).ok_or_else(|| {
            EasySqlError::ConversionError(format!(
                "scalar {value:?} of '{sql}' cannot be converted to {}",
                std::any::type_name::<T>()
            ))
        })
    }
}

/// Run a statement with bound parameters and wrap it in a cursor.
pub(crate) async fn run_query(
    conn: SharedSqliteConnection,
    sql: String,
    params: Vec<BoundParam>,
    forward_only: bool,
) -> Result<QueryResult, EasySqlError> {
    let values = Params::convert(params.iter().map(|p| &p.value));
    let (sql, execution) = run_blocking(conn, move |c| {
        let execution = execute_blocking(c, &sql, values.as_values())?;
        Ok((sql, execution))
    })
    .await?;
    Ok(QueryResult::from_execution(
        &sql,
        execution,
        forward_only,
        &params,
    ))
}

/// Run a statement that produces no rows.
pub(crate) async fn run_non_query(
    conn: SharedSqliteConnection,
    sql: String,
    values: Vec<RowValues>,
) -> Result<NonQueryResult, EasySqlError> {
    let params = Params::convert(&values);
    run_blocking(conn, move |c| {
        let execution = execute_blocking(c, &sql, params.as_values())?;
        Ok(NonQueryResult::new(
            execution.result_set.rows_affected,
            execution.last_insert_id,
            sql,
            execution.executed_query,
        ))
    })
    .await
}

/// Run one statement once per parameter row.
pub(crate) async fn run_many(
    conn: SharedSqliteConnection,
    sql: String,
    rows: Vec<Vec<RowValues>>,
) -> Result<NonQueryResult, EasySqlError> {
    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| row.iter().map(row_value_to_sqlite_value).collect())
        .collect();
    run_blocking(conn, move |c| {
        let (affected, last_insert_id) = execute_many_blocking(c, &sql, &rows)?;
        Ok(NonQueryResult::new(
            affected,
            last_insert_id,
            sql.clone(),
            sql,
        ))
    })
    .await
}
