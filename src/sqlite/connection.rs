use std::sync::{MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::types::Value;

use super::config::SharedSqliteConnection;
use super::query::{build_result_set, execute_statement};
use crate::error::EasySqlError;
use crate::results::ResultSet;

const ROLLBACK_BUSY_RETRIES: &[Duration] = &[
    Duration::from_millis(10),
    Duration::from_millis(25),
    Duration::from_millis(50),
];

/// Lock a shared connection, recovering the guard if a previous holder panicked.
pub(crate) fn lock_connection(conn: &SharedSqliteConnection) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `func` against the connection on tokio's blocking pool.
///
/// # Errors
/// Returns whatever `func` returns, or `EasySqlError::ExecutionError` if the blocking task
/// could not be joined.
pub async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, EasySqlError>
where
    F: FnOnce(&mut Connection) -> Result<R, EasySqlError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = lock_connection(&conn);
        func(&mut guard)
    })
    .await
    .map_err(|e| EasySqlError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

/// Outcome of running one statement on the blocking pool.
#[derive(Debug, Default)]
pub(crate) struct Execution {
    pub result_set: ResultSet,
    pub executed_query: String,
    pub last_insert_id: Option<i64>,
}

/// Prepare (through the statement cache), bind and run one statement.
pub(crate) fn execute_blocking(
    conn: &Connection,
    sql: &str,
    params: &[Value],
) -> Result<Execution, EasySqlError> {
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| EasySqlError::query(sql, e))?;
    let result_set = build_result_set(&mut stmt, params).map_err(|e| attach_query(e, sql))?;
    let executed_query = stmt.expanded_sql().unwrap_or_else(|| sql.to_string());
    let last_insert_id = if result_set.get_column_names().is_none() && result_set.rows_affected > 0
    {
        Some(conn.last_insert_rowid())
    } else {
        None
    };
    tracing::debug!(sql, rows = result_set.rows_affected, "sqlite statement executed");
    Ok(Execution {
        result_set,
        executed_query,
        last_insert_id,
    })
}

/// Run one statement once per parameter row, returning the summed change count and the last
/// rowid.
pub(crate) fn execute_many_blocking(
    conn: &Connection,
    sql: &str,
    rows: &[Vec<Value>],
) -> Result<(usize, Option<i64>), EasySqlError> {
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| EasySqlError::query(sql, e))?;
    let mut affected = 0;
    for params in rows {
        affected += execute_statement(&mut stmt, params).map_err(|e| attach_query(e, sql))?;
    }
    tracing::debug!(sql, batches = rows.len(), rows = affected, "sqlite batch executed");
    let last_insert_id = (affected > 0).then(|| conn.last_insert_rowid());
    Ok((affected, last_insert_id))
}

/// Check that `sql` compiles, leaving it in the statement cache.
pub(crate) fn prepare_blocking(conn: &Connection, sql: &str) -> Result<(), EasySqlError> {
    conn.prepare_cached(sql)
        .map(drop)
        .map_err(|e| EasySqlError::query(sql, e))
}

fn attach_query(err: EasySqlError, sql: &str) -> EasySqlError {
    match err {
        EasySqlError::SqliteError(source) => EasySqlError::query(sql, source),
        other => other,
    }
}

/// Roll back the open transaction, retrying briefly while the database reports busy.
pub(crate) fn rollback_with_busy_retries(conn: &Connection) -> Result<(), EasySqlError> {
    for (idx, delay) in ROLLBACK_BUSY_RETRIES.iter().copied().enumerate() {
        let result = conn
            .execute_batch("ROLLBACK")
            .map_err(|e| EasySqlError::query("ROLLBACK", e));

        match &result {
            Ok(()) => return result,
            Err(err) if err.is_busy() && idx + 1 < ROLLBACK_BUSY_RETRIES.len() => {
                thread::sleep(delay);
            }
            _ => return result,
        }
    }
    Ok(())
}
