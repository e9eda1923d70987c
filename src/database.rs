use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use rusqlite::{Connection, TransactionBehavior};

use crate::error::EasySqlError;
use crate::executor::SqlExecutor;
use crate::factory::DbSetting;
use crate::sqlite::{SharedSqliteConnection, SqliteManager, SqliteOptions, run_blocking};
use crate::transaction::Transaction;

/// A handle on one `SQLite` connection, either standalone or checked out of a pool.
///
/// Pooled connections return to their pool when the `Database` is dropped.
///
/// ```rust,no_run
/// use easy_sql::prelude::*;
///
/// # async fn demo() -> Result<(), EasySqlError> {
/// let mut db = Database::open_in_memory().await?;
/// db.exec_non_query("CREATE TABLE t (a INTEGER)").await?;
///
/// let mut tx = db.transaction().await?;
/// tx.insert_into("t (a)").values(row_values![1]).exec().await?;
/// tx.commit().await?;
/// # Ok(()) }
/// ```
pub struct Database {
    pub(crate) conn: SharedSqliteConnection,
    lease: Option<PooledConnection<'static, SqliteManager>>,
    path: String,
}

impl Database {
    fn standalone(conn: SharedSqliteConnection, path: impl Into<String>) -> Self {
        Self {
            conn,
            lease: None,
            path: path.into(),
        }
    }

    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConnectionError` if the file cannot be opened.
    pub async fn open(path: &str) -> Result<Self, EasySqlError> {
        Self::open_with(&SqliteOptions::new(path)).await
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConnectionError` if `SQLite` cannot allocate the database.
    pub async fn open_in_memory() -> Result<Self, EasySqlError> {
        Self::open_with(&SqliteOptions::in_memory()).await
    }

    /// Open a standalone connection with explicit options.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConnectionError` if the database cannot be opened.
    pub async fn open_with(opts: &SqliteOptions) -> Result<Self, EasySqlError> {
        let conn = opts.open().await?;
        tracing::debug!(db_path = %opts.db_path, "sqlite database opened");
        Ok(Self::standalone(conn, opts.db_path.clone()))
    }

    /// Open a standalone connection described by `setting`.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConfigError` for unsupported settings and
    /// `EasySqlError::ConnectionError` if the database cannot be opened.
    pub async fn connect(setting: &DbSetting) -> Result<Self, EasySqlError> {
        Self::open_with(&setting.sqlite_options()?).await
    }

    /// Wrap an already-open rusqlite connection.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        let path = conn.path().unwrap_or_default().to_string();
        Self::standalone(Arc::new(Mutex::new(conn)), path)
    }

    /// Check a connection out of `pool`. It is returned when the `Database` is dropped.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConnectionError` if no connection becomes available in time.
    pub async fn from_pool(pool: &Pool<SqliteManager>) -> Result<Self, EasySqlError> {
        let lease = pool.get_owned().await?;
        let conn = Arc::clone(&*lease);
        let path = {
            let guard = crate::sqlite::connection::lock_connection(&conn);
            guard.path().unwrap_or_default().to_string()
        };
        Ok(Self {
            conn,
            lease: Some(lease),
            path,
        })
    }

    /// File the connection is attached to; empty for in-memory databases.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_pooled(&self) -> bool {
        self.lease.is_some()
    }

    /// Begin a deferred transaction.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if BEGIN fails.
    pub async fn transaction(&mut self) -> Result<Transaction<'_>, EasySqlError> {
        self.transaction_with(TransactionBehavior::Deferred).await
    }

    /// Begin a transaction with an explicit locking behavior.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if BEGIN fails.
    pub async fn transaction_with(
        &mut self,
        behavior: TransactionBehavior,
    ) -> Result<Transaction<'_>, EasySqlError> {
        Transaction::begin(self, behavior).await
    }

    /// Run `func` with the raw rusqlite connection on the blocking pool.
    ///
    /// # Errors
    /// Returns the error produced by `func`, or `EasySqlError::ExecutionError` if the blocking
    /// task fails.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, EasySqlError>
    where
        F: FnOnce(&mut Connection) -> Result<R, EasySqlError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(Arc::clone(&self.conn), func).await
    }
}

#[async_trait]
impl SqlExecutor for Database {
    fn connection_handle(&self) -> Result<SharedSqliteConnection, EasySqlError> {
        Ok(Arc::clone(&self.conn))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("pooled", &self.lease.is_some())
            .finish_non_exhaustive()
    }
}
