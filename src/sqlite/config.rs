use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use rusqlite::Connection;

use super::connection::run_blocking;
use crate::error::EasySqlError;

/// A `SQLite` connection shared between the async caller and the blocking pool.
pub type SharedSqliteConnection = Arc<Mutex<Connection>>;

/// Path used for private in-memory databases.
pub const MEMORY_PATH: &str = ":memory:";

/// Options for opening `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
    pub busy_timeout: Duration,
    /// Switch file databases to WAL journaling on connect.
    pub wal: bool,
    pub pool_size: u32,
    pub connection_timeout: Duration,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: Duration::from_secs(5),
            wal: true,
            pool_size: 8,
            connection_timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.db_path.is_empty() || self.db_path == MEMORY_PATH
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    #[must_use]
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Open a connection with these options on the current thread.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConnectionError` if the database cannot be opened or configured.
    pub fn open_blocking(&self) -> Result<Connection, EasySqlError> {
        let conn = if self.is_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.db_path)
        }
        .map_err(|e| {
            EasySqlError::ConnectionError(format!("cannot open {}: {e}", self.db_path))
        })?;

        conn.busy_timeout(self.busy_timeout)?;
        if self.wal && !self.is_memory() {
            // journal_mode returns a row, so read it instead of executing.
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))?;
        }
        Ok(conn)
    }

    /// Open a standalone shared connection without blocking the runtime.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConnectionError` if the database cannot be opened.
    pub async fn open(&self) -> Result<SharedSqliteConnection, EasySqlError> {
        let opts = self.clone();
        let conn = tokio::task::spawn_blocking(move || opts.open_blocking())
            .await
            .map_err(|e| {
                EasySqlError::ConnectionError(format!("sqlite open join error: {e}"))
            })??;
        Ok(Arc::new(Mutex::new(conn)))
    }
}

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    opts: SqliteOptions,
}

impl SqliteManager {
    #[must_use]
    pub fn new(opts: SqliteOptions) -> Self {
        Self { opts }
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }

    /// Build a pool from this manager.
    ///
    /// Every connection to `:memory:` opens a distinct database, so in-memory pools hold a
    /// single connection.
    ///
    /// # Errors
    /// Returns `EasySqlError` if creating the pool fails.
    pub async fn build_pool(self) -> Result<Pool<SqliteManager>, EasySqlError> {
        let max_size = if self.opts.is_memory() {
            1
        } else {
            self.opts.pool_size.max(1)
        };
        tracing::info!(
            db_path = %self.opts.db_path,
            max_size,
            "building sqlite pool"
        );
        Pool::builder()
            .max_size(max_size)
            .connection_timeout(self.opts.connection_timeout)
            .build(self)
            .await
            .map_err(|e| EasySqlError::ConnectionError(format!("sqlite pool error: {e}")))
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = EasySqlError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let opts = self.opts.clone();
        async move { opts.open().await }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let handle = Arc::clone(conn);
        async move {
            run_blocking(handle, |guard| {
                guard
                    .query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(EasySqlError::SqliteError)
            })
            .await
        }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        // A connection returned mid-transaction must not be handed out again.
        conn.try_lock()
            .map(|guard| !guard.is_autocommit())
            .unwrap_or(false)
    }
}
