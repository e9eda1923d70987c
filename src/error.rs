use thiserror::Error;

/// Errors raised by `easy-sql`.
///
/// Statement failures carry the SQL text that was running so callers can report both in one
/// place:
/// ```rust,no_run
/// use easy_sql::prelude::*;
///
/// # async fn demo(db: &Database) {
/// if let Err(err) = db.exec_non_query("DROP TABLE missing").await {
///     eprintln!("{err} (query: {:?})", err.last_query());
/// }
/// # }
/// ```
#[derive(Debug, Error)]
pub enum EasySqlError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Query error: {source}")]
    QueryError {
        query: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),
}

impl EasySqlError {
    /// Wrap a driver error raised while running `query`.
    pub(crate) fn query(query: impl Into<String>, source: rusqlite::Error) -> Self {
        EasySqlError::QueryError {
            query: query.into(),
            source,
        }
    }

    /// SQL text of the statement that failed, when known.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        match self {
            EasySqlError::QueryError { query, .. } => Some(query.as_str()),
            _ => None,
        }
    }

    /// True when the underlying `SQLite` error is `SQLITE_BUSY`.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        let source = match self {
            EasySqlError::SqliteError(err) | EasySqlError::QueryError { source: err, .. } => err,
            _ => return false,
        };
        matches!(
            source,
            rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::DatabaseBusy
        )
    }
}

impl From<bb8::RunError<EasySqlError>> for EasySqlError {
    fn from(err: bb8::RunError<EasySqlError>) -> Self {
        match err {
            bb8::RunError::User(inner) => inner,
            bb8::RunError::TimedOut => {
                EasySqlError::ConnectionError("SQLite pool checkout timed out".into())
            }
        }
    }
}
