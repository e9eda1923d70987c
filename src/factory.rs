//! Process-wide registry of named connection settings.
//!
//! Settings are registered once, typically at startup, and every later
//! [`get_database`](SqlFactory::get_database) call checks a connection out of a pool built
//! lazily for that name.
//!
//! ```rust,no_run
//! use easy_sql::prelude::*;
//!
//! # async fn demo() -> Result<(), EasySqlError> {
//! let factory = SqlFactory::instance();
//! factory.config_default(DbSetting::sqlite_in_memory()).await;
//! let db = factory.get_database(DEFAULT_CONNECTION).await?;
//! db.exec_non_query("CREATE TABLE t (a INTEGER)").await?;
//! # Ok(()) }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use bb8::Pool;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::database::Database;
use crate::error::EasySqlError;
use crate::sqlite::{SqliteManager, SqliteOptions, config::MEMORY_PATH};
use crate::types::DatabaseType;

/// Name used when no connection name is given.
pub const DEFAULT_CONNECTION: &str = "default";

/// Settings for one named connection.
///
/// Host, port and credentials describe network databases; `SQLite` only reads `db_name`
/// (a file path or `:memory:`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSetting {
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub db_name: String,
    /// Maximum pooled connections; in-memory databases always use one.
    pub pool_size: Option<u32>,
}

impl DbSetting {
    #[must_use]
    pub fn new(
        db_type: DatabaseType,
        host: &str,
        port: Option<u16>,
        username: &str,
        password: &str,
        db_name: &str,
    ) -> Self {
        Self {
            db_type,
            host: Some(host.to_string()),
            port,
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            db_name: db_name.to_string(),
            pool_size: None,
        }
    }

    /// Settings carrying only a connection string (for `SQLite`, the database path).
    #[must_use]
    pub fn with_connection_string(db_type: DatabaseType, connection: &str) -> Self {
        Self {
            db_type,
            db_name: connection.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sqlite(path: &str) -> Self {
        Self::with_connection_string(DatabaseType::Sqlite, path)
    }

    #[must_use]
    pub fn sqlite_in_memory() -> Self {
        Self::sqlite(MEMORY_PATH)
    }

    #[must_use]
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.db_name.is_empty() || self.db_name == MEMORY_PATH
    }

    /// `SQLite` options for these settings.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConfigError` if `pool_size` is zero.
    pub fn sqlite_options(&self) -> Result<SqliteOptions, EasySqlError> {
        if self.host.is_some() || self.port.is_some() || self.username.is_some() {
            tracing::debug!(
                db_name = %self.db_name,
                "network settings are ignored for sqlite connections"
            );
        }
        let mut opts = SqliteOptions::new(self.db_name.clone());
        if let Some(size) = self.pool_size {
            if size == 0 {
                return Err(EasySqlError::ConfigError(format!(
                    "pool_size for {} must be at least 1",
                    self.db_name
                )));
            }
            opts = opts.with_pool_size(size);
        }
        Ok(opts)
    }
}

/// Named settings, as read from a JSON object of name → [`DbSetting`].
///
/// ```json
/// { "default": { "type": "sqlite", "db_name": "app.db", "pool_size": 4 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactoryConfig(pub BTreeMap<String, DbSetting>);

impl FactoryConfig {
    /// # Errors
    /// Returns `EasySqlError::ConfigError` if `json` is not a map of settings.
    pub fn from_json(json: &str) -> Result<Self, EasySqlError> {
        serde_json::from_str(json)
            .map_err(|e| EasySqlError::ConfigError(format!("invalid connection settings: {e}")))
    }

    /// # Errors
    /// Returns `EasySqlError::ConfigError` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, EasySqlError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EasySqlError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

#[derive(Debug)]
struct Entry {
    setting: DbSetting,
    pool: Option<Pool<SqliteManager>>,
}

/// Registry of named [`DbSetting`]s with one lazily built pool per name.
#[derive(Debug, Default)]
pub struct SqlFactory {
    entries: Mutex<HashMap<String, Entry>>,
}

lazy_static! {
    static ref INSTANCE: SqlFactory = SqlFactory::new();
}

impl SqlFactory {
    /// A private registry. Most callers use [`SqlFactory::instance`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    #[must_use]
    pub fn instance() -> &'static SqlFactory {
        &INSTANCE
    }

    /// Register `settings` under `name`, replacing (and dropping the pool of) any previous
    /// registration.
    pub async fn config(&self, settings: DbSetting, name: &str) {
        let mut entries = self.entries.lock().await;
        let replaced = entries
            .insert(
                name.to_string(),
                Entry {
                    setting: settings,
                    pool: None,
                },
            )
            .is_some();
        tracing::info!(connection = name, replaced, "connection settings registered");
    }

    /// Register `settings` under [`DEFAULT_CONNECTION`].
    pub async fn config_default(&self, settings: DbSetting) {
        self.config(settings, DEFAULT_CONNECTION).await;
    }

    /// Register every connection in `config`. Returns how many were registered.
    pub async fn configure(&self, config: FactoryConfig) -> usize {
        let count = config.0.len();
        for (name, setting) in config.0 {
            self.config(setting, &name).await;
        }
        count
    }

    /// Register connections from a JSON object of name → settings.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConfigError` if `json` does not parse.
    pub async fn configure_from_json(&self, json: &str) -> Result<usize, EasySqlError> {
        let config = FactoryConfig::from_json(json)?;
        Ok(self.configure(config).await)
    }

    /// Check out a connection for `name`, building its pool on first use.
    ///
    /// # Errors
    /// Returns `EasySqlError::ConfigError` for unknown names and
    /// `EasySqlError::ConnectionError` if the pool cannot provide a connection.
    pub async fn get_database(&self, name: &str) -> Result<Database, EasySqlError> {
        let pool = {
            let mut entries = self.entries.lock().await;
            let entry = entries.get_mut(name).ok_or_else(|| {
                EasySqlError::ConfigError(format!("no connection settings named '{name}'"))
            })?;
            match &entry.pool {
                Some(pool) => pool.clone(),
                None => {
                    let opts = entry.setting.sqlite_options()?;
                    let pool = SqliteManager::new(opts).build_pool().await?;
                    entry.pool = Some(pool.clone());
                    pool
                }
            }
        };
        Database::from_pool(&pool).await
    }

    /// Settings registered under `name`.
    pub async fn setting(&self, name: &str) -> Option<DbSetting> {
        self.entries
            .lock()
            .await
            .get(name)
            .map(|entry| entry.setting.clone())
    }

    /// Forget `name` and drop its pool. Returns whether it was registered.
    pub async fn remove(&self, name: &str) -> bool {
        self.entries.lock().await.remove(name).is_some()
    }

    /// Registered names, sorted.
    pub async fn connection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_read_from_json() {
        let config = FactoryConfig::from_json(
            r#"{
                "main": { "type": "sqlite", "db_name": "app.db", "pool_size": 4 },
                "scratch": { "db_name": ":memory:" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.0["main"].pool_size, Some(4));
        assert_eq!(config.0["scratch"], DbSetting::sqlite_in_memory());
        assert!(config.0["scratch"].is_memory());
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let err = DbSetting::sqlite("x.db")
            .with_pool_size(0)
            .sqlite_options()
            .unwrap_err();
        assert!(matches!(err, EasySqlError::ConfigError(_)));
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        assert!(matches!(
            FactoryConfig::from_json("[1, 2]"),
            Err(EasySqlError::ConfigError(_))
        ));
    }
}
