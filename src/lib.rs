//! Async convenience layer over `rusqlite`.
//!
//! Open a [`Database`], run statements through the [`SqlExecutor`] methods, build
//! INSERT/UPDATE/DELETE statements fluently, walk results with a [`QueryResult`] cursor, and
//! scope work in a [`Transaction`] that rolls back unless committed. Named settings can be
//! registered once in the [`SqlFactory`] and checked out from connection pools anywhere.
//!
//! ```rust,no_run
//! use easy_sql::prelude::*;
//!
//! # async fn demo() -> Result<(), EasySqlError> {
//! let mut db = Database::open_in_memory().await?;
//! db.exec_non_query("CREATE TABLE t (a INTEGER, b TEXT)").await?;
//!
//! {
//!     let mut tx = db.transaction().await?;
//!     tx.insert_into("t (a, b)")
//!         .values(row_values![1, "one"])
//!         .values(row_values![2, "two"])
//!         .exec()
//!         .await?;
//!     tx.update("t").set("b", "uno").where_("a = ?", row_values![1]).await?;
//!     tx.commit().await?;
//! }
//!
//! let query = db.prepare("SELECT a, b FROM t WHERE a >= ?").await?;
//! let mut res = query.exec(params![1]).await?;
//! while res.next() {
//!     let (a, b) = res.fetch::<(i64, String)>()?;
//!     println!("{a} {b}");
//! }
//! # Ok(()) }
//! ```
//!
//! All driver work runs on tokio's blocking pool.

pub mod conversion;
pub mod database;
pub mod error;
pub mod executor;
pub mod factory;
pub mod params;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod sqlite;
pub mod transaction;
pub mod types;
pub mod util;

pub use conversion::{FromRow, FromRowValue};
pub use database::Database;
pub use error::EasySqlError;
pub use executor::SqlExecutor;
pub use factory::{DEFAULT_CONNECTION, DbSetting, FactoryConfig, SqlFactory};
pub use params::{BoundParam, In, InOut, Out, ParamDirection};
pub use query_builder::{DeleteQuery, InsertQuery, PreparedQuery, UpdateQuery};
pub use results::{CursorPosition, CustomDbRow, NonQueryResult, QueryResult, ResultSet};
pub use rusqlite::TransactionBehavior;
pub use transaction::Transaction;
pub use types::{DatabaseType, RowValues};
pub use util::Util;
