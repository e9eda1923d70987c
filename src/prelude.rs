//! Convenient imports for common functionality.
//!
//! `use easy_sql::prelude::*;` brings in the connection and transaction types, the shared
//! executor trait, result types, parameter markers and the `row_values!`/`params!` macros.

pub use crate::conversion::{FromRow, FromRowValue};
pub use crate::database::Database;
pub use crate::error::EasySqlError;
pub use crate::executor::SqlExecutor;
pub use crate::factory::{DEFAULT_CONNECTION, DbSetting, FactoryConfig, SqlFactory};
pub use crate::params::{BoundParam, In, InOut, Out, ParamDirection};
pub use crate::results::{CursorPosition, NonQueryResult, QueryResult};
pub use crate::sqlite::{SqliteManager, SqliteOptions};
pub use crate::transaction::Transaction;
pub use crate::types::{DatabaseType, RowValues};
pub use crate::util::Util;
pub use crate::{params, row_values};
pub use rusqlite::TransactionBehavior;
