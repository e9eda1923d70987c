// SQLite backend plumbing
//
// - config: connection options, the bb8 manager and pool construction
// - connection: blocking-pool execution helpers and transaction cleanup
// - params: conversion between `RowValues` and rusqlite values
// - query: statement execution and result extraction

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager, SqliteOptions};
pub use connection::run_blocking;
pub use params::{row_value_to_sqlite_value, sqlite_value_to_row_value};
pub use query::build_result_set;
