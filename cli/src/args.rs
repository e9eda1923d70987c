use std::path::PathBuf;

use clap::{Parser, Subcommand};
use easy_sql::{DEFAULT_CONNECTION, DatabaseType};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL through easy-sql")]
pub(crate) struct Args {
    /// Database path; `:memory:` for a private in-memory database.
    #[arg(long, default_value = ":memory:")]
    pub(crate) db: String,
    #[arg(long, value_enum, default_value = "sqlite")]
    pub(crate) db_type: DatabaseType,
    /// JSON file of named connection settings; overrides `--db`.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Connection to use from `--config`.
    #[arg(long, default_value = DEFAULT_CONNECTION)]
    pub(crate) connection: String,
    /// Also write logs to this file.
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    /// Log every statement.
    #[arg(long)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone, Serialize)]
pub(crate) enum Command {
    /// Execute a statement and report rows affected.
    Exec { sql: String },
    /// Run a query and print rows as JSON lines.
    Query {
        sql: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Walk through create, insert, prepared select, update and commit.
    Demo,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RunConfig {
    pub(crate) db: String,
    pub(crate) db_type: DatabaseType,
    pub(crate) config: Option<PathBuf>,
    pub(crate) connection: String,
    pub(crate) command: Command,
}

impl RunConfig {
    pub(crate) fn from_args(args: &Args) -> Self {
        Self {
            db: args.db.clone(),
            db_type: args.db_type,
            config: args.config.clone(),
            connection: args.connection.clone(),
            command: args.command.clone(),
        }
    }
}
