mod args;
mod demo;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use easy_sql::prelude::*;
use tracing::Level;

use crate::args::{Args, Command, RunConfig};
use crate::logging::LogSink;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let sink = LogSink::open(args.log.as_deref()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_writer(sink)
        .with_target(false)
        .with_ansi(args.log.is_none())
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let config = RunConfig::from_args(&args);
    let config_json = serde_json::to_string(&config).unwrap_or_else(|_| "{}".to_string());
    tracing::debug!("config: {}", config_json);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.last_query() {
                Some(query) => tracing::error!(%err, query, "easy-sql failed"),
                None => tracing::error!(%err, "easy-sql failed"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn open(args: &Args) -> Result<Database, EasySqlError> {
    match &args.config {
        Some(path) => {
            let factory = SqlFactory::instance();
            factory.configure(FactoryConfig::from_file(path)?).await;
            factory.get_database(&args.connection).await
        }
        None => Database::connect(&DbSetting::with_connection_string(args.db_type, &args.db)).await,
    }
}

async fn run(args: Args) -> Result<(), EasySqlError> {
    let mut db = open(&args).await?;
    match args.command {
        Command::Exec { sql } => {
            let res = db.exec_non_query(&sql).await?;
            println!(
                "{}",
                serde_json::json!({
                    "rows_affected": res.num_rows_affected(),
                    "last_insert_id": res.last_insert_id(),
                })
            );
        }
        Command::Query { sql, offset, limit } => {
            let mut res = db.exec_query(&sql).await?;
            let printed = Util::range(&mut res, offset, limit.unwrap_or(usize::MAX), |row| {
                println!("{}", row.to_json());
            });
            tracing::info!(rows = printed, "query finished");
        }
        Command::Demo => demo::run(&mut db).await?,
    }
    Ok(())
}
