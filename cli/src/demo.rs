use easy_sql::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Record {
    a: i64,
    b: i64,
    c: i64,
    d: JsonValue,
}

/// Create a table, fill it, read it back several ways, update it and commit.
pub(crate) async fn run(db: &mut Database) -> Result<(), EasySqlError> {
    tracing::info!("begin");
    let mut tx = db.transaction().await?;

    tx.exec_non_query("CREATE TEMP TABLE IF NOT EXISTS table1 (a int, b int, c int, d text)")
        .await?;

    let inserted = tx
        .insert_into("table1 (a, b, c, d)")
        .values(row_values![1, 2, 3, 7])
        .values(row_values![2, 3, 4, "test"])
        .values(row_values![2, 3, 4, 8])
        .exec()
        .await?;
    tracing::info!(
        query = inserted.last_query(),
        rows = inserted.num_rows_affected(),
        "inserted"
    );

    tx.first("SELECT 1", |row| {
        tracing::info!(flag = ?row.scalar::<bool>(), "first row");
    })
    .await?;

    tx.each("SELECT * FROM table1", |row| {
        tracing::info!(row = ?row.to_map(), "table1");
    })
    .await?;

    let query = tx
        .prepare("SELECT a, b, c, d FROM table1 WHERE a = ? AND b = ?")
        .await?;

    let mut res = query.exec(params![1, 2]).await?;
    Util::each(&mut res, |row| tracing::info!(row = ?row.to_map(), "a=1 b=2"));

    let i: i64 = tx.scalar("SELECT 1").await?;
    let j = tx.scalar_value("SELECT 1").await?;
    tracing::info!(i, j = ?j, "scalars");

    let mut res = query.exec(params![2, 3]).await?;
    tracing::info!(
        executed = res.executed_query(),
        bound = ?res.bound_values(),
        "prepared select"
    );
    while res.next() {
        tracing::info!(values = ?res.to_string_list(), "a=2 b=3");
        let (a, b, c, d) = res.fetch::<(i64, bool, f64, RowValues)>()?;
        let mut record = Record::default();
        res.fetch_object(&mut record)?;
        tracing::info!(a, b, c, d = ?d, record = ?record, "fetched");
    }

    let updated = tx
        .update("table1")
        .set("a", 123)
        .set("b", 333)
        .set_map([("a", 1), ("b", 2)])
        .where_("c=? AND d=?", row_values![3, 4])
        .await?;
    tracing::info!(
        query = updated.last_query(),
        executed = updated.executed_query(),
        rows = updated.num_rows_affected(),
        "updated"
    );

    tx.commit().await?;
    tracing::info!("end");
    Ok(())
}
