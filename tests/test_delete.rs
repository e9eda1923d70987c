use easy_sql::prelude::*;

async fn setup() -> Result<Database, EasySqlError> {
    let db = Database::open_in_memory().await?;
    db.exec_non_query("CREATE TABLE testTable (a int, b int, c int, d text)")
        .await?;
    db.insert_into("testTable (a, b, c, d)")
        .values(row_values![1, 2, 3, "a"])
        .values(row_values![4, 5, 6, "b"])
        .values(row_values![7, 8, 9, "c"])
        .values(row_values![10, 11, 12, "d"])
        .exec()
        .await?;
    Ok(db)
}

async fn remaining<E: SqlExecutor>(exec: &E) -> Result<Vec<i64>, EasySqlError> {
    let mut res = exec.exec_query("SELECT a FROM testTable ORDER BY a").await?;
    let mut out = Vec::new();
    while res.next() {
        out.push(res.fetch::<(i64,)>()?.0);
    }
    Ok(out)
}

#[tokio::test]
async fn delete_everything() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = setup().await?;

    {
        let tx = db.transaction().await?;
        let res = tx.delete_from("testTable").exec().await?;
        assert_eq!(res.num_rows_affected(), 4);
        assert!(remaining(&tx).await?.is_empty());
    }
    assert_eq!(remaining(&db).await?, vec![1, 4, 7, 10]);

    {
        let mut tx = db.transaction().await?;
        tx.delete_from("testTable").exec().await?;
        tx.commit().await?;
    }
    assert!(remaining(&db).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn delete_with_literal_condition() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let query = db.delete_from("testTable");
    assert_eq!(query.sql("a=1"), "DELETE FROM testTable WHERE a=1");
    let res = query.where_("a=1", row_values![]).await?;
    assert_eq!(res.num_rows_affected(), 1);
    assert_eq!(remaining(&db).await?, vec![4, 7, 10]);
    Ok(())
}

#[tokio::test]
async fn delete_with_bound_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let res = db
        .delete_from("testTable")
        .where_("a=? OR b=?", row_values![1, 5])
        .await?;
    assert_eq!(res.num_rows_affected(), 2);
    assert_eq!(res.last_query(), "DELETE FROM testTable WHERE a=? OR b=?");
    assert_eq!(res.executed_query(), "DELETE FROM testTable WHERE a=1 OR b=5");
    assert_eq!(remaining(&db).await?, vec![7, 10]);

    let res = db
        .delete_from("testTable")
        .where_("a=?", row_values![100])
        .await?;
    assert_eq!(res.num_rows_affected(), 0);
    Ok(())
}
