use std::collections::BTreeMap;

use easy_sql::prelude::*;

type Row = (i64, i64, i64, String);

fn test_data() -> Vec<Row> {
    vec![
        (1, 2, 3, "a".into()),
        (4, 5, 6, "b".into()),
        (7, 8, 9, "c".into()),
        (10, 11, 12, "d".into()),
    ]
}

async fn setup() -> Result<Database, EasySqlError> {
    let db = Database::open_in_memory().await?;
    db.exec_non_query("CREATE TABLE testTable (a int, b int, c int, d text)")
        .await?;
    let mut query = db.insert_into("testTable (a, b, c, d)");
    for (a, b, c, d) in test_data() {
        query = query.values(row_values![a, b, c, d]);
    }
    query.exec().await?;
    Ok(db)
}

async fn read_all<E: SqlExecutor>(exec: &E) -> Result<Vec<Row>, EasySqlError> {
    let mut res = exec
        .exec_query("SELECT a, b, c, d FROM testTable ORDER BY rowid")
        .await?;
    let mut rows = Vec::new();
    while res.next() {
        rows.push(res.fetch::<Row>()?);
    }
    Ok(rows)
}

#[tokio::test]
async fn update_every_row() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = setup().await?;

    {
        let mut tx = db.transaction().await?;
        let res = tx
            .update("testTable")
            .set("a", 10)
            .set("b", 20)
            .set("c", 30)
            .exec()
            .await?;
        assert_eq!(res.num_rows_affected(), 4);
        tx.commit().await?;
    }

    let rows = read_all(&db).await?;
    assert!(rows.iter().all(|(a, b, c, _)| (*a, *b, *c) == (10, 20, 30)));
    Ok(())
}

#[tokio::test]
async fn where_parameters_bind_after_set_values() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = setup().await?;
    let expected: Vec<Row> = vec![
        (10, 20, 30, "a".into()),
        (10, 20, 30, "b".into()),
        (7, 8, 9, "c".into()),
        (10, 11, 12, "d".into()),
    ];

    {
        let tx = db.transaction().await?;
        let res = tx
            .update("testTable")
            .set("a", 10)
            .set("b", 20)
            .set("c", 30)
            .where_("a=? OR a=?", row_values![1, 4])
            .await?;
        assert_eq!(res.num_rows_affected(), 2);
        assert_eq!(read_all(&tx).await?, expected);
        // rolled back on drop
    }

    assert_eq!(read_all(&db).await?, test_data());
    Ok(())
}

#[tokio::test]
async fn set_map_assigns_several_fields() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let mut fields: BTreeMap<&str, RowValues> = BTreeMap::new();
    fields.insert("b", RowValues::Int(0));
    fields.insert("d", RowValues::Text("z".into()));

    let query = db.update("testTable").set_map(fields).set("c", -1);
    assert_eq!(query.sql()?, "UPDATE testTable SET b=?,c=?,d=?");
    let res = query.where_("a >= ?", row_values![7]).await?;
    assert_eq!(res.num_rows_affected(), 2);

    assert_eq!(
        read_all(&db).await?,
        vec![
            (1, 2, 3, "a".to_string()),
            (4, 5, 6, "b".to_string()),
            (7, 0, -1, "z".to_string()),
            (10, 0, -1, "z".to_string()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn later_set_wins() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    db.update("testTable")
        .set("d", "first")
        .set("d", "second")
        .where_("a = 1", row_values![])
        .await?;
    let d: String = db.scalar("SELECT d FROM testTable WHERE a = 1").await?;
    assert_eq!(d, "second");
    Ok(())
}

#[tokio::test]
async fn update_without_fields_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let err = db.update("testTable").exec().await.unwrap_err();
    assert!(matches!(err, EasySqlError::ExecutionError(_)));
    assert_eq!(read_all(&db).await?, test_data());
    Ok(())
}
