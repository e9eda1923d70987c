use std::collections::BTreeMap;

use easy_sql::prelude::*;
use serde::{Deserialize, Serialize};

const SELECT_ABCD: &str = "SELECT a, b, c, d FROM testTable";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Row {
    a: i64,
    b: i64,
    c: i64,
    d: String,
}

fn test_data() -> Vec<Row> {
    vec![
        Row { a: 1, b: 2, c: 3, d: "a".into() },
        Row { a: 4, b: 5, c: 6, d: "b".into() },
        Row { a: 7, b: 8, c: 9, d: "c".into() },
    ]
}

async fn setup() -> Result<Database, EasySqlError> {
    let mut db = Database::open_in_memory().await?;
    {
        let mut tx = db.transaction().await?;
        tx.exec_non_query("CREATE TABLE testTable (a int, b int, c int, d text)")
            .await?;
        let mut insert = tx.insert_into("testTable (a, b, c, d)");
        for row in test_data() {
            insert = insert.values(row_values![row.a, row.b, row.c, row.d]);
        }
        insert.exec().await?;
        tx.commit().await?;
    }
    Ok(db)
}

#[tokio::test]
async fn row_count_matches_inserted_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let count: i64 = db.scalar("SELECT COUNT(*) FROM testTable").await?;
    assert_eq!(count, 3);

    let mut res = db.exec_query(SELECT_ABCD).await?;
    assert_eq!(res.size(), Some(3));
    let mut seen = 0;
    while res.next() {
        seen += 1;
    }
    assert_eq!(seen, 3);
    Ok(())
}

#[tokio::test]
async fn column_names_follow_the_select_list() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let res = db.exec_query(SELECT_ABCD).await?;
    assert_eq!(res.column_names(), ["a", "b", "c", "d"]);

    let res = db.exec_query("SELECT d, a FROM testTable").await?;
    assert_eq!(res.column_names(), ["d", "a"]);
    Ok(())
}

#[tokio::test]
async fn values_by_index_and_name() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    let rows = test_data();

    let mut res = db.exec_query(SELECT_ABCD).await?;
    let mut i = 0;
    while res.next() {
        let row = &rows[i];
        assert_eq!(res.value(0), Some(&RowValues::Int(row.a)));
        assert_eq!(res.value_by_name("B"), Some(&RowValues::Int(row.b)));
        assert_eq!(res.value_by_name("d"), Some(&RowValues::Text(row.d.clone())));
        assert_eq!(res.value(4), None);
        i += 1;
    }
    assert_eq!(i, rows.len());
    Ok(())
}

#[tokio::test]
async fn conditional_select() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let mut res = db
        .exec_query("SELECT a, d FROM testTable WHERE a > 3 ORDER BY a")
        .await?;
    let mut found = Vec::new();
    while res.next() {
        found.push(res.fetch::<(i64, String)>()?);
    }
    assert_eq!(found, vec![(4, "b".to_string()), (7, "c".to_string())]);
    Ok(())
}

#[tokio::test]
async fn prepared_conditional_select() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let query = db
        .prepare("SELECT a, b, c, d FROM testTable WHERE a = ? OR d = ?")
        .await?;
    assert!(query.is_forward_only());

    let mut res = query.exec(params![1, "c"]).await?;
    let mut found = Vec::new();
    while res.next() {
        found.push(res.deserialize::<Row>()?);
    }
    let rows = test_data();
    assert_eq!(found, vec![rows[0].clone(), rows[2].clone()]);

    // reuse with new parameters
    let mut res = query.exec(params![4, "none"]).await?;
    assert!(res.next());
    assert_eq!(res.scalar::<i64>(), Some(4));
    assert!(!res.next());
    Ok(())
}

#[tokio::test]
async fn fetch_tuple_list_and_map() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    let rows = test_data();

    let mut res = db.exec_query(SELECT_ABCD).await?;
    let mut list = Vec::new();
    let mut map = BTreeMap::new();
    let mut i = 0;
    while res.next() {
        let row = &rows[i];

        let (a, b, c, d) = res.fetch::<(i64, i64, i64, String)>()?;
        assert_eq!((a, b, c, d.as_str()), (row.a, row.b, row.c, row.d.as_str()));

        res.fetch_list(&mut list);
        assert_eq!(list, row_values![row.a, row.b, row.c, row.d.as_str()]);
        assert_eq!(res.to_list(), list);

        res.fetch_map(&mut map);
        assert_eq!(map.len(), 4);
        assert_eq!(map["a"], RowValues::Int(row.a));
        assert_eq!(map["d"], RowValues::Text(row.d.clone()));
        assert_eq!(res.to_map(), map);

        i += 1;
    }
    assert_eq!(i, rows.len());
    Ok(())
}

#[tokio::test]
async fn fetch_string_list_renders_every_cell() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    let rows = test_data();

    let mut res = db.exec_query(SELECT_ABCD).await?;
    let mut strings = Vec::new();
    let mut i = 0;
    while res.next() {
        let row = &rows[i];
        let expected = vec![
            row.a.to_string(),
            row.b.to_string(),
            row.c.to_string(),
            row.d.clone(),
        ];
        res.fetch_string_list(&mut strings);
        assert_eq!(strings, expected);
        assert_eq!(res.to_vector::<String>(false), expected);
        i += 1;
    }
    assert_eq!(i, rows.len());
    Ok(())
}

#[tokio::test]
async fn fetch_object_overwrites_matching_fields() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let mut res = db.exec_query("SELECT a, d FROM testTable ORDER BY a").await?;
    assert!(res.last());

    let mut target = Row {
        a: 0,
        b: 42,
        c: 43,
        d: String::new(),
    };
    res.fetch_object(&mut target)?;
    assert_eq!(
        target,
        Row {
            a: 7,
            b: 42,
            c: 43,
            d: "c".into()
        }
    );
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Flag {
    id: i64,
    active: bool,
    seen: chrono::NaiveDateTime,
}

#[tokio::test]
async fn struct_mapping_reads_sqlite_bools_and_timestamps() -> Result<(), Box<dyn std::error::Error>>
{
    let db = Database::open_in_memory().await?;
    db.exec_non_query("CREATE TABLE f (id int, active int, seen text)")
        .await?;
    let seen = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(10, 20, 30))
        .ok_or("bad date")?;
    db.insert_into("f (id, active, seen)")
        .values(row_values![1, true, seen])
        .values(row_values![2, false, "2024-03-02 08:00:00"])
        .exec()
        .await?;

    let mut res = db.exec_query("SELECT id, active, seen FROM f ORDER BY id").await?;
    assert!(res.next());
    assert_eq!(res.value_by_name("active"), Some(&RowValues::Int(1)));
    let flag = res.deserialize::<Flag>()?;
    assert_eq!(
        flag,
        Flag {
            id: 1,
            active: true,
            seen
        }
    );

    assert!(res.next());
    let mut target = flag.clone();
    res.fetch_object(&mut target)?;
    assert_eq!(target.id, 2);
    assert!(!target.active);
    assert_eq!(target.seen.to_string(), "2024-03-02 08:00:00");
    Ok(())
}

#[tokio::test]
async fn int_vector_skips_unparsable_text() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    let rows = test_data();

    let mut res = db.exec_query(SELECT_ABCD).await?;
    let mut i = 0;
    while res.next() {
        let row = &rows[i];
        assert_eq!(res.to_vector::<i64>(false), vec![row.a, row.b, row.c]);
        i += 1;
    }
    assert_eq!(i, rows.len());
    Ok(())
}

#[tokio::test]
async fn parse_to_int_vector_honours_base() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;
    let rows = test_data();

    let mut res = db.exec_query(SELECT_ABCD).await?;
    let mut i = 0;
    while res.next() {
        let row = &rows[i];
        // "a", "b" and "c" do not parse in base 10
        assert_eq!(res.parse_to_int_vector(10, false)?, vec![row.a, row.b, row.c]);

        let hex = i64::from_str_radix(&row.d, 16)?;
        assert_eq!(
            res.parse_to_int_vector(16, false)?,
            vec![row.a, row.b, row.c, hex]
        );
        i += 1;
    }
    assert_eq!(i, rows.len());

    assert!(matches!(
        res.parse_to_int_vector(1, false),
        Err(EasySqlError::ParameterError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn bool_vector_uses_truthiness() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let mut res = db.exec_query(SELECT_ABCD).await?;
    let mut i = 0;
    while res.next() {
        assert_eq!(res.to_vector::<bool>(false), vec![true, true, true, true]);
        i += 1;
    }
    assert_eq!(i, 3);

    let mut res = db.exec_query("SELECT 0, 1, 'false', '', NULL").await?;
    assert!(res.next());
    assert_eq!(
        res.to_vector::<bool>(false),
        vec![false, true, false, false, false]
    );
    assert_eq!(res.to_vector::<bool>(true), vec![false, true, false, false]);
    Ok(())
}

#[tokio::test]
async fn scrollable_navigation() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let mut res = db.exec_query("SELECT a FROM testTable ORDER BY a").await?;
    assert!(!res.is_forward_only());
    assert_eq!(res.at(), CursorPosition::BeforeFirst);
    assert!(!res.is_valid());

    assert!(res.last());
    assert_eq!(res.scalar::<i64>(), Some(7));
    assert!(res.previous());
    assert_eq!(res.scalar::<i64>(), Some(4));
    assert!(res.first());
    assert_eq!(res.at(), CursorPosition::Row(0));
    assert!(res.seek(2, true));
    assert_eq!(res.scalar::<i64>(), Some(7));
    assert!(!res.next());
    assert_eq!(res.at(), CursorPosition::AfterLast);
    assert_eq!(res.scalar_value(), None);
    assert!(res.seek(1, false));
    assert_eq!(res.scalar::<i64>(), Some(4));
    assert!(!res.seek(-5, true));
    assert_eq!(res.at(), CursorPosition::BeforeFirst);
    Ok(())
}

#[tokio::test]
async fn forward_only_results_do_not_scroll_back() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let query = db.prepare("SELECT a FROM testTable ORDER BY a").await?;
    let mut res = query.exec(params![]).await?;
    assert!(res.next());
    assert!(res.next());
    assert!(!res.previous());
    assert!(!res.first());
    assert!(!res.seek(0, false));
    assert_eq!(res.scalar::<i64>(), Some(4));
    assert!(res.last());
    assert_eq!(res.scalar::<i64>(), Some(7));

    let scrollable = db
        .prepare_with("SELECT a FROM testTable ORDER BY a", false)
        .await?;
    let mut res = scrollable.exec(params![]).await?;
    assert!(res.last());
    assert!(res.first());
    assert_eq!(res.scalar::<i64>(), Some(1));
    Ok(())
}

#[tokio::test]
async fn next_result_deactivates_the_cursor() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let mut res = db.exec_query(SELECT_ABCD).await?;
    assert!(res.is_active());
    assert!(res.next());
    assert!(!res.next_result());
    assert!(!res.is_active());
    assert!(!res.next());
    assert_eq!(res.to_json(), serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn scalar_helpers_on_the_executor() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let total: i64 = db.scalar("SELECT SUM(a) FROM testTable").await?;
    assert_eq!(total, 12);
    let avg: f64 = db.scalar("SELECT AVG(b) FROM testTable").await?;
    assert!((avg - 5.0).abs() < f64::EPSILON);
    let name: String = db.scalar("SELECT d FROM testTable WHERE a = 4").await?;
    assert_eq!(name, "b");

    // no rows converts like NULL
    let missing: i64 = db.scalar("SELECT a FROM testTable WHERE a = 100").await?;
    assert_eq!(missing, 0);
    assert_eq!(
        db.scalar_value("SELECT a FROM testTable WHERE a = 100").await?,
        RowValues::Null
    );
    let optional: Option<String> = db.scalar("SELECT NULL").await?;
    assert_eq!(optional, None);

    let err = db
        .scalar::<chrono::NaiveDateTime>("SELECT a FROM testTable")
        .await
        .unwrap_err();
    assert!(matches!(err, EasySqlError::ConversionError(_)));
    Ok(())
}

#[tokio::test]
async fn row_json_uses_column_names() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let mut res = db.exec_query("SELECT a, d FROM testTable WHERE a = 1").await?;
    assert!(res.next());
    assert_eq!(res.to_json(), serde_json::json!({ "a": 1, "d": "a" }));
    Ok(())
}

#[tokio::test]
async fn failed_query_reports_its_sql() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup().await?;

    let err = db.exec_query("SELECT nope FROM testTable").await.unwrap_err();
    assert_eq!(err.last_query(), Some("SELECT nope FROM testTable"));
    assert!(matches!(err, EasySqlError::QueryError { .. }));

    let err = db.prepare("SELEC 1").await.err().unwrap();
    assert_eq!(err.last_query(), Some("SELEC 1"));
    Ok(())
}
