use easy_sql::prelude::*;
use tempfile::tempdir;

#[tokio::test]
async fn unknown_connection_name_is_a_config_error() {
    let factory = SqlFactory::new();
    let err = factory.get_database("nowhere").await.unwrap_err();
    assert!(matches!(err, EasySqlError::ConfigError(_)));
}

#[tokio::test]
async fn in_memory_connection_is_shared_between_checkouts() -> Result<(), Box<dyn std::error::Error>>
{
    let factory = SqlFactory::new();
    factory.config_default(DbSetting::sqlite_in_memory()).await;

    {
        let db = factory.get_database(DEFAULT_CONNECTION).await?;
        assert!(db.is_pooled());
        db.exec_non_query("CREATE TABLE t (a int)").await?;
        db.insert_into("t (a)").values(row_values![1]).exec().await?;
    }

    let db = factory.get_database(DEFAULT_CONNECTION).await?;
    let count: i64 = db.scalar("SELECT COUNT(*) FROM t").await?;
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn reconfiguring_a_name_replaces_its_pool() -> Result<(), Box<dyn std::error::Error>> {
    let factory = SqlFactory::new();
    factory.config(DbSetting::sqlite_in_memory(), "scratch").await;

    {
        let db = factory.get_database("scratch").await?;
        db.exec_non_query("CREATE TABLE t (a int)").await?;
    }

    factory.config(DbSetting::sqlite_in_memory(), "scratch").await;
    let db = factory.get_database("scratch").await?;
    assert!(db.exec_query("SELECT * FROM t").await.is_err());
    Ok(())
}

#[tokio::test]
async fn json_configuration_with_file_databases() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let main = dir.path().join("main.db");
    let logs = dir.path().join("logs.db");
    let json = serde_json::json!({
        "main": { "type": "sqlite", "db_name": main, "pool_size": 2 },
        "logs": { "db_name": logs },
    })
    .to_string();

    let factory = SqlFactory::new();
    assert_eq!(factory.configure_from_json(&json).await?, 2);
    assert_eq!(factory.connection_names().await, vec!["logs", "main"]);
    assert_eq!(
        factory.setting("main").await.and_then(|s| s.pool_size),
        Some(2)
    );

    let writer = factory.get_database("main").await?;
    let reader = factory.get_database("main").await?;
    writer
        .exec_non_query("CREATE TABLE t (a int)")
        .await?;
    writer.insert_into("t (a)").values(row_values![5]).exec().await?;
    let a: i64 = reader.scalar("SELECT a FROM t").await?;
    assert_eq!(a, 5);

    let logs_db = factory.get_database("logs").await?;
    assert!(logs_db.exec_query("SELECT a FROM t").await.is_err());

    assert!(factory.remove("logs").await);
    assert!(!factory.remove("logs").await);
    assert_eq!(factory.connection_names().await, vec!["main"]);
    Ok(())
}

#[tokio::test]
async fn configuration_file_is_read() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config_path = dir.path().join("connections.json");
    std::fs::write(
        &config_path,
        r#"{ "default": { "type": "sqlite", "db_name": ":memory:" } }"#,
    )?;

    let config = FactoryConfig::from_file(&config_path)?;
    assert_eq!(config.0[DEFAULT_CONNECTION], DbSetting::sqlite_in_memory());

    let missing = FactoryConfig::from_file(&dir.path().join("missing.json"));
    assert!(matches!(missing, Err(EasySqlError::ConfigError(_))));
    Ok(())
}

#[tokio::test]
async fn network_settings_open_sqlite_by_name() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("net.db");
    let setting = DbSetting::new(
        DatabaseType::Sqlite,
        "localhost",
        Some(5432),
        "user",
        "secret",
        path.to_str().ok_or("non-utf8 temp path")?,
    );

    let db = Database::connect(&setting).await?;
    assert!(!db.is_pooled());
    assert!(db.path().ends_with("net.db"));
    Ok(())
}

#[tokio::test]
async fn global_instance_is_shared() -> Result<(), Box<dyn std::error::Error>> {
    let name = "global_instance_is_shared";
    SqlFactory::instance()
        .config(DbSetting::sqlite_in_memory(), name)
        .await;
    assert!(SqlFactory::instance().setting(name).await.is_some());

    let db = SqlFactory::instance().get_database(name).await?;
    let one: i64 = db.scalar("SELECT 1").await?;
    assert_eq!(one, 1);

    drop(db);
    assert!(SqlFactory::instance().remove(name).await);
    Ok(())
}
