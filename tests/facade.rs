mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sqlfacade::drivers::{InMemoryDriver, InMemoryResponseBuilder};
use sqlfacade::{
    ConnectionState, Database, DbConfig, DbError, Driver, Registry, ResolveKind, Severity, SqlValue,
    Timeouts,
};

use common::{connected, facade, init_tracing, registry_for, RecordingLogger};

#[tokio::test]
async fn test_query_without_driver_fails_fast() {
    let driver = InMemoryDriver::new();
    let (mut db, logger) = facade(&driver, false);

    let err = db.query("SELECT 1", &[]).await.unwrap_err();

    assert!(matches!(err, DbError::NoDriver));
    assert_eq!(db.state(), ConnectionState::Uninitialized);
    assert!(logger.has(Severity::Error, "No driver"));
    assert!(!logger.has(Severity::Debug, "successfully"));
    assert!(db.result("SELECT 1").is_none());
    driver.assert_query_count(0);
}

#[tokio::test]
async fn test_every_operation_requires_a_driver() {
    let driver = InMemoryDriver::new();
    let (mut db, _logger) = facade(&driver, true);

    assert!(matches!(
        db.connect("localhost", "app", "secret").await,
        Err(DbError::NoDriver)
    ));
    assert!(matches!(db.database("shop", false).await, Err(DbError::NoDriver)));
    assert!(matches!(
        db.bind("SELECT 1", &HashMap::new()).await,
        Err(DbError::NoDriver)
    ));
    assert!(matches!(db.table(&["users"]), Err(DbError::NoDriver)));
    assert_eq!(db.last_error().await, "");
    assert!(db.driver_name().await.is_none());
}

#[tokio::test]
async fn test_unknown_driver_is_reported() {
    let driver = InMemoryDriver::new();
    let (mut db, logger) = facade(&driver, false);

    match db.select_driver("oracle") {
        Err(DbError::DriverNotFound { kind, name }) => {
            assert_eq!(kind, ResolveKind::Driver);
            assert_eq!(name, "oracle");
        }
        other => panic!("Expected DriverNotFound, got {other:?}"),
    }
    assert_eq!(db.state(), ConnectionState::Uninitialized);
    assert!(logger.has(Severity::Error, "oracle"));
}

#[tokio::test]
async fn test_state_transitions_on_success() {
    let driver = InMemoryDriver::new()
        .with_credentials("app", "secret")
        .with_database("shop");
    let (mut db, logger) = facade(&driver, false);

    db.select_driver("Memory").unwrap();
    assert_eq!(db.state(), ConnectionState::DriverSelected);
    assert_eq!(db.driver_name().await.as_deref(), Some("memory"));
    assert!(logger.has(Severity::Debug, "No query builder"));

    db.connect("localhost", "app", "secret").await.unwrap();
    assert_eq!(db.state(), ConnectionState::Connected);
    assert_eq!(db.last_error().await, "");

    db.database("shop", false).await.unwrap();
    assert_eq!(db.state(), ConnectionState::DatabaseSelected);
    assert_eq!(db.database_error(), "");
    assert_eq!(driver.current_database().as_deref(), Some("shop"));
}

#[tokio::test]
async fn test_bad_credentials_keep_driver_selected() {
    let driver = InMemoryDriver::new().with_credentials("app", "secret");
    let (mut db, logger) = facade(&driver, false);
    db.select_driver("memory").unwrap();

    let err = db.connect("localhost", "app", "wrong").await.unwrap_err();

    assert!(matches!(err, DbError::Connect(_)));
    assert_eq!(db.state(), ConnectionState::DriverSelected);
    assert!(!db.last_error().await.is_empty());
    assert!(logger.has(Severity::Error, "Cannot connect"));

    // a later attempt may still succeed
    db.connect("localhost", "app", "secret").await.unwrap();
    assert_eq!(db.state(), ConnectionState::Connected);
    assert_eq!(db.last_error().await, "");
}

#[tokio::test]
async fn test_database_selection_failure_and_force_create() {
    let driver = InMemoryDriver::new().with_database("shop");
    let (mut db, logger) = connected(&driver, false).await;

    let err = db.database("archive", false).await.unwrap_err();
    assert!(matches!(err, DbError::Select(_)));
    assert_eq!(db.state(), ConnectionState::Connected);
    assert!(db.database_error().contains("archive"));
    assert!(logger.has(Severity::Error, "Cannot select database 'archive'"));

    db.database("archive", true).await.unwrap();
    assert_eq!(db.state(), ConnectionState::DatabaseSelected);
    assert_eq!(db.database_error(), "");
    assert_eq!(driver.current_database().as_deref(), Some("archive"));
}

#[tokio::test]
async fn test_database_without_connection_is_select_error() {
    let driver = InMemoryDriver::new();
    let (mut db, _logger) = facade(&driver, false);
    db.select_driver("memory").unwrap();

    let err = db.database("shop", false).await.unwrap_err();
    assert!(matches!(err, DbError::Select(_)));
    assert_eq!(db.state(), ConnectionState::DriverSelected);
}

#[tokio::test]
async fn test_positional_query_end_to_end() {
    init_tracing();
    let driver = InMemoryDriver::new().with_response(
        InMemoryResponseBuilder::new()
            .columns(&["a", "b"])
            .row(&["x", "y"])
            .row(&["x", "y"])
            .build(),
    );
    let (mut db, logger) = connected(&driver, false).await;

    let template = "SELECT * FROM t WHERE a=? AND b=?";
    let result = db
        .query(template, &[SqlValue::from("x"), SqlValue::from("y")])
        .await
        .unwrap();

    driver.assert_last_query("SELECT * FROM t WHERE a='x' AND b='y'");
    assert_eq!(result.sql(), "SELECT * FROM t WHERE a='x' AND b='y'");
    assert_eq!(result.count(), 2);
    assert!(logger.has(
        Severity::Debug,
        "Execute query 'SELECT * FROM t WHERE a='x' AND b='y'' successfully, return 2 result"
    ));

    let stored = db.result(template).unwrap();
    assert!(Arc::ptr_eq(&stored, &result));
}

#[tokio::test]
async fn test_injection_attempt_stays_literal() {
    let driver = InMemoryDriver::new();
    let (mut db, _logger) = connected(&driver, false).await;

    db.query(
        "SELECT * FROM users WHERE name = ?",
        &[SqlValue::from("'; DROP TABLE users; --")],
    )
    .await
    .unwrap();

    driver.assert_query_count(1);
    driver.assert_last_query("SELECT * FROM users WHERE name = '''; DROP TABLE users; --'");
}

#[tokio::test]
async fn test_too_few_values_executes_nothing() {
    let driver = InMemoryDriver::new();
    let (mut db, logger) = connected(&driver, false).await;

    let err = db
        .query("SELECT * FROM t WHERE a=? AND b=?", &[SqlValue::from("x")])
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::BindArity { markers: 2, supplied: 1 }));
    driver.assert_query_count(0);
    assert!(db.result("SELECT * FROM t WHERE a=? AND b=?").is_none());
    assert!(logger.has(Severity::Error, "SELECT * FROM t WHERE a=? AND b=?"));
}

#[tokio::test]
async fn test_extra_values_are_ignored() {
    let driver = InMemoryDriver::new();
    let (db, logger) = connected(&driver, false).await;

    db.query("SELECT * FROM t WHERE a=?", &["x".into(), "unused".into()])
        .await
        .unwrap();
    driver.assert_last_query("SELECT * FROM t WHERE a='x'");
    assert!(logger.has(
        Severity::Warn,
        "Ignoring 1 bound value(s) without a placeholder in 'SELECT * FROM t WHERE a=?'"
    ));

    db.query("SELECT 1", &["unused".into()]).await.unwrap();
    driver.assert_last_query("SELECT 1");
    assert_eq!(logger.count(Severity::Warn), 2);
}

#[tokio::test]
async fn test_negative_values_never_form_a_comment() {
    let driver = InMemoryDriver::new();
    let (db, _logger) = connected(&driver, false).await;

    db.query(
        "UPDATE accounts SET balance = balance-? WHERE id = ?",
        &[SqlValue::Int32(-5), SqlValue::Int32(3)],
    )
    .await
    .unwrap();
    driver.assert_last_query("UPDATE accounts SET balance = balance-(-5) WHERE id = 3");

    db.query("SELECT 10-?", &[SqlValue::Float(-4.0)]).await.unwrap();
    driver.assert_last_query("SELECT 10-(-4)");
}

#[tokio::test]
async fn test_query_without_data_runs_verbatim() {
    let driver = InMemoryDriver::new();
    let (mut db, _logger) = connected(&driver, false).await;

    db.query("SELECT '?' AS mark", &[]).await.unwrap();
    driver.assert_last_query("SELECT '?' AS mark");
}

#[tokio::test]
async fn test_memo_is_last_write_wins() {
    let driver = InMemoryDriver::new().with_responses([
        InMemoryResponseBuilder::new().columns(&["n"]).row(&["1"]).build(),
        InMemoryResponseBuilder::new()
            .columns(&["n"])
            .row(&["1"])
            .row(&["2"])
            .build(),
    ]);
    let (mut db, _logger) = connected(&driver, false).await;

    let template = "SELECT n FROM t WHERE g = ?";
    db.query(template, &[1.into()]).await.unwrap();
    assert_eq!(db.result(template).unwrap().count(), 1);

    db.query(template, &[2.into()]).await.unwrap();
    let latest = db.result(template).unwrap();
    assert_eq!(latest.count(), 2);
    assert_eq!(latest.sql(), "SELECT n FROM t WHERE g = 2");
}

#[tokio::test]
async fn test_backend_rejection_is_reported_and_kept() {
    let driver = InMemoryDriver::new().reject_containing("SELEC ", "You have an error in your SQL syntax");
    let (mut db, logger) = connected(&driver, false).await;

    let err = db.query("SELEC 1", &[]).await.unwrap_err();

    match err {
        DbError::QueryExecution { sql, message } => {
            assert_eq!(sql, "SELEC 1");
            assert_eq!(message, "You have an error in your SQL syntax");
        }
        other => panic!("Expected QueryExecution, got {other:?}"),
    }
    let stored = db.result("SELEC 1").unwrap();
    assert!(stored.is_error());
    assert_eq!(db.last_error().await, "You have an error in your SQL syntax");
    assert!(logger.has(Severity::Error, "Execute query 'SELEC 1' with error"));
    assert!(!logger.has(Severity::Debug, "successfully"));
}

#[tokio::test]
async fn test_named_bind() {
    let driver = InMemoryDriver::new().with_response(InMemoryResponseBuilder::new().affected(1).build());
    let (mut db, _logger) = connected(&driver, false).await;

    let mut data = HashMap::new();
    data.insert("name".to_string(), SqlValue::from("Ann"));
    data.insert("id".to_string(), SqlValue::Int64(7));

    let template = "UPDATE users SET name = :name WHERE id = :id";
    let result = db.bind(template, &data).await.unwrap();

    driver.assert_last_query("UPDATE users SET name = 'Ann' WHERE id = 7");
    assert_eq!(result.count(), 1);
    assert!(db.result(template).is_some());
}

#[tokio::test]
async fn test_named_bind_missing_key() {
    let driver = InMemoryDriver::new();
    let (mut db, _logger) = connected(&driver, false).await;

    let err = db
        .bind("SELECT * FROM users WHERE id = :id", &HashMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::BindKey(ref k) if k == "id"));
    driver.assert_query_count(0);
}

#[tokio::test]
async fn test_named_bind_with_empty_data_still_executes() {
    let driver = InMemoryDriver::new();
    let (mut db, _logger) = connected(&driver, false).await;

    db.bind("SELECT 1", &HashMap::new()).await.unwrap();
    driver.assert_last_query("SELECT 1");
}

#[tokio::test]
async fn test_query_before_connect_is_not_connected() {
    let driver = InMemoryDriver::new();
    let (mut db, _logger) = facade(&driver, false);
    db.select_driver("memory").unwrap();

    let err = db.query("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::NotConnected));
}

#[tokio::test]
async fn test_query_timeout() {
    let driver = InMemoryDriver::new().with_delay(Duration::from_millis(500));
    let (db, logger) = facade(&driver, false);
    let mut db = db.with_timeouts(Timeouts {
        connect: None,
        query: Some(Duration::from_millis(20)),
    });
    db.select_driver("memory").unwrap();
    db.connect("localhost", "app", "secret").await.unwrap();

    let err = db.query("SELECT SLEEP(1)", &[]).await.unwrap_err();

    match err {
        DbError::Timeout { operation, after } => {
            assert_eq!(operation, "query");
            assert_eq!(after, Duration::from_millis(20));
        }
        other => panic!("Expected Timeout, got {other:?}"),
    }
    assert!(db.result("SELECT SLEEP(1)").is_none());
    assert!(logger.has(Severity::Error, "timed out"));
}

#[tokio::test]
async fn test_from_config_without_config_is_uninitialized() {
    let driver = InMemoryDriver::new();
    let logger = Arc::new(RecordingLogger::default());

    let db = Database::from_config(None, registry_for(&driver, false), logger.clone())
        .await
        .unwrap();

    assert_eq!(db.state(), ConnectionState::Uninitialized);
    assert!(logger.entries().is_empty());
}

#[tokio::test]
async fn test_from_config_applies_driver_connection_and_database() {
    let driver = InMemoryDriver::new()
        .with_credentials("app", "secret")
        .with_database("shop");
    let config = DbConfig::from_json_str(
        r#"{"driver": "memory", "host": "db:3306", "username": "app",
            "password": "secret", "database": "shop", "query_timeout_secs": 5}"#,
    )
    .unwrap();

    let db = Database::from_config(
        Some(config),
        registry_for(&driver, false),
        Arc::new(RecordingLogger::default()),
    )
    .await
    .unwrap();

    assert_eq!(db.state(), ConnectionState::DatabaseSelected);
    assert_eq!(driver.current_database().as_deref(), Some("shop"));
}

#[tokio::test]
async fn test_from_config_without_driver_warns() {
    let driver = InMemoryDriver::new();
    let logger = Arc::new(RecordingLogger::default());
    let config = DbConfig::from_json_str(r#"{"host": "localhost"}"#).unwrap();

    let db = Database::from_config(Some(config), registry_for(&driver, false), logger.clone())
        .await
        .unwrap();

    assert_eq!(db.state(), ConnectionState::Uninitialized);
    assert!(logger.has(Severity::Warn, "no driver"));
}

#[tokio::test]
async fn test_from_config_with_bad_credentials_fails() {
    let driver = InMemoryDriver::new().with_credentials("app", "secret");
    let config = DbConfig::from_json_str(
        r#"{"driver": "memory", "host": "localhost", "username": "app", "password": "nope"}"#,
    )
    .unwrap();

    let outcome = Database::from_config(
        Some(config),
        registry_for(&driver, false),
        Arc::new(RecordingLogger::default()),
    )
    .await;

    assert!(matches!(outcome, Err(DbError::Connect(_))));
    assert!(!driver.is_connected());
}

#[tokio::test]
async fn test_close_disconnects() {
    let driver = InMemoryDriver::new();
    let (db, _logger) = connected(&driver, false).await;

    db.close().await.unwrap();
    assert!(!driver.is_connected());
}

#[tokio::test]
async fn test_selecting_a_new_driver_resets_state() {
    let driver = InMemoryDriver::new();
    let (mut db, logger) = connected(&driver, false).await;
    assert_eq!(db.state(), ConnectionState::Connected);

    db.select_driver("memory").unwrap();
    assert_eq!(db.state(), ConnectionState::DriverSelected);
    assert_eq!(logger.count(Severity::Info), 3);
}

#[test]
fn test_default_registry_knows_mysql() {
    let registry = Registry::with_defaults();
    assert!(registry.has_driver("MySQL"));
    assert!(registry.has_driver("postgres"));
}
