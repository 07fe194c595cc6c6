//! Integration tests against a file-backed SQLite database.
//!
//! Tests verify that:
//! - The execute family works end to end over the built-in SQLite driver
//! - Parameterized selects bind through the driver's own placeholders
//! - Statement batches produce one result set per statement
//! - Typed mapping works against real driver rows
//! - Concurrent calls use independent connections

use db_access::{AccessHelper, Parameters, SqlValue, map_record};
use tempfile::NamedTempFile;

static TRACING: std::sync::Once = std::sync::Once::new();

/// Create a helper over a fresh temp-file SQLite database.
/// Run with RUST_LOG=debug to see driver events.
fn setup_helper() -> AccessHelper {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
    let temp_file = NamedTempFile::new().unwrap();
    // Keep the temp file alive - prevent deletion when function returns
    let db_path = temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    AccessHelper::new(
        "sqlx-sqlite",
        "sqlx::sqlite::SqliteConnection",
        format!("sqlite:{}", db_path),
    )
    .unwrap()
}

/// Create a helper over a table seeded with rows id 0..9.
async fn setup_seeded_helper() -> AccessHelper {
    let helper = setup_helper();
    helper
        .execute_non_query("CREATE TABLE mytable (id int, name TEXT)", None)
        .await
        .unwrap();
    for i in 0..10i64 {
        let params = Parameters::new().with("id", i).with("name", format!("row-{}", i));
        let affected = helper
            .execute_non_query(
                "INSERT INTO mytable (id, name) VALUES (@id, @name)",
                Some(&params),
            )
            .await
            .unwrap();
        assert_eq!(affected, 1, "single-row insert affects exactly one row");
    }
    helper
}

#[tokio::test]
async fn test_select_with_parameter_returns_matching_row() {
    let helper = setup_seeded_helper().await;

    let params = Parameters::new().with("id", 2i64);
    let rows = helper
        .execute_list("SELECT * FROM mytable WHERE id = @id", Some(&params))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value("id"), Some(&SqlValue::Int(2)));
    assert_eq!(
        rows[0].value("name"),
        Some(&SqlValue::Text("row-2".to_string()))
    );
}

#[tokio::test]
async fn test_untyped_list_preserves_rows_and_columns() {
    let helper = setup_seeded_helper().await;

    let rows = helper
        .execute_list("SELECT id, name FROM mytable ORDER BY id", None)
        .await
        .unwrap();

    assert_eq!(rows.len(), 10);
    for (i, row) in rows.iter().enumerate() {
        let columns: Vec<_> = row.columns().collect();
        assert_eq!(columns, vec!["id", "name"]);
        assert_eq!(row.value("id"), Some(&SqlValue::Int(i as i64)));
    }
}

#[tokio::test]
async fn test_scalar_exists_check() {
    let helper = setup_seeded_helper().await;

    let exists: Option<i64> = helper
        .execute_scalar_as(
            "SELECT EXISTS (SELECT name FROM sqlite_master WHERE type='table' AND name='mytable')",
            None,
        )
        .await
        .unwrap();
    assert_eq!(exists, Some(1));

    let exists: Option<i64> = helper
        .execute_scalar_as(
            "SELECT EXISTS (SELECT name FROM sqlite_master WHERE type='table' AND name='missing')",
            None,
        )
        .await
        .unwrap();
    assert_eq!(exists, Some(0));
}

#[tokio::test]
async fn test_scalar_no_rows_is_none() {
    let helper = setup_seeded_helper().await;
    let value = helper
        .execute_scalar("SELECT id FROM mytable WHERE id = 999", None)
        .await
        .unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_statement_batch_yields_one_set_per_statement() {
    let helper = setup_helper();

    let sets = helper
        .execute_lists("SELECT 1; SELECT 2;", None)
        .await
        .unwrap();

    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].len(), 1);
    assert_eq!(sets[1].len(), 1);
    let first: Vec<_> = sets[0][0].iter().map(|c| c.value.clone()).collect();
    let second: Vec<_> = sets[1][0].iter().map(|c| c.value.clone()).collect();
    assert_eq!(first, vec![SqlValue::Int(1)]);
    assert_eq!(second, vec![SqlValue::Int(2)]);
}

#[tokio::test]
async fn test_empty_result_set_is_empty_not_error() {
    let helper = setup_seeded_helper().await;
    let rows = helper
        .execute_list("SELECT * FROM mytable WHERE id = -1", None)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_update_and_delete_affected_counts() {
    let helper = setup_seeded_helper().await;

    let affected = helper
        .execute_non_query("UPDATE mytable SET name = 'x' WHERE id < 3", None)
        .await
        .unwrap();
    assert_eq!(affected, 3);

    let affected = helper
        .execute_non_query("DELETE FROM mytable WHERE id >= 5", None)
        .await
        .unwrap();
    assert_eq!(affected, 5);
}

#[derive(Debug, Default, PartialEq)]
struct Person {
    id: i64,
    label: String,
    age: Option<i64>,
}

map_record!(Person {
    id,
    label => "name",
    age,
});

#[tokio::test]
async fn test_typed_mapping_with_alias_and_missing_column() {
    let helper = setup_seeded_helper().await;

    let params = Parameters::new().with("id", 4i64);
    let people: Vec<Person> = helper
        .execute_list_as("SELECT id, name FROM mytable WHERE id = @id", Some(&params))
        .await
        .unwrap();

    // "name" binds through the alias; no "age" column leaves the default.
    assert_eq!(
        people,
        vec![Person {
            id: 4,
            label: "row-4".to_string(),
            age: None,
        }]
    );
}

#[tokio::test]
async fn test_typed_mapping_null_column_into_option() {
    let helper = setup_helper();
    helper
        .execute_non_query("CREATE TABLE people (id int, name TEXT, age int)", None)
        .await
        .unwrap();
    helper
        .execute_non_query("INSERT INTO people VALUES (1, 'ann', NULL)", None)
        .await
        .unwrap();

    let people: Vec<Person> = helper
        .execute_list_as("SELECT id, name, age FROM people", None)
        .await
        .unwrap();
    assert_eq!(people[0].age, None);
}

#[tokio::test]
async fn test_blob_round_trip() {
    let helper = setup_helper();
    helper
        .execute_non_query("CREATE TABLE bin (data BLOB)", None)
        .await
        .unwrap();
    let params = Parameters::new().with("data", vec![0xDEu8, 0xAD, 0xBE, 0xEF]);
    helper
        .execute_non_query("INSERT INTO bin (data) VALUES (@data)", Some(&params))
        .await
        .unwrap();

    let rows = helper.execute_list("SELECT data FROM bin", None).await.unwrap();
    assert_eq!(
        rows[0].value("data"),
        Some(&SqlValue::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]))
    );
}

#[tokio::test]
async fn test_execution_error_propagates() {
    let helper = setup_helper();
    let err = helper
        .execute_list("SELECT * FROM no_such_table", None)
        .await
        .unwrap_err();
    assert!(matches!(err, db_access::AccessError::Execution { .. }));
}

#[tokio::test]
async fn test_concurrent_calls_use_independent_connections() {
    let helper = setup_seeded_helper().await;

    let low = helper.execute_list("SELECT id FROM mytable WHERE id < 5 ORDER BY id", None);
    let high = helper.execute_list("SELECT id FROM mytable WHERE id >= 5 ORDER BY id", None);
    let (low, high) = tokio::join!(low, high);

    let low = low.unwrap();
    let high = high.unwrap();
    assert_eq!(low.len(), 5);
    assert_eq!(high.len(), 5);
    assert_eq!(low[0].value("id"), Some(&SqlValue::Int(0)));
    assert_eq!(high[0].value("id"), Some(&SqlValue::Int(5)));
}

#[test]
fn test_blocking_facade_round_trip() {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let helper = db_access::blocking::AccessHelper::new(
        "sqlx-sqlite",
        "sqlx::sqlite::SqliteConnection",
        format!("sqlite:{}", db_path),
    )
    .unwrap();

    helper
        .execute_non_query("CREATE TABLE t (id int)", None)
        .unwrap();
    let affected = helper
        .execute_non_query(
            "INSERT INTO t (id) VALUES (@id)",
            Some(&Parameters::new().with("id", 1i64)),
        )
        .unwrap();
    assert_eq!(affected, 1);

    let count: Option<i64> = helper.execute_scalar_as("SELECT COUNT(*) FROM t", None).unwrap();
    assert_eq!(count, Some(1));

    let rows = helper.execute_list("SELECT id FROM t", None).unwrap();
    assert_eq!(rows.len(), 1);
}
