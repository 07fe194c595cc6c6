//! The execute-family surface.
//!
//! Every call resolves a fresh connection from the registry, opens it, runs
//! its single command, and closes the connection on every exit path. No
//! connection, command, or row cursor outlives the call that created it, so
//! concurrent calls on one helper are independent.

use tracing::debug;

use crate::driver::{ConnectionSpec, DriverConnection, DriverRegistry};
use crate::error::AccessResult;
use crate::mapper::{FromSql, MapRow};
use crate::params::Parameters;
use crate::row::{ResultSet, SqlValue};

/// Driver-agnostic SQL execution helper.
///
/// Constructed once with a driver identity and connection string; each
/// execute call opens its own connection. See the crate docs for the
/// built-in driver identities.
///
/// ```no_run
/// # async fn demo() -> db_access::AccessResult<()> {
/// use db_access::{AccessHelper, Parameters};
///
/// let helper = AccessHelper::new(
///     "sqlx-sqlite",
///     "sqlx::sqlite::SqliteConnection",
///     "sqlite:application.db?mode=rwc",
/// )?;
/// helper
///     .execute_non_query("CREATE TABLE IF NOT EXISTS mytable (id int)", None)
///     .await?;
/// let rows = helper
///     .execute_list(
///         "SELECT * FROM mytable WHERE id = @id",
///         Some(&Parameters::new().with("id", 2i64)),
///     )
///     .await?;
/// # let _ = rows;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AccessHelper {
    spec: ConnectionSpec,
    registry: DriverRegistry,
}

impl AccessHelper {
    /// Create a helper using the built-in driver registry.
    ///
    /// Fails with a configuration error when the package or type name is
    /// empty; no connection attempt is made here.
    pub fn new(
        package: impl Into<String>,
        type_name: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> AccessResult<Self> {
        Self::with_registry(
            package,
            type_name,
            connection_string,
            DriverRegistry::builtin(),
        )
    }

    /// Create a helper over a caller-supplied registry (custom or test
    /// drivers).
    pub fn with_registry(
        package: impl Into<String>,
        type_name: impl Into<String>,
        connection_string: impl Into<String>,
        registry: DriverRegistry,
    ) -> AccessResult<Self> {
        Ok(Self {
            spec: ConnectionSpec::new(package, type_name, connection_string)?,
            registry,
        })
    }

    /// The immutable driver identity and connection string.
    pub fn spec(&self) -> &ConnectionSpec {
        &self.spec
    }

    /// The registry this helper resolves drivers from.
    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Execute a statement and return the affected row count.
    pub async fn execute_non_query(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<u64> {
        let empty = Parameters::new();
        let params = params.unwrap_or(&empty);
        let mut conn = self.connect().await?;
        let result = conn.execute(sql, params).await;
        finish(conn, result).await
    }

    /// Execute a query and return the first column of the first row of the
    /// first result set. `None` when the query produced no rows;
    /// `Some(SqlValue::Null)` when the value itself is SQL NULL.
    pub async fn execute_scalar(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Option<SqlValue>> {
        let rows = self.execute_list(sql, params).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.iter().next().map(|cell| cell.value.clone())))
    }

    /// Typed [`execute_scalar`](AccessHelper::execute_scalar). A NULL value
    /// fails coercion unless `T` is an `Option`.
    pub async fn execute_scalar_as<T: FromSql>(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Option<T>> {
        match self.execute_scalar(sql, params).await? {
            Some(value) => T::from_sql(&value).map(Some),
            None => Ok(None),
        }
    }

    /// Execute a query and return the first result set as raw rows. An
    /// empty result yields an empty set.
    pub async fn execute_list(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<ResultSet> {
        Ok(self
            .execute_lists(sql, params)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    /// Typed [`execute_list`](AccessHelper::execute_list).
    pub async fn execute_list_as<T: MapRow>(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Vec<T>> {
        let rows = self.execute_list(sql, params).await?;
        T::map_rows(&rows)
    }

    /// Execute a statement batch and return one result set per statement.
    pub async fn execute_lists(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Vec<ResultSet>> {
        let empty = Parameters::new();
        let params = params.unwrap_or(&empty);
        let mut conn = self.connect().await?;
        let result = conn.query(sql, params).await;
        finish(conn, result).await
    }

    /// Typed [`execute_lists`](AccessHelper::execute_lists).
    pub async fn execute_lists_as<T: MapRow>(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Vec<Vec<T>>> {
        let sets = self.execute_lists(sql, params).await?;
        sets.iter().map(|set| T::map_rows(set)).collect()
    }

    async fn connect(&self) -> AccessResult<Box<dyn DriverConnection>> {
        let mut conn = self.registry.resolve(&self.spec)?;
        debug!(
            package = self.spec.package(),
            type_name = self.spec.type_name(),
            connection = %self.spec.masked_connection_string(),
            "opening connection"
        );
        conn.open().await?;
        Ok(conn)
    }
}

// Close on every exit path; the operation's error wins over a close error.
async fn finish<T>(
    mut conn: Box<dyn DriverConnection>,
    result: AccessResult<T>,
) -> AccessResult<T> {
    let closed = conn.close().await;
    let value = result?;
    closed?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;
    use crate::error::AccessError;
    use crate::row::RawRow;

    fn memory_helper() -> (MemoryDriver, AccessHelper) {
        let driver = MemoryDriver::new();
        let mut registry = DriverRegistry::builtin();
        driver.register_into(&mut registry, "mem", "mem::Connection");
        let helper =
            AccessHelper::with_registry("mem", "mem::Connection", "mem:test", registry).unwrap();
        (driver, helper)
    }

    #[test]
    fn test_empty_identity_fails_before_any_connection() {
        let err = AccessHelper::new("", "sqlx::sqlite::SqliteConnection", "sqlite:x.db")
            .unwrap_err();
        assert!(matches!(err, AccessError::Configuration { .. }));

        let err = AccessHelper::new("sqlx-sqlite", "", "sqlite:x.db").unwrap_err();
        assert!(matches!(err, AccessError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_unregistered_driver_surfaces_resolution_error() {
        let helper = AccessHelper::new("no-such-pkg", "no::such::Type", "x:").unwrap();
        let err = helper.execute_non_query("SELECT 1", None).await.unwrap_err();
        assert!(matches!(err, AccessError::DriverResolution { .. }));
    }

    #[tokio::test]
    async fn test_every_call_opens_and_closes_its_own_connection() {
        let (driver, helper) = memory_helper();
        helper.execute_non_query("CREATE TABLE t (id int)", None).await.unwrap();
        helper.execute_list("SELECT * FROM t", None).await.unwrap();
        helper.execute_scalar("SELECT 1", None).await.unwrap();
        assert_eq!(driver.opened(), 3);
        assert_eq!(driver.closed(), 3);
    }

    #[tokio::test]
    async fn test_connection_closed_when_execution_fails() {
        let (driver, helper) = memory_helper();
        driver.fail_next("boom");
        let err = helper.execute_non_query("INSERT", None).await.unwrap_err();
        assert!(matches!(err, AccessError::Execution { .. }));
        assert_eq!(driver.opened(), 1);
        assert_eq!(driver.closed(), 1);
    }

    #[tokio::test]
    async fn test_scalar_distinguishes_no_rows_from_null() {
        let (driver, helper) = memory_helper();

        // No rows at all.
        assert_eq!(helper.execute_scalar("SELECT 1", None).await.unwrap(), None);

        // One row whose first value is NULL.
        let mut row = RawRow::new();
        row.push("v", "TEXT", SqlValue::Null).unwrap();
        driver.queue_rows(vec![row]);
        assert_eq!(
            helper.execute_scalar("SELECT NULL", None).await.unwrap(),
            Some(SqlValue::Null)
        );
    }

    #[tokio::test]
    async fn test_typed_scalar() {
        let (driver, helper) = memory_helper();
        let mut row = RawRow::new();
        row.push("n", "INTEGER", SqlValue::Int(42)).unwrap();
        driver.queue_rows(vec![row]);
        let n: Option<i64> = helper.execute_scalar_as("SELECT 42", None).await.unwrap();
        assert_eq!(n, Some(42));
    }

    #[tokio::test]
    async fn test_parameters_reach_the_driver_in_order() {
        let (driver, helper) = memory_helper();
        let params = Parameters::new().with("name", "x").with("id", 2i64);
        helper
            .execute_non_query("UPDATE t SET name = @name WHERE id = @id", Some(&params))
            .await
            .unwrap();
        let recorded = driver.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(
            recorded[0].params,
            vec![
                ("name".to_string(), SqlValue::Text("x".into())),
                ("id".to_string(), SqlValue::Int(2)),
            ]
        );
    }
}
