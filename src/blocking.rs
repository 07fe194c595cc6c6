//! Synchronous facade over the async helper.
//!
//! Owns a private current-thread tokio runtime and blocks on the async
//! implementation. Must not be used from inside an async context; use
//! [`crate::AccessHelper`] there instead.

use crate::driver::DriverRegistry;
use crate::error::{AccessError, AccessResult};
use crate::mapper::{FromSql, MapRow};
use crate::params::Parameters;
use crate::row::{ResultSet, SqlValue};

/// Blocking counterpart of [`crate::AccessHelper`], method for method.
pub struct AccessHelper {
    inner: crate::helper::AccessHelper,
    runtime: tokio::runtime::Runtime,
}

impl AccessHelper {
    /// Create a blocking helper using the built-in driver registry.
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

    /// Create a blocking helper over a caller-supplied registry.
    pub fn with_registry(
        package: impl Into<String>,
        type_name: impl Into<String>,
        connection_string: impl Into<String>,
        registry: DriverRegistry,
    ) -> AccessResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AccessError::internal(format!("Failed to start async runtime: {}", e)))?;
        Ok(Self {
            inner: crate::helper::AccessHelper::with_registry(
                package,
                type_name,
                connection_string,
                registry,
            )?,
            runtime,
        })
    }

    /// Execute a statement and return the affected row count.
    pub fn execute_non_query(&self, sql: &str, params: Option<&Parameters>) -> AccessResult<u64> {
        self.runtime.block_on(self.inner.execute_non_query(sql, params))
    }

    /// Execute a query and return the first column of the first row.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Option<SqlValue>> {
        self.runtime.block_on(self.inner.execute_scalar(sql, params))
    }

    /// Typed [`execute_scalar`](AccessHelper::execute_scalar).
    pub fn execute_scalar_as<T: FromSql>(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Option<T>> {
        self.runtime
            .block_on(self.inner.execute_scalar_as(sql, params))
    }

    /// Execute a query and return the first result set as raw rows.
    pub fn execute_list(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<ResultSet> {
        self.runtime.block_on(self.inner.execute_list(sql, params))
    }

    /// Typed [`execute_list`](AccessHelper::execute_list).
    pub fn execute_list_as<T: MapRow>(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Vec<T>> {
        self.runtime
            .block_on(self.inner.execute_list_as(sql, params))
    }

    /// Execute a statement batch and return one result set per statement.
    pub fn execute_lists(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Vec<ResultSet>> {
        self.runtime.block_on(self.inner.execute_lists(sql, params))
    }

    /// Typed [`execute_lists`](AccessHelper::execute_lists).
    pub fn execute_lists_as<T: MapRow>(
        &self,
        sql: &str,
        params: Option<&Parameters>,
    ) -> AccessResult<Vec<Vec<T>>> {
        self.runtime
            .block_on(self.inner.execute_lists_as(sql, params))
    }
}

impl std::fmt::Debug for AccessHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessHelper")
            .field("spec", self.inner.spec())
            .finish()
    }
}
