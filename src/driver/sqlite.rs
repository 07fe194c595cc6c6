//! SQLite backend over a single sqlx connection.

use async_trait::async_trait;
use futures_util::StreamExt;
use sqlx::sqlite::{SqliteArguments, SqliteConnection};
use sqlx::{Connection, Sqlite};
use tracing::debug;

use crate::driver::decode::DecodeRow;
use crate::driver::{DriverConnection, collect_result_sets, not_open};
use crate::error::AccessResult;
use crate::params::Parameters;
use crate::row::{ResultSet, SqlValue};

/// One SQLite connection, created unopened by the registry factory.
pub struct SqliteDriver {
    connection_string: String,
    conn: Option<SqliteConnection>,
}

impl SqliteDriver {
    /// Create an unopened connection holding the given connection string.
    pub fn unopened(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            conn: None,
        }
    }
}

#[async_trait]
impl DriverConnection for SqliteDriver {
    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn open(&mut self) -> AccessResult<()> {
        debug!(backend = "sqlite", "opening connection");
        let conn = SqliteConnection::connect(&self.connection_string).await?;
        self.conn = Some(conn);
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &Parameters) -> AccessResult<u64> {
        let conn = self.conn.as_mut().ok_or_else(not_open)?;
        debug!(backend = "sqlite", params = params.len(), "executing statement");
        // Parameter-free text runs unprepared, which also permits batches.
        let result = if params.is_empty() {
            use sqlx::Executor;
            conn.execute(sqlx::raw_sql(sql)).await?
        } else {
            let mut query = sqlx::query(sql);
            for value in params.values() {
                query = bind_value(query, value);
            }
            use sqlx::Executor;
            conn.execute(query).await?
        };
        Ok(result.rows_affected())
    }

    async fn query(&mut self, sql: &str, params: &Parameters) -> AccessResult<Vec<ResultSet>> {
        let conn = self.conn.as_mut().ok_or_else(not_open)?;
        debug!(backend = "sqlite", params = params.len(), "executing query");
        if params.is_empty() {
            let stream = sqlx::raw_sql(sql).fetch_many(&mut *conn);
            return collect_result_sets(stream).await;
        }
        // A parameterized command prepares a single statement.
        let mut query = sqlx::query(sql);
        for value in params.values() {
            query = bind_value(query, value);
        }
        let mut stream = query.fetch(&mut *conn);
        let mut rows: ResultSet = Vec::new();
        while let Some(row) = stream.next().await {
            rows.push(row?.to_raw_row()?);
        }
        Ok(vec![rows])
    }

    async fn close(&mut self) -> AccessResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Bytes(v) => query.bind(v.as_slice()),
        SqlValue::DateTime(v) => query.bind(*v),
    }
}
