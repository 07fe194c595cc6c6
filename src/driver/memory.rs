//! An in-memory scripted driver.
//!
//! Registered through the public [`DriverRegistry`](crate::DriverRegistry)
//! seam, this driver lets tests script query responses, record executed
//! commands, and observe connection lifecycle without a real database.
//!
//! # Example
//! ```
//! use db_access::{AccessHelper, DriverRegistry, MemoryDriver};
//!
//! let driver = MemoryDriver::new();
//! let mut registry = DriverRegistry::builtin();
//! driver.register_into(&mut registry, "mem", "mem::Connection");
//! let helper = AccessHelper::with_registry("mem", "mem::Connection", "mem:", registry).unwrap();
//! # let _ = helper;
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::driver::{DriverConnection, DriverRegistry};
use crate::error::{AccessError, AccessResult};
use crate::params::Parameters;
use crate::row::{ResultSet, SqlValue};

/// A recorded command execution for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub sql: String,
    pub params: Vec<(String, SqlValue)>,
}

#[derive(Default)]
struct MemoryState {
    responses: Mutex<VecDeque<Vec<ResultSet>>>,
    recorded: Mutex<Vec<RecordedCommand>>,
    affected_rows: Mutex<u64>,
    fail_next: Mutex<Option<String>>,
    opened: Mutex<usize>,
    closed: Mutex<usize>,
}

/// Handle over the scripted driver state.
///
/// Connections produced by the registered factory share this handle's state,
/// so responses queued here are served to helper calls and commands those
/// calls run show up in [`recorded`](MemoryDriver::recorded). Accessors
/// panic on a poisoned lock, which only happens after a panic in the test
/// itself.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    state: Arc<MemoryState>,
}

impl MemoryDriver {
    /// Create a fresh scripted driver with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register this driver's connection factory under the given identity.
    pub fn register_into(
        &self,
        registry: &mut DriverRegistry,
        package: impl Into<String>,
        type_name: impl Into<String>,
    ) {
        let state = Arc::clone(&self.state);
        registry.register(package, type_name, move |cs| {
            Box::new(MemoryConnection {
                connection_string: cs.to_string(),
                state: Arc::clone(&state),
                open: false,
            })
        });
    }

    /// Queue a multi-result-set response. Responses are served in FIFO
    /// order; an empty queue serves an empty response.
    pub fn queue_result_sets(&self, sets: Vec<ResultSet>) {
        self.state.responses.lock().unwrap().push_back(sets);
    }

    /// Queue a single-result-set response.
    pub fn queue_rows(&self, rows: ResultSet) {
        self.queue_result_sets(vec![rows]);
    }

    /// Set the affected-row count reported by subsequent executes.
    pub fn set_affected_rows(&self, count: u64) {
        *self.state.affected_rows.lock().unwrap() = count;
    }

    /// Make the next execute or query fail with an execution error.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.state.fail_next.lock().unwrap() = Some(message.into());
    }

    /// All commands executed so far, in order.
    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.state.recorded.lock().unwrap().clone()
    }

    /// Number of connections opened so far.
    pub fn opened(&self) -> usize {
        *self.state.opened.lock().unwrap()
    }

    /// Number of connections closed so far.
    pub fn closed(&self) -> usize {
        *self.state.closed.lock().unwrap()
    }
}

struct MemoryConnection {
    connection_string: String,
    state: Arc<MemoryState>,
    open: bool,
}

impl MemoryConnection {
    fn record(&self, sql: &str, params: &Parameters) -> AccessResult<()> {
        if let Some(message) = self
            .state
            .fail_next
            .lock()
            .map_err(|_| AccessError::internal("memory driver state poisoned"))?
            .take()
        {
            return Err(AccessError::execution(message, None, "scripted failure"));
        }
        self.state
            .recorded
            .lock()
            .map_err(|_| AccessError::internal("memory driver state poisoned"))?
            .push(RecordedCommand {
                sql: sql.to_string(),
                params: params
                    .iter()
                    .map(|(n, v)| (n.to_string(), v.clone()))
                    .collect(),
            });
        Ok(())
    }
}

#[async_trait]
impl DriverConnection for MemoryConnection {
    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn open(&mut self) -> AccessResult<()> {
        self.open = true;
        *self
            .state
            .opened
            .lock()
            .map_err(|_| AccessError::internal("memory driver state poisoned"))? += 1;
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &Parameters) -> AccessResult<u64> {
        if !self.open {
            return Err(crate::driver::not_open());
        }
        self.record(sql, params)?;
        Ok(*self
            .state
            .affected_rows
            .lock()
            .map_err(|_| AccessError::internal("memory driver state poisoned"))?)
    }

    async fn query(&mut self, sql: &str, params: &Parameters) -> AccessResult<Vec<ResultSet>> {
        if !self.open {
            return Err(crate::driver::not_open());
        }
        self.record(sql, params)?;
        Ok(self
            .state
            .responses
            .lock()
            .map_err(|_| AccessError::internal("memory driver state poisoned"))?
            .pop_front()
            .unwrap_or_default())
    }

    async fn close(&mut self) -> AccessResult<()> {
        if self.open {
            self.open = false;
            *self
                .state
                .closed
                .lock()
                .map_err(|_| AccessError::internal("memory driver state poisoned"))? += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RawRow;

    fn one_row() -> ResultSet {
        let mut row = RawRow::new();
        row.push("id", "INTEGER", SqlValue::Int(1)).unwrap();
        vec![row]
    }

    #[tokio::test]
    async fn test_responses_served_fifo() {
        let driver = MemoryDriver::new();
        let mut registry = DriverRegistry::empty();
        driver.register_into(&mut registry, "mem", "mem::Connection");

        let spec =
            crate::driver::ConnectionSpec::new("mem", "mem::Connection", "mem:first").unwrap();
        let mut conn = registry.resolve(&spec).unwrap();
        conn.open().await.unwrap();

        driver.queue_rows(one_row());
        let sets = conn.query("SELECT 1", &Parameters::new()).await.unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].len(), 1);

        // Queue drained: next response is empty.
        let sets = conn.query("SELECT 2", &Parameters::new()).await.unwrap();
        assert!(sets.is_empty());
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_records_commands_and_params() {
        let driver = MemoryDriver::new();
        let mut registry = DriverRegistry::empty();
        driver.register_into(&mut registry, "mem", "mem::Connection");

        let spec = crate::driver::ConnectionSpec::new("mem", "mem::Connection", "mem:").unwrap();
        let mut conn = registry.resolve(&spec).unwrap();
        conn.open().await.unwrap();

        let params = Parameters::new().with("id", 2i64);
        conn.execute("DELETE FROM t WHERE id = @id", &params)
            .await
            .unwrap();

        let recorded = driver.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].sql, "DELETE FROM t WHERE id = @id");
        assert_eq!(recorded[0].params, vec![("id".to_string(), SqlValue::Int(2))]);
    }

    #[tokio::test]
    async fn test_unopened_connection_refuses_commands() {
        let driver = MemoryDriver::new();
        let mut registry = DriverRegistry::empty();
        driver.register_into(&mut registry, "mem", "mem::Connection");

        let spec = crate::driver::ConnectionSpec::new("mem", "mem::Connection", "mem:").unwrap();
        let mut conn = registry.resolve(&spec).unwrap();
        let err = conn
            .execute("SELECT 1", &Parameters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Connection { .. }));
    }
}
