//! Driver factory registry.
//!
//! Resolution of a driver identity into a connection object happens through
//! an explicit registry of named factories rather than runtime type loading:
//! each backend registers a constructor under its (package, type name) pair,
//! and [`DriverRegistry::resolve`] becomes a map lookup. Unregistered
//! identities fail with a driver resolution error.

use std::collections::HashMap;
use std::sync::Arc;

use crate::driver::{ConnectionSpec, DriverConnection};
use crate::error::{AccessError, AccessResult};

type ConnectionFactory = Arc<dyn Fn(&str) -> Box<dyn DriverConnection> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DriverKey {
    package: String,
    type_name: String,
}

/// Registry mapping driver identities to connection factories.
///
/// A factory receives the connection string and returns an *unopened*
/// connection; no network or file resource is touched during resolution.
#[derive(Clone)]
pub struct DriverRegistry {
    factories: HashMap<DriverKey, ConnectionFactory>,
}

impl DriverRegistry {
    /// Create an empty registry with no drivers.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with the built-in sqlx backends registered:
    ///
    /// | package         | type name                          |
    /// |-----------------|------------------------------------|
    /// | `sqlx-sqlite`   | `sqlx::sqlite::SqliteConnection`   |
    /// | `sqlx-mysql`    | `sqlx::mysql::MySqlConnection`     |
    /// | `sqlx-postgres` | `sqlx::postgres::PgConnection`     |
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("sqlx-sqlite", "sqlx::sqlite::SqliteConnection", |cs| {
            Box::new(crate::driver::SqliteDriver::unopened(cs))
        });
        registry.register("sqlx-mysql", "sqlx::mysql::MySqlConnection", |cs| {
            Box::new(crate::driver::MySqlDriver::unopened(cs))
        });
        registry.register("sqlx-postgres", "sqlx::postgres::PgConnection", |cs| {
            Box::new(crate::driver::PostgresDriver::unopened(cs))
        });
        registry
    }

    /// Register a connection factory under a driver identity. A later
    /// registration under the same identity replaces the earlier one.
    pub fn register(
        &mut self,
        package: impl Into<String>,
        type_name: impl Into<String>,
        factory: impl Fn(&str) -> Box<dyn DriverConnection> + Send + Sync + 'static,
    ) {
        self.factories.insert(
            DriverKey {
                package: package.into(),
                type_name: type_name.into(),
            },
            Arc::new(factory),
        );
    }

    /// Check whether a driver identity is registered.
    pub fn contains(&self, package: &str, type_name: &str) -> bool {
        self.factories.contains_key(&DriverKey {
            package: package.to_string(),
            type_name: type_name.to_string(),
        })
    }

    /// Resolve a spec into an unopened connection holding the spec's
    /// connection string.
    pub fn resolve(&self, spec: &ConnectionSpec) -> AccessResult<Box<dyn DriverConnection>> {
        let key = DriverKey {
            package: spec.package().to_string(),
            type_name: spec.type_name().to_string(),
        };
        let factory = self.factories.get(&key).ok_or_else(|| {
            AccessError::driver_resolution(
                spec.package(),
                spec.type_name(),
                "no connection factory registered under this identity",
            )
        })?;
        Ok(factory(spec.connection_string()))
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self
            .factories
            .keys()
            .map(|k| format!("{}::{}", k.package, k.type_name))
            .collect();
        names.sort();
        f.debug_struct("DriverRegistry")
            .field("drivers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_spec(connection_string: &str) -> ConnectionSpec {
        ConnectionSpec::new(
            "sqlx-sqlite",
            "sqlx::sqlite::SqliteConnection",
            connection_string,
        )
        .unwrap()
    }

    #[test]
    fn test_builtin_backends_registered() {
        let registry = DriverRegistry::builtin();
        assert!(registry.contains("sqlx-sqlite", "sqlx::sqlite::SqliteConnection"));
        assert!(registry.contains("sqlx-mysql", "sqlx::mysql::MySqlConnection"));
        assert!(registry.contains("sqlx-postgres", "sqlx::postgres::PgConnection"));
    }

    #[test]
    fn test_resolve_returns_unopened_connection_with_exact_string() {
        let registry = DriverRegistry::builtin();
        let spec = sqlite_spec("sqlite:some/path.db?mode=rwc");
        let conn = registry.resolve(&spec).unwrap();
        // Resolution must not open anything; the string passes through verbatim.
        assert_eq!(conn.connection_string(), "sqlite:some/path.db?mode=rwc");
    }

    #[test]
    fn test_resolve_unregistered_identity_fails() {
        let registry = DriverRegistry::builtin();
        let spec = ConnectionSpec::new(
            "oracle-managed",
            "oracle::Connection",
            "server=db;uid=x;pwd=y",
        )
        .unwrap();
        let err = registry.resolve(&spec).err().unwrap();
        match err {
            AccessError::DriverResolution {
                package, type_name, ..
            } => {
                assert_eq!(package, "oracle-managed");
                assert_eq!(type_name, "oracle::Connection");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_requires_both_identity_parts() {
        // Same package, different type name: still unregistered.
        let registry = DriverRegistry::builtin();
        let spec =
            ConnectionSpec::new("sqlx-sqlite", "sqlx::SqliteConnection", "sqlite::memory:")
                .unwrap();
        assert!(registry.resolve(&spec).is_err());
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = DriverRegistry::empty();
        registry.register("pkg", "Type", |cs| {
            Box::new(crate::driver::SqliteDriver::unopened(cs))
        });
        assert!(registry.contains("pkg", "Type"));
        registry.register("pkg", "Type", |cs| {
            Box::new(crate::driver::MySqlDriver::unopened(cs))
        });
        assert!(registry.contains("pkg", "Type"));
    }
}
