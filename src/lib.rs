//! db-access
//!
//! A driver-agnostic SQL execution helper: pick a database backend by string
//! identity at run time, execute parameterized commands on a fresh
//! connection per call, and map result rows into loosely-typed
//! ([`RawRow`]) or strongly-typed ([`MapRow`]) collections.
//!
//! Built-in driver identities:
//!
//! | package         | type name                          |
//! |-----------------|------------------------------------|
//! | `sqlx-sqlite`   | `sqlx::sqlite::SqliteConnection`   |
//! | `sqlx-mysql`    | `sqlx::mysql::MySqlConnection`     |
//! | `sqlx-postgres` | `sqlx::postgres::PgConnection`     |
//!
//! Additional backends register through [`DriverRegistry::register`].

pub mod blocking;
pub mod driver;
pub mod error;
pub mod helper;
pub mod mapper;
pub mod params;
pub mod row;

pub use driver::{ConnectionSpec, DriverConnection, DriverRegistry, MemoryDriver};
pub use error::{AccessError, AccessResult};
pub use helper::AccessHelper;
pub use mapper::{FromSql, MapRow};
pub use params::Parameters;
pub use row::{RawCell, RawRow, ResultSet, SqlValue};
