//! Row-to-record mapping.
//!
//! The typed result path converts [`RawRow`]s into caller structs. A struct
//! opts in by implementing [`MapRow`], normally through the
//! [`map_record!`](crate::map_record) binding macro:
//!
//! ```
//! use db_access::map_record;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     age: Option<i64>,
//! }
//!
//! map_record!(User {
//!     id,
//!     name => "user_name",
//!     age,
//! });
//! ```
//!
//! For each declared field the row is searched by the declared column alias
//! if one is given, else by the exact (case-sensitive) field name. A missing
//! column leaves the field at its `Default` value; an extra row column is
//! ignored. Found values pass through [`FromSql`], which applies
//! numeric-to-numeric widening/narrowing with range checks and
//! string-to-numeric parsing, and fails with a mapping error for
//! fundamentally incompatible values. SQL NULL maps into `Option<T>` as
//! `None` and is an error for non-optional fields.

use chrono::NaiveDateTime;

use crate::error::{AccessError, AccessResult};
use crate::row::{RawRow, SqlValue};

/// Conversion from a raw column value into a field type.
pub trait FromSql: Sized {
    fn from_sql(value: &SqlValue) -> AccessResult<Self>;
}

fn incompatible(value: &SqlValue, target: &str) -> AccessError {
    AccessError::mapping(format!(
        "Cannot convert {} value into {}",
        value.type_name(),
        target
    ))
}

impl FromSql for SqlValue {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql(other).map(Some),
        }
    }
}

impl FromSql for i64 {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        match value {
            SqlValue::Int(v) => Ok(*v),
            SqlValue::Float(v) if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v <= i64::MAX as f64 => {
                Ok(*v as i64)
            }
            SqlValue::Text(v) => v
                .trim()
                .parse::<i64>()
                .map_err(|_| AccessError::mapping(format!("Cannot parse '{}' as an integer", v))),
            other => Err(incompatible(other, "i64")),
        }
    }
}

macro_rules! int_from_sql {
    ($($t:ty),+ $(,)?) => {
        $(
            impl FromSql for $t {
                fn from_sql(value: &SqlValue) -> AccessResult<Self> {
                    let wide = i64::from_sql(value)?;
                    <$t>::try_from(wide).map_err(|_| {
                        AccessError::mapping(format!(
                            "Integer value {} out of range for {}",
                            wide,
                            stringify!($t)
                        ))
                    })
                }
            }
        )+
    };
}

int_from_sql!(i8, i16, i32, u8, u16, u32, u64);

impl FromSql for f64 {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        match value {
            SqlValue::Float(v) => Ok(*v),
            SqlValue::Int(v) => Ok(*v as f64),
            SqlValue::Text(v) => v
                .trim()
                .parse::<f64>()
                .map_err(|_| AccessError::mapping(format!("Cannot parse '{}' as a float", v))),
            other => Err(incompatible(other, "f64")),
        }
    }
}

impl FromSql for f32 {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        f64::from_sql(value).map(|v| v as f32)
    }
}

impl FromSql for bool {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        match value {
            SqlValue::Bool(v) => Ok(*v),
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            SqlValue::Text(v) => match v.trim() {
                "0" => Ok(false),
                "1" => Ok(true),
                other => other.parse::<bool>().map_err(|_| {
                    AccessError::mapping(format!("Cannot parse '{}' as a boolean", v))
                }),
            },
            other => Err(incompatible(other, "bool")),
        }
    }
}

impl FromSql for String {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        match value {
            SqlValue::Text(v) => Ok(v.clone()),
            SqlValue::Int(v) => Ok(v.to_string()),
            SqlValue::Float(v) => Ok(v.to_string()),
            SqlValue::Bool(v) => Ok(v.to_string()),
            SqlValue::DateTime(v) => Ok(v.to_string()),
            SqlValue::Bytes(v) => String::from_utf8(v.clone())
                .map_err(|_| AccessError::mapping("Binary value is not valid UTF-8 text")),
            SqlValue::Null => Err(incompatible(value, "String")),
        }
    }
}

impl FromSql for Vec<u8> {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        match value {
            SqlValue::Bytes(v) => Ok(v.clone()),
            SqlValue::Text(v) => Ok(v.clone().into_bytes()),
            other => Err(incompatible(other, "Vec<u8>")),
        }
    }
}

impl FromSql for NaiveDateTime {
    fn from_sql(value: &SqlValue) -> AccessResult<Self> {
        match value {
            SqlValue::DateTime(v) => Ok(*v),
            SqlValue::Text(v) => parse_datetime(v)
                .ok_or_else(|| AccessError::mapping(format!("Cannot parse '{}' as a datetime", v))),
            SqlValue::Int(v) => chrono::DateTime::from_timestamp(*v, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    AccessError::mapping(format!("Integer {} is out of range for a timestamp", v))
                }),
            other => Err(incompatible(other, "NaiveDateTime")),
        }
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(v) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(v);
    }
    if let Ok(v) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(v);
    }
    if let Ok(v) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(v.naive_utc());
    }
    None
}

/// A caller-declared record that rows map into.
///
/// Implement through [`map_record!`](crate::map_record), or by hand when the
/// binding table cannot express the mapping.
pub trait MapRow: Sized {
    /// Map one row into a record.
    fn map_row(row: &RawRow) -> AccessResult<Self>;

    /// Map a result set into records, preserving row order. An empty input
    /// yields an empty vector.
    fn map_rows(rows: &[RawRow]) -> AccessResult<Vec<Self>> {
        rows.iter().map(Self::map_row).collect()
    }
}

/// Declare the column-binding table for a `Default` struct and generate its
/// [`MapRow`] impl.
///
/// Each entry is a field name, optionally followed by `=> "column"` to bind
/// the field to a source column whose name differs from the field's:
///
/// ```
/// use db_access::map_record;
///
/// #[derive(Default)]
/// struct Order {
///     id: i64,
///     customer: String,
/// }
///
/// map_record!(Order {
///     id,
///     customer => "customer_name",
/// });
/// ```
#[macro_export]
macro_rules! map_record {
    ($ty:ident { $( $field:ident $( => $column:literal )? ),+ $(,)? }) => {
        impl $crate::MapRow for $ty {
            fn map_row(row: &$crate::RawRow) -> $crate::AccessResult<Self> {
                let mut record = <$ty as ::core::default::Default>::default();
                $(
                    let column: &str = $crate::map_record!(@column $field $( $column )?);
                    if let ::core::option::Option::Some(value) = row.value(column) {
                        record.$field = $crate::FromSql::from_sql(value)
                            .map_err(|e| e.for_column(column))?;
                    }
                )+
                ::core::result::Result::Ok(record)
            }
        }
    };
    (@column $field:ident) => { ::core::stringify!($field) };
    (@column $field:ident $column:literal) => { $column };
}
