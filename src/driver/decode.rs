//! Backend-agnostic column decoding.
//!
//! Raw driver rows are turned into [`RawRow`]s in two phases:
//! 1. [`TypeCategory`] classifies the declared column type into a logical
//!    category
//! 2. Backend-specific decoders extract the value for that category
//!
//! This centralizes type classification while allowing backend-specific
//! handling where the drivers differ. Decode failures propagate as mapping
//! errors; values are never silently replaced with NULL.

use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo};

use crate::error::{AccessError, AccessResult};
use crate::row::{RawRow, SqlValue};

/// Database backend, for classification rules that differ between engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Postgres,
    Sqlite,
}

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for declared column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    DateTime,
    Unknown,
}

/// Classify a declared column type name into a logical category.
pub fn categorize_type(type_name: &str, backend: Backend) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if backend == Backend::Sqlite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    // Date/Time - before integer checks ("datetime2", "timestamp")
    if lower.contains("timestamp")
        || lower.contains("datetime")
        || lower == "date"
        || lower == "time"
        || lower == "timetz"
    {
        return TypeCategory::DateTime;
    }

    // Integer types
    if lower.contains("int") || lower.contains("serial") || lower.contains("tiny") {
        return TypeCategory::Integer;
    }

    // Boolean
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    // Float types
    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    // Binary types
    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    // Text types
    if lower.contains("char") || lower.contains("text") || lower.contains("clob") {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL/NUMERIC values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Row Decoding Trait
// =============================================================================

/// Trait for converting backend rows into [`RawRow`]s.
pub trait DecodeRow {
    fn to_raw_row(&self) -> AccessResult<RawRow>;
}

fn undecodable(declared_type: &str, name: &str) -> AccessError {
    AccessError::mapping(format!(
        "Cannot decode value of declared type '{}' from column '{}'",
        declared_type, name
    ))
    .for_column(name)
}

impl DecodeRow for MySqlRow {
    fn to_raw_row(&self) -> AccessResult<RawRow> {
        let mut row = RawRow::new();
        for (idx, col) in self.columns().iter().enumerate() {
            let type_name = col.type_info().name();
            let category = categorize_type(type_name, Backend::MySql);
            let value = mysql::decode_column(self, idx, category)
                .ok_or_else(|| undecodable(type_name, col.name()))?;
            row.push(col.name(), type_name, value)?;
        }
        Ok(row)
    }
}

impl DecodeRow for PgRow {
    fn to_raw_row(&self) -> AccessResult<RawRow> {
        let mut row = RawRow::new();
        for (idx, col) in self.columns().iter().enumerate() {
            let type_name = col.type_info().name();
            let category = categorize_type(type_name, Backend::Postgres);
            let value = postgres::decode_column(self, idx, category)
                .ok_or_else(|| undecodable(type_name, col.name()))?;
            row.push(col.name(), type_name, value)?;
        }
        Ok(row)
    }
}

impl DecodeRow for SqliteRow {
    fn to_raw_row(&self) -> AccessResult<RawRow> {
        let mut row = RawRow::new();
        for (idx, col) in self.columns().iter().enumerate() {
            let type_name = col.type_info().name();
            let category = categorize_type(type_name, Backend::Sqlite);
            let value = sqlite::decode_column(self, idx, category)
                .ok_or_else(|| undecodable(type_name, col.name()))?;
            row.push(col.name(), type_name, value)?;
        }
        Ok(row)
    }
}

// =============================================================================
// Backend-Specific Decoders
// =============================================================================
//
// Each module below probes the category-appropriate types first and falls
// back through the remaining representations. `None` means no representation
// matched; the caller raises the mapping error.

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> Option<SqlValue> {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::Boolean => decode_boolean(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::Float => decode_float(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::Binary => decode_bytes(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::DateTime => decode_datetime(row, idx).or_else(|| fallback(row, idx)),
            _ => fallback(row, idx),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => Some(SqlValue::Text(v.0)),
            Ok(None) => Some(SqlValue::Null),
            Err(_) => None,
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Some(v.map(SqlValue::Int).unwrap_or(SqlValue::Null));
        }
        // Unsigned columns beyond i64 range
        if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            return match v {
                Some(v) => i64::try_from(v).ok().map(SqlValue::Int),
                None => Some(SqlValue::Null),
            };
        }
        None
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::Bool).unwrap_or(SqlValue::Null))
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Some(v.map(SqlValue::Float).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
            return Some(v.map(|v| SqlValue::Float(v as f64)).unwrap_or(SqlValue::Null));
        }
        None
    }

    fn decode_bytes(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::Bytes).unwrap_or(SqlValue::Null))
    }

    fn decode_datetime(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return Some(v.map(SqlValue::DateTime).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
            return Some(
                v.and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(SqlValue::DateTime)
                    .unwrap_or(SqlValue::Null),
            );
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
            return Some(
                v.map(|t| SqlValue::Text(t.to_string()))
                    .unwrap_or(SqlValue::Null),
            );
        }
        None
    }

    fn fallback(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return Some(v.map(SqlValue::Text).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Some(v.map(SqlValue::Int).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Some(v.map(SqlValue::Float).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return Some(v.map(SqlValue::Bytes).unwrap_or(SqlValue::Null));
        }
        None
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> Option<SqlValue> {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::Boolean => decode_boolean(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::Float => decode_float(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::Binary => decode_bytes(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::DateTime => decode_datetime(row, idx).or_else(|| fallback(row, idx)),
            _ => fallback(row, idx),
        }
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> Option<SqlValue> {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => Some(SqlValue::Text(v.0)),
            Ok(None) => Some(SqlValue::Null),
            Err(_) => None,
        }
    }

    fn decode_integer(row: &PgRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Some(v.map(SqlValue::Int).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return Some(v.map(|v| SqlValue::Int(v as i64)).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return Some(v.map(|v| SqlValue::Int(v as i64)).unwrap_or(SqlValue::Null));
        }
        None
    }

    fn decode_boolean(row: &PgRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::Bool).unwrap_or(SqlValue::Null))
    }

    fn decode_float(row: &PgRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Some(v.map(SqlValue::Float).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
            return Some(v.map(|v| SqlValue::Float(v as f64)).unwrap_or(SqlValue::Null));
        }
        None
    }

    fn decode_bytes(row: &PgRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::Bytes).unwrap_or(SqlValue::Null))
    }

    fn decode_datetime(row: &PgRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return Some(v.map(SqlValue::DateTime).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
            return Some(
                v.map(|v| SqlValue::DateTime(v.naive_utc()))
                    .unwrap_or(SqlValue::Null),
            );
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
            return Some(
                v.and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(SqlValue::DateTime)
                    .unwrap_or(SqlValue::Null),
            );
        }
        if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(idx) {
            return Some(
                v.map(|t| SqlValue::Text(t.to_string()))
                    .unwrap_or(SqlValue::Null),
            );
        }
        None
    }

    fn fallback(row: &PgRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return Some(v.map(SqlValue::Text).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Some(v.map(SqlValue::Int).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Some(v.map(SqlValue::Float).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return Some(v.map(SqlValue::Bytes).unwrap_or(SqlValue::Null));
        }
        None
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize, category: TypeCategory) -> Option<SqlValue> {
        match category {
            TypeCategory::Integer => decode_integer(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::Boolean => decode_boolean(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::Float | TypeCategory::Decimal => {
                decode_float(row, idx).or_else(|| fallback(row, idx))
            }
            TypeCategory::Binary => decode_bytes(row, idx).or_else(|| fallback(row, idx)),
            TypeCategory::DateTime => decode_datetime(row, idx).or_else(|| fallback(row, idx)),
            _ => fallback(row, idx),
        }
    }

    fn decode_integer(row: &SqliteRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<i64>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::Int).unwrap_or(SqlValue::Null))
    }

    fn decode_boolean(row: &SqliteRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::Bool).unwrap_or(SqlValue::Null))
    }

    fn decode_float(row: &SqliteRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<f64>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::Float).unwrap_or(SqlValue::Null))
    }

    fn decode_bytes(row: &SqliteRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::Bytes).unwrap_or(SqlValue::Null))
    }

    fn decode_datetime(row: &SqliteRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<Option<NaiveDateTime>, _>(idx)
            .ok()
            .map(|v| v.map(SqlValue::DateTime).unwrap_or(SqlValue::Null))
    }

    // SQLite columns are dynamically typed; probe every storage class.
    fn fallback(row: &SqliteRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return Some(v.map(SqlValue::Text).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Some(v.map(SqlValue::Int).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Some(v.map(SqlValue::Float).unwrap_or(SqlValue::Null));
        }
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return Some(v.map(SqlValue::Bytes).unwrap_or(SqlValue::Null));
        }
        None
    }
}
