//! Raw result-set representation.
//!
//! Rows come back from a driver as an ordered sequence of cells, each keyed
//! by column name and carrying the raw value plus the column type the driver
//! declared for it. No type-specific mapping has happened yet at this layer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AccessError, AccessResult};

/// A raw scalar value as produced by a database driver.
///
/// This is the closed set of source types the row mapper converts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
    /// Binary data (base64 encoded in serialized form)
    #[serde(with = "base64_bytes")]
    Bytes(Vec<u8>),
    /// Date/time value without timezone
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Check if this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this value for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::DateTime(_) => "datetime",
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::DateTime(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Custom serialization for binary data as base64.
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// One cell of a result row: column name, the type the driver declared for
/// the column, and the raw value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawCell {
    pub name: String,
    pub declared_type: String,
    pub value: SqlValue,
}

/// One result-set row: an ordered sequence of cells keyed by column name.
///
/// Column order is the order the driver reported. Duplicate column names
/// (possible when joined tables share a name) are refused at insertion time
/// rather than silently overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRow {
    cells: Vec<RawCell>,
}

impl RawRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell. Fails with a mapping error when the column name is
    /// already present in this row.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        declared_type: impl Into<String>,
        value: SqlValue,
    ) -> AccessResult<()> {
        let name = name.into();
        if self.cells.iter().any(|c| c.name == name) {
            return Err(
                AccessError::mapping(format!("Duplicate column name in row: {}", name))
                    .for_column(name),
            );
        }
        self.cells.push(RawCell {
            name,
            declared_type: declared_type.into(),
            value,
        });
        Ok(())
    }

    /// Get a column's value by exact name.
    pub fn value(&self, name: &str) -> Option<&SqlValue> {
        self.cells.iter().find(|c| c.name == name).map(|c| &c.value)
    }

    /// Get a full cell by exact name.
    pub fn cell(&self, name: &str) -> Option<&RawCell> {
        self.cells.iter().find(|c| c.name == name)
    }

    /// Column names in driver order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.name.as_str())
    }

    /// Iterate over cells in driver order.
    pub fn iter(&self) -> impl Iterator<Item = &RawCell> {
        self.cells.iter()
    }

    /// Number of columns in this row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<'a> IntoIterator for &'a RawRow {
    type Item = &'a RawCell;
    type IntoIter = std::slice::Iter<'a, RawCell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// One statement's rows, in order.
pub type ResultSet = Vec<RawRow>;
