//! Ordered parameter collections for parameterized commands.

use serde::Serialize;

use crate::row::SqlValue;

/// An ordered name → value collection bound to one command invocation.
///
/// Names are unique within a collection; [`insert`](Parameters::insert)
/// refuses duplicates. Values bind to the driver's positional placeholders
/// in insertion order, so the order parameters are added must match the
/// order their placeholders first appear in the command text. SQLite assigns
/// `@name` placeholders indexes in order of first occurrence, which keeps
/// named-style text working there; MySQL (`?`) and PostgreSQL (`$1`) are
/// positional by nature.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Parameters {
    entries: Vec<(String, SqlValue)>,
}

impl Parameters {
    /// Create an empty parameter collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. Returns `false` (leaving the collection unchanged)
    /// when the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> bool {
        let name = name.into();
        if self.entries.iter().any(|(n, _)| *n == name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    /// Builder-style [`insert`](Parameters::insert); a duplicate name leaves
    /// the collection unchanged.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate over (name, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Parameter values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no parameters have been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order() {
        let mut params = Parameters::new();
        params.insert("b", 2i64);
        params.insert("a", "one");
        let names: Vec<_> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_insert_refuses_duplicate_name() {
        let mut params = Parameters::new();
        assert!(params.insert("id", 1i64));
        assert!(!params.insert("id", 2i64));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id"), Some(&SqlValue::Int(1)));
    }

    #[test]
    fn test_with_builder() {
        let params = Parameters::new()
            .with("id", 2i64)
            .with("name", "alice")
            .with("id", 9i64);
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("id"), Some(&SqlValue::Int(2)));
    }

    #[test]
    fn test_null_parameter() {
        let params = Parameters::new().with("maybe", None::<String>);
        assert_eq!(params.get("maybe"), Some(&SqlValue::Null));
    }
}
