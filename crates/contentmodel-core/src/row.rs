//! Rows exchanged with storage backends.

use crate::error::{Error, Result};
use crate::value::Value;

/// Conversion from a backend [`Value`] into a concrete Rust type.
pub trait FromValue: Sized {
    /// Convert, or explain which shape was expected.
    fn from_value(value: &Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| Error::backend(format!("expected integer, got {value:?}")))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| Error::backend(format!("expected number, got {value:?}")))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::backend(format!("expected boolean, got {value:?}")))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| Error::backend(format!("expected text, got {value:?}")))
    }
}

/// An ordered set of column/value pairs.
///
/// Used both as query output and as the column set for inserts/updates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Keeps insertion order.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Set a column, replacing an existing value or appending.
    pub fn set(&mut self, column: &str, value: Value) {
        if let Some(idx) = self.columns.iter().position(|c| c == column) {
            self.values[idx] = value;
        } else {
            self.push(column, value);
        }
    }

    /// Builder-style [`Row::push`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.push(column, value);
        self
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value at position.
    #[must_use]
    pub fn value(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Value for a column name.
    #[must_use]
    pub fn named(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Typed value at position.
    pub fn get_as<T: FromValue>(&self, idx: usize) -> Result<T> {
        let value = self
            .value(idx)
            .ok_or_else(|| Error::backend(format!("no column at index {idx}")))?;
        T::from_value(value)
    }

    /// Typed value for a column name.
    pub fn get_named<T: FromValue>(&self, column: &str) -> Result<T> {
        let value = self
            .named(column)
            .ok_or_else(|| Error::backend(format!("no column named {column}")))?;
        T::from_value(value)
    }

    /// Iterate column/value pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}
