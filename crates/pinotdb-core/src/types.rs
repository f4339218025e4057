use crate::error::{PinotError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A scalar cell as carried from the broker payload to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Value {
    /// Arrays and objects have no scalar counterpart and are rejected.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(v) => Ok(Value::Bool(v)),
            serde_json::Value::Number(v) => Ok(Value::Number(v)),
            serde_json::Value::String(v) => Ok(Value::Text(v)),
            other => Err(PinotError::Schema(format!("value of unknown type: {other}"))),
        }
    }

    /// Booleans are tested before numbers so the two never overlap.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Bool(_) => ColumnType::Boolean,
            Value::Number(_) => ColumnType::Number,
            Value::Text(_) => ColumnType::Text,
            Value::Null => ColumnType::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Inferred type of a result column. `Null` means no non-null value was seen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Number,
    Boolean,
    Null,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "STRING",
            ColumnType::Number => "NUMBER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Null => "NULL",
        };
        f.write_str(name)
    }
}

/// Column metadata in the shape of a DB-API `description` entry. Only the
/// name and type are ever populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub type_code: ColumnType,
    pub display_size: Option<usize>,
    pub internal_size: Option<usize>,
    pub precision: Option<usize>,
    pub scale: Option<usize>,
    pub null_ok: Option<bool>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_code: ColumnType) -> Self {
        Self {
            name: name.into(),
            type_code,
            display_size: None,
            internal_size: None,
            precision: None,
            scale: None,
            null_ok: None,
        }
    }
}

/// One result row. Column names are shared by every row of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Value;

    fn index(&self, idx: usize) -> &Value {
        &self.values[idx]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// `None` when the query produced no rows.
    pub description: Option<Vec<ColumnDescriptor>>,
    pub rows: Vec<Row>,
}
