//! Field values, storage column types and output scalar types

use crate::core::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single value read from storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

/// A fetched record, aligned to the columns requested from the adapter
pub type Row = Vec<FieldValue>;

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert a JSON argument value into a storage value
    ///
    /// Arrays and objects have no storage form and map to `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Boolean(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Integer)
                .or_else(|| n.as_f64().map(FieldValue::Float)),
            Value::String(s) => Some(FieldValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// The correlation-column values of one row
///
/// Floats compare and hash by bit pattern so keys can live in hash maps.
/// Keys holding a null are never built: a null never correlates.
#[derive(Debug, Clone, Default)]
pub struct CorrelationKey(Vec<FieldValue>);

impl CorrelationKey {
    /// Key of `row` over the columns at `indexes`, `None` if a value is null
    pub fn from_row(row: &[FieldValue], indexes: &[usize]) -> Option<Self> {
        let mut values = Vec::with_capacity(indexes.len());
        for index in indexes {
            match row.get(*index) {
                None | Some(FieldValue::Null) => return None,
                Some(value) => values.push(value.clone()),
            }
        }
        Some(Self(values))
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.0
    }
}

impl PartialEq for CorrelationKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|pair| match pair {
                (FieldValue::Float(a), FieldValue::Float(b)) => a.to_bits() == b.to_bits(),
                (a, b) => a == b,
            })
    }
}

impl Eq for CorrelationKey {}

impl Hash for CorrelationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            std::mem::discriminant(value).hash(state);
            match value {
                FieldValue::String(s) => s.hash(state),
                FieldValue::Integer(i) => i.hash(state),
                FieldValue::Float(f) => f.to_bits().hash(state),
                FieldValue::Boolean(b) => b.hash(state),
                FieldValue::Null => {}
            }
        }
    }
}

/// Storage-level column kinds an adapter can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Text,
    Varchar,
    Boolean,
    Timestamp,
    Uuid,
    Json,
    Bytes,
}

/// Output scalar types exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Int,
    Float,
    String,
    Boolean,
}

impl ScalarType {
    /// The default storage → output mapping
    ///
    /// Integer, floating-point, text and boolean kinds are mapped; anything
    /// else has no scalar form and is rejected at schema build time.
    pub fn from_column_type(column_type: ColumnType) -> Option<Self> {
        match column_type {
            ColumnType::SmallInt | ColumnType::Integer | ColumnType::BigInt => {
                Some(ScalarType::Int)
            }
            ColumnType::Real | ColumnType::Double | ColumnType::Numeric => Some(ScalarType::Float),
            ColumnType::Text | ColumnType::Varchar => Some(ScalarType::String),
            ColumnType::Boolean => Some(ScalarType::Boolean),
            ColumnType::Timestamp | ColumnType::Uuid | ColumnType::Json | ColumnType::Bytes => {
                None
            }
        }
    }

    /// Map a column type or fail with the schema error describing it
    pub fn for_column(
        type_name: &str,
        column: &str,
        column_type: ColumnType,
    ) -> Result<Self, SchemaError> {
        Self::from_column_type(column_type).ok_or_else(|| SchemaError::UnmappedColumnType {
            type_name: type_name.to_string(),
            column: column.to_string(),
            column_type,
        })
    }

    /// Coerce a storage value into this scalar's JSON form
    ///
    /// Values that cannot represent the scalar become `null`.
    pub fn coerce(&self, value: &FieldValue) -> Value {
        match (self, value) {
            (_, FieldValue::Null) => Value::Null,
            (ScalarType::Int, FieldValue::Integer(i)) => Value::from(*i),
            // 2^63 itself is out of range
            (ScalarType::Int, FieldValue::Float(f))
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Value::from(*f as i64)
            }
            (ScalarType::Int, FieldValue::Boolean(b)) => Value::from(i64::from(*b)),
            (ScalarType::Int, FieldValue::String(s)) => {
                s.trim().parse::<i64>().map_or(Value::Null, Value::from)
            }
            (ScalarType::Float, FieldValue::Integer(i)) => Value::from(*i as f64),
            (ScalarType::Float, FieldValue::Float(f)) => Value::from(*f),
            (ScalarType::Float, FieldValue::String(s)) => {
                s.trim().parse::<f64>().map_or(Value::Null, Value::from)
            }
            (ScalarType::String, FieldValue::String(s)) => Value::from(s.clone()),
            (ScalarType::String, FieldValue::Integer(i)) => Value::from(i.to_string()),
            (ScalarType::String, FieldValue::Float(f)) => Value::from(f.to_string()),
            (ScalarType::String, FieldValue::Boolean(b)) => Value::from(b.to_string()),
            (ScalarType::Boolean, FieldValue::Boolean(b)) => Value::from(*b),
            (ScalarType::Boolean, FieldValue::Integer(i)) => Value::from(*i != 0),
            _ => Value::Null,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::String => "String",
            ScalarType::Boolean => "Boolean",
        };
        f.write_str(name)
    }
}

/// Declared type of a relationship argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentType {
    pub scalar: ScalarType,
    pub non_null: bool,
    pub list: bool,
}

impl ArgumentType {
    pub fn new(scalar: ScalarType) -> Self {
        Self {
            scalar,
            non_null: false,
            list: false,
        }
    }

    pub fn int() -> Self {
        Self::new(ScalarType::Int)
    }

    pub fn float() -> Self {
        Self::new(ScalarType::Float)
    }

    pub fn string() -> Self {
        Self::new(ScalarType::String)
    }

    pub fn boolean() -> Self {
        Self::new(ScalarType::Boolean)
    }

    /// Mark the argument as required
    pub fn non_null(mut self) -> Self {
        self.non_null = true;
        self
    }

    /// Accept a list of the scalar
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "[{}!]", self.scalar)?;
        } else {
            write!(f, "{}", self.scalar)?;
        }
        if self.non_null {
            f.write_str("!")?;
        }
        Ok(())
    }
}
