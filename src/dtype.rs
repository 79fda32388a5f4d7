//! Semantic data types and value coercion.
//!
//! Cells are stored as [`serde_json::Value`]. A [`DataType`] describes what a
//! whole series holds and knows how to convert a single cell into its own
//! representation.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// The semantic type of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Boolean values.
    Bool,
    /// 64-bit signed integers.
    Int64,
    /// 64-bit floats.
    Float64,
    /// UTF-8 strings.
    String,
    /// Mixed or untyped values.
    Object,
}

impl DataType {
    /// Returns the canonical name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::Object => "object",
        }
    }

    /// Infers the type of a sequence of cells.
    ///
    /// Nulls are ignored. Integers mixed with floats widen to `Float64`;
    /// anything else that is mixed, or a sequence without non-null values,
    /// is `Object`.
    pub fn infer<'a, I>(values: I) -> DataType
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut inferred: Option<DataType> = None;
        for value in values {
            let current = match value {
                Value::Null => continue,
                Value::Bool(_) => DataType::Bool,
                Value::Number(n) if n.is_i64() => DataType::Int64,
                Value::Number(_) => DataType::Float64,
                Value::String(_) => DataType::String,
                Value::Array(_) | Value::Object(_) => return DataType::Object,
            };
            inferred = Some(match (inferred, current) {
                (None, t) => t,
                (Some(a), b) if a == b => a,
                (Some(DataType::Int64), DataType::Float64)
                | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
                _ => return DataType::Object,
            });
        }
        inferred.unwrap_or(DataType::Object)
    }

    /// Converts one cell into this type.
    ///
    /// Returns `None` when the cell cannot be represented. Nulls always
    /// coerce to null.
    pub fn coerce_value(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        match self {
            DataType::Object => Some(value.clone()),
            DataType::Int64 => coerce_int(value).map(Value::from),
            DataType::Float64 => coerce_float(value)
                .and_then(Number::from_f64)
                .map(Value::Number),
            DataType::Bool => coerce_bool(value).map(Value::Bool),
            DataType::String => Some(Value::String(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })),
        }
    }

    /// Returns true if a single non-null cell already has this type.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (DataType::Object, _) => true,
            (DataType::Bool, Value::Bool(_)) => true,
            (DataType::Int64, Value::Number(n)) => n.is_i64(),
            (DataType::Float64, Value::Number(_)) => true,
            (DataType::String, Value::String(_)) => true,
            _ => false,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
