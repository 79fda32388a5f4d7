//! One-dimensional named sequences.

use serde_json::Value;

use crate::dtype::DataType;

use super::label::Label;

/// A named, typed, one-dimensional sequence of cells.
///
/// Columns, single-level row indexes and the levels of a multi-level index
/// are all series. The dtype is inferred from the values on construction and
/// set explicitly when a series is coerced.
///
/// # Example
///
/// ```rust
/// use framecheck::{DataType, Series};
/// use serde_json::json;
///
/// let series = Series::new("x", vec![json!(1), json!(2), json!(null)]);
/// assert_eq!(series.dtype(), DataType::Int64);
/// assert_eq!(series.null_positions(), vec![2]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: Option<Label>,
    dtype: DataType,
    values: Vec<Value>,
}

impl Series {
    /// Creates a named series, inferring its dtype.
    pub fn new(name: impl Into<Label>, values: Vec<Value>) -> Self {
        Self::from_parts(Some(name.into()), values)
    }

    /// Creates a series without a name, inferring its dtype.
    pub fn unnamed(values: Vec<Value>) -> Self {
        Self::from_parts(None, values)
    }

    /// Creates a series from an optional name, inferring its dtype.
    pub fn from_parts(name: Option<Label>, values: Vec<Value>) -> Self {
        let dtype = DataType::infer(&values);
        Self {
            name,
            dtype,
            values,
        }
    }

    /// Returns this series with an explicit dtype.
    ///
    /// The values are not converted; use this for data already held in the
    /// target representation.
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Returns this series under a different name.
    pub fn renamed(mut self, name: Option<Label>) -> Self {
        self.name = name;
        self
    }

    /// Returns the series name.
    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    /// Returns the series dtype.
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Returns the cells.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the series has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the cell at `position`.
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Returns a new series holding the cells at `positions`, in order.
    ///
    /// Out-of-range positions are skipped. The dtype is preserved.
    pub fn take(&self, positions: &[usize]) -> Series {
        Series {
            name: self.name.clone(),
            dtype: self.dtype,
            values: positions
                .iter()
                .filter_map(|&p| self.values.get(p).cloned())
                .collect(),
        }
    }

    /// Returns the positions of null cells.
    pub fn null_positions(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_null())
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns true if the series holds data of the declared type.
    ///
    /// A series without non-null cells satisfies any dtype.
    pub fn satisfies(&self, dtype: DataType) -> bool {
        dtype == DataType::Object
            || self.dtype == dtype
            || self.values.iter().all(Value::is_null)
    }
}
