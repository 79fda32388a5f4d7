//! In-memory tables.
//!
//! A [`Table`] is an ordered list of labelled columns plus a row index.
//! Duplicate column labels are allowed, and column labels may be tuples for
//! tables with multi-level columns.
//!
//! # Example
//!
//! ```rust
//! use framecheck::{Label, Table};
//! use serde_json::json;
//!
//! let table = Table::from_columns(vec![
//!     ("x", vec![json!(1), json!(2)]),
//!     ("x", vec![json!(3), json!(4)]),
//! ])
//! .unwrap();
//!
//! assert_eq!(table.num_rows(), 2);
//! assert_eq!(table.positions_of(&Label::from("x")), vec![0, 1]);
//! ```

mod index;
mod label;
mod series;

pub use index::{MultiLevelIndex, RowIndex};
pub use label::Label;
pub use series::Series;

use serde_json::Value;

/// Errors raised while assembling a table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    /// A column or index does not match the table's row count.
    #[error("{what} has {got} rows, expected {expected}")]
    LengthMismatch {
        /// What was being added.
        what: String,
        /// The table's row count.
        expected: usize,
        /// The offending length.
        got: usize,
    },
    /// Columns must be named.
    #[error("column at position {0} has no name")]
    UnnamedColumn(usize),
    /// A multi-level index needs at least one level.
    #[error("a multi-level index needs at least one level")]
    EmptyMultiIndex,
}

/// A two-dimensional table of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Series>,
    index: RowIndex,
}

impl Table {
    /// Builds a table from named series with a default range index.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is unnamed or the lengths differ.
    pub fn new(columns: Vec<Series>) -> Result<Self, TableError> {
        let rows = columns.first().map_or(0, Series::len);
        for (position, column) in columns.iter().enumerate() {
            let Some(name) = column.name() else {
                return Err(TableError::UnnamedColumn(position));
            };
            if column.len() != rows {
                return Err(TableError::LengthMismatch {
                    what: format!("column '{}'", name),
                    expected: rows,
                    got: column.len(),
                });
            }
        }
        Ok(Self {
            columns,
            index: RowIndex::range(rows),
        })
    }

    /// Builds a table from `(label, values)` pairs.
    pub fn from_columns<I, L>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (L, Vec<Value>)>,
        L: Into<Label>,
    {
        Self::new(
            columns
                .into_iter()
                .map(|(label, values)| Series::new(label, values))
                .collect(),
        )
    }

    /// Replaces the row index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index length differs from the row count.
    pub fn with_index(mut self, index: impl Into<RowIndex>) -> Result<Self, TableError> {
        let index = index.into();
        if !self.columns.is_empty() && index.len() != self.num_rows() {
            return Err(TableError::LengthMismatch {
                what: "index".to_string(),
                expected: self.num_rows(),
                got: index.len(),
            });
        }
        self.index = index;
        Ok(self)
    }

    /// Assembles a table whose parts are known to be consistent.
    pub(crate) fn from_parts(columns: Vec<Series>, index: RowIndex) -> Self {
        Self { columns, index }
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.columns
            .first()
            .map_or_else(|| self.index.len(), Series::len)
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    /// Returns the column labels in order, including duplicates.
    pub fn column_labels(&self) -> Vec<Label> {
        self.columns
            .iter()
            .filter_map(|c| c.name().cloned())
            .collect()
    }

    /// Returns true if at least one column carries `label`.
    pub fn contains_column(&self, label: &Label) -> bool {
        self.columns.iter().any(|c| c.name() == Some(label))
    }

    /// Returns the positions of every column carrying `label`.
    pub fn positions_of(&self, label: &Label) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name() == Some(label))
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns the column at `position`.
    pub fn column_at(&self, position: usize) -> Option<&Series> {
        self.columns.get(position)
    }

    /// Replaces the data of the column at `position`, keeping its label.
    pub fn replace_column(&mut self, position: usize, series: Series) {
        if let Some(slot) = self.columns.get_mut(position) {
            let name = slot.name().cloned();
            *slot = series.renamed(name);
        }
    }

    /// Returns the number of column levels.
    ///
    /// Tables whose labels are all tuples of the same arity have that many
    /// levels; every other table has one.
    pub fn column_nlevels(&self) -> usize {
        let mut arity = None;
        for column in &self.columns {
            match column.name().and_then(Label::as_tuple).map(<[Label]>::len) {
                Some(n) if arity.is_none() || arity == Some(n) => arity = Some(n),
                _ => return 1,
            }
        }
        arity.unwrap_or(1)
    }

    /// Returns the row index.
    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    /// Installs a row index of matching length.
    pub(crate) fn set_index(&mut self, index: RowIndex) {
        self.index = index;
    }
}
