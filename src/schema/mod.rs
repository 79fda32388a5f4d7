//! Schema components for validating tables.
//!
//! This module provides the three component kinds (column, index and
//! multi-level index), the whole-table schema that combines them, and the
//! default validators they delegate to. Each component validates a table
//! on its own, in lazy or fail-fast mode.
//!
//! # Example
//!
//! ```rust
//! use framecheck::{DataType, Schema, SchemaComponent, Table, ValidateOptions};
//! use serde_json::json;
//!
//! let schema = Schema::column(DataType::Int64).name("x").nullable(false);
//! let table = Table::from_columns(vec![("x", vec![json!(1), json!(2)])]).unwrap();
//!
//! let result = schema.validate(&table, &ValidateOptions::new()).unwrap();
//! assert!(result.is_success());
//! ```

mod column;
mod field;
mod index;
mod multi_index;
mod table;
mod traits;

pub use column::ColumnSchema;
pub use field::{FieldBackend, FieldSchema, ReportDuplicates};
pub use index::IndexSchema;
pub use multi_index::{MultiIndexBuilder, MultiIndexSchema};
pub use table::{IndexComponent, TableBackend, TableSchema};
pub use traits::{FieldValidator, SchemaComponent, TableValidator};

use crate::dtype::DataType;

/// Entry point for creating schemas.
///
/// `Schema` provides factory methods for each component kind. Every schema
/// is configured through builder methods and never changes while
/// validating, so one schema can be shared across threads.
///
/// # Example
///
/// ```rust
/// use framecheck::{DataType, Schema};
///
/// let table = Schema::table()
///     .column("id", Schema::column(DataType::Int64).unique(true))
///     .column("^score_", Schema::column(DataType::Float64).regex(true))
///     .index(Schema::index(DataType::Int64))
///     .strict(true);
///
/// assert_eq!(table.columns().len(), 2);
/// ```
pub struct Schema;

impl Schema {
    /// Creates a column schema.
    ///
    /// Pass `None` to accept any dtype. The column is required and
    /// non-nullable until configured otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use framecheck::{DataType, Schema, SchemaComponent, Table, ValidateOptions};
    /// use serde_json::json;
    ///
    /// let schema = Schema::column(DataType::Int64).name("x");
    /// let table = Table::from_columns(vec![("x", vec![json!(1), json!(null)])]).unwrap();
    ///
    /// let result = schema.validate(&table, &ValidateOptions::new()).unwrap();
    /// assert!(result.is_failure());
    ///
    /// let result = schema.nullable(true).validate(&table, &ValidateOptions::new()).unwrap();
    /// assert!(result.is_success());
    /// ```
    pub fn column(dtype: impl Into<Option<DataType>>) -> ColumnSchema {
        ColumnSchema::new(dtype.into())
    }

    /// Creates a single-level index schema.
    pub fn index(dtype: impl Into<Option<DataType>>) -> IndexSchema {
        IndexSchema::new(dtype.into())
    }

    /// Starts a multi-level index schema from its levels, in order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use framecheck::{DataType, Schema, SchemaInitError};
    ///
    /// let result = Schema::multi_index(vec![
    ///     Schema::index(DataType::String).name("a"),
    ///     Schema::index(DataType::Int64),
    /// ])
    /// .ordered(false)
    /// .build();
    ///
    /// assert_eq!(result.err(), Some(SchemaInitError::UnnamedUnorderedLevel));
    /// ```
    pub fn multi_index(indexes: Vec<IndexSchema>) -> MultiIndexBuilder {
        MultiIndexBuilder::new(indexes)
    }

    /// Creates an empty table schema.
    pub fn table() -> TableSchema {
        TableSchema::new()
    }
}
