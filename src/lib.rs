//! # Framecheck
//!
//! Schema components for validating tabular data, with either lazy or
//! fail-fast error reporting.
//!
//! ## Overview
//!
//! A schema component describes one part of a table: a column (or a family
//! of columns matched by a regex), the row index, or a multi-level row
//! index. Validating a component resolves it against the table, coerces the
//! data to the declared types, and runs nullability, uniqueness, dtype and
//! predicate checks. In lazy mode every failure is collected; in fail-fast
//! mode the first failure ends the pass. Failures are returned through
//! stillwater's `Validation` type; misconfigured schemas are reported
//! separately as a [`SchemaInitError`].
//!
//! ## Core Types
//!
//! - [`Table`]: Ordered, possibly duplicate-labelled columns plus a row index
//! - [`Schema`]: Entry point for creating column, index and table schemas
//! - [`SchemaComponent`]: The capability interface shared by all components
//! - [`SchemaError`]: A single validation failure with its failure cases
//! - [`SchemaErrors`]: A non-empty collection of validation failures
//!
//! ## Example
//!
//! ```rust
//! use framecheck::{DataType, ReasonCode, Schema, SchemaComponent, Table, ValidateOptions};
//! use serde_json::json;
//!
//! let schema = Schema::column(DataType::Int64).name("x").nullable(false);
//! let table = Table::from_columns(vec![("x", vec![json!(1), json!(2), json!(null)])]).unwrap();
//!
//! let errors = schema
//!     .validate(&table, &ValidateOptions::new().lazy(true))
//!     .unwrap()
//!     .into_result()
//!     .unwrap_err();
//!
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors.first().reason, ReasonCode::SeriesContainsNulls);
//! assert_eq!(errors.first().failure_rows(), vec![2]);
//! ```

pub mod check;
pub mod dtype;
pub mod error;
pub mod options;
pub mod schema;
pub mod table;
pub mod validation;

pub use check::{Check, CheckFault, CheckOutput};
pub use dtype::DataType;
pub use error::{FailureCase, ReasonCode, SchemaContext, SchemaError, SchemaErrors, SchemaInitError};
pub use options::ValidateOptions;
pub use schema::{
    ColumnSchema, FieldBackend, FieldSchema, FieldValidator, IndexComponent, IndexSchema,
    MultiIndexBuilder, MultiIndexSchema, ReportDuplicates, Schema, SchemaComponent, TableBackend,
    TableSchema, TableValidator,
};
pub use table::{Label, MultiLevelIndex, RowIndex, Series, Table, TableError};
pub use validation::{Abort, ErrorHandler};

/// Type alias for validation results using SchemaErrors
pub type ValidationResult<T> = stillwater::Validation<T, SchemaErrors>;
