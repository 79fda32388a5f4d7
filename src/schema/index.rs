//! Single-level row index schema component.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dtype::DataType;
use crate::error::{FailureCase, ReasonCode, SchemaContext, SchemaError};
use crate::options::ValidateOptions;
use crate::table::{RowIndex, Table};
use crate::validation::{Abort, ErrorHandler};

use super::field::{field_builders, FieldBackend, FieldSchema};
use super::traits::{FieldValidator, SchemaComponent};

/// Schema for a table's single-level row index.
///
/// # Example
///
/// ```rust
/// use framecheck::{DataType, Schema, SchemaComponent, Series, Table, ValidateOptions};
/// use serde_json::json;
///
/// let schema = Schema::index(DataType::String).unique(true);
/// let table = Table::from_columns(vec![("x", vec![json!(1), json!(2)])])
///     .unwrap()
///     .with_index(Series::new("id", vec![json!("a"), json!("a")]))
///     .unwrap();
///
/// let result = schema.validate(&table, &ValidateOptions::new()).unwrap();
/// assert!(result.is_failure());
/// ```
#[derive(Clone)]
pub struct IndexSchema {
    field: FieldSchema,
    backend: Arc<dyn FieldValidator>,
}

field_builders!(IndexSchema);

impl IndexSchema {
    /// Creates a non-nullable index of the given dtype.
    pub fn new(dtype: Option<DataType>) -> Self {
        Self {
            field: FieldSchema::new(dtype),
            backend: Arc::new(FieldBackend),
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn FieldValidator> {
        &self.backend
    }
}

impl SchemaComponent for IndexSchema {
    type Target = ();

    fn context(&self) -> SchemaContext {
        SchemaContext::Index(self.field.name().cloned())
    }

    fn resolve(&self, table: &Table, handler: &mut ErrorHandler) -> Result<Vec<()>, Abort> {
        if let RowIndex::Multi(index) = table.index() {
            handler.collect(
                SchemaError::new(
                    self.context(),
                    ReasonCode::MismatchIndex,
                    format!(
                        "Attempting to validate mismatch index: expected a single-level \
                         index, found {} levels",
                        index.nlevels()
                    ),
                )
                .with_failure_cases(vec![FailureCase::scalar(index.nlevels())]),
            )?;
            return Ok(Vec::new());
        }
        Ok(vec![()])
    }

    fn coerce(
        &self,
        table: &mut Table,
        targets: &[()],
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        if targets.is_empty() || !self.field.is_coerced() {
            return Ok(());
        }
        let RowIndex::Single(series) = table.index() else {
            return Ok(());
        };

        match self.backend.coerce(series, &self.field, &self.context()) {
            Ok(coerced) => {
                debug!(schema = %self.context(), dtype = %coerced.dtype(), "coerced index");
                table.set_index(RowIndex::Single(coerced));
                Ok(())
            }
            Err(error) => handler.collect(error),
        }
    }

    fn check(
        &self,
        table: &Table,
        targets: &[()],
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        if targets.is_empty() {
            return Ok(());
        }
        let RowIndex::Single(series) = table.index() else {
            return Ok(());
        };
        self.backend
            .validate(series, &self.field, &self.context(), options, handler)
    }
}

impl fmt::Debug for IndexSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSchema")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}
