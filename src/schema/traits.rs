//! Traits shared by schema components and their validator collaborators.
//!
//! [`SchemaComponent`] is the capability interface of the three component
//! kinds (column, index, multi-index): each resolves its targets in a table,
//! coerces them, and checks them. [`FieldValidator`] and [`TableValidator`]
//! are the collaborators components delegate to; default implementations
//! live in [`FieldBackend`](super::FieldBackend) and
//! [`TableBackend`](super::TableBackend), and either can be replaced per
//! component.

use stillwater::Validation;
use tracing::debug;

use crate::error::{SchemaContext, SchemaError, SchemaErrors, SchemaInitError};
use crate::options::ValidateOptions;
use crate::table::{Series, Table};
use crate::validation::{Abort, ErrorHandler};
use crate::ValidationResult;

use super::field::FieldSchema;
use super::table::TableSchema;

/// A schema unit validated independently against a table.
///
/// Implementors provide the three stages; the provided methods run them in
/// order against a shared [`ErrorHandler`]. Components never mutate
/// themselves while validating, so one component can validate many tables
/// from many threads.
///
/// # Example
///
/// ```rust
/// use framecheck::{DataType, Schema, SchemaComponent, Table, ValidateOptions};
/// use serde_json::json;
///
/// let column = Schema::column(DataType::Int64).name("x").nullable(false);
/// let table = Table::from_columns(vec![("x", vec![json!(1), json!(2), json!(null)])]).unwrap();
///
/// let result = column.validate(&table, &ValidateOptions::new().lazy(true)).unwrap();
/// assert!(result.is_failure());
/// ```
pub trait SchemaComponent: Send + Sync {
    /// A concrete thing this component resolves to in a table.
    type Target;

    /// Identity used in failure records.
    fn context(&self) -> SchemaContext;

    /// Rejects schemas that cannot validate any data.
    fn preflight(&self) -> Result<(), SchemaInitError> {
        Ok(())
    }

    /// Finds the targets this component validates in `table`.
    fn resolve(&self, table: &Table, handler: &mut ErrorHandler) -> Result<Vec<Self::Target>, Abort>;

    /// Converts the targets to the declared types, in place.
    fn coerce(
        &self,
        table: &mut Table,
        targets: &[Self::Target],
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort>;

    /// Runs the value-level checks on the targets.
    fn check(
        &self,
        table: &Table,
        targets: &[Self::Target],
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort>;

    /// Runs all stages against an existing handler.
    fn run(
        &self,
        table: &mut Table,
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        self.preflight()?;
        let targets = self.resolve(table, handler)?;
        self.coerce(table, &targets, handler)?;
        self.check(table, &targets, options, handler)
    }

    /// Validates `table` in place; coercion mutates the caller's table.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaInitError`] if the component is misconfigured.
    fn validate_in_place(
        &self,
        table: &mut Table,
        options: &ValidateOptions,
    ) -> Result<ValidationResult<()>, SchemaInitError> {
        let mut handler = ErrorHandler::new(options.is_lazy());
        let outcome = self.run(table, options, &mut handler);
        let result = handler.finish(outcome)?;
        if let Validation::Failure(ref errors) = result {
            debug!(schema = %self.context(), failures = errors.len(), "component validation failed");
        }
        Ok(result)
    }

    /// Validates a copy of `table`, returning the validated (and possibly
    /// coerced) copy.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaInitError`] if the component is misconfigured.
    fn validate(
        &self,
        table: &Table,
        options: &ValidateOptions,
    ) -> Result<ValidationResult<Table>, SchemaInitError> {
        let mut working = table.clone();
        Ok(match self.validate_in_place(&mut working, options)? {
            Validation::Success(()) => Validation::Success(working),
            Validation::Failure(errors) => Validation::Failure(errors),
        })
    }
}

/// Validates one-dimensional data against field constraints.
pub trait FieldValidator: Send + Sync {
    /// Converts `series` to the field's dtype.
    ///
    /// Fails with a `dtype_coercion_error` listing every value that could
    /// not be converted.
    fn coerce(
        &self,
        series: &Series,
        field: &FieldSchema,
        context: &SchemaContext,
    ) -> Result<Series, SchemaError>;

    /// Checks nullability, uniqueness, dtype and the field's checks.
    fn validate(
        &self,
        series: &Series,
        field: &FieldSchema,
        context: &SchemaContext,
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort>;
}

/// Validates a table against a mapping of named column schemas.
pub trait TableValidator: Send + Sync {
    /// Checks column presence, strictness, ordering, joint uniqueness and
    /// every column and index component of `schema`.
    fn validate(
        &self,
        table: &mut Table,
        schema: &TableSchema,
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort>;
}

/// Validates a whole table and returns its failures as one set.
pub(crate) fn run_table_validator(
    validator: &dyn TableValidator,
    table: &mut Table,
    schema: &TableSchema,
    options: &ValidateOptions,
    lazy: bool,
) -> Result<Validation<(), SchemaErrors>, SchemaInitError> {
    let mut handler = ErrorHandler::new(lazy);
    let outcome = validator.validate(table, schema, options, &mut handler);
    handler.finish(outcome)
}
