//! Whole-table schema and the default table validator.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use stillwater::Validation;
use tracing::debug;

use crate::error::{FailureCase, ReasonCode, SchemaContext, SchemaError, SchemaInitError};
use crate::options::ValidateOptions;
use crate::table::{Label, Table};
use crate::validation::{Abort, ErrorHandler};
use crate::ValidationResult;

use super::column::ColumnSchema;
use super::field::{value_key, ReportDuplicates};
use super::index::IndexSchema;
use super::multi_index::MultiIndexSchema;
use super::traits::{run_table_validator, SchemaComponent, TableValidator};

/// The row-index component of a table schema.
#[derive(Debug, Clone)]
pub enum IndexComponent {
    /// A single-level index.
    Single(IndexSchema),
    /// A multi-level index.
    Multi(MultiIndexSchema),
}

impl IndexComponent {
    /// Identity used in failure records.
    pub fn context(&self) -> SchemaContext {
        match self {
            IndexComponent::Single(index) => index.context(),
            IndexComponent::Multi(index) => index.context(),
        }
    }

    fn run(
        &self,
        table: &mut Table,
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
        force_coerce: bool,
    ) -> Result<(), Abort> {
        match self {
            IndexComponent::Single(index) if force_coerce => {
                index.clone().coerce(true).run(table, options, handler)
            }
            IndexComponent::Single(index) => index.run(table, options, handler),
            IndexComponent::Multi(index) if force_coerce => {
                index.with_coerce(true).run(table, options, handler)
            }
            IndexComponent::Multi(index) => index.run(table, options, handler),
        }
    }
}

impl From<IndexSchema> for IndexComponent {
    fn from(index: IndexSchema) -> Self {
        IndexComponent::Single(index)
    }
}

impl From<MultiIndexSchema> for IndexComponent {
    fn from(index: MultiIndexSchema) -> Self {
        IndexComponent::Multi(index)
    }
}

/// Schema for a whole table: named columns, an optional index, and
/// table-wide constraints.
///
/// # Example
///
/// ```rust
/// use framecheck::{Check, DataType, ReasonCode, Schema, Table, ValidateOptions};
/// use serde_json::json;
///
/// let schema = Schema::table()
///     .column("id", Schema::column(DataType::Int64).unique(true))
///     .column("score", Schema::column(DataType::Float64).check(Check::in_range(0.0, 1.0)))
///     .strict(true);
///
/// let table = Table::from_columns(vec![
///     ("id", vec![json!(1), json!(1)]),
///     ("score", vec![json!(0.5), json!(1.5)]),
///     ("extra", vec![json!(null), json!(null)]),
/// ])
/// .unwrap();
///
/// let errors = schema
///     .validate(&table, &ValidateOptions::new().lazy(true))
///     .unwrap()
///     .into_result()
///     .unwrap_err();
///
/// assert_eq!(errors.len(), 3);
/// assert_eq!(errors.first().reason, ReasonCode::ColumnNotInSchema);
/// ```
#[derive(Clone)]
pub struct TableSchema {
    name: Option<String>,
    columns: IndexMap<Label, ColumnSchema>,
    index: Option<IndexComponent>,
    strict: bool,
    ordered: bool,
    unique: Vec<Label>,
    report_duplicates: ReportDuplicates,
    coerce: bool,
    backend: Arc<dyn TableValidator>,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSchema {
    /// Creates an empty, non-strict, unordered table schema.
    pub fn new() -> Self {
        Self {
            name: None,
            columns: IndexMap::new(),
            index: None,
            strict: false,
            ordered: false,
            unique: Vec::new(),
            report_duplicates: ReportDuplicates::default(),
            coerce: false,
            backend: Arc::new(TableBackend),
        }
    }

    /// Adds a column under `key`; the column takes `key` as its name.
    ///
    /// For a regex column the key is the pattern.
    pub fn column(mut self, key: impl Into<Label>, column: ColumnSchema) -> Self {
        let key = key.into();
        let column = column.bind_name(key.clone());
        self.columns.insert(key, column);
        self
    }

    /// Sets the row-index component.
    pub fn index(mut self, index: impl Into<IndexComponent>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Rejects columns the schema does not declare.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Requires declared columns to appear in declaration order.
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Requires rows to be jointly unique over `columns`.
    pub fn unique<I, L>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.unique = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets which duplicate rows the joint-uniqueness check reports.
    pub fn report_duplicates(mut self, policy: ReportDuplicates) -> Self {
        self.report_duplicates = policy;
        self
    }

    /// Coerces every column and the index before checking.
    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    /// Sets the schema name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the validator used for this schema.
    pub fn with_table_validator(mut self, validator: Arc<dyn TableValidator>) -> Self {
        self.backend = validator;
        self
    }

    /// Returns the declared columns in order.
    pub fn columns(&self) -> &IndexMap<Label, ColumnSchema> {
        &self.columns
    }

    /// Returns the index component.
    pub fn index_component(&self) -> Option<&IndexComponent> {
        self.index.as_ref()
    }

    /// Returns true if undeclared columns are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Returns true if column order is checked.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Returns the jointly unique columns.
    pub fn unique_columns(&self) -> &[Label] {
        &self.unique
    }

    /// Returns true if columns and index are coerced.
    pub fn is_coerced(&self) -> bool {
        self.coerce
    }

    /// Identity used in failure records.
    pub fn context(&self) -> SchemaContext {
        SchemaContext::Table(self.name.clone())
    }

    pub(crate) fn backend(&self) -> &dyn TableValidator {
        self.backend.as_ref()
    }

    pub(crate) fn with_columns(&self, columns: IndexMap<Label, ColumnSchema>) -> Self {
        Self {
            columns,
            ..self.clone()
        }
    }

    /// Validates `table` in place; coercion mutates the caller's table.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaInitError`] if a component is misconfigured.
    pub fn validate_in_place(
        &self,
        table: &mut Table,
        options: &ValidateOptions,
    ) -> Result<ValidationResult<()>, SchemaInitError> {
        let result = run_table_validator(self.backend(), table, self, options, options.is_lazy())?;
        if let Validation::Failure(ref errors) = result {
            debug!(schema = %self.context(), failures = errors.len(), "table validation failed");
        }
        Ok(result)
    }

    /// Validates a copy of `table`, returning the validated copy.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaInitError`] if a component is misconfigured.
    pub fn validate(
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

impl fmt::Debug for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSchema")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("index", &self.index)
            .field("strict", &self.strict)
            .field("ordered", &self.ordered)
            .field("unique", &self.unique)
            .field("coerce", &self.coerce)
            .finish_non_exhaustive()
    }
}

/// The default [`TableValidator`].
///
/// Order: column presence, strictness, ordering, joint uniqueness, each
/// column component in declaration order, then the index component.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableBackend;

impl TableBackend {
    fn check_presence(
        &self,
        table: &Table,
        schema: &TableSchema,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        for (key, column) in schema.columns() {
            if column.is_regex() || !column.is_required() || table.contains_column(key) {
                continue;
            }
            handler.collect(
                SchemaError::new(
                    SchemaContext::Column(Some(key.clone())),
                    ReasonCode::ColumnNotInDataframe,
                    format!("column '{}' not in table", key),
                )
                .with_check("column_in_dataframe")
                .with_failure_cases(vec![FailureCase::scalar(key.to_string())]),
            )?;
        }
        Ok(())
    }

    fn check_strict(
        &self,
        table: &Table,
        schema: &TableSchema,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        let regex_matches: Vec<Label> = schema
            .columns()
            .values()
            .filter(|c| c.is_regex())
            .flat_map(|c| c.regex_candidates(table).unwrap_or_default())
            .collect();

        for label in table.column_labels() {
            if schema.columns().contains_key(&label) || regex_matches.contains(&label) {
                continue;
            }
            handler.collect(
                SchemaError::new(
                    schema.context(),
                    ReasonCode::ColumnNotInSchema,
                    format!("column '{}' not in schema", label),
                )
                .with_check("column_in_schema")
                .with_failure_cases(vec![
                    FailureCase::scalar(label.to_string()).in_column(label.clone())
                ]),
            )?;
        }
        Ok(())
    }

    fn check_order(
        &self,
        table: &Table,
        schema: &TableSchema,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        let mut furthest = 0;
        for label in table.column_labels() {
            let Some(position) = schema.columns().get_index_of(&label) else {
                continue;
            };
            if position < furthest {
                handler.collect(
                    SchemaError::new(
                        schema.context(),
                        ReasonCode::ColumnNotOrdered,
                        format!("column '{}' out-of-order", label),
                    )
                    .with_check("column_ordered")
                    .with_failure_cases(vec![
                        FailureCase::scalar(label.to_string()).in_column(label.clone())
                    ]),
                )?;
            }
            furthest = furthest.max(position);
        }
        Ok(())
    }

    fn check_joint_unique(
        &self,
        table: &Table,
        schema: &TableSchema,
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        let present: Vec<(&Label, usize)> = schema
            .unique_columns()
            .iter()
            .filter_map(|label| table.positions_of(label).first().map(|&p| (label, p)))
            .collect();
        if present.is_empty() {
            return Ok(());
        }

        let row = |r: usize| -> Vec<Value> {
            present
                .iter()
                .map(|&(_, p)| {
                    table
                        .column_at(p)
                        .and_then(|c| c.get(r))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect()
        };
        let rows: Vec<usize> = options
            .row_positions(table.num_rows())
            .unwrap_or_else(|| (0..table.num_rows()).collect());
        let keys: Vec<String> = rows
            .iter()
            .map(|&r| value_key(&Value::Array(row(r))))
            .collect();

        let flagged: Vec<usize> = schema
            .report_duplicates
            .flagged(&keys)
            .into_iter()
            .map(|p| rows[p])
            .collect();
        if flagged.is_empty() {
            return Ok(());
        }

        let cases: Vec<FailureCase> = flagged
            .iter()
            .flat_map(|&r| {
                present
                    .iter()
                    .zip(row(r))
                    .map(move |(&(label, _), value)| FailureCase::at(r, value).in_column(label.clone()))
            })
            .collect();
        let names: Vec<String> = present.iter().map(|(l, _)| format!("'{}'", l)).collect();
        handler.collect(
            SchemaError::new(
                schema.context(),
                ReasonCode::Duplicates,
                format!(
                    "columns [{}] not unique: {} duplicated row(s)",
                    names.join(", "),
                    flagged.len()
                ),
            )
            .with_check("multiple_fields_uniqueness")
            .with_failure_cases(cases),
        )
    }
}

impl TableValidator for TableBackend {
    fn validate(
        &self,
        table: &mut Table,
        schema: &TableSchema,
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        debug!(
            schema = %schema.context(),
            columns = schema.columns().len(),
            rows = table.num_rows(),
            "validating table"
        );

        for column in schema.columns().values() {
            column.preflight()?;
        }

        self.check_presence(table, schema, handler)?;
        if schema.is_strict() {
            self.check_strict(table, schema, handler)?;
        }
        if schema.is_ordered() {
            self.check_order(table, schema, handler)?;
        }
        self.check_joint_unique(table, schema, options, handler)?;

        for (key, column) in schema.columns() {
            if !column.is_regex() && !table.contains_column(key) {
                continue;
            }
            if column.is_regex() && !column.is_required() {
                if let Ok(matches) = column.regex_candidates(table) {
                    if matches.is_empty() {
                        continue;
                    }
                }
            }
            let column = if schema.is_coerced() {
                Cow::Owned(column.forced_coerce())
            } else {
                Cow::Borrowed(column)
            };
            let outcome = column.run(table, options, handler);
            handler.absorb(outcome)?;
        }

        if let Some(index) = schema.index_component() {
            let outcome = index.run(table, options, handler, schema.is_coerced());
            handler.absorb(outcome)?;
        }
        Ok(())
    }
}
