//! Multi-level row index schema component.
//!
//! A multi-level index is validated by coercing each declared level, then
//! flattening the index into a synthetic table (one column per level) and
//! validating that table with a [`TableSchema`] built from the levels.
//! Failures from the synthetic table are reported against the multi-index.

use std::borrow::Cow;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::{SchemaContext, SchemaError, SchemaErrors, SchemaInitError};
use crate::options::ValidateOptions;
use crate::table::{Label, MultiLevelIndex, RowIndex, Series, Table};
use crate::validation::{Abort, ErrorHandler};

use super::column::ColumnSchema;
use super::field::{FieldSchema, ReportDuplicates};
use super::index::IndexSchema;
use super::table::TableSchema;
use super::traits::{run_table_validator, SchemaComponent, TableValidator};

/// Builder for [`MultiIndexSchema`].
///
/// Created by [`Schema::multi_index`](super::Schema::multi_index).
pub struct MultiIndexBuilder {
    indexes: Vec<IndexSchema>,
    coerce: bool,
    strict: bool,
    ordered: bool,
    unique: Vec<Label>,
    name: Option<String>,
    backend: Option<Arc<dyn TableValidator>>,
}

impl MultiIndexBuilder {
    pub(crate) fn new(indexes: Vec<IndexSchema>) -> Self {
        Self {
            indexes,
            coerce: false,
            strict: false,
            ordered: true,
            unique: Vec::new(),
            name: None,
            backend: None,
        }
    }

    /// Coerces every level, whatever the level's own setting.
    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    /// Rejects index levels the schema does not declare.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Requires levels to appear in declaration order. Unordered schemas
    /// find levels by name only.
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Requires rows to be jointly unique over the named levels.
    pub fn unique<I, L>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.unique = levels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the component name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the validator used for the flattened index.
    pub fn with_table_validator(mut self, validator: Arc<dyn TableValidator>) -> Self {
        self.backend = Some(validator);
        self
    }

    /// Builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaInitError::UnnamedUnorderedLevel`] if the schema is
    /// unordered and a level has no name.
    pub fn build(self) -> Result<MultiIndexSchema, SchemaInitError> {
        let mut columns = IndexMap::new();
        for (position, index) in self.indexes.iter().enumerate() {
            if !self.ordered && index.field().name().is_none() {
                return Err(SchemaInitError::UnnamedUnorderedLevel);
            }
            let key = index
                .field()
                .name()
                .cloned()
                .unwrap_or_else(|| Label::from(position));
            columns.insert(key.clone(), level_column(index, key));
        }

        let mut synthetic = TableSchema::new()
            .strict(self.strict)
            .ordered(self.ordered)
            .unique(self.unique);
        if let Some(name) = &self.name {
            synthetic = synthetic.name(name.clone());
        }
        if let Some(backend) = self.backend {
            synthetic = synthetic.with_table_validator(backend);
        }

        Ok(MultiIndexSchema {
            indexes: self.indexes,
            coerce: self.coerce,
            name: self.name,
            synthetic: Box::new(synthetic.with_columns(columns)),
        })
    }
}

/// The synthetic column standing in for one declared level.
///
/// Coercion is applied to levels before flattening, so the column never
/// coerces.
fn level_column(index: &IndexSchema, key: Label) -> ColumnSchema {
    let level = index.field();
    let field = FieldSchema {
        dtype: level.dtype(),
        checks: level.checks().to_vec(),
        nullable: level.is_nullable(),
        unique: level.is_unique(),
        report_duplicates: ReportDuplicates::default(),
        coerce: false,
        name: Some(key),
        title: None,
        description: None,
    };
    ColumnSchema::from_field(field, Arc::clone(index.backend()))
}

/// Schema for a table's multi-level row index.
///
/// # Example
///
/// ```rust
/// use framecheck::{DataType, MultiLevelIndex, ReasonCode, Schema, SchemaComponent, Table, ValidateOptions};
/// use serde_json::json;
///
/// let schema = Schema::multi_index(vec![
///     Schema::index(DataType::String).name("a"),
///     Schema::index(DataType::Int64).name("b"),
/// ])
/// .unique(["a", "b"])
/// .build()
/// .unwrap();
///
/// let index = MultiLevelIndex::from_arrays(vec![
///     (Some("a".into()), vec![json!("x"), json!("x"), json!("y")]),
///     (Some("b".into()), vec![json!(1), json!(1), json!(2)]),
/// ])
/// .unwrap();
/// let table = Table::from_columns(vec![("v", vec![json!(1), json!(2), json!(3)])])
///     .unwrap()
///     .with_index(index)
///     .unwrap();
///
/// let errors = schema
///     .validate(&table, &ValidateOptions::new())
///     .unwrap()
///     .into_result()
///     .unwrap_err();
/// assert_eq!(errors.first().reason, ReasonCode::Duplicates);
/// assert_eq!(errors.first().failure_rows(), vec![0, 0, 1, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct MultiIndexSchema {
    indexes: Vec<IndexSchema>,
    coerce: bool,
    name: Option<String>,
    synthetic: Box<TableSchema>,
}

impl MultiIndexSchema {
    /// Returns the declared levels in order.
    pub fn indexes(&self) -> &[IndexSchema] {
        &self.indexes
    }

    /// Returns the declared level names.
    pub fn names(&self) -> Vec<Option<Label>> {
        self.indexes
            .iter()
            .map(|index| index.field().name().cloned())
            .collect()
    }

    /// Returns true if the schema or any of its levels coerces.
    pub fn is_coerced(&self) -> bool {
        self.coerce || self.indexes.iter().any(|index| index.field().is_coerced())
    }

    /// Returns true if undeclared levels are rejected.
    pub fn is_strict(&self) -> bool {
        self.synthetic.is_strict()
    }

    /// Returns true if level order is checked.
    pub fn is_ordered(&self) -> bool {
        self.synthetic.is_ordered()
    }

    /// Returns the table schema the flattened index is validated against.
    pub fn flattened_schema(&self) -> &TableSchema {
        &self.synthetic
    }

    pub(crate) fn with_coerce(&self, coerce: bool) -> Self {
        Self {
            coerce,
            ..self.clone()
        }
    }

    /// Physical level positions a declared level applies to.
    fn level_positions(&self, declared: usize, index: &IndexSchema, levels: &[Series]) -> Vec<usize> {
        if self.indexes.iter().all(|i| i.field().name().is_none()) {
            return (declared < levels.len()).then_some(declared).into_iter().collect();
        }
        levels
            .iter()
            .enumerate()
            .filter(|(_, level)| level.name() == index.field().name())
            .map(|(position, _)| position)
            .collect()
    }

    /// The synthetic table: one column per physical level, labelled by the
    /// level name or, for unnamed levels, the level position.
    fn flatten(levels: &MultiLevelIndex) -> Table {
        let columns = levels
            .levels()
            .iter()
            .enumerate()
            .map(|(position, level)| {
                let label = level.name().cloned().unwrap_or_else(|| Label::from(position));
                level.clone().renamed(Some(label))
            })
            .collect();
        Table::from_parts(columns, RowIndex::range(levels.len()))
    }

    /// Re-keys the synthetic columns when the index repeats a level name.
    fn synthetic_schema(&self, levels: &MultiLevelIndex) -> Cow<'_, TableSchema> {
        let names = levels.names();
        let distinct: IndexSet<&Option<Label>> = names.iter().collect();
        if names.iter().all(Option::is_none) || distinct.len() == levels.nlevels() {
            return Cow::Borrowed(&self.synthetic);
        }

        let keys: IndexSet<Label> = names
            .iter()
            .enumerate()
            .map(|(position, name)| name.clone().unwrap_or_else(|| Label::from(position)))
            .collect();
        let columns = keys
            .into_iter()
            .zip(self.synthetic.columns().values())
            .map(|(key, column)| (key.clone(), column.bind_name(key)))
            .collect();
        debug!(schema = %self.context(), "re-keyed duplicate index level names");
        Cow::Owned(self.synthetic.with_columns(columns))
    }

    fn rewrite(&self, mut error: SchemaError) -> SchemaError {
        if let Some(column) = error.schema.label().cloned() {
            for case in &mut error.failure_cases {
                case.column = Some(column.clone());
            }
        }
        error.schema = self.context();
        error
    }
}

impl SchemaComponent for MultiIndexSchema {
    type Target = ();

    fn context(&self) -> SchemaContext {
        SchemaContext::MultiIndex(self.name.clone())
    }

    fn resolve(&self, _table: &Table, _handler: &mut ErrorHandler) -> Result<Vec<()>, Abort> {
        Ok(vec![()])
    }

    /// Coerces the declared levels.
    ///
    /// Every level is attempted before any failure is reported. Failures
    /// end the pass for this component: all of them in lazy mode, the first
    /// otherwise.
    fn coerce(
        &self,
        table: &mut Table,
        targets: &[()],
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        if targets.is_empty() || !self.is_coerced() {
            return Ok(());
        }

        let mut levels = table.index().to_levels().levels().to_vec();
        let mut failures = Vec::new();
        for (declared, index) in self.indexes.iter().enumerate() {
            if !(self.coerce || index.field().is_coerced()) {
                continue;
            }
            let field = index.field().clone().with_coerce(true);
            for position in self.level_positions(declared, index, &levels) {
                match index.backend().coerce(&levels[position], &field, &index.context()) {
                    Ok(coerced) => levels[position] = coerced,
                    Err(error) => failures.push(error),
                }
            }
        }

        if let Some(errors) = SchemaErrors::try_from_vec(failures) {
            debug!(schema = %self.context(), failures = errors.len(), "index level coercion failed");
            let errors = if handler.is_lazy() {
                errors
            } else {
                SchemaErrors::single(errors.first().clone())
            };
            return Err(Abort::Failures(errors));
        }

        let coerced = if table.index().is_multi() {
            RowIndex::Multi(MultiLevelIndex::with_levels(levels))
        } else {
            match levels.into_iter().next() {
                Some(level) => RowIndex::Single(level),
                None => return Ok(()),
            }
        };
        table.set_index(coerced);
        Ok(())
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

        let levels = table.index().to_levels();
        let schema = self.synthetic_schema(&levels);
        let mut flat = Self::flatten(&levels);

        let result =
            run_table_validator(schema.backend(), &mut flat, &schema, options, handler.is_lazy())?;
        if let Err(errors) = result.into_result() {
            for error in errors {
                handler.collect(self.rewrite(error))?;
            }
        }
        Ok(())
    }
}
