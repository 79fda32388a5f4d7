//! Column schema component.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use regex::Regex;
use tracing::debug;

use crate::dtype::DataType;
use crate::error::{
    FailureCase, ReasonCode, SchemaContext, SchemaError, SchemaErrors, SchemaInitError,
};
use crate::options::ValidateOptions;
use crate::table::{Label, Table};
use crate::validation::{Abort, ErrorHandler};

use super::field::{field_builders, FieldBackend, FieldSchema};
use super::traits::{FieldValidator, SchemaComponent};

/// A compiled regex column name.
enum ColumnPattern {
    /// One pattern matched against single-level labels.
    Single(Regex),
    /// One pattern per level of tuple labels; every level must match.
    Levels(Vec<Regex>),
}

fn compile(pattern: &str) -> Result<Regex, SchemaInitError> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|e| SchemaInitError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Schema for one column, or for a family of columns selected by a regex.
///
/// A column is validated as a field: dtype, nullability, uniqueness and
/// checks. When the table holds several columns with the same label, each
/// physical column is coerced and validated on its own.
///
/// # Example
///
/// ```rust
/// use framecheck::{Check, DataType, Schema, SchemaComponent, Table, ValidateOptions};
/// use serde_json::json;
///
/// let schema = Schema::column(DataType::Int64)
///     .name("^col_[0-9]+$")
///     .regex(true)
///     .check(Check::greater_than(0.0));
///
/// let table = Table::from_columns(vec![
///     ("col_1", vec![json!(1), json!(2)]),
///     ("col_2", vec![json!(3), json!(4)]),
///     ("other", vec![json!("a"), json!("b")]),
/// ])
/// .unwrap();
///
/// assert_eq!(schema.matching_columns(&table).unwrap().len(), 2);
/// assert!(schema.validate(&table, &ValidateOptions::new()).unwrap().is_success());
/// ```
#[derive(Clone)]
pub struct ColumnSchema {
    field: FieldSchema,
    required: bool,
    regex: bool,
    backend: Arc<dyn FieldValidator>,
}

field_builders!(ColumnSchema);

impl ColumnSchema {
    /// Creates a required, non-nullable column of the given dtype.
    pub fn new(dtype: Option<DataType>) -> Self {
        Self {
            field: FieldSchema::new(dtype),
            required: true,
            regex: false,
            backend: Arc::new(FieldBackend),
        }
    }

    pub(crate) fn from_field(field: FieldSchema, backend: Arc<dyn FieldValidator>) -> Self {
        Self {
            field,
            required: true,
            regex: false,
            backend,
        }
    }

    /// Treats the name as a pattern selecting every matching column.
    ///
    /// Patterns match from the start of the label. A tuple name holds one
    /// pattern per column level.
    pub fn regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Sets whether the column must be present.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Returns a copy of this schema bound to `name`.
    pub fn bind_name(&self, name: impl Into<Label>) -> Self {
        self.set_name(Some(name.into()))
    }

    /// Returns a copy of this schema with its name replaced.
    pub fn set_name(&self, name: Option<Label>) -> Self {
        Self {
            field: self.field.clone().with_name(name),
            ..self.clone()
        }
    }

    /// Returns true if the name is a pattern.
    pub fn is_regex(&self) -> bool {
        self.regex
    }

    /// Returns true if the column must be present.
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn forced_coerce(&self) -> Self {
        Self {
            field: self.field.clone().with_coerce(true),
            ..self.clone()
        }
    }

    /// Returns the distinct labels in `table` matched by this column's
    /// pattern, in table order. A literal column matches its own name.
    ///
    /// # Errors
    ///
    /// Returns [`Abort::Init`] for a missing or non-string pattern and
    /// [`Abort::Failures`] when no label matches or the pattern and the
    /// labels disagree on level count.
    pub fn matching_columns(&self, table: &Table) -> Result<Vec<Label>, Abort> {
        self.preflight()?;
        let name = self.field.name().ok_or(SchemaInitError::MissingName)?;
        if !self.regex {
            return Ok(vec![name.clone()]);
        }
        let matches = self.regex_candidates(table)?;
        if matches.is_empty() {
            return Err(Abort::Failures(SchemaErrors::single(self.no_match(table))));
        }
        Ok(matches)
    }

    fn pattern(&self) -> Result<ColumnPattern, SchemaInitError> {
        let name = self.field.name().ok_or(SchemaInitError::MissingName)?;
        match name {
            Label::Str(pattern) => Ok(ColumnPattern::Single(compile(pattern)?)),
            Label::Tuple(parts) => parts
                .iter()
                .map(|part| match part {
                    Label::Str(pattern) => compile(pattern),
                    _ => Err(SchemaInitError::NonStringPattern(name.clone())),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ColumnPattern::Levels),
            Label::Int(_) => Err(SchemaInitError::NonStringPattern(name.clone())),
        }
    }

    /// Labels matched by the pattern, possibly none.
    pub(crate) fn regex_candidates(&self, table: &Table) -> Result<Vec<Label>, Abort> {
        let pattern = self.pattern()?;
        let nlevels = table.column_nlevels();

        let matched: IndexSet<Label> = match &pattern {
            ColumnPattern::Single(regex) => {
                if nlevels > 1 {
                    return Err(Abort::Failures(SchemaErrors::single(
                        self.level_mismatch(format!(
                            "Column regex name '{}' is a string, expected a table with \
                             single-level columns, found {} level(s)",
                            self.display_name(),
                            nlevels
                        )),
                    )));
                }
                table
                    .column_labels()
                    .into_iter()
                    .filter(|label| label.match_text().is_some_and(|t| regex.is_match(&t)))
                    .collect()
            }
            ColumnPattern::Levels(regexes) => {
                if regexes.len() != nlevels {
                    return Err(Abort::Failures(SchemaErrors::single(
                        self.level_mismatch(format!(
                            "Column regex name '{}' is a tuple, expected a table with {} \
                             column level(s), found {} level(s)",
                            self.display_name(),
                            regexes.len(),
                            nlevels
                        )),
                    )));
                }
                table
                    .column_labels()
                    .into_iter()
                    .filter(|label| {
                        label.as_tuple().is_some_and(|parts| {
                            parts.iter().zip(regexes).all(|(part, regex)| {
                                part.match_text().is_some_and(|t| regex.is_match(&t))
                            })
                        })
                    })
                    .collect()
            }
        };

        debug!(
            pattern = %self.display_name(),
            matches = matched.len(),
            "resolved regex column"
        );
        Ok(matched.into_iter().collect())
    }

    fn display_name(&self) -> String {
        self.field
            .name()
            .map_or_else(|| "None".to_string(), ToString::to_string)
    }

    fn level_mismatch(&self, message: String) -> SchemaError {
        SchemaError::new(self.context(), ReasonCode::InvalidColumnLevels, message)
            .with_failure_cases(vec![FailureCase::scalar(self.display_name())])
    }

    fn no_match(&self, table: &Table) -> SchemaError {
        let labels: Vec<String> = table
            .column_labels()
            .iter()
            .map(|l| format!("'{}'", l))
            .collect();
        let labels = format!("[{}]", labels.join(", "));
        SchemaError::new(
            self.context(),
            ReasonCode::NoRegexColumnMatch,
            format!(
                "Column regex name='{}' did not match any columns in the table. Update the \
                 regex pattern so that it matches at least one column: {}",
                self.display_name(),
                labels
            ),
        )
        .with_check(format!("no_regex_column_match('{}')", self.display_name()))
        .with_failure_cases(vec![FailureCase::scalar(labels)])
    }
}

impl SchemaComponent for ColumnSchema {
    type Target = Label;

    fn context(&self) -> SchemaContext {
        SchemaContext::Column(self.field.name().cloned())
    }

    fn preflight(&self) -> Result<(), SchemaInitError> {
        if self.field.name().is_none() {
            return Err(SchemaInitError::MissingName);
        }
        if self.regex {
            self.pattern()?;
        }
        Ok(())
    }

    fn resolve(&self, table: &Table, handler: &mut ErrorHandler) -> Result<Vec<Label>, Abort> {
        let name = self.field.name().ok_or(SchemaInitError::MissingName)?;

        if self.regex {
            let matches = match self.regex_candidates(table) {
                Err(Abort::Failures(errors)) => {
                    for error in errors {
                        handler.collect(error)?;
                    }
                    return Ok(Vec::new());
                }
                other => other?,
            };
            if matches.is_empty() {
                handler.collect(self.no_match(table))?;
            }
            return Ok(matches);
        }

        if table.contains_column(name) {
            return Ok(vec![name.clone()]);
        }
        if self.required {
            handler.collect(
                SchemaError::new(
                    self.context(),
                    ReasonCode::ColumnNotInDataframe,
                    format!("column '{}' not in table", name),
                )
                .with_check("column_in_dataframe")
                .with_failure_cases(vec![FailureCase::scalar(name.to_string())]),
            )?;
        }
        Ok(Vec::new())
    }

    fn coerce(
        &self,
        table: &mut Table,
        targets: &[Label],
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        if !self.field.is_coerced() {
            return Ok(());
        }

        for target in targets {
            let bound = self.bind_name(target);
            let context = bound.context();
            let mut failures = Vec::new();
            for position in table.positions_of(target) {
                let Some(series) = table.column_at(position) else {
                    continue;
                };
                match self.backend.coerce(series, &bound.field, &context) {
                    Ok(coerced) => table.replace_column(position, coerced),
                    Err(error) => failures.push(error),
                }
            }
            for error in failures {
                handler.collect(error)?;
            }
        }
        Ok(())
    }

    fn check(
        &self,
        table: &Table,
        targets: &[Label],
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        for target in targets {
            let bound = self.bind_name(target);
            let context = bound.context();
            for position in table.positions_of(target) {
                if let Some(series) = table.column_at(position) {
                    self.backend
                        .validate(series, &bound.field, &context, options, handler)?;
                }
            }
        }
        Ok(())
    }

    fn run(
        &self,
        table: &mut Table,
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        self.preflight()?;
        let targets = self.resolve(table, handler)?;
        for target in &targets {
            let target = std::slice::from_ref(target);
            SchemaComponent::coerce(self, table, target, handler)?;
            SchemaComponent::check(self, table, target, options, handler)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSchema")
            .field("field", &self.field)
            .field("required", &self.required)
            .field("regex", &self.regex)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(labels: &[&str]) -> Table {
        Table::from_columns(labels.iter().map(|l| (*l, vec![json!(1)]))).unwrap()
    }

    #[test]
    fn test_regex_matches_from_start() {
        let column = ColumnSchema::new(None).name("col").regex(true);
        let matched = column
            .matching_columns(&table(&["col_1", "my_col", "col_2"]))
            .unwrap();
        assert_eq!(matched, vec![Label::from("col_1"), Label::from("col_2")]);
    }

    #[test]
    fn test_regex_matches_deduplicated() {
        let column = ColumnSchema::new(None).name("a").regex(true);
        let matched = column.matching_columns(&table(&["a", "b", "a"])).unwrap();
        assert_eq!(matched, vec![Label::from("a")]);
    }

    #[test]
    fn test_integer_labels_match_as_text() {
        let t = Table::from_columns(vec![(1_i64, vec![json!(1)]), (20, vec![json!(2)])]).unwrap();
        let column = ColumnSchema::new(None).name("2").regex(true);
        assert_eq!(column.matching_columns(&t).unwrap(), vec![Label::Int(20)]);
    }

    #[test]
    fn test_tuple_pattern_requires_every_level() {
        let t = Table::from_columns(vec![
            (Label::tuple(["a", "x"]), vec![json!(1)]),
            (Label::tuple(["a", "y"]), vec![json!(1)]),
            (Label::tuple(["b", "x"]), vec![json!(1)]),
        ])
        .unwrap();
        let column = ColumnSchema::new(None)
            .name(Label::tuple(["a", "x|y"]))
            .regex(true);

        assert_eq!(
            column.matching_columns(&t).unwrap(),
            vec![Label::tuple(["a", "x"]), Label::tuple(["a", "y"])]
        );
    }

    #[test]
    fn test_string_pattern_against_multi_level_columns() {
        let t = Table::from_columns(vec![(Label::tuple(["a", "x"]), vec![json!(1)])]).unwrap();
        let column = ColumnSchema::new(None).name("a").regex(true);

        match column.matching_columns(&t) {
            Err(Abort::Failures(errors)) => {
                assert_eq!(errors.first().reason, ReasonCode::InvalidColumnLevels)
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_preflight_rejects_bad_names() {
        assert_eq!(
            ColumnSchema::new(None).preflight(),
            Err(SchemaInitError::MissingName)
        );
        assert_eq!(
            ColumnSchema::new(None).name(3_i64).regex(true).preflight(),
            Err(SchemaInitError::NonStringPattern(Label::Int(3)))
        );
        assert!(matches!(
            ColumnSchema::new(None).name("(").regex(true).preflight(),
            Err(SchemaInitError::InvalidPattern { .. })
        ));
        assert!(ColumnSchema::new(None).name(3_i64).preflight().is_ok());
    }

    #[test]
    fn test_bind_name_leaves_original_untouched() {
        let column = ColumnSchema::new(None);
        let bound = column.bind_name("x");
        assert_eq!(bound.field().name(), Some(&Label::from("x")));
        assert_eq!(column.field().name(), None);
    }

    #[test]
    fn test_missing_optional_column_is_skipped() {
        let column = ColumnSchema::new(None).name("y").required(false);
        let mut handler = ErrorHandler::new(true);
        let targets = column.resolve(&table(&["x"]), &mut handler).unwrap();
        assert!(targets.is_empty());
        assert!(!handler.has_failures());
    }
}
