//! Failure records produced by component validation.
//!
//! A [`SchemaError`] names the component, the reason and the offending
//! values; [`SchemaErrors`] is the non-empty set a failed pass returns.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;
use stillwater::prelude::*;

use crate::table::Label;

/// Identity of the schema unit a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum SchemaContext {
    /// A whole-table schema.
    Table(Option<String>),
    /// A column component.
    Column(Option<Label>),
    /// A single-level index component.
    Index(Option<Label>),
    /// A multi-level index component.
    MultiIndex(Option<String>),
}

impl SchemaContext {
    /// Returns the label of a column or index context.
    pub fn label(&self) -> Option<&Label> {
        match self {
            SchemaContext::Column(label) | SchemaContext::Index(label) => label.as_ref(),
            SchemaContext::Table(_) | SchemaContext::MultiIndex(_) => None,
        }
    }
}

impl Display for SchemaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaContext::Table(Some(name)) => write!(f, "Table '{}'", name),
            SchemaContext::Table(None) => write!(f, "Table"),
            SchemaContext::Column(Some(label)) => write!(f, "Column '{}'", label),
            SchemaContext::Column(None) => write!(f, "Column"),
            SchemaContext::Index(Some(label)) => write!(f, "Index '{}'", label),
            SchemaContext::Index(None) => write!(f, "Index"),
            SchemaContext::MultiIndex(Some(name)) => write!(f, "MultiIndex '{}'", name),
            SchemaContext::MultiIndex(None) => write!(f, "MultiIndex"),
        }
    }
}

/// Machine-readable category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// A required column is absent.
    ColumnNotInDataframe,
    /// A strict schema found a column it does not declare.
    ColumnNotInSchema,
    /// Columns appear in a different order than declared.
    ColumnNotOrdered,
    /// Rows are not jointly unique over a column subset.
    Duplicates,
    /// A series does not hold the declared dtype.
    WrongDtype,
    /// A non-nullable series holds nulls.
    SeriesContainsNulls,
    /// A unique series holds repeated values.
    SeriesContainsDuplicates,
    /// A predicate check found non-conforming values.
    DataframeCheck,
    /// A predicate check faulted while running.
    CheckError,
    /// Values could not be converted to the declared dtype.
    DtypeCoercionError,
    /// A single-level index schema met a multi-level index.
    MismatchIndex,
    /// A regex column pattern matched no column.
    NoRegexColumnMatch,
    /// A regex pattern and the column labels disagree on level count.
    InvalidColumnLevels,
}

impl ReasonCode {
    /// Returns the snake_case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::ColumnNotInDataframe => "column_not_in_dataframe",
            ReasonCode::ColumnNotInSchema => "column_not_in_schema",
            ReasonCode::ColumnNotOrdered => "column_not_ordered",
            ReasonCode::Duplicates => "duplicates",
            ReasonCode::WrongDtype => "wrong_dtype",
            ReasonCode::SeriesContainsNulls => "series_contains_nulls",
            ReasonCode::SeriesContainsDuplicates => "series_contains_duplicates",
            ReasonCode::DataframeCheck => "dataframe_check",
            ReasonCode::CheckError => "check_error",
            ReasonCode::DtypeCoercionError => "dtype_coercion_error",
            ReasonCode::MismatchIndex => "mismatch_index",
            ReasonCode::NoRegexColumnMatch => "no_regex_column_match",
            ReasonCode::InvalidColumnLevels => "invalid_column_levels",
        }
    }
}

impl Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One offending value and where it was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureCase {
    /// Row position of the value, if the failure is row-bound.
    pub index: Option<usize>,
    /// Column (or index level) the value came from, when known.
    pub column: Option<Label>,
    /// The offending value.
    pub value: Value,
}

impl FailureCase {
    /// A failure case at a row position.
    pub fn at(index: usize, value: Value) -> Self {
        Self {
            index: Some(index),
            column: None,
            value,
        }
    }

    /// A failure case not bound to a row.
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self {
            index: None,
            column: None,
            value: value.into(),
        }
    }

    /// Sets the column label and returns self for chaining.
    pub fn in_column(mut self, column: Label) -> Self {
        self.column = Some(column);
        self
    }
}

/// A single validation failure with full context.
///
/// `SchemaError` captures all relevant information about a violated constraint:
/// - **schema**: Which component the failure belongs to
/// - **reason**: Machine-readable failure category
/// - **check**: The check that failed, or a pseudo-check such as `not_nullable`
/// - **failure_cases**: The offending values and their row positions
/// - **message**: Human-readable description of the failure
///
/// # Example
///
/// ```rust
/// use framecheck::{FailureCase, Label, ReasonCode, SchemaContext, SchemaError};
/// use serde_json::Value;
///
/// let error = SchemaError::new(
///     SchemaContext::Column(Some(Label::from("x"))),
///     ReasonCode::SeriesContainsNulls,
///     "non-nullable series 'x' contains null values",
/// )
/// .with_check("not_nullable")
/// .with_failure_cases(vec![FailureCase::at(2, Value::Null)]);
///
/// assert_eq!(error.reason, ReasonCode::SeriesContainsNulls);
/// assert_eq!(error.failure_cases[0].index, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaError {
    /// The component the failure belongs to.
    pub schema: SchemaContext,
    /// Machine-readable failure category.
    pub reason: ReasonCode,
    /// Identity of the failing check.
    pub check: Option<String>,
    /// Position of the failing check within the component's checks.
    pub check_index: Option<usize>,
    /// The offending values.
    pub failure_cases: Vec<FailureCase>,
    /// Human-readable error message.
    pub message: String,
}

impl SchemaError {
    /// Creates a new schema error without check identity or failure cases.
    pub fn new(schema: SchemaContext, reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            schema,
            reason,
            check: None,
            check_index: None,
            failure_cases: Vec::new(),
            message: message.into(),
        }
    }

    /// Sets the check identity and returns self for chaining.
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = Some(check.into());
        self
    }

    /// Sets the check index and returns self for chaining.
    pub fn with_check_index(mut self, index: usize) -> Self {
        self.check_index = Some(index);
        self
    }

    /// Sets the failure cases and returns self for chaining.
    pub fn with_failure_cases(mut self, cases: Vec<FailureCase>) -> Self {
        self.failure_cases = cases;
        self
    }

    /// Returns the row positions named by the failure cases.
    pub fn failure_rows(&self) -> Vec<usize> {
        self.failure_cases.iter().filter_map(|c| c.index).collect()
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.schema, self.message)?;

        if let Some(ref check) = self.check {
            write!(f, " (check: {})", check)?;
        }
        if !self.failure_cases.is_empty() {
            write!(f, " ({} failure case(s))", self.failure_cases.len())?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaError {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<SchemaError>();
    assert_sync::<SchemaError>();
};

/// The failures of one validation pass, in the order they were found.
///
/// Backed by a `NonEmptyVec`, so a `Validation::Failure` always carries at
/// least one error. In fail-fast mode it holds exactly one.
///
/// # Combining Errors
///
/// `SchemaErrors` implements `Semigroup`, so the failure sets of several
/// components can be merged by the caller:
///
/// ```rust
/// use framecheck::{Label, ReasonCode, SchemaContext, SchemaError, SchemaErrors};
/// use stillwater::prelude::*;
///
/// let errors1 = SchemaErrors::single(SchemaError::new(
///     SchemaContext::Column(Some(Label::from("a"))),
///     ReasonCode::SeriesContainsNulls,
///     "contains nulls",
/// ));
/// let errors2 = SchemaErrors::single(SchemaError::new(
///     SchemaContext::Column(Some(Label::from("b"))),
///     ReasonCode::WrongDtype,
///     "wrong dtype",
/// ));
///
/// let combined = errors1.combine(errors2);
/// assert_eq!(combined.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaErrors(NonEmptyVec<SchemaError>);

impl SchemaErrors {
    /// Creates a `SchemaErrors` containing a single error.
    pub fn single(error: SchemaError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Wraps collected failures; `None` when nothing was collected.
    pub fn try_from_vec(errors: Vec<SchemaError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Number of failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the contained errors.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaError> {
        self.0.iter()
    }

    /// Returns all errors with the specified reason.
    pub fn with_reason(&self, reason: ReasonCode) -> Vec<&SchemaError> {
        self.0.iter().filter(|e| e.reason == reason).collect()
    }

    /// Returns all errors belonging to the given component.
    pub fn for_schema(&self, schema: &SchemaContext) -> Vec<&SchemaError> {
        self.0.iter().filter(|e| &e.schema == schema).collect()
    }

    /// Returns every failure case across all errors, in order.
    pub fn failure_cases(&self) -> Vec<&FailureCase> {
        self.0.iter().flat_map(|e| e.failure_cases.iter()).collect()
    }

    /// The first failure found.
    pub fn first(&self) -> &SchemaError {
        self.0.head()
    }

    /// Unwraps into a plain vector.
    pub fn into_vec(self) -> Vec<SchemaError> {
        self.0.into_vec()
    }

    /// Renders the errors as a JSON report.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let errors: Vec<&SchemaError> = self.iter().collect();
        serde_json::to_string_pretty(&errors)
    }
}

impl Semigroup for SchemaErrors {
    fn combine(self, other: Self) -> Self {
        SchemaErrors(self.0.combine(other.0))
    }
}

impl Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.len())?;
        for (i, error) in self.iter().enumerate() {
            writeln!(f, "  {}. [{}] {}", i + 1, error.reason, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

impl IntoIterator for SchemaErrors {
    type Item = SchemaError;
    type IntoIter = std::vec::IntoIter<SchemaError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl<'a> IntoIterator for &'a SchemaErrors {
    type Item = &'a SchemaError;
    type IntoIter = Box<dyn Iterator<Item = &'a SchemaError> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.0.iter())
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<SchemaErrors>();
    assert_sync::<SchemaErrors>();
};
