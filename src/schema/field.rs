//! Field constraints and the default one-dimensional validator.
//!
//! [`FieldSchema`] holds the attributes shared by column and index schemas.
//! [`FieldBackend`] checks a [`Series`] against them.

use std::any::Any;
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::check::{Check, CheckOutput};
use crate::dtype::DataType;
use crate::error::{FailureCase, ReasonCode, SchemaContext, SchemaError};
use crate::options::ValidateOptions;
use crate::table::{Label, Series};
use crate::validation::{Abort, ErrorHandler};

use super::traits::FieldValidator;

/// Which occurrences of a repeated value are reported as duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportDuplicates {
    /// Every occurrence.
    #[default]
    All,
    /// Every occurrence except the first.
    ExcludeFirst,
    /// Every occurrence except the last.
    ExcludeLast,
}

impl ReportDuplicates {
    /// Returns the sorted positions in `keys` to report as duplicates.
    pub(crate) fn flagged<K: Eq + Hash>(&self, keys: &[K]) -> Vec<usize> {
        let mut groups: HashMap<&K, Vec<usize>> = HashMap::new();
        for (position, key) in keys.iter().enumerate() {
            groups.entry(key).or_default().push(position);
        }

        let mut flagged: Vec<usize> = groups
            .into_values()
            .filter(|positions| positions.len() > 1)
            .flat_map(|positions| {
                let n = positions.len();
                let range = match self {
                    ReportDuplicates::All => 0..n,
                    ReportDuplicates::ExcludeFirst => 1..n,
                    ReportDuplicates::ExcludeLast => 0..n - 1,
                };
                positions[range].to_vec()
            })
            .collect();
        flagged.sort_unstable();
        flagged
    }
}

/// Key used to compare cells for equality.
pub(crate) fn value_key(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

/// Constraints on a one-dimensional sequence of values.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    pub(crate) dtype: Option<DataType>,
    pub(crate) checks: Vec<Check>,
    pub(crate) nullable: bool,
    pub(crate) unique: bool,
    pub(crate) report_duplicates: ReportDuplicates,
    pub(crate) coerce: bool,
    pub(crate) name: Option<Label>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
}

impl FieldSchema {
    /// A field of the given dtype, or of any dtype when `None`.
    pub fn new(dtype: Option<DataType>) -> Self {
        Self {
            dtype,
            ..Self::default()
        }
    }

    /// The declared dtype.
    pub fn dtype(&self) -> Option<DataType> {
        self.dtype
    }

    /// The checks, in the order they run.
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Whether nulls are allowed.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether values must be unique.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// How duplicates are reported.
    pub fn duplicate_policy(&self) -> ReportDuplicates {
        self.report_duplicates
    }

    /// Whether values are coerced to the dtype before checking.
    pub fn is_coerced(&self) -> bool {
        self.coerce
    }

    /// The field name.
    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    /// A human-readable label.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// A free-form description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn with_name(mut self, name: Option<Label>) -> Self {
        self.name = name;
        self
    }

    pub(crate) fn with_coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }
}

/// Builder methods shared by the column and index schemas.
macro_rules! field_builders {
    ($schema:ty) => {
        impl $schema {
            /// Adds a check; checks run in the order they are added.
            pub fn check(mut self, check: $crate::check::Check) -> Self {
                self.field.checks.push(check);
                self
            }

            /// Adds several checks.
            pub fn checks<I>(mut self, checks: I) -> Self
            where
                I: IntoIterator<Item = $crate::check::Check>,
            {
                self.field.checks.extend(checks);
                self
            }

            /// Sets whether nulls are allowed.
            pub fn nullable(mut self, nullable: bool) -> Self {
                self.field.nullable = nullable;
                self
            }

            /// Sets whether values must be unique.
            pub fn unique(mut self, unique: bool) -> Self {
                self.field.unique = unique;
                self
            }

            /// Sets which duplicate occurrences are reported.
            pub fn report_duplicates(mut self, policy: $crate::schema::ReportDuplicates) -> Self {
                self.field.report_duplicates = policy;
                self
            }

            /// Sets whether values are coerced to the dtype before checking.
            pub fn coerce(mut self, coerce: bool) -> Self {
                self.field.coerce = coerce;
                self
            }

            /// Sets the name.
            pub fn name(mut self, name: impl Into<$crate::table::Label>) -> Self {
                self.field.name = Some(name.into());
                self
            }

            /// Sets a human-readable label.
            pub fn title(mut self, title: impl Into<String>) -> Self {
                self.field.title = Some(title.into());
                self
            }

            /// Sets a free-form description.
            pub fn description(mut self, description: impl Into<String>) -> Self {
                self.field.description = Some(description.into());
                self
            }

            /// Replaces the validator used for the field's values.
            pub fn with_field_validator(
                mut self,
                validator: std::sync::Arc<dyn $crate::schema::FieldValidator>,
            ) -> Self {
                self.backend = validator;
                self
            }

            /// Returns the field constraints.
            pub fn field(&self) -> &$crate::schema::FieldSchema {
                &self.field
            }
        }
    };
}

pub(crate) use field_builders;

/// The default [`FieldValidator`].
///
/// Validation order: nullability, uniqueness, dtype, then each check in
/// declaration order. Row-subset options restrict which rows are examined;
/// failure cases always carry positions in the full series.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldBackend;

impl FieldBackend {
    fn run_check(
        &self,
        check: &Check,
        check_index: usize,
        view: &Series,
        rows: &[usize],
        context: &SchemaContext,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| check.run(view)));
        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(fault)) => {
                return handler.collect(check_fault(context, check, check_index, fault.to_string()))
            }
            Err(payload) => {
                return handler.collect(check_fault(
                    context,
                    check,
                    check_index,
                    panic_message(payload.as_ref()),
                ))
            }
        };

        match output {
            CheckOutput::Scalar(true) => Ok(()),
            CheckOutput::Scalar(false) => {
                let message = check.error_message().map_or_else(
                    || {
                        format!(
                            "{} failed series or dataframe validator {}: {}",
                            context,
                            check_index,
                            check.name()
                        )
                    },
                    str::to_string,
                );
                handler.collect(
                    SchemaError::new(context.clone(), ReasonCode::DataframeCheck, message)
                        .with_check(check.name())
                        .with_check_index(check_index)
                        .with_failure_cases(vec![FailureCase::scalar(false)]),
                )
            }
            CheckOutput::Mask(mask) if mask.len() != view.len() => handler.collect(check_fault(
                context,
                check,
                check_index,
                format!(
                    "check returned {} results for {} rows",
                    mask.len(),
                    view.len()
                ),
            )),
            CheckOutput::Mask(mask) => {
                let cases: Vec<FailureCase> = mask
                    .iter()
                    .zip(view.values())
                    .enumerate()
                    .filter(|(_, (passed, value))| {
                        !**passed && !(check.ignores_na() && value.is_null())
                    })
                    .map(|(p, (_, value))| FailureCase::at(rows[p], value.clone()))
                    .collect();
                if cases.is_empty() {
                    return Ok(());
                }

                let message = check.error_message().map_or_else(
                    || {
                        let values: Vec<String> =
                            cases.iter().map(|c| c.value.to_string()).collect();
                        format!(
                            "{} failed element-wise validator number {}: {} failure cases: {}",
                            context,
                            check_index,
                            check.name(),
                            values.join(", ")
                        )
                    },
                    str::to_string,
                );
                handler.collect(
                    SchemaError::new(context.clone(), ReasonCode::DataframeCheck, message)
                        .with_check(check.name())
                        .with_check_index(check_index)
                        .with_failure_cases(cases),
                )
            }
        }
    }
}

impl FieldValidator for FieldBackend {
    fn coerce(
        &self,
        series: &Series,
        field: &FieldSchema,
        context: &SchemaContext,
    ) -> Result<Series, SchemaError> {
        let Some(dtype) = field.dtype() else {
            return Ok(series.clone());
        };

        let mut values = Vec::with_capacity(series.len());
        let mut failures = Vec::new();
        for (position, value) in series.values().iter().enumerate() {
            match dtype.coerce_value(value) {
                Some(coerced) => values.push(coerced),
                None => {
                    failures.push(FailureCase::at(position, value.clone()));
                    values.push(value.clone());
                }
            }
        }

        if failures.is_empty() {
            debug!(schema = %context, dtype = %dtype, "coerced series");
            return Ok(Series::from_parts(series.name().cloned(), values).with_dtype(dtype));
        }

        Err(SchemaError::new(
            context.clone(),
            ReasonCode::DtypeCoercionError,
            format!(
                "Error while coercing '{}' to type {}: could not coerce {} of {} value(s)",
                display_name(series),
                dtype,
                failures.len(),
                series.len()
            ),
        )
        .with_check(format!("coerce_dtype('{}')", dtype))
        .with_failure_cases(failures))
    }

    fn validate(
        &self,
        series: &Series,
        field: &FieldSchema,
        context: &SchemaContext,
        options: &ValidateOptions,
        handler: &mut ErrorHandler,
    ) -> Result<(), Abort> {
        let rows: Vec<usize> = options
            .row_positions(series.len())
            .unwrap_or_else(|| (0..series.len()).collect());
        let view = series.take(&rows);
        let name = display_name(series);

        if !field.is_nullable() {
            let cases: Vec<FailureCase> = view
                .null_positions()
                .into_iter()
                .map(|p| FailureCase::at(rows[p], Value::Null))
                .collect();
            if !cases.is_empty() {
                handler.collect(
                    SchemaError::new(
                        context.clone(),
                        ReasonCode::SeriesContainsNulls,
                        format!("non-nullable series '{}' contains null values", name),
                    )
                    .with_check("not_nullable")
                    .with_failure_cases(cases),
                )?;
            }
        }

        if field.is_unique() {
            let keys: Vec<String> = view.values().iter().map(value_key).collect();
            let cases: Vec<FailureCase> = field
                .duplicate_policy()
                .flagged(&keys)
                .into_iter()
                .map(|p| FailureCase::at(rows[p], view.values()[p].clone()))
                .collect();
            if !cases.is_empty() {
                handler.collect(
                    SchemaError::new(
                        context.clone(),
                        ReasonCode::SeriesContainsDuplicates,
                        format!("series '{}' contains duplicate values", name),
                    )
                    .with_check("field_uniqueness")
                    .with_failure_cases(cases),
                )?;
            }
        }

        if let Some(dtype) = field.dtype() {
            if !series.satisfies(dtype) {
                handler.collect(
                    SchemaError::new(
                        context.clone(),
                        ReasonCode::WrongDtype,
                        format!(
                            "expected series '{}' to have type {}, got {}",
                            name,
                            dtype,
                            series.dtype()
                        ),
                    )
                    .with_check(format!("dtype('{}')", dtype))
                    .with_failure_cases(vec![FailureCase::scalar(series.dtype().name())]),
                )?;
            }
        }

        for (check_index, check) in field.checks().iter().enumerate() {
            self.run_check(check, check_index, &view, &rows, context, handler)?;
        }
        Ok(())
    }
}

fn display_name(series: &Series) -> String {
    series
        .name()
        .map_or_else(|| "None".to_string(), ToString::to_string)
}

fn check_fault(
    context: &SchemaContext,
    check: &Check,
    check_index: usize,
    fault: String,
) -> SchemaError {
    warn!(schema = %context, check = check.name(), %fault, "check raised an error");
    let backtrace = Backtrace::force_capture();
    SchemaError::new(
        context.clone(),
        ReasonCode::CheckError,
        format!(
            "Error while executing check function: {}\n{}",
            fault, backtrace
        ),
    )
    .with_check(check.name())
    .with_check_index(check_index)
    .with_failure_cases(vec![FailureCase::scalar(fault)])
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with a non-string payload".to_string()
    }
}
