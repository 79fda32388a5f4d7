//! Predicate checks run against a series.
//!
//! A [`Check`] wraps a function that inspects a [`Series`] and reports
//! either a single verdict or one verdict per row. Checks may also fail to
//! run at all; such faults are reported by the validator as `check_error`
//! failures rather than propagated.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::table::Series;

/// An error raised by a check that could not run.
pub type CheckFault = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for the function stored in a check.
pub(crate) type CheckFn = Arc<dyn Fn(&Series) -> Result<CheckOutput, CheckFault> + Send + Sync>;

/// The verdict of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutput {
    /// One verdict for the whole series.
    Scalar(bool),
    /// One verdict per row.
    Mask(Vec<bool>),
}

impl From<bool> for CheckOutput {
    fn from(passed: bool) -> Self {
        CheckOutput::Scalar(passed)
    }
}

impl From<Vec<bool>> for CheckOutput {
    fn from(mask: Vec<bool>) -> Self {
        CheckOutput::Mask(mask)
    }
}

/// A named predicate over a series.
///
/// # Example
///
/// ```rust
/// use framecheck::{Check, CheckOutput, Series};
/// use serde_json::json;
///
/// let positive = Check::greater_than(0.0);
/// let series = Series::new("x", vec![json!(1), json!(-1)]);
///
/// assert_eq!(positive.run(&series).unwrap(), CheckOutput::Mask(vec![true, false]));
/// assert_eq!(positive.name(), "greater_than(0)");
/// ```
#[derive(Clone)]
pub struct Check {
    name: String,
    func: CheckFn,
    ignore_na: bool,
    error: Option<String>,
}

impl Check {
    /// Creates a check from a function over the whole series.
    pub fn new<F, O>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Series) -> Result<O, CheckFault> + Send + Sync + 'static,
        O: Into<CheckOutput>,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |series| func(series).map(Into::into)),
            ignore_na: true,
            error: None,
        }
    }

    /// Creates a check applied to every cell independently.
    ///
    /// Null cells are passed to the predicate too; with `ignore_na` (the
    /// default) their verdicts are disregarded.
    pub fn element_wise<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(name, move |series: &Series| {
            Ok::<_, CheckFault>(series.values().iter().map(&predicate).collect::<Vec<bool>>())
        })
    }

    /// Values must be numbers strictly greater than `min`.
    pub fn greater_than(min: f64) -> Self {
        Self::element_wise(format!("greater_than({})", min), move |v| {
            v.as_f64().is_some_and(|x| x > min)
        })
    }

    /// Values must be numbers greater than or equal to `min`.
    pub fn greater_than_or_equal_to(min: f64) -> Self {
        Self::element_wise(format!("greater_than_or_equal_to({})", min), move |v| {
            v.as_f64().is_some_and(|x| x >= min)
        })
    }

    /// Values must be numbers strictly less than `max`.
    pub fn less_than(max: f64) -> Self {
        Self::element_wise(format!("less_than({})", max), move |v| {
            v.as_f64().is_some_and(|x| x < max)
        })
    }

    /// Values must be numbers within `[min, max]`.
    pub fn in_range(min: f64, max: f64) -> Self {
        Self::element_wise(format!("in_range({}, {})", min, max), move |v| {
            v.as_f64().is_some_and(|x| (min..=max).contains(&x))
        })
    }

    /// Values must be members of `allowed`.
    pub fn isin(allowed: Vec<Value>) -> Self {
        let name = format!("isin({})", Value::Array(allowed.clone()));
        Self::element_wise(name, move |v| allowed.contains(v))
    }

    /// Values must be strings matching `pattern` from their start.
    pub fn str_matches(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})", pattern))?;
        Ok(Self::element_wise(
            format!("str_matches('{}')", pattern),
            move |v| v.as_str().is_some_and(|s| regex.is_match(s)),
        ))
    }

    /// Sets whether null cells are exempt from element-wise verdicts.
    pub fn ignore_na(mut self, ignore: bool) -> Self {
        self.ignore_na = ignore;
        self
    }

    /// Sets a custom message reported when the check fails.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Returns the check name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if nulls are exempt from element-wise verdicts.
    pub fn ignores_na(&self) -> bool {
        self.ignore_na
    }

    /// Returns the custom failure message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Runs the check against a series.
    pub fn run(&self, series: &Series) -> Result<CheckOutput, CheckFault> {
        (self.func)(series)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("ignore_na", &self.ignore_na)
            .field("error", &self.error)
            .finish()
    }
}
