//! Failure accumulation during a validation pass.
//!
//! This module provides the [`ErrorHandler`] that is threaded through every
//! component validation. In lazy mode it collects every failure; in fail-fast
//! mode the first collected failure aborts the pass.

use stillwater::Validation;
use tracing::trace;

use crate::error::{SchemaError, SchemaErrors, SchemaInitError};

/// Reason a validation pass stopped before completing its work.
#[derive(Debug, Clone, PartialEq)]
pub enum Abort {
    /// The schema is unusable; never collected.
    Init(SchemaInitError),
    /// Failures that end the pass.
    Failures(SchemaErrors),
}

impl From<SchemaInitError> for Abort {
    fn from(error: SchemaInitError) -> Self {
        Abort::Init(error)
    }
}

impl From<SchemaErrors> for Abort {
    fn from(errors: SchemaErrors) -> Self {
        Abort::Failures(errors)
    }
}

/// Accumulator for validation failures.
///
/// The handler's mode is chosen once, when the pass starts:
/// - **lazy**: [`collect`](Self::collect) records the failure and returns `Ok`
/// - **fail-fast**: [`collect`](Self::collect) returns `Err(Abort)` holding
///   exactly that failure, so callers stop with `?`
///
/// # Example
///
/// ```rust
/// use framecheck::{ErrorHandler, ReasonCode, SchemaContext, SchemaError};
///
/// let error = SchemaError::new(SchemaContext::Column(None), ReasonCode::WrongDtype, "bad");
///
/// let mut lazy = ErrorHandler::new(true);
/// assert!(lazy.collect(error.clone()).is_ok());
/// assert!(lazy.has_failures());
///
/// let mut eager = ErrorHandler::new(false);
/// assert!(eager.collect(error).is_err());
/// ```
#[derive(Debug, Default)]
pub struct ErrorHandler {
    lazy: bool,
    collected: Vec<SchemaError>,
}

impl ErrorHandler {
    /// Creates an empty handler.
    pub fn new(lazy: bool) -> Self {
        Self {
            lazy,
            collected: Vec::new(),
        }
    }

    /// Returns true if failures are collected rather than raised.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Records a failure, or aborts with it in fail-fast mode.
    pub fn collect(&mut self, error: SchemaError) -> Result<(), Abort> {
        trace!(reason = %error.reason, schema = %error.schema, "collected failure");
        if self.lazy {
            self.collected.push(error);
            Ok(())
        } else {
            Err(Abort::Failures(SchemaErrors::single(error)))
        }
    }

    /// Folds the outcome of a nested pass into this handler.
    ///
    /// In lazy mode failures from the nested pass are collected and the
    /// caller keeps going. Configuration errors always propagate.
    pub fn absorb(&mut self, outcome: Result<(), Abort>) -> Result<(), Abort> {
        match outcome {
            Err(Abort::Failures(errors)) if self.lazy => {
                self.collected.extend(errors);
                Ok(())
            }
            other => other,
        }
    }

    /// Returns true if any failure has been collected.
    pub fn has_failures(&self) -> bool {
        !self.collected.is_empty()
    }

    /// Returns the collected failures in order.
    pub fn failures(&self) -> &[SchemaError] {
        &self.collected
    }

    /// Removes and returns the collected failures.
    pub fn drain(&mut self) -> Vec<SchemaError> {
        std::mem::take(&mut self.collected)
    }

    /// Ends the pass, merging collected failures with the pass outcome.
    ///
    /// # Errors
    ///
    /// Returns the configuration error if the pass was aborted by one.
    pub fn finish(
        mut self,
        outcome: Result<(), Abort>,
    ) -> Result<Validation<(), SchemaErrors>, SchemaInitError> {
        let mut errors = self.drain();
        match outcome {
            Ok(()) => {}
            Err(Abort::Init(error)) => return Err(error),
            Err(Abort::Failures(aborted)) => errors.extend(aborted),
        }
        Ok(match SchemaErrors::try_from_vec(errors) {
            Some(errors) => Validation::Failure(errors),
            None => Validation::Success(()),
        })
    }
}
