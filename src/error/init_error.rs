//! Schema configuration errors.

use crate::table::Label;

/// A schema was built or used in a way that can never validate data.
///
/// These errors signal misuse of the API rather than a defect in the data,
/// so they are never collected alongside validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaInitError {
    /// A column schema was validated before receiving a name.
    #[error(
        "column name is not set; pass a name when building the column or use `set_name`"
    )]
    MissingName,
    /// Regex column names must be strings or tuples of strings.
    #[error("cannot use non-string name '{0}' as a column regex pattern")]
    NonStringPattern(Label),
    /// A regex column pattern failed to compile.
    #[error("invalid column regex pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The compiler's description of the problem.
        message: String,
    },
    /// An unordered multi-index schema can only find levels by name.
    #[error("index names must be specified when a multi-index schema is not ordered")]
    UnnamedUnorderedLevel,
}
