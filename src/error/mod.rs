//! Error types for validation failures.
//!
//! [`SchemaError`] and [`SchemaErrors`] describe data that violates a schema;
//! [`SchemaInitError`] describes a schema that cannot be used at all.

mod init_error;
mod schema_error;

pub use init_error::SchemaInitError;
pub use schema_error::{FailureCase, ReasonCode, SchemaContext, SchemaError, SchemaErrors};
