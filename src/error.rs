//! Error types for feed generation.

use thiserror::Error;

/// Errors that can occur while normalizing recurrence rules or building a document.
///
/// Every error is detected synchronously: a document build either fully succeeds
/// or fails on the first malformed field it encounters. An *absent* field is
/// never an error, it is simply omitted from the output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A frequency value outside the RFC 5545 enumeration
    /// (SECONDLY, MINUTELY, HOURLY, DAILY, WEEKLY, MONTHLY, YEARLY).
    #[error("Invalid recurrence frequency: {0}")]
    InvalidFrequency(String),

    /// Recurrence rule text that does not follow the `NAME=value[,value...]` grammar:
    /// an unknown rule-part name, or a value that does not parse to its typed form.
    #[error("Malformed recurrence rule text: {0}")]
    MalformedRuleText(String),

    /// A field's declared multiplicity does not match the shape of its value.
    /// This signals a broken mapping table, not bad caller data.
    #[error("Field {field} with multiplicity {multiplicity} got an incompatible {shape} value")]
    UnsupportedMultiplicity {
        /// The generic field name, as it appears in the mapping table.
        field: &'static str,
        /// The multiplicity declared by the table.
        multiplicity: &'static str,
        /// The shape of the value the item actually supplied.
        shape: &'static str,
    },
}

/// Result type alias for feed operations.
pub type FeedResult<T> = Result<T, Error>;
