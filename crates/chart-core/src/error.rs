//! # Error Types
//!
//! Errors raised by the core data model. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.

use thiserror::Error;

use crate::value::ValueKind;

/// Error raised when a [`DocumentValue`](crate::DocumentValue) is accessed
/// as a variant it does not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The stored variant disagrees with the requested one.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The kind the caller asked for.
        expected: ValueKind,
        /// The kind actually stored.
        found: ValueKind,
    },
}

/// Errors from parsing or validating domain primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier is not a valid UUID.
    #[error("invalid {kind} identifier: \"{value}\" ({reason})")]
    InvalidIdentifier {
        /// Which identifier namespace was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
