//! Error types for the core crate

use thiserror::Error;

/// Errors raised by the outcome and utility model
#[derive(Debug, Error)]
pub enum CoreError {
    /// An outcome space cannot be flattened into a Cartesian product
    #[error("outcome space cannot be flattened: {0}")]
    Composition(String),

    /// A utility function does not satisfy the center contract
    #[error("center utility contract violation: {0}")]
    TypeMismatch(String),

    /// A strategy name has no registered factory
    #[error("negotiator type not registered: {0}")]
    NotRegistered(String),

    /// A scenario is internally inconsistent
    #[error("invalid scenario: {0}")]
    Scenario(String),
}
