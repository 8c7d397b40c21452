//! Error types for tournament scheduling

use thiserror::Error;

/// Errors raised by tournament construction and dispatch
#[derive(Debug, Error)]
pub enum TournamentError {
    /// The tournament definition itself is unusable
    #[error("tournament configuration: {0}")]
    Configuration(String),

    /// One scheduled session failed; callers log and exclude it
    #[error("job execution failed: {0}")]
    JobExecution(String),
}
