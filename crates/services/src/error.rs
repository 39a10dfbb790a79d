//! Shared error types for the services crate.

use thiserror::Error;

/// Errors surfaced by result sinks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("result sink unavailable: {0}")]
    Unavailable(String),

    #[error("result rejected: {0}")]
    Rejected(String),
}

/// Errors emitted by the drill loop.
///
/// Out-of-phase input is not an error; it surfaces as `RoundOutcome::Ignored`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DrillServiceError {
    #[error("drill has not terminated yet")]
    NotTerminated,
    #[error("drill state lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Sink(#[from] SinkError),
}
