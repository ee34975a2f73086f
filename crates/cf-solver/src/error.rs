//! Error types for solver requests.

use cf_core::CoreError;
use thiserror::Error;

/// Errors raised while building or validating a solver request.
///
/// Integration failures are not errors: they come back as
/// [`SolverOutcome::Divergence`](crate::SolverOutcome::Divergence).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid request: {what}")]
    InvalidRequest { what: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;
