//! Error types for simulation control.

use cf_core::CoreError;
use cf_solver::SolverError;
use thiserror::Error;

/// Errors that stop a run or a sweep.
///
/// Advisories such as SOC clamping are not errors; see [`crate::Advisory`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid configuration: {what}")]
    InvalidConfiguration { what: String },

    #[error("Invalid segment {index}: {reason}")]
    InvalidSegment { index: usize, reason: String },

    #[error(
        "Segment {index} diverged at {power_kw} kW (default: {default_diagnostic}; safe: {safe_diagnostic})"
    )]
    SegmentDivergence {
        index: usize,
        power_kw: f64,
        default_diagnostic: String,
        safe_diagnostic: String,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Invalid state transition: {what}")]
    InvalidState { what: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<CoreError> for SimError {
    fn from(e: CoreError) -> Self {
        SimError::InvalidConfiguration {
            what: e.to_string(),
        }
    }
}

impl From<SolverError> for SimError {
    fn from(e: SolverError) -> Self {
        SimError::InvalidArg {
            what: e.to_string(),
        }
    }
}
