//! Tagged solver results.

use core::fmt;

/// One point of a segment trajectory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Absolute simulation time (s)
    pub time_s: f64,
    /// Terminal voltage (V)
    pub voltage_v: f64,
    /// Current (A), positive = discharge
    pub current_a: f64,
}

impl Sample {
    pub fn new(time_s: f64, voltage_v: f64, current_a: f64) -> Self {
        Self {
            time_s,
            voltage_v,
            current_a,
        }
    }

    pub fn power_w(&self) -> f64 {
        self.voltage_v * self.current_a
    }
}

/// Which cut-off ended a segment early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TruncationReason {
    LowerVoltageCutoff,
    UpperVoltageCutoff,
}

impl fmt::Display for TruncationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowerVoltageCutoff => write!(f, "lower voltage cut-off"),
            Self::UpperVoltageCutoff => write!(f, "upper voltage cut-off"),
        }
    }
}

/// What a solver returns for one request.
#[derive(Clone, Debug, PartialEq)]
pub enum SolverOutcome {
    /// Integrated over the whole window.
    Success { samples: Vec<Sample> },
    /// Integrated until a voltage bound was reached.
    TruncatedSuccess {
        samples: Vec<Sample>,
        truncation_time_s: f64,
        reason: TruncationReason,
    },
    /// Failed to converge.
    Divergence {
        failure_time_s: f64,
        diagnostic: String,
    },
}

impl SolverOutcome {
    pub fn is_divergence(&self) -> bool {
        matches!(self, SolverOutcome::Divergence { .. })
    }

    /// Split into a usable trajectory or the divergence diagnostic.
    pub fn into_trajectory(self) -> Result<Trajectory, (f64, String)> {
        match self {
            SolverOutcome::Success { samples } => Ok(Trajectory {
                samples,
                truncation: None,
            }),
            SolverOutcome::TruncatedSuccess {
                samples,
                truncation_time_s,
                reason,
            } => Ok(Trajectory {
                samples,
                truncation: Some(Truncation {
                    time_s: truncation_time_s,
                    reason,
                }),
            }),
            SolverOutcome::Divergence {
                failure_time_s,
                diagnostic,
            } => Err((failure_time_s, diagnostic)),
        }
    }
}

/// Where and why a trajectory stopped early.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Truncation {
    pub time_s: f64,
    pub reason: TruncationReason,
}

/// A successful (possibly truncated) segment trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub samples: Vec<Sample>,
    pub truncation: Option<Truncation>,
}

impl Trajectory {
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }
}
