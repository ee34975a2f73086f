//! The solver boundary.

use std::time::Instant;

use cf_core::{BatteryConfiguration, ControlSignal};

use crate::error::{SolverError, SolverResult};
use crate::outcome::SolverOutcome;
use crate::profile::StabilityProfile;

/// Absolute integration window (s).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    pub start_s: f64,
    pub end_s: f64,
}

impl TimeWindow {
    pub fn new(start_s: f64, end_s: f64) -> SolverResult<Self> {
        if !start_s.is_finite() || !end_s.is_finite() || end_s <= start_s {
            return Err(SolverError::InvalidRequest {
                what: format!("time window [{start_s}, {end_s}] is empty or non-finite"),
            });
        }
        Ok(Self { start_s, end_s })
    }

    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// Battery condition at the start of a window.
///
/// Solvers rebuild their internal state from this; `voltage_v` is `None`
/// when the pack starts relaxed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitialCondition {
    pub soc: f64,
    pub voltage_v: Option<f64>,
    pub current_a: f64,
}

impl InitialCondition {
    pub fn relaxed(soc: f64) -> Self {
        Self {
            soc,
            voltage_v: None,
            current_a: 0.0,
        }
    }
}

/// Everything a solver needs for one segment.
#[derive(Clone, Copy, Debug)]
pub struct IntegrationRequest<'a> {
    pub config: &'a BatteryConfiguration,
    pub control: ControlSignal,
    pub window: TimeWindow,
    pub profile: &'a StabilityProfile,
    pub initial: InitialCondition,
    /// Wall-clock instant after which the solver should give up.
    pub deadline: Option<Instant>,
}

impl IntegrationRequest<'_> {
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// An electrochemical solver seen from the engine.
///
/// Implementations may take arbitrarily long and may diverge; neither is an
/// error at this boundary. `Sync` so independent runs can share one solver
/// across worker threads.
pub trait CellSolver: Send + Sync {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome;
}

impl<S: CellSolver + ?Sized> CellSolver for &S {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        (**self).integrate(request)
    }
}

impl<S: CellSolver + ?Sized> CellSolver for Box<S> {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        (**self).integrate(request)
    }
}
