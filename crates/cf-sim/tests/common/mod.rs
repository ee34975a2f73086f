//! Hand-written solvers shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use cf_solver::{
    CellSolver, IntegrationRequest, ProfileKind, Sample, SolverOutcome, TruncationReason,
};

fn current(request: &IntegrationRequest<'_>) -> f64 {
    request.control.current_a(request.config.capacity_ah())
}

fn flat_samples(request: &IntegrationRequest<'_>, volts: f64, end_s: f64) -> Vec<Sample> {
    let i = current(request);
    let start = request.window.start_s;
    vec![
        Sample::new(start, volts, i),
        Sample::new(0.5 * (start + end_s), volts, i),
        Sample::new(end_s, volts, i),
    ]
}

/// Holds terminal voltage fixed at nominal.
pub struct ConstantVoltage;

impl CellSolver for ConstantVoltage {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        SolverOutcome::Success {
            samples: flat_samples(request, request.config.nominal_voltage_v, request.window.end_s),
        }
    }
}

/// Diverges when |power| exceeds the limit for the requested profile.
pub struct PowerLimited {
    pub default_limit_kw: f64,
    pub safe_limit_kw: f64,
}

impl CellSolver for PowerLimited {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        let power_kw = (current(request) * request.config.nominal_voltage_v / 1000.0).abs();
        let limit = match request.profile.kind {
            ProfileKind::Default => self.default_limit_kw,
            ProfileKind::Safe => self.safe_limit_kw,
        };
        if power_kw > limit + 1e-9 {
            return SolverOutcome::Divergence {
                failure_time_s: request.window.start_s,
                diagnostic: format!("{} profile: step size collapsed", request.profile.kind),
            };
        }
        ConstantVoltage.integrate(request)
    }
}

/// Diverges on both profiles for segments starting at or after `from_s`.
pub struct DivergesFrom {
    pub from_s: f64,
}

impl CellSolver for DivergesFrom {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        if request.window.start_s >= self.from_s {
            return SolverOutcome::Divergence {
                failure_time_s: request.window.start_s,
                diagnostic: format!("{} profile gave up", request.profile.kind),
            };
        }
        ConstantVoltage.integrate(request)
    }
}

/// Truncates the segment starting at `at_start_s` halfway through.
pub struct TruncatesAt {
    pub at_start_s: f64,
}

impl CellSolver for TruncatesAt {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        let w = request.window;
        if (w.start_s - self.at_start_s).abs() < 1e-9 {
            let t = w.start_s + 0.5 * w.duration_s();
            return SolverOutcome::TruncatedSuccess {
                samples: flat_samples(request, request.config.min_voltage_v, t),
                truncation_time_s: t,
                reason: TruncationReason::LowerVoltageCutoff,
            };
        }
        ConstantVoltage.integrate(request)
    }
}

/// Returns good data, but only after sleeping.
pub struct Slow(pub Duration);

impl CellSolver for Slow {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        std::thread::sleep(self.0);
        ConstantVoltage.integrate(request)
    }
}

/// Reports success with a NaN terminal voltage.
pub struct NonFiniteVoltage;

impl CellSolver for NonFiniteVoltage {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        SolverOutcome::Success {
            samples: flat_samples(request, f64::NAN, request.window.end_s),
        }
    }
}

/// Reports success without any samples.
pub struct NoSamples;

impl CellSolver for NoSamples {
    fn integrate(&self, _request: &IntegrationRequest<'_>) -> SolverOutcome {
        SolverOutcome::Success {
            samples: Vec::new(),
        }
    }
}

/// Reports success but stops sampling halfway through the window.
pub struct StopsHalfway;

impl CellSolver for StopsHalfway {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        let w = request.window;
        SolverOutcome::Success {
            samples: flat_samples(
                request,
                request.config.nominal_voltage_v,
                w.start_s + 0.5 * w.duration_s(),
            ),
        }
    }
}
