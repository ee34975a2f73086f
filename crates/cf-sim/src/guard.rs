//! Stability guard: default attempt, one safe retry, then give up.

use std::time::{Duration, Instant};

use cf_core::BatteryConfiguration;
use cf_solver::{
    CellSolver, InitialCondition, IntegrationRequest, ProfileKind, SolverOutcome,
    StabilityProfile, TimeWindow, Trajectory,
};
use tracing::{debug, info, warn};

use crate::error::{SimError, SimResult};
use crate::planner::SimulationSegment;

/// Trajectory of a guarded segment plus how it was obtained.
#[derive(Clone, Debug, PartialEq)]
pub struct GuardedTrajectory {
    pub trajectory: Trajectory,
    /// Profile of the attempt that succeeded
    pub profile: ProfileKind,
    /// Solver calls spent (1 or 2)
    pub attempts: usize,
    /// Why the default attempt failed, when it did
    pub default_diagnostic: Option<String>,
}

impl GuardedTrajectory {
    pub fn escalated(&self) -> bool {
        self.profile == ProfileKind::Safe
    }
}

/// Wraps solver calls for a single segment.
///
/// Holds no state between segments: every segment starts on its planned
/// profile regardless of what happened before.
#[derive(Clone, Copy, Debug, Default)]
pub struct StabilityGuard {
    attempt_timeout: Option<Duration>,
}

impl StabilityGuard {
    pub fn new(attempt_timeout: Option<Duration>) -> Self {
        Self { attempt_timeout }
    }

    pub fn integrate<S: CellSolver + ?Sized>(
        &self,
        solver: &S,
        config: &BatteryConfiguration,
        segment: &SimulationSegment,
        initial: InitialCondition,
    ) -> SimResult<GuardedTrajectory> {
        let first = StabilityProfile::for_kind(segment.profile);
        let default_diagnostic = match self.attempt(solver, config, segment, initial, first) {
            Ok(trajectory) => {
                return Ok(GuardedTrajectory {
                    trajectory,
                    profile: first.kind,
                    attempts: 1,
                    default_diagnostic: None,
                });
            }
            Err(diagnostic) => diagnostic,
        };

        info!(
            segment = segment.index,
            power_kw = segment.power_kw,
            diagnostic = %default_diagnostic,
            "divergence on {} profile, retrying in safe mode",
            first.kind
        );

        let safe = &StabilityProfile::SAFE;
        match self.attempt(solver, config, segment, initial, safe) {
            Ok(trajectory) => Ok(GuardedTrajectory {
                trajectory,
                profile: safe.kind,
                attempts: 2,
                default_diagnostic: Some(default_diagnostic),
            }),
            Err(safe_diagnostic) => {
                warn!(
                    segment = segment.index,
                    power_kw = segment.power_kw,
                    "segment diverged in safe mode too"
                );
                Err(SimError::SegmentDivergence {
                    index: segment.index,
                    power_kw: segment.power_kw.abs(),
                    default_diagnostic,
                    safe_diagnostic,
                })
            }
        }
    }

    /// One solver call. A call that overruns its budget counts as a
    /// divergence even if the solver ignored the deadline and returned data.
    fn attempt<S: CellSolver + ?Sized>(
        &self,
        solver: &S,
        config: &BatteryConfiguration,
        segment: &SimulationSegment,
        initial: InitialCondition,
        profile: &StabilityProfile,
    ) -> Result<Trajectory, String> {
        let started = Instant::now();
        let request = IntegrationRequest {
            config,
            control: segment.control,
            window: segment.window,
            profile,
            initial,
            deadline: self.attempt_timeout.map(|t| started + t),
        };
        debug!(
            segment = segment.index,
            profile = %profile.kind,
            start_s = segment.window.start_s,
            end_s = segment.window.end_s,
            "solver attempt"
        );
        let outcome = solver.integrate(&request);

        if let Some(limit) = self.attempt_timeout {
            let elapsed = started.elapsed();
            if elapsed > limit && !matches!(outcome, SolverOutcome::Divergence { .. }) {
                return Err(format!(
                    "attempt exceeded its {limit:?} budget ({elapsed:?})"
                ));
            }
        }

        let trajectory = outcome
            .into_trajectory()
            .map_err(|(time_s, diagnostic)| format!("{diagnostic} (t = {time_s:.1} s)"))?;
        check_trajectory(&trajectory, segment.window, profile)
            .map_err(|what| format!("malformed solver result: {what}"))?;
        Ok(trajectory)
    }
}

/// A reported success must cover its window with finite, time-ordered
/// samples: up to the window end, or exactly to the truncation time.
fn check_trajectory(
    trajectory: &Trajectory,
    window: TimeWindow,
    profile: &StabilityProfile,
) -> Result<(), String> {
    let samples = &trajectory.samples;
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Err("no samples".to_string());
    };

    if let Some(bad) = samples
        .iter()
        .find(|s| !(s.time_s.is_finite() && s.voltage_v.is_finite() && s.current_a.is_finite()))
    {
        return Err(format!(
            "non-finite sample (t = {}, V = {}, I = {})",
            bad.time_s, bad.voltage_v, bad.current_a
        ));
    }
    if samples.windows(2).any(|w| w[1].time_s < w[0].time_s) {
        return Err("sample times decrease".to_string());
    }

    let start_tol = profile.event_tolerance(window.start_s);
    if first.time_s < window.start_s - start_tol {
        return Err(format!(
            "first sample at {} s precedes window start {} s",
            first.time_s, window.start_s
        ));
    }

    let expected_end = match trajectory.truncation {
        Some(t) => {
            let latest = window.end_s + profile.event_tolerance(window.end_s);
            if !(window.start_s - start_tol..=latest).contains(&t.time_s) {
                return Err(format!(
                    "truncation at {} s lies outside [{}, {}] s",
                    t.time_s, window.start_s, window.end_s
                ));
            }
            t.time_s
        }
        None => window.end_s,
    };
    if (last.time_s - expected_end).abs() > profile.event_tolerance(expected_end) {
        return Err(format!(
            "last sample at {} s, expected {} s",
            last.time_s, expected_end
        ));
    }
    Ok(())
}
