//! Run engine: plan, then guard and accumulate each segment in order.

use core::fmt;
use std::time::{Duration, Instant};

use cf_core::{BatteryConfiguration, ControlMode, PowerUnit};
use cf_solver::{CellSolver, ProfileKind, Sample, Truncation};
use tracing::{debug, info, warn};

use crate::accumulator::{BatteryState, StateAccumulator, TruncationPolicy};
use crate::advisory::Advisory;
use crate::error::{SimError, SimResult};
use crate::guard::StabilityGuard;
use crate::planner::{PowerSegment, plan};
use crate::progress::{RunProgressEvent, RunStage};

/// Options for a run.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub truncation_policy: TruncationPolicy,
    /// Unit the request's powers are expressed in
    pub power_unit: PowerUnit,
    pub control_mode: ControlMode,
    /// Wall-clock budget per solver call; overruns count as divergence
    pub attempt_timeout: Option<Duration>,
}

/// Result of one integrated segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentReport {
    pub index: usize,
    pub power_kw: f64,
    pub start_s: f64,
    pub end_s: f64,
    /// Solver calls spent (1 or 2)
    pub attempts: usize,
    /// Profile of the attempt that produced the samples
    pub profile: ProfileKind,
    pub energy_wh: f64,
    pub charge_ah: f64,
    pub soc_before: f64,
    pub soc_after: f64,
    pub truncation: Option<Truncation>,
    pub advisories: Vec<Advisory>,
    pub samples: Vec<Sample>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunStatus {
    Completed,
    /// The run stopped at a segment that diverged on both profiles.
    Failed { error: SimError },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    /// Last consistent state; for a failed run, the state before the failing segment
    pub final_state: BatteryState,
    pub segments: Vec<SegmentReport>,
    pub status: RunStatus,
    /// Indices not integrated because a truncation halted the run
    pub skipped: Vec<usize>,
}

impl RunResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }

    pub fn failure(&self) -> Option<&SimError> {
        match &self.status {
            RunStatus::Completed => None,
            RunStatus::Failed { error } => Some(error),
        }
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Advisory> {
        self.segments.iter().flat_map(|s| s.advisories.iter())
    }

    /// All samples of the run in time order.
    pub fn trajectory(&self) -> impl Iterator<Item = &Sample> {
        self.segments.iter().flat_map(|s| s.samples.iter())
    }

    pub fn summary(&self) -> RunSummary {
        let s = &self.final_state;
        RunSummary {
            time_h: s.elapsed_h(),
            final_voltage_v: s.last_voltage_v,
            final_current_a: s.last_current_a,
            soc: s.soc,
            net_energy_wh: s.net_energy_wh,
            capacity_used_ah: s.charge_throughput_ah,
        }
    }
}

/// End-of-run figures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub time_h: f64,
    pub final_voltage_v: Option<f64>,
    pub final_current_a: f64,
    pub soc: f64,
    pub net_energy_wh: f64,
    pub capacity_used_ah: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Time:          {:.2} h", self.time_h)?;
        match self.final_voltage_v {
            Some(v) => writeln!(f, "Final voltage: {v:.2} V")?,
            None => writeln!(f, "Final voltage: n/a")?,
        }
        writeln!(f, "Final current: {:.2} A", self.final_current_a)?;
        writeln!(f, "SOC:           {:.1} %", self.soc * 100.0)?;
        writeln!(f, "Net energy:    {:.1} Wh", self.net_energy_wh)?;
        write!(f, "Capacity used: {:.2} Ah", self.capacity_used_ah)
    }
}

struct Reporter<'a> {
    cb: Option<&'a mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
    segment_count: usize,
}

impl Reporter<'_> {
    fn emit(
        &mut self,
        stage: RunStage,
        segment: Option<usize>,
        state: &BatteryState,
        profile: Option<ProfileKind>,
        message: Option<String>,
    ) {
        if let Some(cb) = self.cb.as_deref_mut() {
            cb(RunProgressEvent {
                stage,
                segment,
                segment_count: self.segment_count,
                elapsed_wall_s: self.started.elapsed().as_secs_f64(),
                sim_time_s: state.elapsed_s,
                soc: state.soc,
                profile,
                message,
            });
        }
    }
}

/// Run a power request against `solver`.
///
/// Configuration and segment errors come back as `Err` before the solver is
/// touched. A segment that diverges on both profiles ends the run with
/// [`RunStatus::Failed`] inside an `Ok`, carrying the last good state.
pub fn run<S: CellSolver + ?Sized>(
    solver: &S,
    segments: &[PowerSegment],
    initial_soc: f64,
    config: &BatteryConfiguration,
    options: &RunOptions,
) -> SimResult<RunResult> {
    run_with_progress(solver, segments, initial_soc, config, options, None)
}

/// [`run`] with a progress callback.
pub fn run_with_progress<S: CellSolver + ?Sized>(
    solver: &S,
    segments: &[PowerSegment],
    initial_soc: f64,
    config: &BatteryConfiguration,
    options: &RunOptions,
    progress: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> SimResult<RunResult> {
    let mut reporter = Reporter {
        cb: progress,
        started: Instant::now(),
        segment_count: segments.len(),
    };

    let mut acc = StateAccumulator::new(initial_soc, config)?;
    reporter.emit(RunStage::Planning, None, &acc.get_state(), None, None);
    let planned = plan(segments, config, options.power_unit, options.control_mode)?;

    let guard = StabilityGuard::new(options.attempt_timeout);
    let mut reports = Vec::with_capacity(planned.len());
    let mut skipped = Vec::new();

    info!(
        model = %config.model,
        segments = planned.len(),
        initial_soc,
        "starting run"
    );

    for (pos, segment) in planned.iter().enumerate() {
        debug!(
            segment = segment.index,
            power_kw = segment.power_kw,
            start_s = segment.window.start_s,
            end_s = segment.window.end_s,
            "segment"
        );
        reporter.emit(
            RunStage::SegmentStarted,
            Some(segment.index),
            &acc.get_state(),
            Some(segment.profile),
            None,
        );

        let initial = acc.get_state().initial_condition();
        let guarded = match guard.integrate(solver, config, segment, initial) {
            Ok(g) => g,
            Err(error) => {
                acc.fail()?;
                warn!(segment = segment.index, %error, "run failed");
                reporter.emit(
                    RunStage::Failed,
                    Some(segment.index),
                    &acc.get_state(),
                    None,
                    Some(error.to_string()),
                );
                return Ok(RunResult {
                    final_state: acc.get_state(),
                    segments: reports,
                    status: RunStatus::Failed { error },
                    skipped,
                });
            }
        };

        if guarded.escalated() {
            reporter.emit(
                RunStage::Escalated,
                Some(segment.index),
                &acc.get_state(),
                Some(guarded.profile),
                guarded.default_diagnostic.clone(),
            );
        }

        let update = acc.apply(segment, &guarded.trajectory)?;
        let truncation = guarded.trajectory.truncation;
        reporter.emit(
            RunStage::SegmentCompleted,
            Some(segment.index),
            &acc.get_state(),
            Some(guarded.profile),
            None,
        );

        reports.push(SegmentReport {
            index: segment.index,
            power_kw: segment.power_kw,
            start_s: segment.window.start_s,
            end_s: segment.window.end_s,
            attempts: guarded.attempts,
            profile: guarded.profile,
            energy_wh: update.energy_wh,
            charge_ah: update.charge_ah,
            soc_before: update.soc_before,
            soc_after: update.soc_after,
            truncation,
            advisories: update.advisories,
            samples: guarded.trajectory.samples,
        });

        if truncation.is_some() && options.truncation_policy == TruncationPolicy::Halt {
            skipped.extend(planned[pos + 1..].iter().map(|s| s.index));
            info!(
                segment = segment.index,
                skipped = skipped.len(),
                "halting run after voltage truncation"
            );
            break;
        }
    }

    acc.complete()?;
    let final_state = acc.get_state();
    info!(
        soc = final_state.soc,
        net_energy_wh = final_state.net_energy_wh,
        elapsed_h = final_state.elapsed_h(),
        "run completed"
    );
    reporter.emit(RunStage::Completed, None, &final_state, None, None);

    Ok(RunResult {
        final_state,
        segments: reports,
        status: RunStatus::Completed,
        skipped,
    })
}
