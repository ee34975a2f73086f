//! Stability sweep over candidate power magnitudes.
//!
//! Each candidate is its own one-segment run with a fresh state, so a sweep
//! never touches the state of a real run. Trials are independent and may run
//! on the rayon pool; the report is the same either way.

use core::fmt;
use core::ops::RangeInclusive;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cf_core::{BatteryConfiguration, ModelKind, PowerUnit};
use cf_solver::{CellSolver, ProfileKind};
use rayon::prelude::*;
use tracing::info;

use crate::engine::{RunOptions, RunStatus, run};
use crate::error::{SimError, SimResult};
use crate::planner::PowerSegment;

/// How a candidate power fared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StabilityClass {
    /// Succeeded on the default profile.
    StableDefault,
    /// Needed the safe retry.
    StableSafe,
    /// Diverged on both profiles.
    Divergent,
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StableDefault => write!(f, "stable"),
            Self::StableSafe => write!(f, "stable (safe mode)"),
            Self::Divergent => write!(f, "divergent"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SweepOptions {
    /// Length of each trial segment (hours)
    pub duration_h: f64,
    pub initial_soc: f64,
    /// Run trials on the rayon pool
    pub parallel: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub attempt_timeout: Option<Duration>,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            duration_h: 0.1,
            initial_soc: 0.5,
            parallel: false,
            attempt_timeout: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SweepTrial {
    /// Candidate power as given (kW), sign kept
    pub power_kw: f64,
    pub class: StabilityClass,
    /// SOC at the end of the trial, when it succeeded
    pub final_soc: Option<f64>,
    pub diagnostic: Option<String>,
}

impl SweepTrial {
    pub fn magnitude(&self) -> f64 {
        self.power_kw.abs()
    }

    pub fn is_stable(&self) -> bool {
        self.class != StabilityClass::Divergent
    }
}

/// Trials ordered by ascending power magnitude.
#[derive(Clone, Debug, PartialEq)]
pub struct StabilityReport {
    pub model: ModelKind,
    pub trials: Vec<SweepTrial>,
}

impl StabilityReport {
    fn max_magnitude(&self, keep: impl Fn(&SweepTrial) -> bool) -> Option<f64> {
        self.trials
            .iter()
            .filter(|t| keep(t))
            .map(SweepTrial::magnitude)
            .reduce(f64::max)
    }

    /// Largest magnitude that succeeded without a retry.
    pub fn max_stable_on_default(&self) -> Option<f64> {
        self.max_magnitude(|t| t.class == StabilityClass::StableDefault)
    }

    /// Largest magnitude that succeeded at all.
    pub fn max_stable(&self) -> Option<f64> {
        self.max_magnitude(SweepTrial::is_stable)
    }

    pub fn first_divergent(&self) -> Option<&SweepTrial> {
        self.trials
            .iter()
            .find(|t| t.class == StabilityClass::Divergent)
    }

    /// Magnitudes from the smallest candidate up to the last one in the
    /// unbroken run of default-profile successes.
    pub fn recommended_range(&self) -> Option<RangeInclusive<f64>> {
        let first = self.trials.first()?;
        let last = self
            .trials
            .iter()
            .take_while(|t| t.class == StabilityClass::StableDefault)
            .last()?;
        Some(first.magnitude()..=last.magnitude())
    }

    pub fn count(&self, class: StabilityClass) -> usize {
        self.trials.iter().filter(|t| t.class == class).count()
    }
}

fn prepare(candidates_kw: &[f64], options: &SweepOptions) -> SimResult<Vec<f64>> {
    if candidates_kw.is_empty() {
        return Err(SimError::InvalidArg {
            what: "no candidate powers".to_string(),
        });
    }
    if let Some(bad) = candidates_kw.iter().find(|p| !p.is_finite()) {
        return Err(SimError::InvalidArg {
            what: format!("candidate power must be finite (got {bad})"),
        });
    }
    if !options.duration_h.is_finite() || options.duration_h <= 0.0 {
        return Err(SimError::InvalidArg {
            what: format!("trial duration must be positive (got {} h)", options.duration_h),
        });
    }
    let mut sorted = candidates_kw.to_vec();
    sorted.sort_by(|a, b| a.abs().total_cmp(&b.abs()));
    Ok(sorted)
}

fn trial<S: CellSolver + ?Sized>(
    solver: &S,
    config: &BatteryConfiguration,
    power_kw: f64,
    options: &SweepOptions,
) -> SimResult<SweepTrial> {
    let run_options = RunOptions {
        power_unit: PowerUnit::Kilowatt,
        attempt_timeout: options.attempt_timeout,
        ..RunOptions::default()
    };
    let result = run(
        solver,
        &[PowerSegment::new(power_kw, options.duration_h)],
        options.initial_soc,
        config,
        &run_options,
    )?;

    Ok(match result.status {
        RunStatus::Completed => {
            let escalated = result
                .segments
                .first()
                .is_some_and(|s| s.profile == ProfileKind::Safe);
            SweepTrial {
                power_kw,
                class: if escalated {
                    StabilityClass::StableSafe
                } else {
                    StabilityClass::StableDefault
                },
                final_soc: Some(result.final_state.soc),
                diagnostic: None,
            }
        }
        RunStatus::Failed { error } => SweepTrial {
            power_kw,
            class: StabilityClass::Divergent,
            final_soc: None,
            diagnostic: Some(error.to_string()),
        },
    })
}

fn finish(config: &BatteryConfiguration, trials: Vec<SweepTrial>) -> StabilityReport {
    let report = StabilityReport {
        model: config.model,
        trials,
    };
    info!(
        model = %report.model,
        stable = report.count(StabilityClass::StableDefault),
        safe = report.count(StabilityClass::StableSafe),
        divergent = report.count(StabilityClass::Divergent),
        max_stable_kw = ?report.max_stable(),
        "stability sweep finished"
    );
    report
}

/// Classify each candidate power (kW) for `config.model`.
///
/// Honors `options.parallel` by delegating to [`sweep_parallel`].
pub fn sweep<S: CellSolver + ?Sized>(
    solver: &S,
    config: &BatteryConfiguration,
    candidates_kw: &[f64],
    options: &SweepOptions,
) -> SimResult<StabilityReport> {
    if options.parallel {
        return sweep_parallel(solver, config, candidates_kw, options);
    }
    let powers = prepare(candidates_kw, options)?;
    let trials = powers
        .into_iter()
        .map(|p| trial(solver, config, p, options))
        .collect::<SimResult<Vec<_>>>()?;
    Ok(finish(config, trials))
}

/// [`sweep`] with trials spread over the rayon pool.
pub fn sweep_parallel<S: CellSolver + ?Sized>(
    solver: &S,
    config: &BatteryConfiguration,
    candidates_kw: &[f64],
    options: &SweepOptions,
) -> SimResult<StabilityReport> {
    let powers = prepare(candidates_kw, options)?;
    let trials = powers
        .par_iter()
        .map(|&p| trial(solver, config, p, options))
        .collect::<SimResult<Vec<_>>>()?;
    Ok(finish(config, trials))
}
