//! Run and sweep services over scenarios.

use cf_core::{BatteryConfiguration, ModelKind};
use cf_sim::{RunProgressEvent, RunResult, StabilityReport, SweepOptions};
use cf_solver::CellSolver;
use tracing::info;

use crate::error::AppResult;
use crate::logging;
use crate::scenario::Scenario;

/// Validate and run a scenario.
pub fn run_scenario<S: CellSolver + ?Sized>(solver: &S, scenario: &Scenario) -> AppResult<RunResult> {
    run_scenario_with_progress(solver, scenario, None)
}

/// Validate and run a scenario, streaming progress events.
///
/// A scenario `log_level` installs the process subscriber at that level
/// unless one is already installed.
pub fn run_scenario_with_progress<S: CellSolver + ?Sized>(
    solver: &S,
    scenario: &Scenario,
    progress: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResult> {
    scenario.validate()?;
    let options = scenario.options.to_run_options()?;
    if let Some(level) = &scenario.log_level {
        logging::init_from_name(level)?;
    }

    info!(
        scenario = %scenario.name,
        model = %scenario.battery.model,
        segments = scenario.segments.len(),
        duration_h = scenario.duration_h(),
        "running scenario"
    );
    let result = cf_sim::run_with_progress(
        solver,
        &scenario.segments,
        scenario.initial_soc,
        &scenario.battery,
        &options,
        progress,
    )?;
    info!(
        scenario = %scenario.name,
        completed = result.is_completed(),
        soc = result.final_state.soc,
        "scenario finished"
    );
    Ok(result)
}

/// Stability sweep of `model` on an otherwise unchanged pack.
pub fn sweep_model<S: CellSolver + ?Sized>(
    solver: &S,
    battery: &BatteryConfiguration,
    model: ModelKind,
    candidates_kw: &[f64],
    options: &SweepOptions,
) -> AppResult<StabilityReport> {
    let config = BatteryConfiguration {
        model,
        ..battery.clone()
    };
    Ok(cf_sim::sweep(solver, &config, candidates_kw, options)?)
}

/// One sweep per known model, in [`ModelKind::ALL`] order.
pub fn compare_models<S: CellSolver + ?Sized>(
    solver: &S,
    battery: &BatteryConfiguration,
    candidates_kw: &[f64],
    options: &SweepOptions,
) -> AppResult<Vec<StabilityReport>> {
    ModelKind::ALL
        .iter()
        .map(|&model| sweep_model(solver, battery, model, candidates_kw, options))
        .collect()
}
